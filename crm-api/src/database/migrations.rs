use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY,
            email TEXT,
            full_name TEXT,
            job_title TEXT,
            timezone TEXT NOT NULL DEFAULT 'UTC',
            avatar_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS companies (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            domain TEXT,
            industry TEXT,
            size TEXT,
            phone TEXT,
            address TEXT,
            city TEXT,
            state TEXT,
            country TEXT,
            notes TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            job_title TEXT,
            company_id TEXT REFERENCES companies (id) ON DELETE SET NULL,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive', 'lead')),
            source TEXT,
            address TEXT,
            city TEXT,
            state TEXT,
            country TEXT,
            avatar_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS deal_stages (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            color TEXT,
            display_order INTEGER NOT NULL,
            is_won INTEGER NOT NULL DEFAULT 0,
            is_lost INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS deals (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            value REAL CHECK (value IS NULL OR value >= 0),
            currency TEXT NOT NULL DEFAULT 'USD',
            probability INTEGER CHECK (probability IS NULL OR probability BETWEEN 0 AND 100),
            stage_id TEXT NOT NULL REFERENCES deal_stages (id) ON DELETE RESTRICT,
            company_id TEXT REFERENCES companies (id) ON DELETE SET NULL,
            expected_close_date TEXT,
            description TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            won_at INTEGER,
            lost_at INTEGER,
            lost_reason TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS deal_contacts (
            deal_id TEXT NOT NULL REFERENCES deals (id) ON DELETE CASCADE,
            contact_id TEXT NOT NULL REFERENCES contacts (id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            role TEXT,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (deal_id, contact_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS activities (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('call', 'email', 'meeting', 'task', 'note')),
            title TEXT NOT NULL,
            description TEXT,
            due_date INTEGER,
            is_completed INTEGER NOT NULL DEFAULT 0,
            completed_at INTEGER,
            contact_id TEXT REFERENCES contacts (id) ON DELETE SET NULL,
            deal_id TEXT REFERENCES deals (id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            content TEXT NOT NULL,
            contact_id TEXT REFERENCES contacts (id) ON DELETE CASCADE,
            company_id TEXT REFERENCES companies (id) ON DELETE CASCADE,
            deal_id TEXT REFERENCES deals (id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Indexes for the owner-scoped list queries
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_user_created ON contacts(user_id, created_at)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_company ON contacts(company_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_companies_user_created ON companies(user_id, created_at)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_deal_stages_user_order ON deal_stages(user_id, display_order)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_deals_stage_position ON deals(stage_id, position)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_deals_user_created ON deals(user_id, created_at)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_activities_user_due ON activities(user_id, is_completed, due_date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notes_contact ON notes(contact_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notes_company ON notes(company_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notes_deal ON notes(deal_id)",
        [],
    )?;

    Ok(())
}
