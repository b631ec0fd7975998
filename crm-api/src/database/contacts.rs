use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use shared_types::{
    CompanyRef, Contact, ContactInput, ContactListQuery, ContactRef, ContactStatus,
    ContactWithCompany, ContactsResponse, PAGE_SIZE,
};

use crate::database::{
    ensure_owned, new_id, now, page_window, parse_enum, AsyncDbConnection, DbError, DbResult,
    Filters,
};

const CONTACT_COLUMNS: &str = "c.id, c.user_id, c.first_name, c.last_name, c.email, c.phone,
     c.job_title, c.company_id, c.status, c.source, c.address, c.city, c.state, c.country,
     c.avatar_url, c.created_at, c.updated_at";

const CONTACT_WITH_COMPANY: &str = "FROM contacts c LEFT JOIN companies co ON co.id = c.company_id";

fn contact_from_row(row: &Row) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        user_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        job_title: row.get(6)?,
        company_id: row.get(7)?,
        status: parse_enum(row, 8)?,
        source: row.get(9)?,
        address: row.get(10)?,
        city: row.get(11)?,
        state: row.get(12)?,
        country: row.get(13)?,
        avatar_url: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

/// Contact columns followed by `co.id, co.name`.
fn contact_with_company_from_row(row: &Row) -> rusqlite::Result<ContactWithCompany> {
    let contact = contact_from_row(row)?;
    let company_id: Option<String> = row.get(17)?;
    let company_name: Option<String> = row.get(18)?;
    let company = company_id
        .zip(company_name)
        .map(|(id, name)| CompanyRef { id, name });
    Ok(ContactWithCompany { contact, company })
}

fn fetch_contact(conn: &Connection, user_id: &str, id: &str) -> DbResult<ContactWithCompany> {
    conn.query_row(
        &format!(
            "SELECT {}, co.id, co.name {} WHERE c.id = ?1 AND c.user_id = ?2",
            CONTACT_COLUMNS, CONTACT_WITH_COMPANY
        ),
        params![id, user_id],
        contact_with_company_from_row,
    )
    .optional()?
    .ok_or(DbError::NotFound)
}

pub async fn list_contacts(
    conn: AsyncDbConnection,
    user_id: &str,
    query: &ContactListQuery,
) -> DbResult<ContactsResponse> {
    let conn = conn.lock().await?;
    let (page, offset) = page_window(query.page);

    let mut filters = Filters::owned_by("c.user_id", user_id);
    filters.search(
        &["c.first_name", "c.last_name", "c.email"],
        query.search.as_deref(),
    );
    if let Some(status) = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<ContactStatus>().ok())
    {
        filters.eq("c.status", status.as_str().to_string());
    }

    let total_count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM contacts c {}", filters.where_sql()),
        params_from_iter(filters.params()),
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {}, co.id, co.name {} {} ORDER BY c.created_at DESC, c.rowid DESC LIMIT ? OFFSET ?",
        CONTACT_COLUMNS,
        CONTACT_WITH_COMPANY,
        filters.where_sql()
    ))?;
    let contacts = stmt
        .query_map(
            params_from_iter(filters.params_with_page(PAGE_SIZE as i64, offset)),
            contact_with_company_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ContactsResponse {
        contacts,
        total_count,
        page,
        page_size: PAGE_SIZE,
    })
}

/// Contact picker entries, by last name.
pub async fn list_contact_options(
    conn: AsyncDbConnection,
    user_id: &str,
) -> DbResult<Vec<ContactRef>> {
    let conn = conn.lock().await?;
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name FROM contacts WHERE user_id = ?1
         ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE",
    )?;
    let options = stmt
        .query_map([user_id], |row| {
            Ok(ContactRef {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(options)
}

pub async fn list_company_contacts(
    conn: AsyncDbConnection,
    user_id: &str,
    company_id: &str,
) -> DbResult<Vec<Contact>> {
    let conn = conn.lock().await?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM contacts c WHERE c.company_id = ?1 AND c.user_id = ?2
         ORDER BY c.last_name COLLATE NOCASE, c.first_name COLLATE NOCASE",
        CONTACT_COLUMNS
    ))?;
    let contacts = stmt
        .query_map(params![company_id, user_id], contact_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(contacts)
}

pub async fn get_contact(
    conn: AsyncDbConnection,
    user_id: &str,
    id: &str,
) -> DbResult<ContactWithCompany> {
    let conn = conn.lock().await?;
    fetch_contact(&conn, user_id, id)
}

pub async fn insert_contact(
    conn: AsyncDbConnection,
    user_id: &str,
    input: &ContactInput,
) -> DbResult<ContactWithCompany> {
    let conn = conn.lock().await?;
    ensure_owned(
        &conn,
        "companies",
        input.company_id.as_deref(),
        user_id,
        "company_id",
        "Company not found",
    )?;

    let id = new_id();
    let now = now();
    conn.execute(
        "INSERT INTO contacts
         (id, user_id, first_name, last_name, email, phone, job_title, company_id, status,
          source, address, city, state, country, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
        params![
            id,
            user_id,
            input.first_name,
            input.last_name,
            input.email,
            input.phone,
            input.job_title,
            input.company_id,
            input.status.as_str(),
            input.source,
            input.address,
            input.city,
            input.state,
            input.country,
            now,
        ],
    )?;

    fetch_contact(&conn, user_id, &id)
}

pub async fn update_contact(
    conn: AsyncDbConnection,
    user_id: &str,
    id: &str,
    input: &ContactInput,
) -> DbResult<ContactWithCompany> {
    let conn = conn.lock().await?;
    ensure_owned(
        &conn,
        "companies",
        input.company_id.as_deref(),
        user_id,
        "company_id",
        "Company not found",
    )?;

    let changed = conn.execute(
        "UPDATE contacts
         SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4, job_title = ?5,
             company_id = ?6, status = ?7, source = ?8, address = ?9, city = ?10,
             state = ?11, country = ?12, updated_at = ?13
         WHERE id = ?14 AND user_id = ?15",
        params![
            input.first_name,
            input.last_name,
            input.email,
            input.phone,
            input.job_title,
            input.company_id,
            input.status.as_str(),
            input.source,
            input.address,
            input.city,
            input.state,
            input.country,
            now(),
            id,
            user_id,
        ],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound);
    }

    fetch_contact(&conn, user_id, id)
}

pub async fn delete_contact(conn: AsyncDbConnection, user_id: &str, id: &str) -> DbResult<()> {
    let conn = conn.lock().await?;
    let deleted = conn.execute(
        "DELETE FROM contacts WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if deleted == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
