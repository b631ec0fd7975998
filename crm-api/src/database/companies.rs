use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use shared_types::{CompaniesResponse, Company, CompanyInput, CompanyListQuery, CompanyRef, PAGE_SIZE};

use crate::database::{new_id, now, page_window, AsyncDbConnection, DbError, DbResult, Filters};

const COMPANY_COLUMNS: &str = "id, user_id, name, domain, industry, size, phone, address, city,
     state, country, notes, created_at, updated_at";

fn company_from_row(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        domain: row.get(3)?,
        industry: row.get(4)?,
        size: row.get(5)?,
        phone: row.get(6)?,
        address: row.get(7)?,
        city: row.get(8)?,
        state: row.get(9)?,
        country: row.get(10)?,
        notes: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(crate) fn fetch_company(conn: &Connection, user_id: &str, id: &str) -> DbResult<Company> {
    conn.query_row(
        &format!(
            "SELECT {} FROM companies WHERE id = ?1 AND user_id = ?2",
            COMPANY_COLUMNS
        ),
        params![id, user_id],
        company_from_row,
    )
    .optional()?
    .ok_or(DbError::NotFound)
}

pub async fn list_companies(
    conn: AsyncDbConnection,
    user_id: &str,
    query: &CompanyListQuery,
) -> DbResult<CompaniesResponse> {
    let conn = conn.lock().await?;
    let (page, offset) = page_window(query.page);

    let mut filters = Filters::owned_by("user_id", user_id);
    filters.search(&["name", "domain"], query.search.as_deref());

    let total_count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM companies {}", filters.where_sql()),
        params_from_iter(filters.params()),
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM companies {} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        COMPANY_COLUMNS,
        filters.where_sql()
    ))?;
    let companies = stmt
        .query_map(
            params_from_iter(filters.params_with_page(PAGE_SIZE as i64, offset)),
            company_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompaniesResponse {
        companies,
        total_count,
        page,
        page_size: PAGE_SIZE,
    })
}

/// Company picker entries, alphabetical.
pub async fn list_company_options(
    conn: AsyncDbConnection,
    user_id: &str,
) -> DbResult<Vec<CompanyRef>> {
    let conn = conn.lock().await?;
    let mut stmt =
        conn.prepare("SELECT id, name FROM companies WHERE user_id = ?1 ORDER BY name COLLATE NOCASE")?;
    let options = stmt
        .query_map([user_id], |row| {
            Ok(CompanyRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(options)
}

pub async fn get_company(conn: AsyncDbConnection, user_id: &str, id: &str) -> DbResult<Company> {
    let conn = conn.lock().await?;
    fetch_company(&conn, user_id, id)
}

pub async fn insert_company(
    conn: AsyncDbConnection,
    user_id: &str,
    input: &CompanyInput,
) -> DbResult<Company> {
    let conn = conn.lock().await?;
    let id = new_id();
    let now = now();

    conn.execute(
        "INSERT INTO companies
         (id, user_id, name, domain, industry, size, phone, address, city, state, country,
          notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
        params![
            id,
            user_id,
            input.name,
            input.domain,
            input.industry,
            input.size,
            input.phone,
            input.address,
            input.city,
            input.state,
            input.country,
            input.notes,
            now,
        ],
    )?;

    fetch_company(&conn, user_id, &id)
}

pub async fn update_company(
    conn: AsyncDbConnection,
    user_id: &str,
    id: &str,
    input: &CompanyInput,
) -> DbResult<Company> {
    let conn = conn.lock().await?;

    let changed = conn.execute(
        "UPDATE companies
         SET name = ?1, domain = ?2, industry = ?3, size = ?4, phone = ?5, address = ?6,
             city = ?7, state = ?8, country = ?9, notes = ?10, updated_at = ?11
         WHERE id = ?12 AND user_id = ?13",
        params![
            input.name,
            input.domain,
            input.industry,
            input.size,
            input.phone,
            input.address,
            input.city,
            input.state,
            input.country,
            input.notes,
            now(),
            id,
            user_id,
        ],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound);
    }

    fetch_company(&conn, user_id, id)
}

pub async fn delete_company(conn: AsyncDbConnection, user_id: &str, id: &str) -> DbResult<()> {
    let conn = conn.lock().await?;
    let deleted = conn.execute(
        "DELETE FROM companies WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if deleted == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
