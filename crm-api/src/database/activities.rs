use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use shared_types::{
    ActivitiesResponse, Activity, ActivityInput, ActivityListQuery, ActivityType,
    ActivityWithRefs, ContactRef, DealRef, PAGE_SIZE,
};

use crate::database::{
    ensure_owned, new_id, now, page_window, parse_enum, AsyncDbConnection, DbError, DbResult,
    Filters,
};

const ACTIVITY_COLUMNS: &str = "a.id, a.user_id, a.type, a.title, a.description, a.due_date,
     a.is_completed, a.completed_at, a.contact_id, a.deal_id, a.created_at, a.updated_at,
     ct.id, ct.first_name, ct.last_name, dl.id, dl.title";

const ACTIVITY_JOINS: &str = "FROM activities a
     LEFT JOIN contacts ct ON ct.id = a.contact_id
     LEFT JOIN deals dl ON dl.id = a.deal_id";

pub(crate) fn select_activities(where_sql: &str, tail: &str) -> String {
    format!(
        "SELECT {} {} {} {}",
        ACTIVITY_COLUMNS, ACTIVITY_JOINS, where_sql, tail
    )
}

pub(crate) fn activity_from_row(row: &Row) -> rusqlite::Result<ActivityWithRefs> {
    let activity = Activity {
        id: row.get(0)?,
        user_id: row.get(1)?,
        activity_type: parse_enum(row, 2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        due_date: row.get(5)?,
        is_completed: row.get(6)?,
        completed_at: row.get(7)?,
        contact_id: row.get(8)?,
        deal_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    };

    let contact = match row.get::<_, Option<String>>(12)? {
        Some(id) => Some(ContactRef {
            id,
            first_name: row.get(13)?,
            last_name: row.get(14)?,
        }),
        None => None,
    };
    let deal = match row.get::<_, Option<String>>(15)? {
        Some(id) => Some(DealRef {
            id,
            title: row.get(16)?,
        }),
        None => None,
    };

    Ok(ActivityWithRefs {
        activity,
        contact,
        deal,
    })
}

fn fetch_activity(conn: &Connection, user_id: &str, id: &str) -> DbResult<ActivityWithRefs> {
    conn.query_row(
        &select_activities("WHERE a.id = ?1 AND a.user_id = ?2", ""),
        params![id, user_id],
        activity_from_row,
    )
    .optional()?
    .ok_or(DbError::NotFound)
}

fn query_activities(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
) -> DbResult<Vec<ActivityWithRefs>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), activity_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn ensure_references(conn: &Connection, user_id: &str, input: &ActivityInput) -> DbResult<()> {
    ensure_owned(
        conn,
        "contacts",
        input.contact_id.as_deref(),
        user_id,
        "contact_id",
        "Contact not found",
    )?;
    ensure_owned(
        conn,
        "deals",
        input.deal_id.as_deref(),
        user_id,
        "deal_id",
        "Deal not found",
    )
}

pub async fn list_activities(
    conn: AsyncDbConnection,
    user_id: &str,
    query: &ActivityListQuery,
) -> DbResult<ActivitiesResponse> {
    let conn = conn.lock().await?;
    let (page, offset) = page_window(query.page);

    let mut filters = Filters::owned_by("a.user_id", user_id);
    filters.search(&["a.title"], query.search.as_deref());
    if let Some(kind) = query
        .activity_type
        .as_deref()
        .and_then(|t| t.parse::<ActivityType>().ok())
    {
        filters.eq("a.type", kind.as_str().to_string());
    }
    if let Some(completed) = query.completed {
        filters.eq("a.is_completed", completed);
    }
    if let Some(contact_id) = query.contact_id.as_deref().filter(|s| !s.is_empty()) {
        filters.eq("a.contact_id", contact_id.to_string());
    }
    if let Some(deal_id) = query.deal_id.as_deref().filter(|s| !s.is_empty()) {
        filters.eq("a.deal_id", deal_id.to_string());
    }

    let total_count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM activities a {}", filters.where_sql()),
        params_from_iter(filters.params()),
        |row| row.get(0),
    )?;

    let activities = query_activities(
        &conn,
        &select_activities(
            &filters.where_sql(),
            "ORDER BY a.created_at DESC, a.rowid DESC LIMIT ? OFFSET ?",
        ),
        filters.params_with_page(PAGE_SIZE as i64, offset),
    )?;

    Ok(ActivitiesResponse {
        activities,
        total_count,
        page,
        page_size: PAGE_SIZE,
    })
}

/// Open activities due at or after `now`, soonest first.
pub async fn list_upcoming(
    conn: AsyncDbConnection,
    user_id: &str,
    now: i64,
    limit: u32,
) -> DbResult<Vec<ActivityWithRefs>> {
    let conn = conn.lock().await?;
    let mut filters = Filters::owned_by("a.user_id", user_id);
    filters
        .eq("a.is_completed", false)
        .clause("a.due_date >= ?", vec![Value::Integer(now)]);

    let mut values = filters.params();
    values.push(Value::Integer(limit as i64));
    query_activities(
        &conn,
        &select_activities(&filters.where_sql(), "ORDER BY a.due_date ASC LIMIT ?"),
        values,
    )
}

/// Open activities whose due date has passed, oldest first.
pub async fn list_overdue(
    conn: AsyncDbConnection,
    user_id: &str,
    now: i64,
) -> DbResult<Vec<ActivityWithRefs>> {
    let conn = conn.lock().await?;
    let mut filters = Filters::owned_by("a.user_id", user_id);
    filters
        .eq("a.is_completed", false)
        .clause("a.due_date < ?", vec![Value::Integer(now)]);

    query_activities(
        &conn,
        &select_activities(&filters.where_sql(), "ORDER BY a.due_date ASC"),
        filters.params(),
    )
}

/// Most recently created activities, for the dashboard feed.
pub(crate) fn fetch_recent(
    conn: &Connection,
    user_id: &str,
    limit: u32,
) -> DbResult<Vec<ActivityWithRefs>> {
    query_activities(
        conn,
        &select_activities(
            "WHERE a.user_id = ?",
            "ORDER BY a.created_at DESC, a.rowid DESC LIMIT ?",
        ),
        vec![Value::Text(user_id.to_string()), Value::Integer(limit as i64)],
    )
}

pub async fn get_activity(
    conn: AsyncDbConnection,
    user_id: &str,
    id: &str,
) -> DbResult<ActivityWithRefs> {
    let conn = conn.lock().await?;
    fetch_activity(&conn, user_id, id)
}

pub async fn insert_activity(
    conn: AsyncDbConnection,
    user_id: &str,
    input: &ActivityInput,
) -> DbResult<ActivityWithRefs> {
    let conn = conn.lock().await?;
    ensure_references(&conn, user_id, input)?;

    let id = new_id();
    let now = now();
    conn.execute(
        "INSERT INTO activities
         (id, user_id, type, title, description, due_date, contact_id, deal_id,
          created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            id,
            user_id,
            input.activity_type.as_str(),
            input.title,
            input.description,
            input.due_date,
            input.contact_id,
            input.deal_id,
            now,
        ],
    )?;

    fetch_activity(&conn, user_id, &id)
}

pub async fn update_activity(
    conn: AsyncDbConnection,
    user_id: &str,
    id: &str,
    input: &ActivityInput,
) -> DbResult<ActivityWithRefs> {
    let conn = conn.lock().await?;
    ensure_references(&conn, user_id, input)?;

    let changed = conn.execute(
        "UPDATE activities
         SET type = ?1, title = ?2, description = ?3, due_date = ?4, contact_id = ?5,
             deal_id = ?6, updated_at = ?7
         WHERE id = ?8 AND user_id = ?9",
        params![
            input.activity_type.as_str(),
            input.title,
            input.description,
            input.due_date,
            input.contact_id,
            input.deal_id,
            now(),
            id,
            user_id,
        ],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound);
    }

    fetch_activity(&conn, user_id, id)
}

/// Flips the completion flag, stamping or clearing `completed_at`.
pub async fn toggle_activity(
    conn: AsyncDbConnection,
    user_id: &str,
    id: &str,
) -> DbResult<ActivityWithRefs> {
    let conn = conn.lock().await?;
    let now = now();
    let changed = conn.execute(
        "UPDATE activities
         SET is_completed = NOT is_completed,
             completed_at = CASE WHEN is_completed THEN NULL ELSE ?1 END,
             updated_at = ?1
         WHERE id = ?2 AND user_id = ?3",
        params![now, id, user_id],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound);
    }

    fetch_activity(&conn, user_id, id)
}

pub async fn delete_activity(conn: AsyncDbConnection, user_id: &str, id: &str) -> DbResult<()> {
    let conn = conn.lock().await?;
    let deleted = conn.execute(
        "DELETE FROM activities WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if deleted == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
