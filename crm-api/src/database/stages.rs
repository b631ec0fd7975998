use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use shared_types::DealStage;

use crate::database::{new_id, now, AsyncDbConnection, DbError, DbResult};

/// name, color, is_won, is_lost
const DEFAULT_STAGES: [(&str, &str, bool, bool); 6] = [
    ("Qualification", "#6366f1", false, false),
    ("Meeting Scheduled", "#8b5cf6", false, false),
    ("Proposal", "#0ea5e9", false, false),
    ("Negotiation", "#f59e0b", false, false),
    ("Closed Won", "#22c55e", true, false),
    ("Closed Lost", "#ef4444", false, true),
];

pub(crate) const STAGE_COLUMNS: &str =
    "s.id, s.user_id, s.name, s.color, s.display_order, s.is_won, s.is_lost, s.created_at";

/// Reads the stage columns starting at `offset`.
pub(crate) fn stage_from_row(row: &Row, offset: usize) -> rusqlite::Result<DealStage> {
    Ok(DealStage {
        id: row.get(offset)?,
        user_id: row.get(offset + 1)?,
        name: row.get(offset + 2)?,
        color: row.get(offset + 3)?,
        display_order: row.get(offset + 4)?,
        is_won: row.get(offset + 5)?,
        is_lost: row.get(offset + 6)?,
        created_at: row.get(offset + 7)?,
    })
}

/// Loads a stage the user owns, reporting a miss against `stage_id`.
pub(crate) fn fetch_owned_stage(conn: &Connection, user_id: &str, id: &str) -> DbResult<DealStage> {
    conn.query_row(
        &format!(
            "SELECT {} FROM deal_stages s WHERE s.id = ?1 AND s.user_id = ?2",
            STAGE_COLUMNS
        ),
        params![id, user_id],
        |row| stage_from_row(row, 0),
    )
    .optional()?
    .ok_or_else(|| DbError::reference("stage_id", "Stage not found"))
}

/// Inserts the default pipeline unless the user already has stages.
pub(crate) fn seed_if_empty(conn: &mut Connection, user_id: &str) -> DbResult<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing: i64 = tx.query_row(
        "SELECT COUNT(*) FROM deal_stages WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    if existing > 0 {
        return Ok(0);
    }

    let now = now();
    for (order, (name, color, is_won, is_lost)) in DEFAULT_STAGES.iter().enumerate() {
        tx.execute(
            "INSERT INTO deal_stages
             (id, user_id, name, color, display_order, is_won, is_lost, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![new_id(), user_id, name, color, order as i64, is_won, is_lost, now],
        )?;
    }
    tx.commit()?;

    tracing::info!("Seeded {} default deal stages for user {}", DEFAULT_STAGES.len(), user_id);
    Ok(DEFAULT_STAGES.len())
}

pub(crate) fn fetch_stages(conn: &Connection, user_id: &str) -> DbResult<Vec<DealStage>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM deal_stages s WHERE s.user_id = ?1 ORDER BY s.display_order, s.rowid",
        STAGE_COLUMNS
    ))?;
    let stages = stmt
        .query_map([user_id], |row| stage_from_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stages)
}

pub async fn seed_default_stages(conn: AsyncDbConnection, user_id: &str) -> DbResult<usize> {
    let mut conn = conn.lock().await?;
    seed_if_empty(&mut conn, user_id)
}

/// Stages in display order, seeding the default pipeline on first use.
pub async fn list_stages(conn: AsyncDbConnection, user_id: &str) -> DbResult<Vec<DealStage>> {
    let mut conn = conn.lock().await?;
    seed_if_empty(&mut conn, user_id)?;
    fetch_stages(&conn, user_id)
}
