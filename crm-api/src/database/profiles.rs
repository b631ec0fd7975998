use rusqlite::{params, Connection, OptionalExtension, Row};
use shared_types::profile::DEFAULT_TIMEZONE;
use shared_types::{Profile, ProfileInput};

use crate::database::{now, AsyncDbConnection, DbError, DbResult};

const PROFILE_COLUMNS: &str =
    "user_id, email, full_name, job_title, timezone, avatar_url, created_at, updated_at";

fn profile_from_row(row: &Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        job_title: row.get(3)?,
        timezone: row.get(4)?,
        avatar_url: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn fetch_profile(conn: &Connection, user_id: &str) -> DbResult<Option<Profile>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM profiles WHERE user_id = ?1", PROFILE_COLUMNS),
            [user_id],
            profile_from_row,
        )
        .optional()?)
}

/// Returns the user's profile, creating an empty one on first access.
pub async fn get_or_create_profile(
    conn: AsyncDbConnection,
    user_id: &str,
    email: Option<&str>,
) -> DbResult<Profile> {
    let conn = conn.lock().await?;
    if let Some(profile) = fetch_profile(&conn, user_id)? {
        return Ok(profile);
    }

    let now = now();
    conn.execute(
        "INSERT OR IGNORE INTO profiles (user_id, email, timezone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![user_id, email, DEFAULT_TIMEZONE, now],
    )?;
    tracing::debug!("Created profile for user {}", user_id);

    fetch_profile(&conn, user_id)?.ok_or(DbError::NotFound)
}

pub async fn update_profile(
    conn: AsyncDbConnection,
    user_id: &str,
    email: Option<&str>,
    input: &ProfileInput,
) -> DbResult<Profile> {
    let conn = conn.lock().await?;
    let now = now();
    conn.execute(
        "INSERT INTO profiles
         (user_id, email, full_name, job_title, timezone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT (user_id) DO UPDATE SET
             full_name = excluded.full_name,
             job_title = excluded.job_title,
             timezone = excluded.timezone,
             updated_at = excluded.updated_at",
        params![
            user_id,
            email,
            input.full_name,
            input.job_title,
            input.timezone,
            now
        ],
    )?;

    fetch_profile(&conn, user_id)?.ok_or(DbError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::test_db;

    #[tokio::test]
    async fn test_profile_created_on_first_access() {
        let t = test_db();
        let conn = t.db.async_connection.clone();

        let profile = get_or_create_profile(conn.clone(), "alice", Some("alice@example.com"))
            .await
            .unwrap();
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
        assert_eq!(profile.timezone, "UTC");
        assert!(profile.full_name.is_none());

        let again = get_or_create_profile(conn, "alice", None).await.unwrap();
        assert_eq!(again.created_at, profile.created_at);
        assert_eq!(again.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn test_update_keeps_email() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        get_or_create_profile(conn.clone(), "alice", Some("alice@example.com"))
            .await
            .unwrap();

        let updated = update_profile(
            conn.clone(),
            "alice",
            Some("other@example.com"),
            &ProfileInput {
                full_name: "Alice Smith".to_string(),
                job_title: None,
                timezone: "Europe/Paris".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Alice Smith"));
        assert_eq!(updated.timezone, "Europe/Paris");
        assert_eq!(updated.email.as_deref(), Some("alice@example.com"));

        // Updating before the first read still creates the row.
        let fresh = update_profile(
            conn,
            "bob",
            Some("bob@example.com"),
            &ProfileInput {
                full_name: "Bob".to_string(),
                job_title: Some("AE".to_string()),
                timezone: "UTC".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(fresh.email.as_deref(), Some("bob@example.com"));
    }
}
