use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use shared_types::{Note, NoteInput, NoteListQuery};

use crate::database::{ensure_owned, new_id, now, AsyncDbConnection, DbError, DbResult, Filters};

const NOTE_COLUMNS: &str =
    "id, user_id, content, contact_id, company_id, deal_id, created_at, updated_at";

fn note_from_row(row: &Row) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        contact_id: row.get(3)?,
        company_id: row.get(4)?,
        deal_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn fetch_note(conn: &Connection, user_id: &str, id: &str) -> DbResult<Note> {
    conn.query_row(
        &format!(
            "SELECT {} FROM notes WHERE id = ?1 AND user_id = ?2",
            NOTE_COLUMNS
        ),
        params![id, user_id],
        note_from_row,
    )
    .optional()?
    .ok_or(DbError::NotFound)
}

fn ensure_references(conn: &Connection, user_id: &str, input: &NoteInput) -> DbResult<()> {
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
        "companies",
        input.company_id.as_deref(),
        user_id,
        "company_id",
        "Company not found",
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

/// Notes attached to the given record(s), newest first.
pub async fn list_notes(
    conn: AsyncDbConnection,
    user_id: &str,
    query: &NoteListQuery,
) -> DbResult<Vec<Note>> {
    let conn = conn.lock().await?;

    let mut filters = Filters::owned_by("user_id", user_id);
    for (column, value) in [
        ("contact_id", &query.contact_id),
        ("company_id", &query.company_id),
        ("deal_id", &query.deal_id),
    ] {
        if let Some(id) = value.as_deref().filter(|s| !s.is_empty()) {
            filters.eq(column, id.to_string());
        }
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM notes {} ORDER BY created_at DESC, rowid DESC",
        NOTE_COLUMNS,
        filters.where_sql()
    ))?;
    let notes = stmt
        .query_map(params_from_iter(filters.params()), note_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notes)
}

pub async fn insert_note(
    conn: AsyncDbConnection,
    user_id: &str,
    input: &NoteInput,
) -> DbResult<Note> {
    let conn = conn.lock().await?;
    ensure_references(&conn, user_id, input)?;

    let id = new_id();
    conn.execute(
        "INSERT INTO notes
         (id, user_id, content, contact_id, company_id, deal_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            id,
            user_id,
            input.content,
            input.contact_id,
            input.company_id,
            input.deal_id,
            now(),
        ],
    )?;

    fetch_note(&conn, user_id, &id)
}

/// Rewrites the note body. Attachments stay as created.
pub async fn update_note(
    conn: AsyncDbConnection,
    user_id: &str,
    id: &str,
    content: &str,
) -> DbResult<Note> {
    let conn = conn.lock().await?;
    let changed = conn.execute(
        "UPDATE notes SET content = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
        params![content, now(), id, user_id],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound);
    }
    fetch_note(&conn, user_id, id)
}

pub async fn delete_note(conn: AsyncDbConnection, user_id: &str, id: &str) -> DbResult<()> {
    let conn = conn.lock().await?;
    let deleted = conn.execute(
        "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if deleted == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::companies::{delete_company, insert_company};
    use crate::database::test_support::test_db;
    use shared_types::CompanyInput;

    fn company_input(name: &str) -> CompanyInput {
        CompanyInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_notes_listed_newest_first_per_record() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let acme = insert_company(conn.clone(), "alice", &company_input("Acme"))
            .await
            .unwrap();

        for content in ["first", "second"] {
            insert_note(
                conn.clone(),
                "alice",
                &NoteInput {
                    content: content.to_string(),
                    company_id: Some(acme.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        insert_note(
            conn.clone(),
            "alice",
            &NoteInput {
                content: "loose".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let notes = list_notes(
            conn.clone(),
            "alice",
            &NoteListQuery {
                company_id: Some(acme.id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let contents: Vec<&str> = notes.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "first"]);

        // Company notes go with the company.
        delete_company(conn.clone(), "alice", &acme.id).await.unwrap();
        let all = list_notes(conn, "alice", &NoteListQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_scoped() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let note = insert_note(
            conn.clone(),
            "alice",
            &NoteInput {
                content: "draft".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            update_note(conn.clone(), "bob", &note.id, "hijack").await,
            Err(DbError::NotFound)
        ));
        let updated = update_note(conn.clone(), "alice", &note.id, "final").await.unwrap();
        assert_eq!(updated.content, "final");

        assert!(matches!(
            delete_note(conn.clone(), "bob", &note.id).await,
            Err(DbError::NotFound)
        ));
        delete_note(conn, "alice", &note.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_foreign_company_rejected() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let acme = insert_company(conn.clone(), "alice", &company_input("Acme"))
            .await
            .unwrap();
        let result = insert_note(
            conn,
            "bob",
            &NoteInput {
                content: "peek".to_string(),
                company_id: Some(acme.id),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(DbError::InvalidReference { ref field, .. }) if field == "company_id"
        ));
    }
}
