use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use shared_types::{
    CompanyRef, ContactRef, Deal, DealContact, DealContactInput, DealInput, DealListQuery,
    DealStage, DealWithDetails, DealsResponse, MoveDealRequest, PipelineBoard, PAGE_SIZE,
};

use crate::database::stages::{
    fetch_owned_stage, fetch_stages, seed_if_empty, stage_from_row, STAGE_COLUMNS,
};
use crate::database::{
    ensure_owned, new_id, now, page_window, AsyncDbConnection, DbError, DbResult, Filters,
};

const DEAL_COLUMNS: &str = "d.id, d.user_id, d.title, d.value, d.currency, d.probability,
     d.stage_id, d.company_id, d.expected_close_date, d.description, d.position, d.won_at,
     d.lost_at, d.lost_reason, d.created_at, d.updated_at";

const DEAL_JOINS: &str = "FROM deals d
     JOIN deal_stages s ON s.id = d.stage_id
     LEFT JOIN companies co ON co.id = d.company_id";

fn select_deals(where_sql: &str, tail: &str) -> String {
    format!(
        "SELECT {}, {}, co.id, co.name {} {} {}",
        DEAL_COLUMNS, STAGE_COLUMNS, DEAL_JOINS, where_sql, tail
    )
}

fn deal_from_row(row: &Row) -> rusqlite::Result<DealWithDetails> {
    let deal = Deal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        value: row.get(3)?,
        currency: row.get(4)?,
        probability: row.get(5)?,
        stage_id: row.get(6)?,
        company_id: row.get(7)?,
        expected_close_date: row.get(8)?,
        description: row.get(9)?,
        position: row.get(10)?,
        won_at: row.get(11)?,
        lost_at: row.get(12)?,
        lost_reason: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    };
    let stage = stage_from_row(row, 16)?;
    let company_id: Option<String> = row.get(24)?;
    let company_name: Option<String> = row.get(25)?;
    Ok(DealWithDetails {
        deal,
        stage,
        company: company_id
            .zip(company_name)
            .map(|(id, name)| CompanyRef { id, name }),
    })
}

fn fetch_deal(conn: &Connection, user_id: &str, id: &str) -> DbResult<DealWithDetails> {
    conn.query_row(
        &select_deals("WHERE d.id = ?1 AND d.user_id = ?2", ""),
        params![id, user_id],
        deal_from_row,
    )
    .optional()?
    .ok_or(DbError::NotFound)
}

/// won_at / lost_at for a deal that has just entered `stage`.
fn outcome_stamps(stage: &DealStage, at: i64) -> (Option<i64>, Option<i64>) {
    (
        stage.is_won.then_some(at),
        stage.is_lost.then_some(at),
    )
}

fn current_stage_id(conn: &Connection, user_id: &str, deal_id: &str) -> DbResult<String> {
    conn.query_row(
        "SELECT stage_id FROM deals WHERE id = ?1 AND user_id = ?2",
        params![deal_id, user_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(DbError::NotFound)
}

/// Ids in a stage column, top to bottom, optionally leaving one deal out.
fn column_ids(
    conn: &Connection,
    user_id: &str,
    stage_id: &str,
    except: Option<&str>,
) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM deals WHERE stage_id = ?1 AND user_id = ?2 AND id IS NOT ?3
         ORDER BY position, rowid",
    )?;
    let ids = stmt
        .query_map(params![stage_id, user_id, except], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn write_positions(conn: &Connection, ids: &[String]) -> DbResult<()> {
    let mut stmt = conn.prepare("UPDATE deals SET position = ?1 WHERE id = ?2 AND position != ?1")?;
    for (position, id) in ids.iter().enumerate() {
        stmt.execute(params![position as i64, id])?;
    }
    Ok(())
}

/// Renumbers a column `0..n`, closing any gaps.
fn renumber_column(conn: &Connection, user_id: &str, stage_id: &str) -> DbResult<()> {
    let ids = column_ids(conn, user_id, stage_id, None)?;
    write_positions(conn, &ids)
}

/// Places a deal at `position` in a stage column and renumbers every column it touched.
fn place_deal(conn: &Connection, user_id: &str, request: &MoveDealRequest) -> DbResult<()> {
    let from_stage = current_stage_id(conn, user_id, &request.deal_id)?;
    let to_stage = fetch_owned_stage(conn, user_id, &request.stage_id)?;

    if from_stage != to_stage.id {
        let (won_at, lost_at) = outcome_stamps(&to_stage, now());
        conn.execute(
            "UPDATE deals SET stage_id = ?1, won_at = ?2, lost_at = ?3, updated_at = ?4
             WHERE id = ?5",
            params![to_stage.id, won_at, lost_at, now(), request.deal_id],
        )?;
    } else {
        conn.execute(
            "UPDATE deals SET updated_at = ?1 WHERE id = ?2",
            params![now(), request.deal_id],
        )?;
    }

    let mut ids = column_ids(conn, user_id, &to_stage.id, Some(&request.deal_id))?;
    let index = (request.position.max(0) as usize).min(ids.len());
    ids.insert(index, request.deal_id.clone());
    write_positions(conn, &ids)?;

    if from_stage != to_stage.id {
        renumber_column(conn, user_id, &from_stage)?;
    }
    Ok(())
}

pub async fn list_deals(
    conn: AsyncDbConnection,
    user_id: &str,
    query: &DealListQuery,
) -> DbResult<DealsResponse> {
    let conn = conn.lock().await?;
    let (page, offset) = page_window(query.page);

    let mut filters = Filters::owned_by("d.user_id", user_id);
    filters.search(&["d.title"], query.search.as_deref());
    if let Some(stage_id) = query.stage_id.as_deref().filter(|s| !s.is_empty()) {
        filters.eq("d.stage_id", stage_id.to_string());
    }

    let total_count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM deals d {}", filters.where_sql()),
        params_from_iter(filters.params()),
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&select_deals(
        &filters.where_sql(),
        "ORDER BY d.created_at DESC, d.rowid DESC LIMIT ? OFFSET ?",
    ))?;
    let deals = stmt
        .query_map(
            params_from_iter(filters.params_with_page(PAGE_SIZE as i64, offset)),
            deal_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DealsResponse {
        deals,
        total_count,
        page,
        page_size: PAGE_SIZE,
    })
}

/// Stage columns with their deals, seeding the default pipeline on first use.
pub async fn get_board(conn: AsyncDbConnection, user_id: &str) -> DbResult<PipelineBoard> {
    let mut conn = conn.lock().await?;
    seed_if_empty(&mut conn, user_id)?;

    let stages = fetch_stages(&conn, user_id)?;
    let mut stmt = conn.prepare(&select_deals(
        "WHERE d.user_id = ?1",
        "ORDER BY d.position, d.rowid",
    ))?;
    let deals = stmt
        .query_map([user_id], deal_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PipelineBoard::from_parts(stages, deals))
}

pub async fn list_company_deals(
    conn: AsyncDbConnection,
    user_id: &str,
    company_id: &str,
) -> DbResult<Vec<DealWithDetails>> {
    let conn = conn.lock().await?;
    let mut stmt = conn.prepare(&select_deals(
        "WHERE d.company_id = ?1 AND d.user_id = ?2",
        "ORDER BY d.created_at DESC, d.rowid DESC",
    ))?;
    let deals = stmt
        .query_map(params![company_id, user_id], deal_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(deals)
}

/// Deals a contact is linked to through `deal_contacts`.
pub async fn list_contact_deals(
    conn: AsyncDbConnection,
    user_id: &str,
    contact_id: &str,
) -> DbResult<Vec<DealWithDetails>> {
    let conn = conn.lock().await?;
    let mut stmt = conn.prepare(&select_deals(
        "WHERE d.user_id = ?2
           AND d.id IN (SELECT deal_id FROM deal_contacts WHERE contact_id = ?1)",
        "ORDER BY d.created_at DESC, d.rowid DESC",
    ))?;
    let deals = stmt
        .query_map(params![contact_id, user_id], deal_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(deals)
}

pub async fn get_deal(conn: AsyncDbConnection, user_id: &str, id: &str) -> DbResult<DealWithDetails> {
    let conn = conn.lock().await?;
    fetch_deal(&conn, user_id, id)
}

pub async fn insert_deal(
    conn: AsyncDbConnection,
    user_id: &str,
    input: &DealInput,
) -> DbResult<DealWithDetails> {
    let mut conn = conn.lock().await?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let stage = fetch_owned_stage(&tx, user_id, &input.stage_id)?;
    ensure_owned(
        &tx,
        "companies",
        input.company_id.as_deref(),
        user_id,
        "company_id",
        "Company not found",
    )?;

    let position: i64 = tx.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM deals WHERE stage_id = ?1 AND user_id = ?2",
        params![stage.id, user_id],
        |row| row.get(0),
    )?;

    let id = new_id();
    let now = now();
    let (won_at, lost_at) = outcome_stamps(&stage, now);
    tx.execute(
        "INSERT INTO deals
         (id, user_id, title, value, currency, probability, stage_id, company_id,
          expected_close_date, description, position, won_at, lost_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
        params![
            id,
            user_id,
            input.title,
            input.value,
            input.currency,
            input.probability,
            stage.id,
            input.company_id,
            input.expected_close_date,
            input.description,
            position,
            won_at,
            lost_at,
            now,
        ],
    )?;
    tx.commit()?;

    fetch_deal(&conn, user_id, &id)
}

pub async fn update_deal(
    conn: AsyncDbConnection,
    user_id: &str,
    id: &str,
    input: &DealInput,
) -> DbResult<DealWithDetails> {
    let mut conn = conn.lock().await?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let from_stage = current_stage_id(&tx, user_id, id)?;
    let stage = fetch_owned_stage(&tx, user_id, &input.stage_id)?;
    ensure_owned(
        &tx,
        "companies",
        input.company_id.as_deref(),
        user_id,
        "company_id",
        "Company not found",
    )?;

    tx.execute(
        "UPDATE deals
         SET title = ?1, value = ?2, currency = ?3, probability = ?4, company_id = ?5,
             expected_close_date = ?6, description = ?7, updated_at = ?8
         WHERE id = ?9 AND user_id = ?10",
        params![
            input.title,
            input.value,
            input.currency,
            input.probability,
            input.company_id,
            input.expected_close_date,
            input.description,
            now(),
            id,
            user_id,
        ],
    )?;

    if from_stage != stage.id {
        // Changing the stage from the form appends the deal to the new column.
        let end = column_ids(&tx, user_id, &stage.id, Some(id))?.len() as i64;
        place_deal(
            &tx,
            user_id,
            &MoveDealRequest {
                deal_id: id.to_string(),
                stage_id: stage.id.clone(),
                position: end,
            },
        )?;
    }
    tx.commit()?;

    fetch_deal(&conn, user_id, id)
}

pub async fn delete_deal(conn: AsyncDbConnection, user_id: &str, id: &str) -> DbResult<()> {
    let mut conn = conn.lock().await?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let stage_id = current_stage_id(&tx, user_id, id)?;
    tx.execute(
        "DELETE FROM deals WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    renumber_column(&tx, user_id, &stage_id)?;
    tx.commit()?;
    Ok(())
}

/// Persists a drag and drop: stage change plus position, both columns renumbered.
pub async fn move_deal(
    conn: AsyncDbConnection,
    user_id: &str,
    request: &MoveDealRequest,
) -> DbResult<DealWithDetails> {
    let mut conn = conn.lock().await?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    place_deal(&tx, user_id, request)?;
    tx.commit()?;

    tracing::debug!(
        "Moved deal {} to stage {} at position {}",
        request.deal_id,
        request.stage_id,
        request.position
    );
    fetch_deal(&conn, user_id, &request.deal_id)
}

/// Applies a batch of placements in one transaction, top of each column first.
pub async fn reorder_deals(
    conn: AsyncDbConnection,
    user_id: &str,
    updates: &[MoveDealRequest],
) -> DbResult<()> {
    let mut ordered: Vec<&MoveDealRequest> = updates.iter().collect();
    ordered.sort_by(|a, b| (&a.stage_id, a.position).cmp(&(&b.stage_id, b.position)));

    let mut conn = conn.lock().await?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for request in ordered {
        place_deal(&tx, user_id, request)?;
    }
    tx.commit()?;
    Ok(())
}

pub async fn list_deal_contacts(
    conn: AsyncDbConnection,
    user_id: &str,
    deal_id: &str,
) -> DbResult<Vec<DealContact>> {
    let conn = conn.lock().await?;
    current_stage_id(&conn, user_id, deal_id)?;

    let mut stmt = conn.prepare(
        "SELECT dc.deal_id, dc.role, c.id, c.first_name, c.last_name, c.email
         FROM deal_contacts dc
         JOIN contacts c ON c.id = dc.contact_id
         WHERE dc.deal_id = ?1 AND dc.user_id = ?2
         ORDER BY c.last_name COLLATE NOCASE, c.first_name COLLATE NOCASE",
    )?;
    let contacts = stmt
        .query_map(params![deal_id, user_id], |row| {
            let contact = ContactRef {
                id: row.get(2)?,
                first_name: row.get(3)?,
                last_name: row.get(4)?,
            };
            Ok(DealContact {
                deal_id: row.get(0)?,
                contact_id: contact.id.clone(),
                role: row.get(1)?,
                contact,
                email: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(contacts)
}

/// Links a contact to a deal; linking again replaces the role.
pub async fn add_deal_contact(
    conn: AsyncDbConnection,
    user_id: &str,
    deal_id: &str,
    input: &DealContactInput,
) -> DbResult<()> {
    let conn = conn.lock().await?;
    current_stage_id(&conn, user_id, deal_id)?;
    ensure_owned(
        &conn,
        "contacts",
        Some(input.contact_id.as_str()),
        user_id,
        "contact_id",
        "Contact not found",
    )?;

    conn.execute(
        "INSERT INTO deal_contacts (deal_id, contact_id, user_id, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (deal_id, contact_id) DO UPDATE SET role = excluded.role",
        params![deal_id, input.contact_id, user_id, input.role, now()],
    )?;
    Ok(())
}

pub async fn remove_deal_contact(
    conn: AsyncDbConnection,
    user_id: &str,
    deal_id: &str,
    contact_id: &str,
) -> DbResult<()> {
    let conn = conn.lock().await?;
    let deleted = conn.execute(
        "DELETE FROM deal_contacts WHERE deal_id = ?1 AND contact_id = ?2 AND user_id = ?3",
        params![deal_id, contact_id, user_id],
    )?;
    if deleted == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::contacts::insert_contact;
    use crate::database::stages::list_stages;
    use crate::database::test_support::test_db;
    use shared_types::{ContactInput, ContactStatus};

    fn deal(title: &str, stage_id: &str) -> DealInput {
        DealInput {
            title: title.to_string(),
            value: Some(1000.0),
            currency: "USD".to_string(),
            stage_id: stage_id.to_string(),
            company_id: None,
            expected_close_date: None,
            probability: None,
            description: None,
        }
    }

    async fn stages(conn: &AsyncDbConnection, user: &str) -> Vec<DealStage> {
        list_stages(conn.clone(), user).await.unwrap()
    }

    async fn titles(conn: &AsyncDbConnection, user: &str, stage_id: &str) -> Vec<(String, i64)> {
        let board = get_board(conn.clone(), user).await.unwrap();
        board
            .column(stage_id)
            .unwrap()
            .deals
            .iter()
            .map(|d| (d.deal.title.clone(), d.deal.position))
            .collect()
    }

    #[tokio::test]
    async fn test_new_deals_append_to_their_column() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let stages = stages(&conn, "alice").await;

        for title in ["A", "B", "C"] {
            insert_deal(conn.clone(), "alice", &deal(title, &stages[0].id)).await.unwrap();
        }
        assert_eq!(
            titles(&conn, "alice", &stages[0].id).await,
            vec![("A".to_string(), 0), ("B".to_string(), 1), ("C".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_foreign_stage_is_a_reference_error() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let bobs = stages(&conn, "bob").await;
        stages(&conn, "alice").await;

        let result = insert_deal(conn.clone(), "alice", &deal("Sneaky", &bobs[0].id)).await;
        assert!(matches!(
            result,
            Err(DbError::InvalidReference { ref field, .. }) if field == "stage_id"
        ));
        let listed = list_deals(conn, "alice", &DealListQuery::default()).await.unwrap();
        assert_eq!(listed.total_count, 0);
    }

    #[tokio::test]
    async fn test_move_across_columns_renumbers_both() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let stages = stages(&conn, "alice").await;
        let (a, b) = (&stages[0].id, &stages[1].id);

        let mut ids = Vec::new();
        for title in ["A1", "A2", "A3"] {
            ids.push(insert_deal(conn.clone(), "alice", &deal(title, a)).await.unwrap().deal.id);
        }
        insert_deal(conn.clone(), "alice", &deal("B1", b)).await.unwrap();

        let moved = move_deal(
            conn.clone(),
            "alice",
            &MoveDealRequest {
                deal_id: ids[0].clone(),
                stage_id: b.clone(),
                position: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.deal.stage_id, *b);
        assert_eq!(moved.deal.position, 0);
        assert_eq!(moved.stage.id, *b);

        assert_eq!(
            titles(&conn, "alice", a).await,
            vec![("A2".to_string(), 0), ("A3".to_string(), 1)]
        );
        assert_eq!(
            titles(&conn, "alice", b).await,
            vec![("A1".to_string(), 0), ("B1".to_string(), 1)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_moves_all_land() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let loads: Vec<_> = (0..8)
            .map(|i| {
                let conn = conn.clone();
                tokio::spawn(async move { list_stages(conn, &format!("user-{i}")).await })
            })
            .collect();
        for load in loads {
            assert_eq!(load.await.unwrap().unwrap().len(), 6);
        }
        let stages = stages(&conn, "alice").await;

        let mut ids = Vec::new();
        for i in 0..8 {
            let created = insert_deal(conn.clone(), "alice", &deal(&format!("D{i}"), &stages[0].id))
                .await
                .unwrap();
            ids.push(created.deal.id);
        }

        for round in 0..10usize {
            let mut handles = Vec::new();
            for (i, id) in ids.iter().enumerate() {
                let conn = conn.clone();
                let request = MoveDealRequest {
                    deal_id: id.clone(),
                    stage_id: stages[(i + round) % 3].id.clone(),
                    position: (i % 3) as i64,
                };
                handles.push(tokio::spawn(async move {
                    move_deal(conn, "alice", &request).await
                }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }
        }

        let board = get_board(conn, "alice").await.unwrap();
        let mut total = 0;
        for column in &board.columns {
            let positions: Vec<i64> = column.deals.iter().map(|d| d.deal.position).collect();
            assert_eq!(positions, (0..column.deals.len() as i64).collect::<Vec<_>>());
            total += column.deals.len();
        }
        assert_eq!(total, ids.len());
    }

    #[tokio::test]
    async fn test_move_within_column_and_clamp() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let stages = stages(&conn, "alice").await;
        let a = &stages[0].id;

        let mut ids = Vec::new();
        for title in ["A1", "A2", "A3"] {
            ids.push(insert_deal(conn.clone(), "alice", &deal(title, a)).await.unwrap().deal.id);
        }

        move_deal(
            conn.clone(),
            "alice",
            &MoveDealRequest {
                deal_id: ids[0].clone(),
                stage_id: a.clone(),
                position: 99,
            },
        )
        .await
        .unwrap();
        assert_eq!(
            titles(&conn, "alice", a).await,
            vec![("A2".to_string(), 0), ("A3".to_string(), 1), ("A1".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_move_stamps_outcome() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let stages = stages(&conn, "alice").await;
        let won = stages.iter().find(|s| s.is_won).unwrap();
        let lost = stages.iter().find(|s| s.is_lost).unwrap();

        let created = insert_deal(conn.clone(), "alice", &deal("Big", &stages[0].id))
            .await
            .unwrap();
        assert!(created.deal.won_at.is_none());

        let moved = move_deal(
            conn.clone(),
            "alice",
            &MoveDealRequest {
                deal_id: created.deal.id.clone(),
                stage_id: won.id.clone(),
                position: 0,
            },
        )
        .await
        .unwrap();
        assert!(moved.deal.won_at.is_some());
        assert!(moved.deal.lost_at.is_none());

        let moved = move_deal(
            conn,
            "alice",
            &MoveDealRequest {
                deal_id: created.deal.id,
                stage_id: lost.id.clone(),
                position: 0,
            },
        )
        .await
        .unwrap();
        assert!(moved.deal.won_at.is_none());
        assert!(moved.deal.lost_at.is_some());
    }

    #[tokio::test]
    async fn test_move_of_foreign_deal_is_not_found() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let bobs = stages(&conn, "bob").await;
        let bob_deal = insert_deal(conn.clone(), "bob", &deal("Bob's", &bobs[0].id))
            .await
            .unwrap();
        let alices = stages(&conn, "alice").await;

        let result = move_deal(
            conn,
            "alice",
            &MoveDealRequest {
                deal_id: bob_deal.deal.id,
                stage_id: alices[1].id.clone(),
                position: 0,
            },
        )
        .await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn test_reorder_batch() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let stages = stages(&conn, "alice").await;
        let (a, b) = (&stages[0].id, &stages[1].id);

        let d1 = insert_deal(conn.clone(), "alice", &deal("D1", a)).await.unwrap().deal.id;
        let d2 = insert_deal(conn.clone(), "alice", &deal("D2", a)).await.unwrap().deal.id;

        reorder_deals(
            conn.clone(),
            "alice",
            &[
                MoveDealRequest {
                    deal_id: d1,
                    stage_id: b.clone(),
                    position: 0,
                },
                MoveDealRequest {
                    deal_id: d2,
                    stage_id: b.clone(),
                    position: 1,
                },
            ],
        )
        .await
        .unwrap();

        assert!(titles(&conn, "alice", a).await.is_empty());
        assert_eq!(
            titles(&conn, "alice", b).await,
            vec![("D1".to_string(), 0), ("D2".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_update_changing_stage_appends_and_delete_closes_gap() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let stages = stages(&conn, "alice").await;
        let (a, b) = (&stages[0].id, &stages[1].id);

        let first = insert_deal(conn.clone(), "alice", &deal("A1", a)).await.unwrap();
        insert_deal(conn.clone(), "alice", &deal("A2", a)).await.unwrap();
        insert_deal(conn.clone(), "alice", &deal("B1", b)).await.unwrap();

        let updated = update_deal(conn.clone(), "alice", &first.deal.id, &deal("A1 renamed", b))
            .await
            .unwrap();
        assert_eq!(updated.deal.stage_id, *b);
        assert_eq!(updated.deal.position, 1);
        assert_eq!(titles(&conn, "alice", a).await, vec![("A2".to_string(), 0)]);

        let board = get_board(conn.clone(), "alice").await.unwrap();
        let b1 = board.column(b).unwrap().deals[0].deal.id.clone();
        delete_deal(conn.clone(), "alice", &b1).await.unwrap();
        assert_eq!(
            titles(&conn, "alice", b).await,
            vec![("A1 renamed".to_string(), 0)]
        );
    }

    #[tokio::test]
    async fn test_deal_contacts() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let stages = stages(&conn, "alice").await;
        let created = insert_deal(conn.clone(), "alice", &deal("Big", &stages[0].id))
            .await
            .unwrap();
        let contact = insert_contact(
            conn.clone(),
            "alice",
            &ContactInput {
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
                email: Some("john@example.com".to_string()),
                phone: None,
                job_title: None,
                company_id: None,
                status: ContactStatus::Active,
                source: None,
                address: None,
                city: None,
                state: None,
                country: None,
            },
        )
        .await
        .unwrap();

        let link = DealContactInput {
            contact_id: contact.contact.id.clone(),
            role: Some("Champion".to_string()),
        };
        add_deal_contact(conn.clone(), "alice", &created.deal.id, &link).await.unwrap();
        add_deal_contact(
            conn.clone(),
            "alice",
            &created.deal.id,
            &DealContactInput {
                role: Some("Buyer".to_string()),
                ..link
            },
        )
        .await
        .unwrap();

        let linked = list_deal_contacts(conn.clone(), "alice", &created.deal.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].role.as_deref(), Some("Buyer"));
        assert_eq!(linked[0].email.as_deref(), Some("john@example.com"));

        let contact_deals = list_contact_deals(conn.clone(), "alice", &contact.contact.id)
            .await
            .unwrap();
        assert_eq!(contact_deals.len(), 1);
        assert_eq!(contact_deals[0].deal.title, "Big");
        assert!(list_contact_deals(conn.clone(), "bob", &contact.contact.id)
            .await
            .unwrap()
            .is_empty());

        remove_deal_contact(conn.clone(), "alice", &created.deal.id, &contact.contact.id)
            .await
            .unwrap();
        assert!(list_deal_contacts(conn, "alice", &created.deal.id)
            .await
            .unwrap()
            .is_empty());
    }
}
