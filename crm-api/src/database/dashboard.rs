use rusqlite::params;
use shared_types::{DashboardStats, StageSummary};

use crate::database::activities::fetch_recent;
use crate::database::stages::seed_if_empty;
use crate::database::{AsyncDbConnection, DbResult};

/// Activities shown in the dashboard feed.
pub const RECENT_ACTIVITY_LIMIT: u32 = 10;

pub async fn get_dashboard_stats(
    conn: AsyncDbConnection,
    user_id: &str,
    now: i64,
) -> DbResult<DashboardStats> {
    let conn = conn.lock().await?;

    let total_contacts: i64 = conn.query_row(
        "SELECT COUNT(*) FROM contacts WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;

    let (total_deal_value, won_deals, won_deal_value, open_deals): (f64, i64, f64, i64) = conn
        .query_row(
            "SELECT
                COALESCE(SUM(d.value), 0),
                COALESCE(SUM(CASE WHEN s.is_won THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN s.is_won THEN d.value ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN s.is_won OR s.is_lost THEN 0 ELSE 1 END), 0)
             FROM deals d
             JOIN deal_stages s ON s.id = d.stage_id
             WHERE d.user_id = ?1",
            [user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

    let overdue_activities: i64 = conn.query_row(
        "SELECT COUNT(*) FROM activities
         WHERE user_id = ?1 AND is_completed = 0 AND due_date < ?2",
        params![user_id, now],
        |row| row.get(0),
    )?;

    let recent_activities = fetch_recent(&conn, user_id, RECENT_ACTIVITY_LIMIT)?;

    Ok(DashboardStats {
        total_contacts,
        total_deal_value,
        won_deals,
        won_deal_value,
        open_deals,
        overdue_activities,
        recent_activities,
    })
}

/// Deal count and value per stage, in board order. Empty stages are included.
pub async fn get_pipeline_summary(
    conn: AsyncDbConnection,
    user_id: &str,
) -> DbResult<Vec<StageSummary>> {
    let mut conn = conn.lock().await?;
    seed_if_empty(&mut conn, user_id)?;

    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.color, s.display_order,
                COUNT(d.id), COALESCE(SUM(d.value), 0)
         FROM deal_stages s
         LEFT JOIN deals d ON d.stage_id = s.id
         WHERE s.user_id = ?1
         GROUP BY s.id
         ORDER BY s.display_order, s.rowid",
    )?;
    let stages = stmt
        .query_map([user_id], |row| {
            Ok(StageSummary {
                stage_id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                display_order: row.get(3)?,
                deal_count: row.get(4)?,
                total_value: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::activities::insert_activity;
    use crate::database::contacts::insert_contact;
    use crate::database::deals::insert_deal;
    use crate::database::stages::list_stages;
    use crate::database::test_support::test_db;
    use shared_types::{ActivityInput, ActivityType, ContactInput, ContactStatus, DealInput};

    fn deal(title: &str, value: Option<f64>, stage_id: &str) -> DealInput {
        DealInput {
            title: title.to_string(),
            value,
            currency: "USD".to_string(),
            probability: None,
            stage_id: stage_id.to_string(),
            company_id: None,
            expected_close_date: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let t = test_db();
        let stats = get_dashboard_stats(t.db.async_connection.clone(), "alice", 0)
            .await
            .unwrap();
        assert_eq!(stats.total_contacts, 0);
        assert_eq!(stats.total_deal_value, 0.0);
        assert_eq!(stats.open_deals, 0);
        assert!(stats.recent_activities.is_empty());
    }

    #[tokio::test]
    async fn test_stats_split_won_lost_and_open() {
        let t = test_db();
        let conn = t.db.async_connection.clone();
        let stages = list_stages(conn.clone(), "alice").await.unwrap();
        let (qualification, won, lost) = (&stages[0].id, &stages[4].id, &stages[5].id);

        insert_deal(conn.clone(), "alice", &deal("Open", Some(1000.0), qualification))
            .await
            .unwrap();
        insert_deal(conn.clone(), "alice", &deal("Unpriced", None, qualification))
            .await
            .unwrap();
        insert_deal(conn.clone(), "alice", &deal("Won", Some(2500.0), won))
            .await
            .unwrap();
        insert_deal(conn.clone(), "alice", &deal("Lost", Some(400.0), lost))
            .await
            .unwrap();

        insert_contact(
            conn.clone(),
            "alice",
            &ContactInput {
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
                email: None,
                phone: None,
                job_title: None,
                company_id: None,
                status: ContactStatus::Lead,
                source: None,
                address: None,
                city: None,
                state: None,
                country: None,
            },
        )
        .await
        .unwrap();

        for (title, due) in [("late", Some(50)), ("future", Some(500)), ("undated", None)] {
            insert_activity(
                conn.clone(),
                "alice",
                &ActivityInput {
                    activity_type: ActivityType::Task,
                    title: title.to_string(),
                    description: None,
                    due_date: due,
                    contact_id: None,
                    deal_id: None,
                },
            )
            .await
            .unwrap();
        }

        let stats = get_dashboard_stats(conn.clone(), "alice", 100).await.unwrap();
        assert_eq!(stats.total_contacts, 1);
        assert_eq!(stats.total_deal_value, 3900.0);
        assert_eq!(stats.won_deals, 1);
        assert_eq!(stats.won_deal_value, 2500.0);
        assert_eq!(stats.open_deals, 2);
        assert_eq!(stats.overdue_activities, 1);
        assert_eq!(stats.recent_activities.len(), 3);

        let other = get_dashboard_stats(conn.clone(), "bob", 100).await.unwrap();
        assert_eq!(other.total_deal_value, 0.0);

        let summary = get_pipeline_summary(conn, "alice").await.unwrap();
        assert_eq!(summary.len(), 6);
        assert_eq!(summary[0].deal_count, 2);
        assert_eq!(summary[0].total_value, 1000.0);
        assert_eq!(summary[1].deal_count, 0);
        assert_eq!(summary[4].total_value, 2500.0);
    }
}
