use crate::{
    error::Failure,
    executor::{Connector, Executor},
    models::{ChangeLogEntry, ClubStats, Totals},
    profile::Role,
    statement::Statement,
};
use serde::Deserialize;

pub const DEFAULT_CHANGES: u32 = 5;
pub const MAX_CHANGES: u32 = 50;

pub async fn totals<C: Connector>(db: &Executor<C>, role: Option<Role>) -> Result<Totals, Failure> {
    db.read_one(
        &Statement::new(
            "SELECT (SELECT COUNT(*) FROM club) AS clubs, (SELECT COUNT(*) FROM event) AS events",
        ),
        role,
    )
    .await?
    .ok_or_else(|| Failure::backend("totals query returned no row"))
}

/// Per-club contact details with the number of events each has held.
pub async fn club_stats<C: Connector>(
    db: &Executor<C>,
    role: Option<Role>,
) -> Result<Vec<ClubStats>, Failure> {
    db.read(
        &Statement::new(
            "SELECT c.club_name, c.club_email, c.instagram_handle, \
             COUNT(e.event_id) AS total_events \
             FROM club c LEFT JOIN event e ON c.club_name = e.club_name \
             GROUP BY c.club_name, c.club_email, c.instagram_handle",
        )
        .ordered_by("club_name"),
        role,
    )
    .await
}

/// Latest entries across the club, department and event change logs,
/// newest first. `limit` is clamped to `1..=MAX_CHANGES`.
pub async fn recent_changes<C: Connector>(
    db: &Executor<C>,
    role: Option<Role>,
    limit: Option<u32>,
) -> Result<Vec<ChangeLogEntry>, Failure> {
    let limit = limit.unwrap_or(DEFAULT_CHANGES).clamp(1, MAX_CHANGES);
    db.read(
        &Statement::new(
            "SELECT kind, old_value, new_value, change_timestamp FROM ( \
             SELECT 'club' AS kind, old_value, new_value, change_timestamp FROM club_change_log \
             UNION ALL \
             SELECT 'department', old_value, new_value, change_timestamp FROM department_change_log \
             UNION ALL \
             SELECT 'event', old_value, new_value, change_timestamp FROM event_change_log \
             ) AS changes ORDER BY change_timestamp DESC LIMIT $1",
        )
        .bind(limit as i32)
        .ordered_by("change_timestamp DESC"),
        role,
    )
    .await
}

/// Round trip to the database under the default profile.
pub async fn ping<C: Connector>(db: &Executor<C>) -> Result<String, Failure> {
    #[derive(Deserialize)]
    struct Current {
        database: String,
    }

    db.read_one::<Current>(&Statement::new("SELECT current_database() AS database"), None)
        .await?
        .map(|c| c.database)
        .ok_or_else(|| Failure::backend("no database reported"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mock::{MockConnector, Reply},
        models::ChangeKind,
        statement::Param,
    };
    use serde_json::json;

    #[tokio::test]
    async fn changes_are_bounded() {
        let mock = MockConnector::new(|_| Ok(Reply::Rows(vec![])));
        let db = mock.executor();

        recent_changes(&db, None, None).await.unwrap();
        recent_changes(&db, None, Some(0)).await.unwrap();
        recent_changes(&db, None, Some(10_000)).await.unwrap();

        let limits: Vec<_> = mock.calls().iter().map(|c| c.params[0].clone()).collect();
        assert_eq!(limits, [Param::Int(5), Param::Int(1), Param::Int(50)]);
        assert!(mock.calls()[0].sql.ends_with("ORDER BY change_timestamp DESC LIMIT $1"));
        assert_eq!(mock.calls()[0].order_by, Some("change_timestamp DESC"));
    }

    #[tokio::test]
    async fn changes_decode_newest_first() {
        let mock = MockConnector::new(|_| {
            Ok(Reply::Rows(vec![
                json!({"kind": "event", "old_value": "Hack Night", "new_value": null,
                       "change_timestamp": "2025-03-02T09:15:00"}),
                json!({"kind": "club", "old_value": "a@x.edu", "new_value": "b@x.edu",
                       "change_timestamp": "2025-03-01T18:00:00.123456"}),
            ]))
        });

        let changes = recent_changes(&mock.executor(), None, None).await.unwrap();

        assert_eq!(changes[0].kind, ChangeKind::Event);
        assert_eq!(changes[0].new_value, None);
        assert_eq!(changes[1].kind, ChangeKind::Club);
        assert!(changes[0].change_timestamp > changes[1].change_timestamp);
    }

    #[tokio::test]
    async fn totals_and_stats_decode() {
        let mock = MockConnector::new(|call| {
            if call.sql.contains("AS clubs") {
                return Ok(Reply::Rows(vec![json!({"clubs": 12, "events": 30})]));
            }
            Ok(Reply::Rows(vec![json!({
                "club_name": "Robotics",
                "club_email": "robotics@x.edu",
                "instagram_handle": "@pes_robotics",
                "total_events": 4
            })]))
        });
        let db = mock.executor();

        assert_eq!(totals(&db, None).await.unwrap(), Totals { clubs: 12, events: 30 });
        let stats = club_stats(&db, None).await.unwrap();
        assert_eq!(stats[0].total_events, 4);
        assert_eq!(mock.released(), 2);
    }

    #[tokio::test]
    async fn ping_reports_database() {
        let mock = MockConnector::new(|_| Ok(Reply::Rows(vec![json!({"database": "club_registry"})])));
        assert_eq!(ping(&mock.executor()).await.unwrap(), "club_registry");
        assert_eq!(mock.calls()[0].principal, "viewer");
    }
}
