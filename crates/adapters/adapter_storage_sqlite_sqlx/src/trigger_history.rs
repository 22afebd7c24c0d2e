//! `SQLite` implementation of [`TriggerHistory`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use growhub_app::ports::TriggerHistory;
use growhub_domain::error::GrowHubError;
use growhub_domain::id::{RuleId, TriggerEventId};
use growhub_domain::rule::Branch;
use growhub_domain::trigger_event::{TriggerEvent, TriggerOutcome};

use crate::error::StorageError;
use crate::rule_repo::{decode_timestamp, encode_timestamp};

struct Wrapper(TriggerEvent);

fn branch_name(branch: Branch) -> &'static str {
    match branch {
        Branch::Then => "then",
        Branch::Else => "else",
    }
}

fn parse_branch(raw: &str) -> Result<Branch, sqlx::Error> {
    match raw {
        "then" => Ok(Branch::Then),
        "else" => Ok(Branch::Else),
        other => Err(sqlx::Error::Decode(
            format!("unknown branch {other:?}").into(),
        )),
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let rule_id: uuid::Uuid = row.try_get("rule_id")?;
        let timestamp: String = row.try_get("timestamp")?;
        let branch: Option<String> = row.try_get("branch")?;
        let actions: String = row.try_get("actions")?;
        let outcome: String = row.try_get("outcome")?;

        Ok(Self(TriggerEvent {
            id: TriggerEventId::from_uuid(id),
            rule_id: RuleId::from_uuid(rule_id),
            rule_name: row.try_get("rule_name")?,
            timestamp: decode_timestamp(&timestamp)?,
            branch: branch.as_deref().map(parse_branch).transpose()?,
            actions: serde_json::from_str(&actions)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            outcome: TriggerOutcome::from_str(&outcome)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            detail: row.try_get("detail")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO trigger_events (id, rule_id, rule_name, timestamp, branch, actions, outcome, detail)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

// Events of one tick share a timestamp; `seq` keeps their insertion order.
const SELECT_RECENT: &str =
    "SELECT * FROM trigger_events ORDER BY timestamp DESC, seq DESC LIMIT ?";
const SELECT_BY_RULE: &str =
    "SELECT * FROM trigger_events WHERE rule_id = ? ORDER BY timestamp DESC, seq DESC LIMIT ?";

/// `SQLite`-backed trigger history.
pub struct SqliteTriggerHistory {
    pool: SqlitePool,
}

impl SqliteTriggerHistory {
    /// Create a new history store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TriggerHistory for SqliteTriggerHistory {
    async fn append(&self, event: TriggerEvent) -> Result<(), GrowHubError> {
        let actions = serde_json::to_string(&event.actions).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(event.id.as_uuid())
            .bind(event.rule_id.as_uuid())
            .bind(&event.rule_name)
            .bind(encode_timestamp(event.timestamp))
            .bind(event.branch.map(branch_name))
            .bind(&actions)
            .bind(event.outcome.as_str())
            .bind(&event.detail)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TriggerEvent>, GrowHubError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_rule(
        &self,
        rule_id: RuleId,
        limit: usize,
    ) -> Result<Vec<TriggerEvent>, GrowHubError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_RULE)
            .bind(rule_id.as_uuid())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use chrono::{Duration, TimeZone, Utc};
    use growhub_domain::rule::{Action, Condition, Rule, SensorCondition, SensorOperator};
    use growhub_domain::time::Timestamp;

    async fn setup() -> SqliteTriggerHistory {
        let db = Config::new("sqlite::memory:").build().await.unwrap();
        SqliteTriggerHistory::new(db.pool().clone())
    }

    fn rule(name: &str) -> Rule {
        Rule::builder()
            .name(name)
            .condition(Condition::Sensor(SensorCondition::new(
                "temp",
                SensorOperator::Gt,
                28.0,
            )))
            .action(Action::on("fan"))
            .build()
            .unwrap()
    }

    fn noon() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()
    }

    fn fired(rule: &Rule, at: Timestamp) -> TriggerEvent {
        TriggerEvent::new(
            rule,
            Some(Branch::Then),
            rule.actions.clone(),
            TriggerOutcome::Fired,
            at,
        )
    }

    #[tokio::test]
    async fn should_append_and_read_back_event() {
        let history = setup().await;
        let rule = rule("Exhaust");
        let event = fired(&rule, noon()).with_detail("fan ON acknowledged");

        history.append(event.clone()).await.unwrap();

        let recent = history.recent(10).await.unwrap();
        assert_eq!(recent, vec![event]);
    }

    #[tokio::test]
    async fn should_store_errored_event_without_branch() {
        let history = setup().await;
        let rule = rule("Broken");
        let event = TriggerEvent::new(&rule, None, Vec::new(), TriggerOutcome::Errored, noon())
            .with_detail("reading for sensor \"temp\" is not finite (NaN)");

        history.append(event.clone()).await.unwrap();

        let stored = history.recent(1).await.unwrap();
        assert_eq!(stored[0].branch, None);
        assert_eq!(stored[0].outcome, TriggerOutcome::Errored);
        assert_eq!(stored[0].detail, event.detail);
    }

    #[tokio::test]
    async fn should_return_newest_events_first_up_to_limit() {
        let history = setup().await;
        let rule = rule("Exhaust");
        for minutes in 0..5 {
            history
                .append(fired(&rule, noon() + Duration::minutes(minutes)))
                .await
                .unwrap();
        }

        let recent = history.recent(3).await.unwrap();
        let stamps: Vec<Timestamp> = recent.iter().map(|e| e.timestamp).collect();
        assert_eq!(
            stamps,
            vec![
                noon() + Duration::minutes(4),
                noon() + Duration::minutes(3),
                noon() + Duration::minutes(2),
            ]
        );
    }

    #[tokio::test]
    async fn should_order_same_tick_events_by_insertion() {
        let history = setup().await;
        let winner = rule("Winner");
        let loser = rule("Loser");
        let overridden = TriggerEvent::new(
            &loser,
            Some(Branch::Then),
            vec![Action::off("fan")],
            TriggerOutcome::Overridden,
            noon(),
        );

        history.append(fired(&winner, noon())).await.unwrap();
        history.append(overridden).await.unwrap();

        let outcomes: Vec<TriggerOutcome> = history
            .recent(10)
            .await
            .unwrap()
            .iter()
            .map(|e| e.outcome)
            .collect();
        assert_eq!(
            outcomes,
            vec![TriggerOutcome::Overridden, TriggerOutcome::Fired]
        );
    }

    #[tokio::test]
    async fn should_filter_events_by_rule() {
        let history = setup().await;
        let exhaust = rule("Exhaust");
        let heater = rule("Heater");
        history.append(fired(&exhaust, noon())).await.unwrap();
        history
            .append(fired(&heater, noon() + Duration::minutes(1)))
            .await
            .unwrap();
        history
            .append(fired(&exhaust, noon() + Duration::minutes(2)))
            .await
            .unwrap();

        let events = history.find_by_rule(exhaust.id, 10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.rule_id == exhaust.id));
        assert!(events[0].timestamp > events[1].timestamp);
    }

    #[tokio::test]
    async fn should_return_empty_history_for_unknown_rule() {
        let history = setup().await;
        assert!(history.find_by_rule(RuleId::new(), 10).await.unwrap().is_empty());
    }
}
