//! `SQLite` implementation of [`RuleRepository`].
//!
//! Conditions, actions and schedules are stored as JSON columns; the
//! engine-owned bookkeeping (`last_triggered`, `trigger_count`) only changes
//! through [`RuleRepository::record_trigger`].

use chrono::SecondsFormat;
use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use growhub_app::ports::RuleRepository;
use growhub_domain::error::GrowHubError;
use growhub_domain::id::RuleId;
use growhub_domain::rule::Rule;
use growhub_domain::time::Timestamp;

use crate::error::StorageError;

struct Wrapper(Rule);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Rule> {
        value.map(|w| w.0)
    }
}

fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

fn decode_int<T: TryFrom<i64>>(raw: i64) -> Result<T, sqlx::Error>
where
    T::Error: std::error::Error + Send + Sync + 'static,
{
    T::try_from(raw).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.to_utc())
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

/// Fixed-width UTC rendering, so text ordering matches time ordering.
pub(crate) fn encode_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let conditions: String = row.try_get("conditions")?;
        let actions: String = row.try_get("actions")?;
        let else_actions: String = row.try_get("else_actions")?;
        let schedule: Option<String> = row.try_get("schedule")?;
        let last_triggered: Option<String> = row.try_get("last_triggered")?;

        Ok(Self(Rule {
            id: RuleId::from_uuid(id),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            enabled: row.try_get("enabled")?,
            priority: decode_int(row.try_get("priority")?)?,
            cooldown_seconds: decode_int(row.try_get("cooldown_seconds")?)?,
            conditions: decode_json(&conditions)?,
            actions: decode_json(&actions)?,
            else_actions: decode_json(&else_actions)?,
            schedule: schedule.as_deref().map(decode_json).transpose()?,
            last_triggered: last_triggered.as_deref().map(decode_timestamp).transpose()?,
            trigger_count: decode_int(row.try_get("trigger_count")?)?,
        }))
    }
}

/// Decode each row on its own; rows that fail are logged and left out.
fn decode_rows(rows: &[SqliteRow]) -> Vec<Rule> {
    rows.iter()
        .filter_map(|row| match Wrapper::from_row(row) {
            Ok(wrapper) => Some(wrapper.0),
            Err(err) => {
                let id: Option<uuid::Uuid> = row.try_get("id").ok();
                tracing::warn!(rule_id = ?id, error = %err, "skipping undecodable rule row");
                None
            }
        })
        .collect()
}

/// Serialized JSON columns of a rule.
struct Columns {
    conditions: String,
    actions: String,
    else_actions: String,
    schedule: Option<String>,
}

impl Columns {
    fn encode(rule: &Rule) -> Result<Self, StorageError> {
        Ok(Self {
            conditions: serde_json::to_string(&rule.conditions)?,
            actions: serde_json::to_string(&rule.actions)?,
            else_actions: serde_json::to_string(&rule.else_actions)?,
            schedule: rule
                .schedule
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        })
    }
}

const INSERT: &str = r"
    INSERT INTO rules (
        id, name, description, enabled, priority, cooldown_seconds,
        conditions, actions, else_actions, schedule, last_triggered, trigger_count
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE: &str = r"
    UPDATE rules
    SET name = ?, description = ?, enabled = ?, priority = ?, cooldown_seconds = ?,
        conditions = ?, actions = ?, else_actions = ?, schedule = ?
    WHERE id = ?
";

const SELECT_BY_ID: &str = "SELECT * FROM rules WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM rules ORDER BY priority DESC, name";
const SELECT_ENABLED: &str = "SELECT * FROM rules WHERE enabled = 1 ORDER BY priority DESC, name";
const DELETE: &str = "DELETE FROM rules WHERE id = ?";
const SET_ENABLED: &str = "UPDATE rules SET enabled = ? WHERE id = ?";
const RECORD_TRIGGER: &str =
    "UPDATE rules SET last_triggered = ?, trigger_count = trigger_count + 1 WHERE id = ?";

/// `SQLite`-backed rule repository.
pub struct SqliteRuleRepository {
    pool: SqlitePool,
}

impl SqliteRuleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RuleRepository for SqliteRuleRepository {
    async fn create(&self, rule: Rule) -> Result<Rule, GrowHubError> {
        let columns = Columns::encode(&rule)?;
        let trigger_count =
            i64::try_from(rule.trigger_count).map_err(|_| StorageError::Overflow(rule.trigger_count))?;

        sqlx::query(INSERT)
            .bind(rule.id.as_uuid())
            .bind(&rule.name)
            .bind(&rule.description)
            .bind(rule.enabled)
            .bind(i64::from(rule.priority))
            .bind(i64::from(rule.cooldown_seconds))
            .bind(&columns.conditions)
            .bind(&columns.actions)
            .bind(&columns.else_actions)
            .bind(&columns.schedule)
            .bind(rule.last_triggered.map(encode_timestamp))
            .bind(trigger_count)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rule)
    }

    async fn get_by_id(&self, id: RuleId) -> Result<Option<Rule>, GrowHubError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Rule>, GrowHubError> {
        let rows = sqlx::query(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(decode_rows(&rows))
    }

    async fn get_enabled(&self) -> Result<Vec<Rule>, GrowHubError> {
        let rows = sqlx::query(SELECT_ENABLED)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(decode_rows(&rows))
    }

    async fn update(&self, rule: Rule) -> Result<Option<Rule>, GrowHubError> {
        let columns = Columns::encode(&rule)?;

        let result = sqlx::query(UPDATE)
            .bind(&rule.name)
            .bind(&rule.description)
            .bind(rule.enabled)
            .bind(i64::from(rule.priority))
            .bind(i64::from(rule.cooldown_seconds))
            .bind(&columns.conditions)
            .bind(&columns.actions)
            .bind(&columns.else_actions)
            .bind(&columns.schedule)
            .bind(rule.id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(rule.id).await
    }

    async fn delete(&self, id: RuleId) -> Result<bool, GrowHubError> {
        let result = sqlx::query(DELETE)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_enabled(&self, id: RuleId, enabled: bool) -> Result<bool, GrowHubError> {
        let result = sqlx::query(SET_ENABLED)
            .bind(enabled)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_trigger(&self, id: RuleId, at: Timestamp) -> Result<bool, GrowHubError> {
        let result = sqlx::query(RECORD_TRIGGER)
            .bind(encode_timestamp(at))
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
