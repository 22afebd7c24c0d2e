//! JSON handlers for the trigger history.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use growhub_app::ports::{RuleRepository, TriggerHistory};
use growhub_app::rule_engine::TickRunner;
use growhub_domain::trigger_event::TriggerEvent;

use super::parse_rule_id;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

/// Query parameters for history listings.
#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

impl HistoryQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }
}

/// `GET /api/history?limit=`: most recent trigger events, newest first.
pub async fn recent<R, H, E>(
    State(state): State<AppState<R, H, E>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TriggerEvent>>, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let events = state.history.recent(query.limit()).await?;
    Ok(Json(events))
}

/// `GET /api/rules/{id}/history?limit=`: trigger events of one rule.
///
/// History outlives deleted rules, so an unknown id yields an empty list.
pub async fn by_rule<R, H, E>(
    State(state): State<AppState<R, H, E>>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TriggerEvent>>, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let events = state
        .history
        .find_by_rule(parse_rule_id(&id)?, query.limit())
        .await?;
    Ok(Json(events))
}
