//! On-demand evaluation.

use axum::Json;
use axum::extract::State;

use growhub_app::ports::{RuleRepository, TriggerHistory};
use growhub_app::rule_engine::{TickReport, TickRunner};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/ticks`: evaluate all enabled rules now.
///
/// Answers `409 Conflict` while the scheduler's tick is still running.
pub async fn run<R, H, E>(
    State(state): State<AppState<R, H, E>>,
) -> Result<Json<TickReport>, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let report = state.engine.run_tick().await?;
    Ok(Json(report))
}
