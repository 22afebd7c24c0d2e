//! Current sensor readings.

use axum::Json;
use axum::extract::State;

use growhub_app::ports::{RuleRepository, TriggerHistory};
use growhub_app::rule_engine::TickRunner;
use growhub_domain::snapshot::SensorSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/sensors`: the snapshot the next tick would evaluate.
pub async fn snapshot<R, H, E>(
    State(state): State<AppState<R, H, E>>,
) -> Result<Json<SensorSnapshot>, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let snapshot = state.engine.current_snapshot().await?;
    Ok(Json(snapshot))
}
