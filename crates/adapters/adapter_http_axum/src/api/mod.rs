//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod history;
#[allow(clippy::missing_errors_doc)]
pub mod rules;
#[allow(clippy::missing_errors_doc)]
pub mod sensors;
#[allow(clippy::missing_errors_doc)]
pub mod ticks;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, post};

use growhub_app::ports::{RuleRepository, TriggerHistory};
use growhub_app::rule_engine::TickRunner;
use growhub_domain::error::{GrowHubError, ValidationError};
use growhub_domain::id::RuleId;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<R, H, E>() -> Router<AppState<R, H, E>>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    Router::new()
        // Rules
        .route(
            "/rules",
            get(rules::list::<R, H, E>).post(rules::create::<R, H, E>),
        )
        .route(
            "/rules/{id}",
            get(rules::get::<R, H, E>)
                .put(rules::update::<R, H, E>)
                .delete(rules::delete::<R, H, E>),
        )
        .route("/rules/{id}/enable", post(rules::enable::<R, H, E>))
        .route("/rules/{id}/disable", post(rules::disable::<R, H, E>))
        .route("/rules/{id}/history", get(history::by_rule::<R, H, E>))
        // History
        .route("/history", get(history::recent::<R, H, E>))
        // Engine
        .route("/ticks", post(ticks::run::<R, H, E>))
        .route("/sensors", get(sensors::snapshot::<R, H, E>))
}

/// Parse a rule id from a path segment.
pub(crate) fn parse_rule_id(raw: &str) -> Result<RuleId, ApiError> {
    RuleId::from_str(raw)
        .map_err(|_| GrowHubError::from(ValidationError::InvalidId(raw.to_string())).into())
}
