//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use growhub_app::ports::{RuleRepository, TriggerHistory};
use growhub_app::rule_engine::TickRunner;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api` and exposes `/health`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<R, H, E>(state: AppState<R, H, E>) -> Router
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
