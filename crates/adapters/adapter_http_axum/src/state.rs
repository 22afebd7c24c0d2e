//! Shared application state for axum handlers.

use std::sync::Arc;

use growhub_app::ports::{RuleRepository, TriggerHistory};
use growhub_app::rule_engine::TickRunner;
use growhub_app::services::rule_service::RuleService;

/// Application state shared across all axum handlers.
///
/// Generic over the rule repository, trigger history and tick runner to
/// avoid dynamic dispatch. `Clone` is implemented manually so the
/// underlying types themselves do not need to be `Clone`; only the `Arc`
/// wrappers are cloned.
pub struct AppState<R, H, E> {
    /// Rule CRUD service.
    pub rule_service: Arc<RuleService<R>>,
    /// Trigger history for audit queries.
    pub history: Arc<H>,
    /// Engine used for on-demand ticks and sensor snapshots.
    pub engine: Arc<E>,
}

impl<R, H, E> Clone for AppState<R, H, E> {
    fn clone(&self) -> Self {
        Self {
            rule_service: Arc::clone(&self.rule_service),
            history: Arc::clone(&self.history),
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<R, H, E> AppState<R, H, E>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    /// Create a new application state from owned services.
    pub fn new(rule_service: RuleService<R>, history: H, engine: E) -> Self {
        Self::from_arcs(Arc::new(rule_service), Arc::new(history), Arc::new(engine))
    }

    /// Create a new application state from pre-wrapped `Arc`s.
    ///
    /// Use this when the engine is shared with the scheduler loop.
    pub fn from_arcs(
        rule_service: Arc<RuleService<R>>,
        history: Arc<H>,
        engine: Arc<E>,
    ) -> Self {
        Self {
            rule_service,
            history,
            engine,
        }
    }
}
