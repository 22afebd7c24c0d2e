//! Trigger history port: append-only audit log of rule firings.

use std::future::Future;
use std::sync::Arc;

use growhub_domain::error::GrowHubError;
use growhub_domain::id::RuleId;
use growhub_domain::trigger_event::TriggerEvent;

/// Append-only store of [`TriggerEvent`]s, ordered by timestamp.
pub trait TriggerHistory {
    /// Append one event.
    fn append(&self, event: TriggerEvent) -> impl Future<Output = Result<(), GrowHubError>> + Send;

    /// Get the most recent events, newest first.
    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<TriggerEvent>, GrowHubError>> + Send;

    /// Get the most recent events of one rule, newest first.
    fn find_by_rule(
        &self,
        rule_id: RuleId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<TriggerEvent>, GrowHubError>> + Send;
}

impl<T: TriggerHistory + Send + Sync> TriggerHistory for Arc<T> {
    fn append(&self, event: TriggerEvent) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        (**self).append(event)
    }

    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<TriggerEvent>, GrowHubError>> + Send {
        (**self).recent(limit)
    }

    fn find_by_rule(
        &self,
        rule_id: RuleId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<TriggerEvent>, GrowHubError>> + Send {
        (**self).find_by_rule(rule_id, limit)
    }
}
