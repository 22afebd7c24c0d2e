//! Rule repository port: the durable rule store.

use std::future::Future;
use std::sync::Arc;

use growhub_domain::error::GrowHubError;
use growhub_domain::id::RuleId;
use growhub_domain::rule::Rule;
use growhub_domain::time::Timestamp;

/// Repository for persisting and querying [`Rule`]s.
///
/// Every read returns whole, committed rules: a concurrent edit is either
/// fully visible or not visible at all.
pub trait RuleRepository {
    /// Create a new rule in storage.
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, GrowHubError>> + Send;

    /// Get a rule by its unique identifier.
    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, GrowHubError>> + Send;

    /// Get all rules.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, GrowHubError>> + Send;

    /// Get all enabled rules in one consistent read.
    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Rule>, GrowHubError>> + Send;

    /// Replace the user-editable fields of an existing rule.
    ///
    /// `last_triggered` and `trigger_count` belong to the engine and are left
    /// untouched. Returns the stored rule, or `None` if it does not exist.
    fn update(
        &self,
        rule: Rule,
    ) -> impl Future<Output = Result<Option<Rule>, GrowHubError>> + Send;

    /// Delete a rule. Returns `false` if it did not exist.
    fn delete(&self, id: RuleId) -> impl Future<Output = Result<bool, GrowHubError>> + Send;

    /// Enable or disable a rule. Returns `false` if it does not exist.
    fn set_enabled(
        &self,
        id: RuleId,
        enabled: bool,
    ) -> impl Future<Output = Result<bool, GrowHubError>> + Send;

    /// Atomically set `last_triggered = at` and increment `trigger_count`.
    ///
    /// Returns `false` if the rule was deleted in the meantime; a deleted
    /// rule is never recreated.
    fn record_trigger(
        &self,
        id: RuleId,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, GrowHubError>> + Send;
}

impl<T: RuleRepository + Send + Sync> RuleRepository for Arc<T> {
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, GrowHubError>> + Send {
        (**self).create(rule)
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, GrowHubError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, GrowHubError>> + Send {
        (**self).get_all()
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Rule>, GrowHubError>> + Send {
        (**self).get_enabled()
    }

    fn update(
        &self,
        rule: Rule,
    ) -> impl Future<Output = Result<Option<Rule>, GrowHubError>> + Send {
        (**self).update(rule)
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<bool, GrowHubError>> + Send {
        (**self).delete(id)
    }

    fn set_enabled(
        &self,
        id: RuleId,
        enabled: bool,
    ) -> impl Future<Output = Result<bool, GrowHubError>> + Send {
        (**self).set_enabled(id, enabled)
    }

    fn record_trigger(
        &self,
        id: RuleId,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, GrowHubError>> + Send {
        (**self).record_trigger(id, at)
    }
}
