//! Rule service: use-cases for managing rules.

use growhub_domain::error::{GrowHubError, NotFoundError};
use growhub_domain::id::RuleId;
use growhub_domain::rule::Rule;

use crate::ports::RuleRepository;

fn not_found(id: RuleId) -> GrowHubError {
    NotFoundError {
        entity: "Rule",
        id: id.to_string(),
    }
    .into()
}

/// Application service for rule CRUD operations.
///
/// Every write is validated first; an invalid rule never reaches storage.
pub struct RuleService<R> {
    repo: R,
}

impl<R: RuleRepository> RuleService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create a new rule after validating domain invariants.
    ///
    /// The stored rule gets a fresh id and empty trigger bookkeeping,
    /// whatever the caller supplied.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_name = %rule.name))]
    pub async fn create_rule(&self, rule: Rule) -> Result<Rule, GrowHubError> {
        let rule = Rule {
            id: RuleId::new(),
            last_triggered: None,
            trigger_count: 0,
            ..rule
        };
        rule.validate()?;
        let created = self.repo.create(rule).await?;
        tracing::info!(rule_id = %created.id, "rule created");
        Ok(created)
    }

    /// Look up a rule by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::NotFound`] when no rule with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, id: RuleId) -> Result<Rule, GrowHubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    /// List all rules.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rules(&self) -> Result<Vec<Rule>, GrowHubError> {
        self.repo.get_all().await
    }

    /// Get all enabled rules.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_enabled(&self) -> Result<Vec<Rule>, GrowHubError> {
        self.repo.get_enabled().await
    }

    /// Replace the editable fields of rule `id`.
    ///
    /// The id in the path wins over any id in the body. Trigger bookkeeping
    /// is kept from the stored rule.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::Validation`] if invariants fail,
    /// [`GrowHubError::NotFound`] if the rule does not exist, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, rule))]
    pub async fn update_rule(&self, id: RuleId, rule: Rule) -> Result<Rule, GrowHubError> {
        let rule = Rule { id, ..rule };
        rule.validate()?;
        let updated = self.repo.update(rule).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(rule_id = %id, "rule updated");
        Ok(updated)
    }

    /// Enable or disable rule `id` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::NotFound`] if the rule does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_rule(&self, id: RuleId, enabled: bool) -> Result<Rule, GrowHubError> {
        if !self.repo.set_enabled(id, enabled).await? {
            return Err(not_found(id));
        }
        tracing::info!(rule_id = %id, enabled, "rule toggled");
        self.get_rule(id).await
    }

    /// Delete a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::NotFound`] if the rule does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), GrowHubError> {
        if !self.repo.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(rule_id = %id, "rule deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::InMemoryRuleRepo;
    use growhub_domain::error::ValidationError;
    use growhub_domain::rule::{Action, Condition, SensorCondition, SensorOperator};

    fn exhaust_rule() -> Rule {
        Rule::builder()
            .name("Exhaust on heat")
            .priority(70)
            .condition(Condition::Sensor(SensorCondition::new(
                "temp",
                SensorOperator::Gt,
                28.0,
            )))
            .action(Action::on("fan"))
            .build()
            .unwrap()
    }

    fn service() -> RuleService<InMemoryRuleRepo> {
        RuleService::new(InMemoryRuleRepo::default())
    }

    #[tokio::test]
    async fn should_create_rule_with_fresh_id_and_bookkeeping() {
        let svc = service();
        let mut input = exhaust_rule();
        let supplied_id = input.id;
        input.trigger_count = 9;
        input.last_triggered = Some(growhub_domain::time::now());

        let created = svc.create_rule(input).await.unwrap();
        assert_ne!(created.id, supplied_id);
        assert_eq!(created.trigger_count, 0);
        assert!(created.last_triggered.is_none());
        assert_eq!(svc.get_rule(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn should_reject_invalid_rule_on_create() {
        let svc = service();
        let mut rule = exhaust_rule();
        rule.actions.clear();

        let err = svc.create_rule(rule).await.unwrap_err();
        assert!(matches!(
            err,
            GrowHubError::Validation(ValidationError::NoActions)
        ));
        assert!(svc.list_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_for_missing_rule() {
        let svc = service();
        let err = svc.get_rule(RuleId::new()).await.unwrap_err();
        assert!(matches!(err, GrowHubError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_update_rule_and_keep_bookkeeping() {
        let repo = InMemoryRuleRepo::default();
        let svc = RuleService::new(repo);
        let created = svc.create_rule(exhaust_rule()).await.unwrap();

        let mut edited = created.clone();
        edited.name = "Exhaust above 30".to_string();
        edited.trigger_count = 42;
        edited.id = RuleId::new();

        let updated = svc.update_rule(created.id, edited).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Exhaust above 30");
        assert_eq!(updated.trigger_count, 0);
    }

    #[tokio::test]
    async fn should_reject_invalid_update_without_touching_stored_rule() {
        let svc = service();
        let created = svc.create_rule(exhaust_rule()).await.unwrap();

        let mut edited = created.clone();
        edited.priority = 101;
        let err = svc.update_rule(created.id, edited).await.unwrap_err();
        assert!(matches!(
            err,
            GrowHubError::Validation(ValidationError::PriorityOutOfRange(101))
        ));
        assert_eq!(svc.get_rule(created.id).await.unwrap().priority, 70);
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_missing_rule() {
        let svc = service();
        let err = svc
            .update_rule(RuleId::new(), exhaust_rule())
            .await
            .unwrap_err();
        assert!(matches!(err, GrowHubError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_toggle_rule_enabled_flag() {
        let svc = service();
        let created = svc.create_rule(exhaust_rule()).await.unwrap();

        let disabled = svc.toggle_rule(created.id, false).await.unwrap();
        assert!(!disabled.enabled);
        assert!(svc.list_enabled().await.unwrap().is_empty());

        let enabled = svc.toggle_rule(created.id, true).await.unwrap();
        assert!(enabled.enabled);
        assert_eq!(svc.list_enabled().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_delete_rule_and_report_missing_on_second_delete() {
        let svc = service();
        let created = svc.create_rule(exhaust_rule()).await.unwrap();

        svc.delete_rule(created.id).await.unwrap();
        assert!(svc.list_rules().await.unwrap().is_empty());

        let err = svc.delete_rule(created.id).await.unwrap_err();
        assert!(matches!(err, GrowHubError::NotFound(_)));
    }
}
