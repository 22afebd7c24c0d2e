//! Rule: IF conditions (or a schedule) THEN actions [ELSE actions].
//!
//! A [`Rule`] is driven either by an ordered list of [`ConditionClause`]s,
//! folded strictly left to right, or by a [`Schedule`]. When it matches, its
//! `actions` are proposed for execution; when a condition-driven rule does
//! not match and has `else_actions`, those are proposed instead. Priority
//! decides per-device conflicts and the cooldown bounds how often the rule
//! may fire.

mod action;
mod condition;
mod schedule;

pub use action::Action;
pub use condition::{
    Check, Condition, ConditionClause, LogicOperator, SensorCondition, SensorOperator,
    TimeCondition, TimeMode,
};
pub use schedule::Schedule;

use serde::{Deserialize, Serialize};

use crate::error::{EvaluationError, ValidationError};
use crate::id::RuleId;
use crate::snapshot::SensorSnapshot;
use crate::time::{EvaluationTime, Timestamp};

/// Highest accepted priority.
pub const MAX_PRIORITY: u8 = 100;

/// Longest accepted cooldown (one week).
pub const MAX_COOLDOWN_SECONDS: u32 = 7 * 24 * 60 * 60;

/// Which action set of a rule was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Then,
    Else,
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Then => "then",
            Self::Else => "else",
        })
    }
}

/// Outcome of evaluating one rule against one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Whether the conditions (or schedule) held.
    pub matched: bool,
    /// The branch to execute, if any.
    pub branch: Option<Branch>,
    /// Sensors referenced by the rule but absent from the snapshot.
    pub data_gaps: Vec<String>,
}

/// A named, prioritized trigger-and-action unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub enabled: bool,
    pub priority: u8,
    #[serde(default)]
    pub cooldown_seconds: u32,
    #[serde(default)]
    pub conditions: Vec<ConditionClause>,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub else_actions: Vec<Action>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub last_triggered: Option<Timestamp>,
    #[serde(default)]
    pub trigger_count: u64,
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking the rule itself
    /// before its conditions, schedule and actions.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.priority > MAX_PRIORITY {
            return Err(ValidationError::PriorityOutOfRange(self.priority));
        }
        if self.cooldown_seconds > MAX_COOLDOWN_SECONDS {
            return Err(ValidationError::CooldownOutOfRange(self.cooldown_seconds));
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions);
        }
        match (self.conditions.is_empty(), &self.schedule) {
            (true, None) => return Err(ValidationError::MissingTrigger),
            (false, Some(_)) => return Err(ValidationError::ConflictingTrigger),
            (true, Some(_)) if !self.else_actions.is_empty() => {
                return Err(ValidationError::ElseWithoutConditions);
            }
            _ => {}
        }
        for clause in &self.conditions {
            clause.condition.validate()?;
        }
        if let Some(schedule) = &self.schedule {
            schedule.validate()?;
        }
        for action in self.actions.iter().chain(&self.else_actions) {
            action.validate()?;
        }
        Ok(())
    }

    /// Evaluate the rule against one snapshot at one instant.
    ///
    /// Every clause is checked, so all data gaps are reported even when the
    /// fold result is already decided.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError`] when a reading is unusable or the rule
    /// has no trigger source.
    pub fn evaluate(
        &self,
        snapshot: &SensorSnapshot,
        time: &EvaluationTime,
    ) -> Result<Evaluation, EvaluationError> {
        let mut data_gaps = Vec::new();

        let Some((first, rest)) = self.conditions.split_first() else {
            let schedule = self.schedule.as_ref().ok_or(EvaluationError::NoTrigger)?;
            let matched = schedule.is_due(time, self.last_triggered);
            return Ok(Evaluation {
                matched,
                branch: matched.then_some(Branch::Then),
                data_gaps,
            });
        };

        let mut check = |clause: &ConditionClause| -> Result<bool, EvaluationError> {
            let result = clause.condition.check(snapshot, time)?;
            if result == Check::Missing {
                if let Condition::Sensor(sensor) = &clause.condition {
                    data_gaps.push(sensor.sensor.clone());
                }
            }
            Ok(result.passed())
        };

        let mut matched = check(first)?;
        for clause in rest {
            let next = check(clause)?;
            matched = clause.logic.apply(matched, next);
        }

        let branch = if matched {
            Some(Branch::Then)
        } else if self.else_actions.is_empty() {
            None
        } else {
            Some(Branch::Else)
        };

        Ok(Evaluation {
            matched,
            branch,
            data_gaps,
        })
    }

    /// Whether the cooldown window has elapsed at `now`.
    #[must_use]
    pub fn cooldown_allows(&self, now: Timestamp) -> bool {
        match self.last_triggered {
            None => true,
            Some(last) => {
                let elapsed = now.signed_duration_since(last).num_seconds();
                elapsed >= i64::from(self.cooldown_seconds)
            }
        }
    }

    /// The actions of the given branch.
    #[must_use]
    pub fn branch_actions(&self, branch: Branch) -> &[Action] {
        match branch {
            Branch::Then => &self.actions,
            Branch::Else => &self.else_actions,
        }
    }

    /// Record a firing at `at`.
    pub fn record_trigger(&mut self, at: Timestamp) {
        self.last_triggered = Some(at);
        self.trigger_count = self.trigger_count.saturating_add(1);
    }
}

/// Step-by-step builder for [`Rule`].
#[derive(Debug, Default)]
pub struct RuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    description: Option<String>,
    enabled: Option<bool>,
    priority: Option<u8>,
    cooldown_seconds: u32,
    conditions: Vec<ConditionClause>,
    actions: Vec<Action>,
    else_actions: Vec<Action>,
    schedule: Option<Schedule>,
    last_triggered: Option<Timestamp>,
    trigger_count: u64,
}

impl RuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn cooldown_seconds(mut self, seconds: u32) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    /// Append a condition combined with `AND`.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(ConditionClause::and(condition));
        self
    }

    /// Append a condition combined with `OR`.
    #[must_use]
    pub fn or_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(ConditionClause::or(condition));
        self
    }

    #[must_use]
    pub fn clause(mut self, clause: ConditionClause) -> Self {
        self.conditions.push(clause);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn else_action(mut self, action: Action) -> Self {
        self.else_actions.push(action);
        self
    }

    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    #[must_use]
    pub fn last_triggered(mut self, ts: Timestamp) -> Self {
        self.last_triggered = Some(ts);
        self
    }

    #[must_use]
    pub fn trigger_count(mut self, count: u64) -> Self {
        self.trigger_count = count;
        self
    }

    /// Consume the builder, validate, and return a [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the assembled rule violates an invariant.
    pub fn build(self) -> Result<Rule, ValidationError> {
        let rule = Rule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            priority: self.priority.unwrap_or(50),
            cooldown_seconds: self.cooldown_seconds,
            conditions: self.conditions,
            actions: self.actions,
            else_actions: self.else_actions,
            schedule: self.schedule,
            last_triggered: self.last_triggered,
            trigger_count: self.trigger_count,
        };
        rule.validate()?;
        Ok(rule)
    }
}
