//! Trigger events: the audit trail of every rule that matched in a tick.
//!
//! One event is written for each fired, suppressed, overridden or errored
//! attempt, so the history explains not only what ran but also what did not.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::{RuleId, TriggerEventId};
use crate::rule::{Action, Branch, Rule};
use crate::time::Timestamp;

/// What happened to a matched rule's attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// Every winning command was acknowledged by the device channel.
    Fired,
    /// Commands were dispatched but at least one was rejected.
    DispatchFailed,
    /// The rule matched inside its cooldown window.
    SuppressedCooldown,
    /// A higher-priority rule won the device.
    Overridden,
    /// The rule could not be evaluated.
    Errored,
    /// No acknowledgement arrived before the dispatch deadline.
    Unknown,
}

impl TriggerOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fired => "fired",
            Self::DispatchFailed => "dispatch_failed",
            Self::SuppressedCooldown => "suppressed_cooldown",
            Self::Overridden => "overridden",
            Self::Errored => "errored",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TriggerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown outcome name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trigger outcome {0:?}")]
pub struct ParseOutcomeError(String);

impl FromStr for TriggerOutcome {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fired" => Ok(Self::Fired),
            "dispatch_failed" => Ok(Self::DispatchFailed),
            "suppressed_cooldown" => Ok(Self::SuppressedCooldown),
            "overridden" => Ok(Self::Overridden),
            "errored" => Ok(Self::Errored),
            "unknown" => Ok(Self::Unknown),
            other => Err(ParseOutcomeError(other.to_string())),
        }
    }
}

/// One history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub id: TriggerEventId,
    pub rule_id: RuleId,
    pub rule_name: String,
    pub timestamp: Timestamp,
    /// Absent for errored evaluations, where no branch was selected.
    pub branch: Option<Branch>,
    pub actions: Vec<Action>,
    pub outcome: TriggerOutcome,
    /// Free-form context: the error message, the winning rule, …
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TriggerEvent {
    #[must_use]
    pub fn new(
        rule: &Rule,
        branch: Option<Branch>,
        actions: Vec<Action>,
        outcome: TriggerOutcome,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: TriggerEventId::new(),
            rule_id: rule.id,
            rule_name: rule.name.clone(),
            timestamp,
            branch,
            actions,
            outcome,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
