//! Schedule: a wall-clock trigger used instead of conditions.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::{EvaluationTime, Timestamp, WallTime};

/// When a schedule-driven rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Every day at `at`.
    Daily { at: WallTime },
    /// On the listed weekdays at `at`.
    Weekly { days: Vec<Weekday>, at: WallTime },
}

impl Schedule {
    /// Whether the schedule is due at `time`.
    ///
    /// A schedule fires at most once per scheduled minute: if the rule
    /// already fired during the current local minute it is not due again.
    #[must_use]
    pub fn is_due(&self, time: &EvaluationTime, last_triggered: Option<Timestamp>) -> bool {
        let on_time = match self {
            Self::Daily { at } => time.wall_time() == *at,
            Self::Weekly { days, at } => {
                time.wall_time() == *at && days.contains(&time.weekday())
            }
        };
        on_time && !last_triggered.is_some_and(|ts| time.same_local_minute(ts))
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyWeekdays`] for a weekly schedule without days.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Weekly { days, .. } if days.is_empty() => Err(ValidationError::EmptyWeekdays),
            Self::Daily { .. } | Self::Weekly { .. } => Ok(()),
        }
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily { at } => write!(f, "daily @ {at}"),
            Self::Weekly { days, at } => {
                let days: Vec<String> = days.iter().map(ToString::to_string).collect();
                write!(f, "{} @ {at}", days.join(","))
            }
        }
    }
}
