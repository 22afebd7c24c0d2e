//! Condition: a predicate over the sensor snapshot or the wall clock.

use serde::{Deserialize, Serialize};

use crate::error::{EvaluationError, ValidationError};
use crate::snapshot::SensorSnapshot;
use crate::time::{EvaluationTime, WallTime};

/// How a clause combines with the running result of every clause before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    #[default]
    And,
    Or,
}

impl LogicOperator {
    /// Fold `next` into `acc`.
    #[must_use]
    pub fn apply(self, acc: bool, next: bool) -> bool {
        match self {
            Self::And => acc && next,
            Self::Or => acc || next,
        }
    }
}

/// One entry of a rule's condition list.
///
/// `logic` is ignored on the first clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionClause {
    #[serde(default)]
    pub logic: LogicOperator,
    #[serde(flatten)]
    pub condition: Condition,
}

impl ConditionClause {
    #[must_use]
    pub fn and(condition: Condition) -> Self {
        Self {
            logic: LogicOperator::And,
            condition,
        }
    }

    #[must_use]
    pub fn or(condition: Condition) -> Self {
        Self {
            logic: LogicOperator::Or,
            condition,
        }
    }
}

/// A single testable predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Compares a sensor reading against a threshold.
    Sensor(SensorCondition),
    /// Compares the local wall clock against a time window.
    Time(TimeCondition),
}

/// Result of checking one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Pass,
    Fail,
    /// The sensor the condition reads is absent from the snapshot.
    Missing,
}

impl Check {
    #[must_use]
    pub fn passed(self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl From<bool> for Check {
    fn from(value: bool) -> Self {
        if value { Self::Pass } else { Self::Fail }
    }
}

impl Condition {
    /// Check this condition against one snapshot at one instant.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError`] when the reading is not a finite number
    /// or the operator cannot be evaluated.
    pub fn check(
        &self,
        snapshot: &SensorSnapshot,
        time: &EvaluationTime,
    ) -> Result<Check, EvaluationError> {
        match self {
            Self::Sensor(condition) => condition.check(snapshot),
            Self::Time(condition) => Ok(condition.matches(time.wall_time()).into()),
        }
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Sensor(condition) => condition.validate(),
            Self::Time(condition) => condition.validate(),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sensor(c) => write!(f, "{} {} {}", c.sensor, c.operator, c.value),
            Self::Time(c) => match (c.mode, c.end) {
                (TimeMode::Between, Some(end)) => write!(f, "time between {}..{end}", c.start),
                (mode, _) => write!(f, "time {mode} {}", c.start),
            },
        }
    }
}

/// Comparison applied between a reading and its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorOperator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    /// Offered by the builder UI but carries a single threshold, so it is
    /// rejected at validation time.
    #[serde(rename = "between")]
    Between,
}

impl std::fmt::Display for SensorOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Between => "between",
        })
    }
}

/// Threshold test on one sensor of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorCondition {
    /// Key into the sensor snapshot, e.g. `"temperature"`.
    pub sensor: String,
    pub operator: SensorOperator,
    pub value: f64,
    /// Display-only unit, e.g. `"°C"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl SensorCondition {
    #[must_use]
    pub fn new(sensor: impl Into<String>, operator: SensorOperator, value: f64) -> Self {
        Self {
            sensor: sensor.into(),
            operator,
            value,
            unit: None,
        }
    }

    fn check(&self, snapshot: &SensorSnapshot) -> Result<Check, EvaluationError> {
        let Some(reading) = snapshot.get(&self.sensor) else {
            return Ok(Check::Missing);
        };
        if !reading.is_finite() {
            return Err(EvaluationError::NonFiniteReading {
                sensor: self.sensor.clone(),
                value: reading,
            });
        }
        let threshold = self.value;
        let passed = match self.operator {
            SensorOperator::Gt => reading > threshold,
            SensorOperator::Lt => reading < threshold,
            SensorOperator::Ge => reading >= threshold,
            SensorOperator::Le => reading <= threshold,
            SensorOperator::Eq => (reading - threshold).abs() < f64::EPSILON,
            SensorOperator::Ne => (reading - threshold).abs() >= f64::EPSILON,
            SensorOperator::Between => {
                return Err(EvaluationError::UnsupportedOperator(self.sensor.clone()));
            }
        };
        Ok(passed.into())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.sensor.trim().is_empty() {
            return Err(ValidationError::EmptySensor);
        }
        if !self.value.is_finite() {
            return Err(ValidationError::NonFiniteThreshold(self.sensor.clone()));
        }
        if self.operator == SensorOperator::Between {
            return Err(ValidationError::UnsupportedOperator(self.sensor.clone()));
        }
        Ok(())
    }
}

/// How a time condition compares the wall clock against its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Matches during the exact minute `start`.
    At,
    /// Matches in `[start, end)`, wrapping past midnight when `start > end`.
    Between,
    /// Matches strictly before `start`.
    Before,
    /// Matches strictly after `start`.
    After,
}

impl std::fmt::Display for TimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::At => "at",
            Self::Between => "between",
            Self::Before => "before",
            Self::After => "after",
        })
    }
}

/// Time-of-day test on the local wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCondition {
    pub mode: TimeMode,
    pub start: WallTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<WallTime>,
}

impl TimeCondition {
    #[must_use]
    pub fn at(time: WallTime) -> Self {
        Self {
            mode: TimeMode::At,
            start: time,
            end: None,
        }
    }

    #[must_use]
    pub fn before(time: WallTime) -> Self {
        Self {
            mode: TimeMode::Before,
            start: time,
            end: None,
        }
    }

    #[must_use]
    pub fn after(time: WallTime) -> Self {
        Self {
            mode: TimeMode::After,
            start: time,
            end: None,
        }
    }

    #[must_use]
    pub fn between(start: WallTime, end: WallTime) -> Self {
        Self {
            mode: TimeMode::Between,
            start,
            end: Some(end),
        }
    }

    /// Whether `now` falls inside this window.
    ///
    /// A `between` window without an end never matches; validation rejects
    /// such conditions before they are stored.
    #[must_use]
    pub fn matches(&self, now: WallTime) -> bool {
        match self.mode {
            TimeMode::At => now == self.start,
            TimeMode::Before => now < self.start,
            TimeMode::After => now > self.start,
            TimeMode::Between => match self.end {
                Some(end) if self.start <= end => self.start <= now && now < end,
                Some(end) => now >= self.start || now < end,
                None => false,
            },
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.mode == TimeMode::Between && self.end.is_none() {
            return Err(ValidationError::MissingEndTime);
        }
        Ok(())
    }
}
