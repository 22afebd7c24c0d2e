//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`GrowHubError`]
//! via `#[from]` / `From` impls. No `String`-only catch-all variants.

/// Top-level error shared by ports, services and adapters.
#[derive(Debug, thiserror::Error)]
pub enum GrowHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("device channel error")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("sensor source error")]
    Sensor(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A rule (or one of its parts) violates a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("a rule needs at least one action")]
    NoActions,

    #[error("a rule needs either conditions or a schedule")]
    MissingTrigger,

    #[error("a rule cannot have both conditions and a schedule")]
    ConflictingTrigger,

    #[error("else actions require conditions")]
    ElseWithoutConditions,

    #[error("priority {0} is out of range 0..=100")]
    PriorityOutOfRange(u8),

    #[error("cooldown of {0}s exceeds the maximum of one week")]
    CooldownOutOfRange(u32),

    #[error("PWM value {value} for device {device:?} is out of range 0..=100")]
    PwmOutOfRange { device: String, value: u8 },

    #[error("device name must not be empty")]
    EmptyDevice,

    #[error("sensor name must not be empty")]
    EmptySensor,

    #[error("threshold for sensor {0:?} is not a finite number")]
    NonFiniteThreshold(String),

    #[error("operator `between` on sensor {0:?} is not supported")]
    UnsupportedOperator(String),

    #[error("time window `between` requires an end time")]
    MissingEndTime,

    #[error("weekly schedule needs at least one day")]
    EmptyWeekdays,

    #[error("invalid wall-clock time {0:?}, expected HH:MM")]
    InvalidWallTime(String),

    #[error("invalid identifier {0:?}")]
    InvalidId(String),
}

/// A requested record does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A rule could not be evaluated against a snapshot.
///
/// Evaluation errors are isolated per rule: the rule is recorded as errored
/// and the rest of the tick proceeds.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("reading for sensor {sensor:?} is not finite ({value})")]
    NonFiniteReading { sensor: String, value: f64 },

    #[error("operator `between` on sensor {0:?} cannot be evaluated")]
    UnsupportedOperator(String),

    #[error("rule has neither conditions nor a schedule")]
    NoTrigger,
}
