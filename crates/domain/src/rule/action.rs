//! Action: the effect a rule asks an actuator to take.

use serde::{Deserialize, Serialize};

use crate::command::{Command, DeviceCommand};
use crate::error::ValidationError;

/// An instruction for one actuator, applied when its branch is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Actuator identifier, e.g. `"fan_exhaust"`.
    pub device: String,
    #[serde(flatten)]
    pub command: Command,
}

impl Action {
    #[must_use]
    pub fn on(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            command: Command::On,
        }
    }

    #[must_use]
    pub fn off(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            command: Command::Off,
        }
    }

    #[must_use]
    pub fn pwm(device: impl Into<String>, value: u8) -> Self {
        Self {
            device: device.into(),
            command: Command::Pwm { value },
        }
    }

    /// The device command this action expands to.
    #[must_use]
    pub fn to_command(&self) -> DeviceCommand {
        DeviceCommand::new(self.device.clone(), self.command)
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDevice`] for a blank device and
    /// [`ValidationError::PwmOutOfRange`] for a PWM duty above 100.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.device.trim().is_empty() {
            return Err(ValidationError::EmptyDevice);
        }
        match self.command {
            Command::Pwm { value } if value > 100 => Err(ValidationError::PwmOutOfRange {
                device: self.device.clone(),
                value,
            }),
            Command::On | Command::Off | Command::Pwm { .. } => Ok(()),
        }
    }
}

impl From<DeviceCommand> for Action {
    fn from(command: DeviceCommand) -> Self {
        Self {
            device: command.device,
            command: command.command,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.device, self.command)
    }
}
