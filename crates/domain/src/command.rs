//! Device command: the resolved instruction sent to one actuator per tick.

use serde::{Deserialize, Serialize};

/// What an actuator should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "UPPERCASE")]
pub enum Command {
    /// Close the relay.
    On,
    /// Open the relay.
    Off,
    /// Drive the output at a duty cycle, 0–100.
    Pwm { value: u8 },
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("ON"),
            Self::Off => f.write_str("OFF"),
            Self::Pwm { value } => write!(f, "PWM {value}"),
        }
    }
}

/// The single command issued to one device in one tick.
///
/// Applying the same command twice must leave the device unchanged, so
/// channels can retry freely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub device: String,
    #[serde(flatten)]
    pub command: Command,
}

impl DeviceCommand {
    #[must_use]
    pub fn new(device: impl Into<String>, command: Command) -> Self {
        Self {
            device: device.into(),
            command,
        }
    }
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.device, self.command)
    }
}
