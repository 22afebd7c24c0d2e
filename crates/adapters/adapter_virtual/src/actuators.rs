//! Virtual actuators: relays and PWM outputs that remember their state.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::RwLock;

use growhub_app::ports::DeviceChannel;
use growhub_domain::command::{Command, DeviceCommand};
use growhub_domain::error::GrowHubError;

use crate::error::VirtualError;

/// Current output of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub command: Command,
    /// How many times the output actually changed.
    pub changes: u64,
}

#[derive(Debug, Default)]
struct Inner {
    states: BTreeMap<String, ActuatorState>,
    unreachable: BTreeSet<String>,
}

/// In-memory [`DeviceChannel`].
///
/// Applying the command a device already holds is acknowledged without
/// counting as a change, which makes redelivery harmless.
#[derive(Debug, Default)]
pub struct VirtualActuators {
    inner: RwLock<Inner>,
    /// When set, only these devices exist.
    known: Option<BTreeSet<String>>,
}

impl VirtualActuators {
    /// Restrict the channel to a fixed set of devices.
    pub fn with_devices<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: RwLock::default(),
            known: Some(devices.into_iter().map(Into::into).collect()),
        }
    }

    /// Last applied state of `device`, if it ever received a command.
    pub async fn state(&self, device: &str) -> Option<ActuatorState> {
        self.inner.read().await.states.get(device).copied()
    }

    /// All actuators that received a command, ordered by name.
    pub async fn states(&self) -> BTreeMap<String, ActuatorState> {
        self.inner.read().await.states.clone()
    }

    /// Make every command for `device` fail until [`Self::restore`] is called.
    pub async fn fail_device(&self, device: impl Into<String>) {
        self.inner.write().await.unreachable.insert(device.into());
    }

    pub async fn restore(&self, device: &str) {
        self.inner.write().await.unreachable.remove(device);
    }

    fn check_known(&self, device: &str) -> Result<(), VirtualError> {
        match &self.known {
            Some(known) if !known.contains(device) => {
                Err(VirtualError::UnknownDevice(device.to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl DeviceChannel for VirtualActuators {
    async fn publish(&self, command: DeviceCommand) -> Result<(), GrowHubError> {
        self.check_known(&command.device)?;
        let mut inner = self.inner.write().await;
        if inner.unreachable.contains(&command.device) {
            return Err(VirtualError::Unreachable(command.device).into());
        }

        let state = inner
            .states
            .entry(command.device.clone())
            .or_insert(ActuatorState {
                command: command.command,
                changes: 0,
            });
        if state.changes == 0 || state.command != command.command {
            state.command = command.command;
            state.changes += 1;
            tracing::info!(device = %command.device, command = %command.command, "actuator switched");
        } else {
            tracing::debug!(device = %command.device, command = %command.command, "actuator already in state");
        }
        Ok(())
    }
}
