//! Errors raised by the virtual devices.

use growhub_domain::error::GrowHubError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VirtualError {
    /// The device is not part of the virtual tent.
    #[error("unknown device {0:?}")]
    UnknownDevice(String),

    /// The device was switched into failure mode.
    #[error("device {0:?} is unreachable")]
    Unreachable(String),
}

impl From<VirtualError> for GrowHubError {
    fn from(err: VirtualError) -> Self {
        Self::Device(Box::new(err))
    }
}
