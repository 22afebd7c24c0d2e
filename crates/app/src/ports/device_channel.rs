//! Device channel port: delivery of resolved commands to actuators.

use std::future::Future;
use std::sync::Arc;

use growhub_domain::command::DeviceCommand;
use growhub_domain::error::GrowHubError;

/// Sends commands to actuators.
///
/// Delivery is at-least-once: implementations must treat a repeated
/// command as a no-op, and retries happen in the transport, not in the core.
pub trait DeviceChannel {
    /// Publish one command and wait for its acknowledgement.
    fn publish(
        &self,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send;
}

impl<T: DeviceChannel + Send + Sync> DeviceChannel for Arc<T> {
    fn publish(
        &self,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        (**self).publish(command)
    }
}
