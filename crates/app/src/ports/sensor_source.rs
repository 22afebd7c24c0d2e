//! Sensor source port: where tick snapshots come from.

use std::future::Future;
use std::sync::Arc;

use growhub_domain::error::GrowHubError;
use growhub_domain::snapshot::SensorSnapshot;

/// Provides the latest sensor readings as one immutable snapshot.
pub trait SensorSource {
    /// Capture a snapshot. Called once at the start of every tick.
    fn snapshot(&self) -> impl Future<Output = Result<SensorSnapshot, GrowHubError>> + Send;
}

impl<T: SensorSource + Send + Sync> SensorSource for Arc<T> {
    fn snapshot(&self) -> impl Future<Output = Result<SensorSnapshot, GrowHubError>> + Send {
        (**self).snapshot()
    }
}
