//! Virtual sensors: a mutable table of readings.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use growhub_app::ports::SensorSource;
use growhub_domain::error::GrowHubError;
use growhub_domain::snapshot::SensorSnapshot;
use growhub_domain::time;

/// Sensor readings held in memory.
///
/// Every snapshot copies the whole table under one read lock, so a tick
/// never sees half of a batch update.
#[derive(Debug, Default)]
pub struct VirtualSensors {
    readings: RwLock<BTreeMap<String, f64>>,
}

impl VirtualSensors {
    /// Create sensors with initial readings.
    pub fn new<K, I>(readings: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        Self {
            readings: RwLock::new(readings.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    pub async fn set_reading(&self, sensor: impl Into<String>, value: f64) {
        let sensor = sensor.into();
        tracing::debug!(%sensor, value, "reading updated");
        self.readings.write().await.insert(sensor, value);
    }

    /// Replace several readings at once.
    pub async fn set_readings<K, I>(&self, readings: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let mut table = self.readings.write().await;
        for (sensor, value) in readings {
            table.insert(sensor.into(), value);
        }
    }

    /// Make a sensor go silent. Returns `false` if it had no reading.
    pub async fn remove_reading(&self, sensor: &str) -> bool {
        self.readings.write().await.remove(sensor).is_some()
    }
}

impl SensorSource for VirtualSensors {
    async fn snapshot(&self) -> Result<SensorSnapshot, GrowHubError> {
        let readings = self.readings.read().await.clone();
        Ok(SensorSnapshot::new(time::now(), readings))
    }
}
