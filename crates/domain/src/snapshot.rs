//! Sensor snapshot: the readings one tick evaluates against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Immutable mapping from sensor key to reading, captured once per tick.
///
/// Every condition of every rule in a tick reads from the same snapshot,
/// so there is no skew between rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    captured_at: Timestamp,
    readings: BTreeMap<String, f64>,
}

impl SensorSnapshot {
    pub fn new<K, I>(captured_at: Timestamp, readings: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        Self {
            captured_at,
            readings: readings.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    #[must_use]
    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    /// Reading for `sensor`, if present.
    #[must_use]
    pub fn get(&self, sensor: &str) -> Option<f64> {
        self.readings.get(sensor).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Iterate readings ordered by sensor key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.readings.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
