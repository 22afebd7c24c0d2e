//! In-memory port implementations shared by the app crate's unit tests.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use growhub_domain::command::DeviceCommand;
use growhub_domain::error::GrowHubError;
use growhub_domain::id::RuleId;
use growhub_domain::rule::Rule;
use growhub_domain::snapshot::SensorSnapshot;
use growhub_domain::time::Timestamp;
use growhub_domain::trigger_event::TriggerEvent;

use crate::ports::{DeviceChannel, RuleRepository, SensorSource, TriggerHistory};

#[derive(Default)]
pub struct InMemoryRuleRepo {
    store: Mutex<BTreeMap<RuleId, Rule>>,
}

impl InMemoryRuleRepo {
    pub fn with_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            store: Mutex::new(rules.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    pub fn get(&self, id: RuleId) -> Option<Rule> {
        self.store.lock().unwrap().get(&id).cloned()
    }

    pub fn remove(&self, id: RuleId) {
        self.store.lock().unwrap().remove(&id);
    }
}

impl RuleRepository for InMemoryRuleRepo {
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, GrowHubError>> + Send {
        self.store.lock().unwrap().insert(rule.id, rule.clone());
        async { Ok(rule) }
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, GrowHubError>> + Send {
        let result = self.get(id);
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, GrowHubError>> + Send {
        let result: Vec<Rule> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Rule>, GrowHubError>> + Send {
        let result: Vec<Rule> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.enabled)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn update(
        &self,
        rule: Rule,
    ) -> impl Future<Output = Result<Option<Rule>, GrowHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = store.get_mut(&rule.id).map(|existing| {
            let last_triggered = existing.last_triggered;
            let trigger_count = existing.trigger_count;
            *existing = Rule {
                last_triggered,
                trigger_count,
                ..rule
            };
            existing.clone()
        });
        async { Ok(result) }
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<bool, GrowHubError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id).is_some();
        async move { Ok(removed) }
    }

    fn set_enabled(
        &self,
        id: RuleId,
        enabled: bool,
    ) -> impl Future<Output = Result<bool, GrowHubError>> + Send {
        let found = self
            .store
            .lock()
            .unwrap()
            .get_mut(&id)
            .map(|r| r.enabled = enabled)
            .is_some();
        async move { Ok(found) }
    }

    fn record_trigger(
        &self,
        id: RuleId,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, GrowHubError>> + Send {
        let found = self
            .store
            .lock()
            .unwrap()
            .get_mut(&id)
            .map(|r| r.record_trigger(at))
            .is_some();
        async move { Ok(found) }
    }
}

#[derive(Default)]
pub struct InMemoryHistory {
    events: Mutex<Vec<TriggerEvent>>,
    fail_appends: bool,
}

impl InMemoryHistory {
    pub fn failing() -> Self {
        Self {
            fail_appends: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<TriggerEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl TriggerHistory for InMemoryHistory {
    fn append(&self, event: TriggerEvent) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        let result = if self.fail_appends {
            Err(GrowHubError::Storage("history is read-only".into()))
        } else {
            self.events.lock().unwrap().push(event);
            Ok(())
        };
        async { result }
    }

    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<TriggerEvent>, GrowHubError>> + Send {
        let result: Vec<TriggerEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn find_by_rule(
        &self,
        rule_id: RuleId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<TriggerEvent>, GrowHubError>> + Send {
        let result: Vec<TriggerEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| e.rule_id == rule_id)
            .take(limit)
            .cloned()
            .collect();
        async { Ok(result) }
    }
}

/// Sensor source whose readings are replaced wholesale by tests.
#[derive(Default)]
pub struct StaticSensors {
    readings: Mutex<BTreeMap<String, f64>>,
    fail: bool,
}

impl StaticSensors {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with(readings: &[(&str, f64)]) -> Self {
        let sensors = Self::default();
        sensors.set(readings);
        sensors
    }

    pub fn set(&self, readings: &[(&str, f64)]) {
        *self.readings.lock().unwrap() = readings
            .iter()
            .map(|(k, v)| ((*k).to_string(), *v))
            .collect();
    }
}

impl SensorSource for StaticSensors {
    fn snapshot(&self) -> impl Future<Output = Result<SensorSnapshot, GrowHubError>> + Send {
        let result = if self.fail {
            Err(GrowHubError::Sensor("bus offline".into()))
        } else {
            let readings = self.readings.lock().unwrap().clone();
            Ok(SensorSnapshot::new(growhub_domain::time::now(), readings))
        };
        async { result }
    }
}

/// Device channel that records every published command.
///
/// Devices listed in `failing` reject commands, devices in `slow` never
/// acknowledge within `delay`.
#[derive(Default)]
pub struct RecordingChannel {
    published: Mutex<Vec<DeviceCommand>>,
    failing: HashSet<String>,
    slow: HashSet<String>,
    delay: Duration,
}

impl RecordingChannel {
    pub fn failing(device: &str) -> Self {
        Self {
            failing: HashSet::from([device.to_string()]),
            ..Self::default()
        }
    }

    pub fn slow(device: &str, delay: Duration) -> Self {
        Self {
            slow: HashSet::from([device.to_string()]),
            delay,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<DeviceCommand> {
        self.published.lock().unwrap().clone()
    }
}

impl DeviceChannel for RecordingChannel {
    fn publish(
        &self,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        let fails = self.failing.contains(&command.device);
        let delay = self
            .slow
            .contains(&command.device)
            .then_some(self.delay);
        self.published.lock().unwrap().push(command.clone());
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fails {
                return Err(GrowHubError::Device(
                    format!("{} did not accept {}", command.device, command.command).into(),
                ));
            }
            Ok(())
        }
    }
}
