//! In-memory ports backing the router tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use growhub_app::ports::{RuleRepository, TriggerHistory};
use growhub_app::rule_engine::{TickError, TickReport, TickRunner};
use growhub_domain::error::GrowHubError;
use growhub_domain::id::RuleId;
use growhub_domain::rule::{Branch, Rule};
use growhub_domain::snapshot::SensorSnapshot;
use growhub_domain::time::{self, Timestamp};
use growhub_domain::trigger_event::{TriggerEvent, TriggerOutcome};

#[derive(Default)]
pub struct StubRuleRepo {
    rules: Mutex<BTreeMap<RuleId, Rule>>,
}

impl RuleRepository for StubRuleRepo {
    async fn create(&self, rule: Rule) -> Result<Rule, GrowHubError> {
        self.rules.lock().unwrap().insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn get_by_id(&self, id: RuleId) -> Result<Option<Rule>, GrowHubError> {
        Ok(self.rules.lock().unwrap().get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Rule>, GrowHubError> {
        Ok(self.rules.lock().unwrap().values().cloned().collect())
    }

    async fn get_enabled(&self) -> Result<Vec<Rule>, GrowHubError> {
        Ok(self
            .rules
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.enabled)
            .cloned()
            .collect())
    }

    async fn update(&self, rule: Rule) -> Result<Option<Rule>, GrowHubError> {
        let mut rules = self.rules.lock().unwrap();
        Ok(rules.get_mut(&rule.id).map(|stored| {
            *stored = Rule {
                last_triggered: stored.last_triggered,
                trigger_count: stored.trigger_count,
                ..rule
            };
            stored.clone()
        }))
    }

    async fn delete(&self, id: RuleId) -> Result<bool, GrowHubError> {
        Ok(self.rules.lock().unwrap().remove(&id).is_some())
    }

    async fn set_enabled(&self, id: RuleId, enabled: bool) -> Result<bool, GrowHubError> {
        Ok(self
            .rules
            .lock()
            .unwrap()
            .get_mut(&id)
            .map(|r| r.enabled = enabled)
            .is_some())
    }

    async fn record_trigger(&self, id: RuleId, at: Timestamp) -> Result<bool, GrowHubError> {
        Ok(self
            .rules
            .lock()
            .unwrap()
            .get_mut(&id)
            .map(|r| r.record_trigger(at))
            .is_some())
    }
}

#[derive(Default)]
pub struct StubHistory {
    events: Mutex<Vec<TriggerEvent>>,
}

impl StubHistory {
    pub fn with_fired(rules: &[&Rule]) -> Self {
        let events = rules
            .iter()
            .map(|rule| {
                TriggerEvent::new(
                    rule,
                    Some(Branch::Then),
                    rule.actions.clone(),
                    TriggerOutcome::Fired,
                    time::now(),
                )
            })
            .collect();
        Self {
            events: Mutex::new(events),
        }
    }
}

impl TriggerHistory for StubHistory {
    async fn append(&self, event: TriggerEvent) -> Result<(), GrowHubError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TriggerEvent>, GrowHubError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_rule(
        &self,
        rule_id: RuleId,
        limit: usize,
    ) -> Result<Vec<TriggerEvent>, GrowHubError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| e.rule_id == rule_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Tick runner that reports an empty tick, or `Busy` when told so.
#[derive(Default)]
pub struct StubEngine {
    pub busy: AtomicBool,
}

impl StubEngine {
    pub fn busy() -> Self {
        Self {
            busy: AtomicBool::new(true),
        }
    }
}

impl TickRunner for StubEngine {
    async fn run_tick(&self) -> Result<TickReport, TickError> {
        if self.busy.load(Ordering::SeqCst) {
            return Err(TickError::Busy);
        }
        Ok(TickReport {
            at: time::now(),
            evaluated: 0,
            matched: 0,
            triggered: Vec::new(),
            dispatches: Vec::new(),
            events: Vec::new(),
        })
    }

    async fn current_snapshot(&self) -> Result<SensorSnapshot, GrowHubError> {
        Ok(SensorSnapshot::new(
            time::now(),
            [("temp", 24.5), ("humidity", 58.0)],
        ))
    }
}
