//! Rule engine: runs one evaluation tick from sensor snapshot to history.
//!
//! A tick captures one snapshot and one consistent list of enabled rules,
//! evaluates every rule, filters out rules still cooling down, resolves
//! per-device conflicts and dispatches the winning commands. Every matched
//! rule leaves a [`TriggerEvent`], including the ones that did not run.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use growhub_domain::command::DeviceCommand;
use growhub_domain::error::GrowHubError;
use growhub_domain::id::RuleId;
use growhub_domain::resolution::{Candidate, Resolution, resolve};
use growhub_domain::rule::{Action, Rule};
use growhub_domain::snapshot::SensorSnapshot;
use growhub_domain::time::Timestamp;
use growhub_domain::trigger_event::{TriggerEvent, TriggerOutcome};

use crate::ports::{Clock, DeviceChannel, RuleRepository, SensorSource, TriggerHistory};

/// Tunables of the engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// How long one command may wait for its acknowledgement.
    pub dispatch_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(5),
        }
    }
}

/// Where the current tick is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPhase {
    Idle,
    SnapshotCaptured,
    RulesEvaluated,
    ConflictsResolved,
    ActionsDispatched,
    HistoryWritten,
}

/// Reasons a tick did not run.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("a tick is already in progress")]
    Busy,

    #[error("failed to capture sensor snapshot")]
    Snapshot(#[source] GrowHubError),

    #[error("failed to load enabled rules")]
    Rules(#[source] GrowHubError),
}

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchStatus {
    Acknowledged,
    Failed { error: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub rule_id: RuleId,
    pub command: DeviceCommand,
    #[serde(flatten)]
    pub status: DispatchStatus,
}

/// Summary of one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub at: Timestamp,
    /// Number of enabled rules evaluated.
    pub evaluated: usize,
    /// Number of rules whose conditions or schedule held.
    pub matched: usize,
    /// Rules that had at least one command dispatched.
    pub triggered: Vec<RuleId>,
    pub dispatches: Vec<DispatchReport>,
    pub events: Vec<TriggerEvent>,
}

/// Inbound port for anything that can run ticks on demand.
pub trait TickRunner {
    /// Run one tick now.
    fn run_tick(&self) -> impl Future<Output = Result<TickReport, TickError>> + Send;

    /// The readings the next tick would see.
    fn current_snapshot(
        &self,
    ) -> impl Future<Output = Result<SensorSnapshot, GrowHubError>> + Send;
}

/// Evaluates enabled rules against sensor snapshots and drives devices.
pub struct RuleEngine<R, H, S, D, C> {
    rules: R,
    history: H,
    sensors: S,
    devices: D,
    clock: C,
    settings: EngineSettings,
    busy: AtomicBool,
    phase: Mutex<TickPhase>,
}

/// Releases the busy flag and returns the engine to [`TickPhase::Idle`]
/// however the tick ends.
struct TickGuard<'a> {
    busy: &'a AtomicBool,
    phase: &'a Mutex<TickPhase>,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = TickPhase::Idle;
        self.busy.store(false, Ordering::Release);
    }
}

impl<R, H, S, D, C> RuleEngine<R, H, S, D, C>
where
    R: RuleRepository,
    H: TriggerHistory,
    S: SensorSource,
    D: DeviceChannel,
    C: Clock,
{
    /// Create a new engine.
    pub fn new(
        rules: R,
        history: H,
        sensors: S,
        devices: D,
        clock: C,
        settings: EngineSettings,
    ) -> Self {
        Self {
            rules,
            history,
            sensors,
            devices,
            clock,
            settings,
            busy: AtomicBool::new(false),
            phase: Mutex::new(TickPhase::Idle),
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    pub fn phase(&self) -> TickPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one tick.
    ///
    /// Evaluation errors are isolated per rule and recorded as `errored`;
    /// dispatch failures and history write failures never abort the tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Busy`] while another tick is running, and
    /// [`TickError::Snapshot`] or [`TickError::Rules`] when the tick's
    /// inputs cannot be read. No rule is evaluated in those cases.
    #[tracing::instrument(skip(self))]
    pub async fn tick(&self) -> Result<TickReport, TickError> {
        let _guard = self.begin()?;
        let time = self.clock.evaluation_time();
        let at = time.now();

        let snapshot = self
            .sensors
            .snapshot()
            .await
            .map_err(TickError::Snapshot)?;
        self.enter(TickPhase::SnapshotCaptured);

        let rules = self.rules.get_enabled().await.map_err(TickError::Rules)?;
        let mut events = Vec::new();
        let mut candidates = Vec::new();
        let mut matched = 0;

        for rule in &rules {
            let evaluation = match rule.evaluate(&snapshot, &time) {
                Ok(evaluation) => evaluation,
                Err(err) => {
                    tracing::warn!(rule_id = %rule.id, error = %err, "rule evaluation failed");
                    events.push(
                        TriggerEvent::new(rule, None, Vec::new(), TriggerOutcome::Errored, at)
                            .with_detail(err.to_string()),
                    );
                    continue;
                }
            };
            if !evaluation.data_gaps.is_empty() {
                tracing::debug!(
                    rule_id = %rule.id,
                    missing = ?evaluation.data_gaps,
                    "rule references sensors absent from snapshot"
                );
            }
            if evaluation.matched {
                matched += 1;
            }
            let Some(branch) = evaluation.branch else {
                continue;
            };
            let actions = rule.branch_actions(branch).to_vec();
            if !rule.cooldown_allows(at) {
                tracing::debug!(rule_id = %rule.id, "rule suppressed by cooldown");
                events.push(TriggerEvent::new(
                    rule,
                    Some(branch),
                    actions,
                    TriggerOutcome::SuppressedCooldown,
                    at,
                ));
                continue;
            }
            candidates.push(Candidate {
                rule_id: rule.id,
                priority: rule.priority,
                branch,
                actions,
            });
        }
        self.enter(TickPhase::RulesEvaluated);

        let resolution = resolve(&candidates);
        self.enter(TickPhase::ConflictsResolved);

        let mut dispatches = Vec::with_capacity(resolution.winners.len());
        for winner in &resolution.winners {
            let status = self.dispatch(winner.command.clone()).await;
            dispatches.push(DispatchReport {
                rule_id: winner.rule_id,
                command: winner.command.clone(),
                status,
            });
        }
        self.enter(TickPhase::ActionsDispatched);

        let by_id: HashMap<RuleId, &Rule> = rules.iter().map(|r| (r.id, r)).collect();
        let mut triggered = Vec::new();
        for candidate in &candidates {
            let Some(rule) = by_id.get(&candidate.rule_id) else {
                continue;
            };
            let sent: Vec<&DispatchReport> = dispatches
                .iter()
                .filter(|d| d.rule_id == candidate.rule_id)
                .collect();
            if !sent.is_empty() {
                events.push(dispatch_event(rule, candidate, &sent, at));
                self.record_trigger(candidate.rule_id, at).await;
                triggered.push(candidate.rule_id);
            }
            if let Some(event) = override_event(rule, candidate, &resolution, at) {
                events.push(event);
            }
        }

        for event in &events {
            if let Err(err) = self.history.append(event.clone()).await {
                tracing::warn!(
                    rule_id = %event.rule_id,
                    outcome = %event.outcome,
                    error = %describe(&err),
                    "failed to write trigger history"
                );
            }
        }
        self.enter(TickPhase::HistoryWritten);

        tracing::info!(
            evaluated = rules.len(),
            matched,
            triggered = triggered.len(),
            dispatched = dispatches.len(),
            "tick complete"
        );

        Ok(TickReport {
            at,
            evaluated: rules.len(),
            matched,
            triggered,
            dispatches,
            events,
        })
    }

    fn begin(&self) -> Result<TickGuard<'_>, TickError> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| TickError::Busy)?;
        Ok(TickGuard {
            busy: &self.busy,
            phase: &self.phase,
        })
    }

    fn enter(&self, phase: TickPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
        tracing::trace!(?phase, "tick phase");
    }

    async fn dispatch(&self, command: DeviceCommand) -> DispatchStatus {
        let label = command.to_string();
        match tokio::time::timeout(self.settings.dispatch_timeout, self.devices.publish(command))
            .await
        {
            Ok(Ok(())) => {
                tracing::debug!(command = %label, "command acknowledged");
                DispatchStatus::Acknowledged
            }
            Ok(Err(err)) => {
                let error = describe(&err);
                tracing::warn!(command = %label, %error, "command dispatch failed");
                DispatchStatus::Failed { error }
            }
            Err(_) => {
                tracing::warn!(
                    command = %label,
                    timeout_ms = self.settings.dispatch_timeout.as_millis(),
                    "command dispatch timed out"
                );
                DispatchStatus::TimedOut
            }
        }
    }

    async fn record_trigger(&self, id: RuleId, at: Timestamp) {
        match self.rules.record_trigger(id, at).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(rule_id = %id, "rule deleted during tick"),
            Err(err) => {
                tracing::warn!(rule_id = %id, error = %describe(&err), "failed to record trigger");
            }
        }
    }
}

impl<R, H, S, D, C> TickRunner for RuleEngine<R, H, S, D, C>
where
    R: RuleRepository + Send + Sync,
    H: TriggerHistory + Send + Sync,
    S: SensorSource + Send + Sync,
    D: DeviceChannel + Send + Sync,
    C: Clock + Send + Sync,
{
    fn run_tick(&self) -> impl Future<Output = Result<TickReport, TickError>> + Send {
        self.tick()
    }

    fn current_snapshot(
        &self,
    ) -> impl Future<Output = Result<SensorSnapshot, GrowHubError>> + Send {
        self.sensors.snapshot()
    }
}

fn dispatch_event(
    rule: &Rule,
    candidate: &Candidate,
    sent: &[&DispatchReport],
    at: Timestamp,
) -> TriggerEvent {
    let failed: Vec<String> = sent
        .iter()
        .filter_map(|d| match &d.status {
            DispatchStatus::Failed { error } => Some(format!("{}: {error}", d.command)),
            DispatchStatus::Acknowledged | DispatchStatus::TimedOut => None,
        })
        .collect();
    let timed_out: Vec<String> = sent
        .iter()
        .filter(|d| d.status == DispatchStatus::TimedOut)
        .map(|d| d.command.to_string())
        .collect();

    let outcome = if !failed.is_empty() {
        TriggerOutcome::DispatchFailed
    } else if !timed_out.is_empty() {
        TriggerOutcome::Unknown
    } else {
        TriggerOutcome::Fired
    };
    let actions = sent.iter().map(|d| Action::from(d.command.clone())).collect();
    let event = TriggerEvent::new(rule, Some(candidate.branch), actions, outcome, at);

    let mut detail = failed;
    detail.extend(timed_out.into_iter().map(|c| format!("{c}: no acknowledgement")));
    if detail.is_empty() {
        event
    } else {
        event.with_detail(detail.join("; "))
    }
}

fn override_event(
    rule: &Rule,
    candidate: &Candidate,
    resolution: &Resolution,
    at: Timestamp,
) -> Option<TriggerEvent> {
    let lost: Vec<_> = resolution.overridden_for(candidate.rule_id).collect();
    if lost.is_empty() {
        return None;
    }
    let winners: BTreeSet<String> = lost.iter().map(|o| o.winner.to_string()).collect();
    let actions = lost.iter().map(|o| o.action.clone()).collect();
    Some(
        TriggerEvent::new(
            rule,
            Some(candidate.branch),
            actions,
            TriggerOutcome::Overridden,
            at,
        )
        .with_detail(format!(
            "overridden by rule {}",
            winners.into_iter().collect::<Vec<_>>().join(", ")
        )),
    )
}

/// Render an error with its whole source chain.
pub(crate) fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
