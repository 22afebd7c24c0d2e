//! Scheduler loop: drives one tick per interval until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::rule_engine::{TickError, TickRunner, describe};

/// Periodic driver for a [`TickRunner`].
///
/// Ticks never overlap: the next tick starts only after the previous one
/// returned, and slots missed by an overrunning tick are skipped.
pub struct Scheduler<E> {
    engine: Arc<E>,
    period: Duration,
}

impl<E: TickRunner> Scheduler<E> {
    pub fn new(engine: Arc<E>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// A tick that is already running when shutdown is requested completes
    /// first, so no dispatch is abandoned halfway.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(period_ms = self.period.as_millis(), "scheduler started");

        loop {
            let slot = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                slot = ticker.tick() => slot,
            };

            match self.engine.run_tick().await {
                Ok(report) => {
                    tracing::debug!(
                        matched = report.matched,
                        triggered = report.triggered.len(),
                        "scheduled tick finished"
                    );
                }
                Err(TickError::Busy) => {
                    tracing::debug!("tick skipped, another tick is in progress");
                }
                Err(err) => {
                    tracing::warn!(error = %describe(&err), "tick skipped");
                }
            }

            let elapsed = slot.elapsed();
            if elapsed > self.period {
                let next = next_slot(slot, elapsed, self.period);
                tracing::debug!(
                    overrun_ms = elapsed.as_millis(),
                    "tick overran its period, skipping missed slots"
                );
                ticker.reset_at(next);
            }
        }

        tracing::info!("scheduler stopped");
    }
}

/// First slot on the `period` grid anchored at `slot` that is not in the past.
fn next_slot(slot: Instant, elapsed: Duration, period: Duration) -> Instant {
    let periods = elapsed.as_nanos().div_ceil(period.as_nanos().max(1));
    let periods = u32::try_from(periods).unwrap_or(u32::MAX);
    slot.checked_add(period.saturating_mul(periods)).unwrap_or_else(Instant::now)
}
