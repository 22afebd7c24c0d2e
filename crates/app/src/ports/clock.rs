//! Clock port: the engine's notion of "now".

use std::sync::Arc;

use chrono::FixedOffset;
use growhub_domain::time::{EvaluationTime, Timestamp};

/// Source of the current instant and of the local UTC offset used for
/// time-of-day conditions. One offset applies to every rule.
pub trait Clock {
    fn now(&self) -> Timestamp;

    fn offset(&self) -> FixedOffset;

    /// The evaluation time for a tick starting now.
    fn evaluation_time(&self) -> EvaluationTime {
        EvaluationTime::new(self.now(), self.offset())
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn offset(&self) -> FixedOffset {
        (**self).offset()
    }
}
