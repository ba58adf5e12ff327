//! Phase transitions.
//!
//! Decides whether an object's recorded phase must change and stamps the
//! transition times. Callers only persist an object when this reports a
//! change.

use chrono::{DateTime, Utc};
use crds::{ObjectPhase, Phase};

/// Source of the current time.
pub type Clock = fn() -> DateTime<Utc>;

/// Applies phase transitions to an object's status.
///
/// A transition happens only when the phase name or message differs from
/// what is recorded. `last_update_time` is set on every transition and
/// `last_transition_time` only when the name changes.
#[derive(Debug, Clone, Copy)]
pub struct Transitioner {
    clock: Clock,
}

impl Default for Transitioner {
    fn default() -> Self {
        Self { clock: Utc::now }
    }
}

impl Transitioner {
    /// Transitioner using `clock` for timestamps
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    /// Current time according to this transitioner's clock
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Move `current` into `next`. Returns whether anything changed.
    pub fn transition_into(&self, current: &mut ObjectPhase, next: &Phase) -> bool {
        if current.phase == *next {
            return false;
        }

        let now = self.now();
        current.last_update_time = Some(now);
        if current.phase.name != next.name {
            current.last_transition_time = Some(now);
        }
        current.phase = next.clone();
        true
    }
}
