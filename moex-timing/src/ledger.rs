use std::collections::HashMap;
use std::time::Instant;

use tracing::trace;

use crate::event::{EventKey, EventKind};

/// Per-trial store of event timestamps. Exactly one trial is live at a
/// time: activation clears everything, so two trials' timings can never
/// coexist. Single-writer; the owner serializes all calls.
#[derive(Debug, Default)]
pub struct TimingLedger {
    active_trial: Option<i32>,
    events: HashMap<EventKey, Instant>,
}

impl TimingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start logging for a new trial; all previous entries are dropped.
    pub fn activate(&mut self, trial_id: i32) {
        self.active_trial = Some(trial_id);
        self.events.clear();
        trace!(trial_id, "ledger activated");
    }

    pub fn active_trial(&self) -> Option<i32> {
        self.active_trial
    }

    /// Record one raw occurrence of `kind`: the first occurrence is
    /// kept, the last is overwritten every time.
    pub fn log_paired(&mut self, kind: EventKind) {
        let now = Instant::now();
        self.events.entry(EventKey::First(kind)).or_insert(now);
        self.events.insert(EventKey::Last(kind), now);
        trace!(key = %EventKey::Last(kind), "logged");
    }

    /// Record a non-paired key, overwriting any previous occurrence.
    pub fn log_direct(&mut self, key: EventKey) {
        self.events.insert(key, Instant::now());
        trace!(%key, "logged");
    }

    pub fn has_logged(&self, key: EventKey) -> bool {
        self.events.contains_key(&key)
    }

    /// Has `kind` occurred at least once this trial?
    pub fn has_logged_kind(&self, kind: EventKind) -> bool {
        self.events.contains_key(&EventKey::Last(kind))
    }

    pub fn instant_of(&self, key: EventKey) -> Option<Instant> {
        self.events.get(&key).copied()
    }

    /// Elapsed seconds from `begin` to `end`, at millisecond precision.
    /// NaN when either endpoint is missing. Negative when the keys are
    /// out of chronological order; that is surfaced, not corrected.
    pub fn duration_secs(&self, begin: EventKey, end: EventKey) -> f64 {
        match (self.instant_of(begin), self.instant_of(end)) {
            (Some(b), Some(e)) => {
                let millis = if e >= b {
                    e.duration_since(b).as_millis() as i64
                } else {
                    -(b.duration_since(e).as_millis() as i64)
                };
                millis as f64 / 1000.0
            }
            _ => f64::NAN,
        }
    }
}
