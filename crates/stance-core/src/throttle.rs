//! Wall-clock event rate limiting.

/// Gates outbound events to at most `events_per_second`.
///
/// State is the timestamp of the last approved emission. A candidate is
/// approved when no previous emission exists or the elapsed time since
/// the last one reaches the minimum interval; rejected candidates are
/// dropped, never queued. A rate of zero or less disables the gate.
#[derive(Debug, Clone)]
pub struct EventThrottle {
    events_per_second: f64,
    last_emit_ms: Option<u64>,
}

impl EventThrottle {
    pub fn new(events_per_second: f64) -> Self {
        Self {
            events_per_second,
            last_emit_ms: None,
        }
    }

    /// Change the rate. Does not reset the last-emission reference, so a
    /// rate change mid-stream never causes a burst.
    pub fn set_rate(&mut self, events_per_second: f64) {
        self.events_per_second = events_per_second;
    }

    pub fn events_per_second(&self) -> f64 {
        self.events_per_second
    }

    /// Decide whether a candidate at `now_ms` (monotonic milliseconds)
    /// may be emitted. On approval the candidate's timestamp becomes the
    /// new reference point.
    pub fn should_emit(&mut self, now_ms: u64) -> bool {
        if self.events_per_second <= 0.0 {
            return true;
        }
        let min_interval_ms = 1000.0 / self.events_per_second;
        let due = match self.last_emit_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) as f64 >= min_interval_ms,
        };
        if due {
            self.last_emit_ms = Some(now_ms);
        }
        due
    }
}
