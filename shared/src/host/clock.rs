use std::time::Instant;

use crate::Millis;

/// Monotonic millisecond tick source
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Ticks since construction, wrapping at `u32::MAX`
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        // truncation is the wrap
        self.start.elapsed().as_millis() as Millis
    }
}
