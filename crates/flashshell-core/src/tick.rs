//! Periodic housekeeping for the foreground loop

/// Fires once every `period_ms` milliseconds of a free running tick counter
///
/// The counter is allowed to wrap.
#[derive(Debug, Clone, Copy)]
pub struct Heartbeat {
    period_ms: u32,
    last: u32,
}

impl Heartbeat {
    /// Start a heartbeat at tick `now_ms`
    pub const fn new(period_ms: u32, now_ms: u32) -> Self {
        Self {
            period_ms,
            last: now_ms,
        }
    }

    /// Returns true when at least one period elapsed since the last beat
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last) >= self.period_ms {
            self.last = now_ms;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period() {
        let mut beat = Heartbeat::new(250, 0);
        assert!(!beat.poll(249));
        assert!(beat.poll(250));
        assert!(!beat.poll(400));
        assert!(beat.poll(510));
    }

    #[test]
    fn test_counter_wrap() {
        let mut beat = Heartbeat::new(250, u32::MAX - 100);
        assert!(!beat.poll(u32::MAX));
        assert!(!beat.poll(100));
        assert!(beat.poll(149));
    }
}
