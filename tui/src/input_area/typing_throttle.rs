//! Rate limiting for typing indicators.
//!
//! "Still typing" is announced on the leading edge and at most once per
//! interval afterwards; a burst inside the interval arms a single trailing
//! announcement. "Stopped typing" is never delayed: it cancels any armed
//! trailing announcement and goes out immediately.

use std::time::Duration;
use std::time::Instant;

#[derive(Debug)]
pub struct TypingThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
    trailing_due: Option<Instant>,
    announced_typing: bool,
}

impl TypingThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            trailing_due: None,
            announced_typing: false,
        }
    }

    /// Returns the typing state to announce now, if any.
    pub fn on_typing(&mut self, typing: bool, now: Instant) -> Option<bool> {
        if !typing {
            self.trailing_due = None;
            self.last_emit = None;
            if !self.announced_typing {
                return None;
            }
            self.announced_typing = false;
            return Some(false);
        }

        match self.last_emit {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.trailing_due = Some(last + self.interval);
                None
            }
            _ => Some(self.emit_typing(now)),
        }
    }

    /// Fire an armed trailing announcement once its deadline has passed.
    pub fn flush_if_due(&mut self, now: Instant) -> Option<bool> {
        let due = self.trailing_due?;
        if now < due {
            return None;
        }
        Some(self.emit_typing(now))
    }

    /// When the host should next call [`TypingThrottle::flush_if_due`].
    pub fn next_deadline(&self) -> Option<Instant> {
        self.trailing_due
    }

    /// Forget all state without announcing anything.
    pub fn reset(&mut self) {
        self.last_emit = None;
        self.trailing_due = None;
        self.announced_typing = false;
    }

    fn emit_typing(&mut self, now: Instant) -> bool {
        self.last_emit = Some(now);
        self.trailing_due = None;
        self.announced_typing = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INTERVAL: Duration = Duration::from_secs(5);

    #[test]
    fn leading_edge_then_trailing_after_interval() {
        let t0 = Instant::now();
        let mut throttle = TypingThrottle::new(INTERVAL);

        assert_eq!(throttle.on_typing(true, t0), Some(true));
        assert_eq!(throttle.on_typing(true, t0 + Duration::from_secs(1)), None);
        assert_eq!(throttle.on_typing(true, t0 + Duration::from_secs(2)), None);
        assert_eq!(throttle.next_deadline(), Some(t0 + INTERVAL));

        assert_eq!(throttle.flush_if_due(t0 + Duration::from_secs(4)), None);
        assert_eq!(throttle.flush_if_due(t0 + INTERVAL), Some(true));
        assert_eq!(throttle.flush_if_due(t0 + Duration::from_secs(9)), None);
    }

    #[test]
    fn stop_typing_cancels_trailing_and_fires_immediately() {
        let t0 = Instant::now();
        let mut throttle = TypingThrottle::new(INTERVAL);

        throttle.on_typing(true, t0);
        throttle.on_typing(true, t0 + Duration::from_secs(1));
        assert_eq!(
            throttle.on_typing(false, t0 + Duration::from_secs(2)),
            Some(false)
        );
        assert_eq!(throttle.next_deadline(), None);
        assert_eq!(throttle.flush_if_due(t0 + Duration::from_secs(10)), None);

        // The next keystroke is a fresh leading edge.
        assert_eq!(
            throttle.on_typing(true, t0 + Duration::from_secs(3)),
            Some(true)
        );
    }

    #[test]
    fn stop_without_prior_announcement_is_silent() {
        let mut throttle = TypingThrottle::new(INTERVAL);
        let t0 = Instant::now();
        assert_eq!(throttle.on_typing(false, t0), None);
        assert_eq!(throttle.next_deadline(), None);

        // A second stop after a stop is silent too.
        assert_eq!(throttle.on_typing(true, t0), Some(true));
        assert_eq!(throttle.on_typing(false, t0), Some(false));
        assert_eq!(throttle.on_typing(false, t0), None);
    }

    #[test]
    fn typing_after_interval_is_a_new_leading_edge() {
        let t0 = Instant::now();
        let mut throttle = TypingThrottle::new(INTERVAL);
        assert_eq!(throttle.on_typing(true, t0), Some(true));
        assert_eq!(
            throttle.on_typing(true, t0 + Duration::from_secs(6)),
            Some(true)
        );
        assert_eq!(throttle.next_deadline(), None);
    }
}
