//! # Interval Timer Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::{Duration, Instant};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A free running stopwatch used to gate periodic control steps.
pub trait IntervalTimer {
    /// Start (or resume) counting.
    fn start(&mut self);

    /// Stop counting, keeping the elapsed time.
    fn stop(&mut self);

    /// Zero the elapsed time without changing whether the timer is running.
    fn reset(&mut self);

    /// Elapsed counting time in seconds.
    fn read(&self) -> f64;

    /// Called by pollers while they wait for `remaining_s` more seconds to elapse.
    ///
    /// The default does nothing, which makes the caller a pure busy poll.
    fn idle(&mut self, _remaining_s: f64) {}
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// [`IntervalTimer`] backed by the host's monotonic clock.
///
/// `idle` sleeps for the remaining time rather than spinning.
#[derive(Debug, Default)]
pub struct StdTimer {
    /// Time accumulated over previous start/stop spans
    accumulated: Duration,

    /// Start of the current span, `None` when stopped
    started_at: Option<Instant>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StdTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

impl IntervalTimer for StdTimer {
    fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(t0) = self.started_at.take() {
            self.accumulated += t0.elapsed();
        }
    }

    fn reset(&mut self) {
        self.accumulated = Duration::from_secs(0);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn read(&self) -> f64 {
        let running = match self.started_at {
            Some(t0) => t0.elapsed(),
            None => Duration::from_secs(0)
        };

        (self.accumulated + running).as_secs_f64()
    }

    fn idle(&mut self, remaining_s: f64) {
        if remaining_s.is_finite() && remaining_s > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(remaining_s));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_std_timer_start_stop() {
        let mut t = StdTimer::new();
        assert_eq!(t.read(), 0.0);

        t.start();
        t.idle(0.005);
        t.stop();

        let stopped = t.read();
        assert!(stopped >= 0.005);

        // Stopped timers do not advance
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(t.read(), stopped);

        t.reset();
        assert_eq!(t.read(), 0.0);
        assert!(!t.is_running());
    }

    #[test]
    fn test_std_timer_reset_while_running() {
        let mut t = StdTimer::new();
        t.start();
        t.idle(0.01);
        t.reset();
        assert!(t.is_running());
        assert!(t.read() < 0.01);
    }
}
