//! Source of the "now" instant.
//!
//! Engine functions take `now` as an argument. Stateful callers (the session
//! controller, the CLI) hold a [`Clock`] so tests can pin time with
//! [`FixedClock`] while production reads the system clock.

/// Supplies the current instant in epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Current instant, epoch milliseconds.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time via `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}
