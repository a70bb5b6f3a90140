//! Cooperative cancellation for blocking I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// A cancellation signal with an optional deadline.
///
/// Clones share the same flag, so cancelling one cancels all of them.
///
/// # Examples
///
/// ```
/// use nodeadm::cancel::Cancellation;
///
/// let token = Cancellation::new();
/// let worker = token.clone();
/// assert!(worker.check().is_ok());
/// token.cancel();
/// assert!(worker.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A token that is never cancelled unless [`Cancellation::cancel`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Cancels this token and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the token was cancelled or its deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline, if there is one.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fails with [`Error::Cancelled`] once cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the token is cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleeps for `duration`, waking early on cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if cancelled before or during the sleep.
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        let until = Instant::now() + duration;
        loop {
            self.check()?;
            let left = until.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Ok(());
            }
            thread::sleep(left.min(SLEEP_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_expires() {
        let token = Cancellation::with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
        assert_eq!(token.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_no_deadline() {
        let token = Cancellation::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.remaining(), None);
        assert!(token.sleep(Duration::from_millis(1)).is_ok());
    }

    #[test]
    fn test_sleep_wakes_on_cancel() {
        let token = Cancellation::new();
        let other = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            other.cancel();
        });
        let started = Instant::now();
        let result = token.sleep(Duration::from_secs(30));
        handle.join().unwrap();
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
