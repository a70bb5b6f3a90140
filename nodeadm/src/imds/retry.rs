//! Bounded exponential backoff.

use std::time::Duration;

use log::debug;

use crate::cancel::Cancellation;
use crate::error::Result;

/// Retry policy: attempts are spaced by a wait that doubles up to a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub initial: Duration,
    /// Upper bound on any single wait.
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial: Duration::from_millis(250),
            max: Duration::from_secs(5),
        }
    }
}

impl Backoff {
    /// The wait before attempt `attempt + 1`, counting from attempt 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use nodeadm::imds::Backoff;
    ///
    /// let backoff = Backoff::default();
    /// assert_eq!(backoff.delay(1), Duration::from_millis(250));
    /// assert_eq!(backoff.delay(2), Duration::from_millis(500));
    /// assert_eq!(backoff.delay(10), Duration::from_secs(5));
    /// ```
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1 << exponent)
            .map_or(self.max, |d| d.min(self.max))
    }

    /// Runs `op` until it succeeds, fails permanently, runs out of attempts,
    /// or `cancel` fires. `is_transient` decides which errors are retried.
    ///
    /// # Errors
    ///
    /// Returns the last error from `op`, or [`crate::Error::Cancelled`].
    pub fn retry<T, F, P>(&self, cancel: &Cancellation, mut op: F, is_transient: P) -> Result<T>
    where
        F: FnMut() -> Result<T>,
        P: Fn(&crate::Error) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            cancel.check()?;
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts && is_transient(&err) => {
                    let wait = self.delay(attempt);
                    debug!("attempt {attempt}/{attempts} failed, retrying in {wait:?}: {err}");
                    cancel.sleep(wait)?;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
