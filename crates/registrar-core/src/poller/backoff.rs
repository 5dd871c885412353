//! Exponential backoff schedule
//!
//! `interval(n) = initial * multiplier^n`, optionally capped at
//! `max_interval`. The budget is bounded by an attempt count, a total elapsed
//! time, or both; a policy with neither bound is rejected.

use std::time::Duration;

use crate::error::{Error, Result};

/// Backoff schedule and retry budget for a [`ConvergencePoller`](super::ConvergencePoller)
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Wait after the first unsuccessful check
    pub initial_interval: Duration,
    /// Growth factor between consecutive waits (>= 1.0)
    pub multiplier: f64,
    /// Upper bound for a single wait
    pub max_interval: Option<Duration>,
    /// Maximum number of check invocations
    pub max_attempts: Option<u32>,
    /// Maximum time spent waiting overall
    pub max_elapsed: Option<Duration>,
}

impl BackoffPolicy {
    /// Fixed number of attempts with the default schedule
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            max_elapsed: None,
            ..Self::default()
        }
    }

    /// Set the initial interval
    pub fn initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the multiplier
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Cap a single wait
    pub fn max_interval(mut self, cap: Option<Duration>) -> Self {
        self.max_interval = cap;
        self
    }

    /// Bound the total elapsed time
    pub fn max_elapsed(mut self, budget: Option<Duration>) -> Self {
        self.max_elapsed = budget;
        self
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<()> {
        if self.initial_interval.is_zero() {
            return Err(Error::config("Backoff initial interval must be > 0"));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(Error::config(format!(
                "Backoff multiplier must be a finite value >= 1.0, got {}",
                self.multiplier
            )));
        }
        if self.max_attempts == Some(0) {
            return Err(Error::config("Backoff max attempts must be > 0"));
        }
        if self.max_attempts.is_none() && self.max_elapsed.is_none() {
            return Err(Error::config(
                "Backoff policy needs an attempt limit or an elapsed-time limit",
            ));
        }
        Ok(())
    }

    /// Wait before retry number `retry` (0 = after the first failed check)
    pub fn interval(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);

        let uncapped = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);

        match self.max_interval {
            Some(cap) => uncapped.min(cap),
            None => uncapped,
        }
    }

    /// Whether `attempts` check invocations exhaust the attempt budget
    pub fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    /// Whether waiting `next` more after `elapsed` would exceed the time budget
    pub fn elapsed_exhausted(&self, elapsed: Duration, next: Duration) -> bool {
        self.max_elapsed
            .is_some_and(|max| elapsed.saturating_add(next) > max)
    }
}

impl Default for BackoffPolicy {
    /// 500ms growing by 1.5x up to 60s, for at most 15 minutes
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            max_interval: Some(Duration::from_secs(60)),
            max_attempts: None,
            max_elapsed: Some(Duration::from_secs(15 * 60)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_grow_exponentially() {
        let policy = BackoffPolicy::with_max_attempts(10)
            .initial_interval(Duration::from_secs(1))
            .multiplier(2.0)
            .max_interval(None);

        assert_eq!(policy.interval(0), Duration::from_secs(1));
        assert_eq!(policy.interval(1), Duration::from_secs(2));
        assert_eq!(policy.interval(4), Duration::from_secs(16));
    }

    #[test]
    fn intervals_respect_the_cap() {
        let policy = BackoffPolicy::with_max_attempts(10)
            .initial_interval(Duration::from_secs(1))
            .multiplier(10.0)
            .max_interval(Some(Duration::from_secs(30)));

        assert_eq!(policy.interval(1), Duration::from_secs(10));
        assert_eq!(policy.interval(2), Duration::from_secs(30));
        assert_eq!(policy.interval(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn unbounded_policy_is_invalid() {
        let policy = BackoffPolicy {
            max_attempts: None,
            max_elapsed: None,
            ..BackoffPolicy::default()
        };
        assert!(policy.validate().is_err());
        assert!(BackoffPolicy::default().validate().is_ok());
        assert!(BackoffPolicy::with_max_attempts(0).validate().is_err());
        assert!(BackoffPolicy::with_max_attempts(3).multiplier(0.5).validate().is_err());
    }

    #[test]
    fn budgets() {
        let policy = BackoffPolicy::with_max_attempts(3)
            .max_elapsed(Some(Duration::from_secs(10)));
        assert!(!policy.attempts_exhausted(2));
        assert!(policy.attempts_exhausted(3));
        assert!(!policy.elapsed_exhausted(Duration::from_secs(4), Duration::from_secs(6)));
        assert!(policy.elapsed_exhausted(Duration::from_secs(5), Duration::from_secs(6)));
    }
}
