//! Convergence polling
//!
//! Registrar writes become visible in the read path some time after the
//! write call returns. The [`ConvergencePoller`] repeatedly invokes a
//! read-only check and tests a predicate over its result, waiting between
//! attempts according to a [`BackoffPolicy`], until the predicate holds or
//! the budget is spent.
//!
//! ## Rules
//!
//! - Only the wait between attempts suspends; the predicate is synchronous.
//! - A check error is fatal: it is returned as [`PollError::Check`], never
//!   treated as "not converged yet".
//! - The [`CancelSignal`] is consulted before each check and raced against each
//!   wait, so cancellation takes effect without sitting out the interval.

pub mod backoff;
pub mod cancel;
pub mod clock;

pub use backoff::BackoffPolicy;
pub use cancel::{CancelHandle, CancelSignal, cancellation};
pub use clock::{Clock, ManualClock, SystemClock};

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::error::{Error, Result};

/// Why a poll ended without convergence
#[derive(Debug, Error)]
pub enum PollError<T: fmt::Debug> {
    /// The backoff budget ran out
    #[error("not converged after {attempts} attempt(s) in {elapsed:?}")]
    Timeout {
        attempts: u32,
        elapsed: Duration,
        /// Last check result, for diagnostics
        last: T,
    },

    /// The cancel signal fired
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32, last: Option<T> },

    /// The status check itself failed
    #[error(transparent)]
    Check(Error),
}

impl<T: fmt::Debug> PollError<T> {
    /// Fold into the crate error, naming what was being waited for
    pub fn into_error(self, operation: impl Into<String>) -> Error {
        let operation = operation.into();
        match self {
            Self::Timeout { attempts, last, .. } => Error::ConvergenceTimeout {
                operation,
                attempts,
                last_seen: format!("{:?}", last),
            },
            Self::Cancelled { .. } => Error::Cancelled { operation },
            Self::Check(err) => err,
        }
    }
}

/// Bounded exponential-backoff poller
pub struct ConvergencePoller {
    clock: Arc<dyn Clock>,
    policy: BackoffPolicy,
    cancel: CancelSignal,
}

impl fmt::Debug for ConvergencePoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvergencePoller")
            .field("policy", &self.policy)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl ConvergencePoller {
    /// Create a poller; the policy is validated up front
    pub fn new(clock: Arc<dyn Clock>, policy: BackoffPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            clock,
            policy,
            cancel: CancelSignal::never(),
        })
    }

    /// Observe `signal` between attempts
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = signal;
        self
    }

    /// The active backoff policy
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// The clock used for waits and elapsed-time accounting
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Poll until `predicate` holds for the observed value
    pub async fn poll_until<T, P, Fut, F>(
        &self,
        mut check: P,
        predicate: F,
    ) -> std::result::Result<T, PollError<T>>
    where
        T: fmt::Debug,
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        F: Fn(&T) -> bool,
    {
        let started = self.clock.now();
        let mut cancel = self.cancel.clone();
        let mut attempts: u32 = 0;
        let mut last: Option<T> = None;

        loop {
            if cancel.is_cancelled() {
                debug!("Poll cancelled before attempt {}", attempts + 1);
                return Err(PollError::Cancelled { attempts, last });
            }

            let observed = check().await.map_err(PollError::Check)?;
            attempts += 1;

            if predicate(&observed) {
                debug!("Converged after {} attempt(s)", attempts);
                return Ok(observed);
            }

            let delay = self.policy.interval(attempts - 1);
            let elapsed = elapsed_since(started, self.clock.now());
            if self.policy.attempts_exhausted(attempts)
                || self.policy.elapsed_exhausted(elapsed, delay)
            {
                debug!(
                    "Poll budget exhausted after {} attempt(s), last seen: {:?}",
                    attempts, observed
                );
                return Err(PollError::Timeout {
                    attempts,
                    elapsed,
                    last: observed,
                });
            }

            debug!(
                "Not converged on attempt {} ({:?}), waiting {:?}",
                attempts, observed, delay
            );
            last = Some(observed);

            tokio::select! {
                _ = self.clock.sleep(delay) => {}
                _ = cancel.cancelled() => {
                    debug!("Poll cancelled while waiting");
                    return Err(PollError::Cancelled { attempts, last });
                }
            }
        }
    }
}

fn elapsed_since(started: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - started).to_std().unwrap_or(Duration::ZERO)
}
