//! Fixed-interval polling until a condition holds
//!
//! No backoff and no jitter: each attempt is followed by the same sleep,
//! except the last one. A probe error aborts the loop at once; only
//! [`Probe::Pending`] is retried.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::common::config::PollSettings;
use crate::common::{Error, Result};

/// Attempt budget and interval for one polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }
}

impl From<PollSettings> for PollPolicy {
    fn from(settings: PollSettings) -> Self {
        Self::new(settings.attempts, settings.interval())
    }
}

/// What a single probe observed
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    /// The condition holds
    Ready(T),
    /// Not yet; the reason is logged before waiting
    Pending(String),
}

/// How a polling loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Ready {
        value: T,
        attempts: u32,
        elapsed: Duration,
    },
    TimedOut {
        attempts: u32,
        elapsed: Duration,
    },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Turn a timeout into an error, warning the operator what is left behind
    ///
    /// `cleanup` completes the sentence "Be sure to ...".
    pub fn or_cleanup(self, what: &str, cleanup: &str) -> Result<T> {
        match self {
            PollOutcome::Ready { value, elapsed, .. } => {
                tracing::info!("Elapsed time: {:.1}s", elapsed.as_secs_f64());
                Ok(value)
            }
            PollOutcome::TimedOut { attempts, elapsed } => {
                tracing::warn!(
                    "Exhausted retries after {:.1}s. Be sure to {} and other necessary \
                     cleanup since we are aborting now.",
                    elapsed.as_secs_f64(),
                    cleanup
                );
                Err(Error::convergence_timeout(what, attempts, cleanup))
            }
        }
    }
}

/// Call `probe` until it reports ready or the attempt budget runs out
///
/// The probe receives the 1-based attempt number.
pub async fn poll_until<T, F, Fut>(
    policy: PollPolicy,
    label: &str,
    mut probe: F,
) -> Result<PollOutcome<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Probe<T>>>,
{
    let start = Instant::now();

    for attempt in 1..=policy.attempts {
        tracing::info!("Attempt: {}/{}: {}", attempt, policy.attempts, label);

        match probe(attempt).await? {
            Probe::Ready(value) => {
                tracing::info!("Pass.");
                return Ok(PollOutcome::Ready {
                    value,
                    attempts: attempt,
                    elapsed: start.elapsed(),
                });
            }
            Probe::Pending(reason) => {
                tracing::info!("{}", reason);
                if attempt < policy.attempts {
                    tracing::info!(
                        "Waiting {} seconds to try again.",
                        policy.interval.as_secs_f64()
                    );
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    Ok(PollOutcome::TimedOut {
        attempts: policy.attempts,
        elapsed: start.elapsed(),
    })
}
