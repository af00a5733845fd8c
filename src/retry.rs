// ABOUTME: Bounded fixed-delay retry primitive shared by polling and HTTP transport.
// ABOUTME: Repeats an operation until a stop predicate holds, the budget runs out, or it is cancelled.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a retry loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// The stop predicate accepted `value`.
    Settled { attempts: u32, value: T },
    /// Every attempt ran and none satisfied the predicate.
    Exhausted { attempts: u32, last: T },
    /// Cancelled between attempts. `last` is the most recent result, if any.
    Cancelled { attempts: u32, last: Option<T> },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Settled { attempts, .. }
            | RetryOutcome::Exhausted { attempts, .. }
            | RetryOutcome::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// The last value observed, whether or not it satisfied the predicate.
    pub fn into_last(self) -> Option<T> {
        match self {
            RetryOutcome::Settled { value, .. } => Some(value),
            RetryOutcome::Exhausted { last, .. } => Some(last),
            RetryOutcome::Cancelled { last, .. } => last,
        }
    }
}

/// Runs an operation up to `max_retries + 1` times with a fixed delay between attempts.
#[derive(Debug, Clone)]
pub struct Retrier {
    delay: Duration,
    max_retries: u32,
    cancel: Option<CancellationToken>,
}

impl Retrier {
    pub fn new(delay: Duration, max_retries: u32) -> Self {
        Self {
            delay,
            max_retries,
            cancel: None,
        }
    }

    /// Check `token` before each attempt and abort the inter-attempt sleep when it fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total number of attempts this retrier will make.
    pub fn budget(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Invoke `operation` until `stop` accepts its result.
    ///
    /// Errors returned by `operation` end the loop immediately; callers that
    /// want to retry on errors return them inside `T` instead.
    pub async fn retry<T, E, F, Fut, P>(
        &self,
        name: &str,
        mut stop: P,
        mut operation: F,
    ) -> Result<RetryOutcome<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&T) -> bool,
    {
        let budget = self.budget();

        if self.is_cancelled() {
            return Ok(RetryOutcome::Cancelled {
                attempts: 0,
                last: None,
            });
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::debug!(operation = name, attempt, budget, "attempt {attempt}/{budget}");

            let value = operation().await?;
            if stop(&value) {
                return Ok(RetryOutcome::Settled {
                    attempts: attempt,
                    value,
                });
            }

            if attempt >= budget {
                return Ok(RetryOutcome::Exhausted {
                    attempts: attempt,
                    last: value,
                });
            }

            if !self.pause().await {
                tracing::info!(operation = name, attempt, "cancelled while waiting to retry");
                return Ok(RetryOutcome::Cancelled {
                    attempts: attempt,
                    last: Some(value),
                });
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Sleep for the configured delay. Returns false if cancelled first.
    async fn pause(&self) -> bool {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => false,
                    _ = tokio::time::sleep(self.delay) => true,
                }
            }
            None => {
                tokio::time::sleep(self.delay).await;
                true
            }
        }
    }
}
