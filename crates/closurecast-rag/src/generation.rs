//! Text generation with a bounded quota retry policy
//!
//! Quota windows on the generation service reset on a fixed cadence, so a
//! quota-exhausted response is retried after a fixed delay (no growth, no
//! jitter) up to `max_retries` times. Every other failure is returned at once.

use async_trait::async_trait;
use closurecast_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of retries after a quota-exhausted response
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed wait between retries
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(30);

/// Trait for text generation backends
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// Quota or rate-limit exhaustion must be reported as
    /// [`Error::QuotaExhausted`] so it can be retried.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Suspends the caller between retries
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// What to do after a quota-exhausted response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then make attempt number `next_attempt`
    Retry { delay: Duration, next_attempt: u32 },

    /// The retry budget is spent
    GiveUp,
}

/// Fixed-delay bounded retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Transition out of a quota-exhausted `attempt` (0-based)
    pub fn on_quota_exhausted(&self, attempt: u32) -> RetryDecision {
        if attempt < self.max_retries {
            RetryDecision::Retry {
                delay: self.backoff,
                next_attempt: attempt + 1,
            }
        } else {
            RetryDecision::GiveUp
        }
    }
}

/// Generation backend wrapped in the quota retry policy
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl GenerationClient {
    /// Wrap a backend with the default policy and the tokio timer
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate text, waiting out quota exhaustion up to the retry budget
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0;

        loop {
            match self.backend.generate(prompt).await {
                Ok(text) => {
                    debug!(
                        backend = self.backend.name(),
                        attempt,
                        chars = text.chars().count(),
                        "Generation succeeded"
                    );
                    return Ok(text);
                }
                Err(e) if e.is_retryable() => match self.policy.on_quota_exhausted(attempt) {
                    RetryDecision::Retry {
                        delay,
                        next_attempt,
                    } => {
                        warn!(
                            "Generation quota exhausted, retrying in {:?} ({}/{})",
                            delay, next_attempt, self.policy.max_retries
                        );
                        metrics::counter!("closurecast_generation_retries_total").increment(1);
                        self.sleeper.sleep(delay).await;
                        attempt = next_attempt;
                    }
                    RetryDecision::GiveUp => {
                        warn!(attempts = attempt + 1, "Generation retries exhausted: {}", e);
                        return Err(Error::RetriesExhausted {
                            attempts: attempt + 1,
                        });
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }
}
