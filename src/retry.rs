//! Optional retry with exponential backoff for API calls.
//!
//! The default policy makes a single attempt. Raising
//! [`RetryPolicy::max_retries`] retries transient fetch failures (transport
//! errors, HTTP 429 and 5xx) with a growing, optionally jittered delay. The
//! build is single-threaded, so waiting is a plain blocking sleep.

use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one. Zero disables retrying.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Stretch each delay by a random 0-100% to spread out retries.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, fails permanently, or the retry
    /// budget is spent.
    pub fn run<T, F>(&self, operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Result<T, FetchError>,
    {
        self.run_with_sleep(operation, thread::sleep)
    }

    fn run_with_sleep<T, F, S>(&self, mut operation: F, mut sleep: S) -> Result<T, FetchError>
    where
        F: FnMut() -> Result<T, FetchError>,
        S: FnMut(Duration),
    {
        let mut attempt = 0;
        let mut delay = self.initial_delay;

        loop {
            match operation() {
                Ok(value) => {
                    if attempt > 0 {
                        info!(attempts = attempt + 1, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        error = %err,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "request failed, retrying"
                    );
                    let wait = if self.jitter { add_jitter(delay) } else { delay };
                    sleep(wait);
                    let next =
                        Duration::from_secs_f64(delay.as_secs_f64() * self.backoff_multiplier);
                    delay = next.min(self.max_delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + factor))
}
