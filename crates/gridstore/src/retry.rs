use std::future::Future;
use std::time::Duration;

use gridstore_core::StoreError;
use tracing::warn;

/// Bounded exponential backoff for quota-classified errors.
///
/// A call is attempted up to `max_attempts` times in total; between
/// attempts the delay doubles from `base_delay`. Any error other than
/// [`StoreError::RateLimited`] fails immediately without retry.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Run `call` under this policy.
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 1u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_rate_limited() && attempt < self.max_attempts => {
                    warn!(
                        "Rate limited (attempt {}/{}), backing off for {:?}",
                        attempt, self.max_attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
