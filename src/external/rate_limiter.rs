use parking_lot::Mutex;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::{sleep, Duration, Instant};

use crate::external::price_provider::PriceProviderError;

/// Keeps provider calls inside free-tier quotas
/// (Twelve Data 8 req/min, Alpha Vantage 5 req/min).
pub struct RateLimiter {
    semaphore: Semaphore,
    last_request: Mutex<Option<Instant>>,
    min_delay: Duration,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, requests_per_minute: u32) -> Self {
        let min_delay_ms = 60_000 / requests_per_minute.max(1) as u64;
        Self {
            semaphore: Semaphore::new(max_concurrent.max(1)),
            last_request: Mutex::new(None),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Waits for a free slot and for the minimum spacing since the previous
    /// request. The slot is released when the guard drops.
    pub async fn acquire(&self) -> Result<RateLimitGuard<'_>, PriceProviderError> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| PriceProviderError::Network("rate limiter closed".into()))?;

        loop {
            let wait = {
                let mut last = self.last_request.lock();
                let now = Instant::now();
                match *last {
                    Some(prev) if now.duration_since(prev) < self.min_delay => {
                        Some(self.min_delay - now.duration_since(prev))
                    },
                    _ => {
                        *last = Some(now);
                        None
                    },
                }
            };

            match wait {
                Some(delay) => sleep(delay).await,
                None => break,
            }
        }

        Ok(RateLimitGuard { _permit: permit })
    }

    #[cfg(test)]
    fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

pub struct RateLimitGuard<'a> {
    _permit: SemaphorePermit<'a>,
}
