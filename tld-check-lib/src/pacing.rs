//! Request pacing toward upstream RDAP servers.
//!
//! Registries rate-limit aggressively, so checks are spaced out. Two
//! shapes are supported: a fixed pause after every check, and a token
//! bucket that allows short bursts and then settles to a steady rate.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Pause applied after each check by default.
pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_millis(100);

/// How checks are spaced out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PacingPolicy {
    /// No pacing at all
    None,
    /// Sleep this long after every check, including the last
    Fixed(Duration),
    /// At most `rate_per_sec` requests per second with bursts of `burst`
    TokenBucket { rate_per_sec: f64, burst: u32 },
}

impl Default for PacingPolicy {
    fn default() -> Self {
        PacingPolicy::Fixed(DEFAULT_PACING_INTERVAL)
    }
}

impl PacingPolicy {
    /// Fixed pacing from milliseconds; zero disables pacing.
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            PacingPolicy::None
        } else {
            PacingPolicy::Fixed(Duration::from_millis(ms))
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Applies a [`PacingPolicy`] around each check of a batch.
///
/// One pacer is shared by every check in a batch. Token-bucket state is
/// guarded by a mutex that is never held across an await.
#[derive(Debug)]
pub struct Pacer {
    policy: PacingPolicy,
    bucket: Mutex<Bucket>,
}

impl Pacer {
    pub fn new(policy: PacingPolicy) -> Self {
        let burst = match policy {
            PacingPolicy::TokenBucket { burst, .. } => f64::from(burst.max(1)),
            _ => 0.0,
        };

        Self {
            policy,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait until a request may be sent.
    pub async fn before_request(&self) {
        if let PacingPolicy::TokenBucket {
            rate_per_sec,
            burst,
        } = self.policy
        {
            let wait = self.reserve_token(rate_per_sec, burst);
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }
    }

    /// Wait after a check has completed.
    pub async fn after_request(&self) {
        if let PacingPolicy::Fixed(interval) = self.policy {
            tokio::time::sleep(interval).await;
        }
    }

    /// Take one token, returning how long the caller must wait for it.
    ///
    /// Tokens may go negative; each waiter then sleeps until its own token
    /// has been refilled, which keeps concurrent callers spaced out.
    fn reserve_token(&self, rate_per_sec: f64, burst: u32) -> Duration {
        if rate_per_sec <= 0.0 || !rate_per_sec.is_finite() {
            return Duration::ZERO;
        }

        let mut bucket = match self.bucket.lock() {
            Ok(bucket) => bucket,
            Err(poisoned) => poisoned.into_inner(),
        };

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        let capacity = f64::from(burst.max(1));
        bucket.tokens = (bucket.tokens + elapsed * rate_per_sec).min(capacity);
        bucket.last_refill = now;

        bucket.tokens -= 1.0;
        if bucket.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-bucket.tokens / rate_per_sec)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis() {
        assert_eq!(PacingPolicy::from_millis(0), PacingPolicy::None);
        assert_eq!(
            PacingPolicy::from_millis(250),
            PacingPolicy::Fixed(Duration::from_millis(250))
        );
        assert_eq!(
            PacingPolicy::default(),
            PacingPolicy::Fixed(Duration::from_millis(100))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_pacing_sleeps_after_each_request() {
        let pacer = Pacer::new(PacingPolicy::Fixed(Duration::from_millis(100)));
        let start = Instant::now();

        for _ in 0..3 {
            pacer.before_request().await;
            pacer.after_request().await;
        }

        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pacing_is_instant() {
        let pacer = Pacer::new(PacingPolicy::None);
        let start = Instant::now();

        for _ in 0..10 {
            pacer.before_request().await;
            pacer.after_request().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_bucket_allows_burst_then_throttles() {
        let pacer = Pacer::new(PacingPolicy::TokenBucket {
            rate_per_sec: 10.0,
            burst: 3,
        });
        let start = Instant::now();

        for _ in 0..3 {
            pacer.before_request().await;
        }
        assert!(start.elapsed() < Duration::from_millis(1));

        // Two more need two refills at 100ms each
        pacer.before_request().await;
        pacer.before_request().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(199), "{:?}", elapsed);
        assert!(elapsed <= Duration::from_millis(210), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_bucket_refills_while_idle() {
        let pacer = Pacer::new(PacingPolicy::TokenBucket {
            rate_per_sec: 2.0,
            burst: 1,
        });

        pacer.before_request().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        pacer.before_request().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }
}
