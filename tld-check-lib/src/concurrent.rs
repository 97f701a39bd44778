//! Concurrency limits for domain checking.
//!
//! The overall number of checks in flight is bounded by the checker's
//! stream; this module adds a second bound per upstream endpoint so a
//! batch spread over many TLDs never floods a single registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Hands out per-endpoint permits.
#[derive(Debug)]
pub struct ConcurrentProcessor {
    per_endpoint: usize,
    semaphores: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ConcurrentProcessor {
    /// Create a processor allowing `per_endpoint` requests per endpoint.
    pub fn new(per_endpoint: usize) -> Self {
        Self {
            per_endpoint: per_endpoint.max(1),
            semaphores: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for a slot on the endpoint identified by `key`.
    ///
    /// The slot is released when the returned permit is dropped.
    pub async fn acquire(&self, key: &str) -> Option<OwnedSemaphorePermit> {
        let semaphore = self.semaphore_for(key);
        // Semaphores are never closed, so this only fails if that changes
        semaphore.acquire_owned().await.ok()
    }

    fn semaphore_for(&self, key: &str) -> Arc<Semaphore> {
        let mut semaphores = match self.semaphores.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        semaphores
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_endpoint)))
            .clone()
    }

    /// Free slots on an endpoint right now.
    pub fn available(&self, key: &str) -> usize {
        self.semaphore_for(key).available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_permits_are_per_endpoint() {
        let processor = ConcurrentProcessor::new(2);

        let _a1 = processor.acquire("rdap.verisign.com").await;
        let _a2 = processor.acquire("rdap.verisign.com").await;
        assert_eq!(processor.available("rdap.verisign.com"), 0);
        assert_eq!(processor.available("rdap.org"), 2);

        // A third acquire on the saturated endpoint has to wait
        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            processor.acquire("rdap.verisign.com"),
        )
        .await;
        assert!(blocked.is_err());

        let other = processor.acquire("rdap.org").await;
        assert!(other.is_some());
    }

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let processor = ConcurrentProcessor::new(1);
        {
            let _permit = processor.acquire("rdap.org").await;
            assert_eq!(processor.available("rdap.org"), 0);
        }
        assert_eq!(processor.available("rdap.org"), 1);
    }

    #[test]
    fn test_waiter_woken_when_permit_dropped() {
        let processor = ConcurrentProcessor::new(1);
        let held = tokio_test::block_on(processor.acquire("rdap.org"));

        let mut waiter = tokio_test::task::spawn(processor.acquire("rdap.org"));
        tokio_test::assert_pending!(waiter.poll());

        drop(held);
        assert!(waiter.is_woken());
        let permit = tokio_test::assert_ready!(waiter.poll());
        assert!(permit.is_some());
    }

    #[test]
    fn test_zero_limit_is_raised_to_one() {
        let processor = ConcurrentProcessor::new(0);
        assert_eq!(processor.available("rdap.org"), 1);
    }
}
