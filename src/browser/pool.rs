//! Bounded page pool
//!
//! A fixed number of permits caps how many pages render at once. A permit
//! goes back to the pool when its holder is dropped, so success, failure
//! and cancellation all release the slot.

use crate::error::{BrowserError, RenderError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Permit pool shared by every render
#[derive(Debug, Clone)]
pub struct PagePool {
    permits: Arc<Semaphore>,
    size: usize,
}

/// One checked-out pool slot
#[derive(Debug)]
pub struct PoolPermit {
    _permit: OwnedSemaphorePermit,
}

impl PagePool {
    /// Create a pool of `size` slots (at least 1)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Wait at most `wait` for a free slot
    pub async fn acquire(&self, wait: Duration) -> Result<PoolPermit> {
        let permit = tokio::time::timeout(wait, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| RenderError::Timeout(wait.as_millis() as u64))?
            .map_err(|_| BrowserError::PoolClosed)?;
        debug!("Pool slot taken, {} left", self.available());
        Ok(PoolPermit { _permit: permit })
    }

    /// Free slots right now
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Configured slot count
    pub fn size(&self) -> usize {
        self.size
    }

    /// Refuse all further acquisitions
    pub fn close(&self) {
        self.permits.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_saturated_pool_times_out() {
        let pool = PagePool::new(1);
        let _held = pool.acquire(Duration::from_millis(10)).await.unwrap();

        let err = pool.acquire(Duration::from_millis(30)).await.unwrap_err();
        assert!(matches!(err, Error::Render(RenderError::Timeout(30))));
        assert_eq!(pool.available(), 0);
    }

    #[tokio::test]
    async fn test_waiter_gets_slot_when_released() {
        let pool = PagePool::new(1);
        let held = pool.acquire(Duration::from_millis(10)).await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire(Duration::from_secs(2)).await.is_ok() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_holder_frees_slot() {
        let pool = PagePool::new(1);

        let holder = {
            let pool = pool.clone();
            async move {
                let _permit = pool.acquire(Duration::from_millis(10)).await?;
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, Error>(())
            }
        };
        assert!(tokio::time::timeout(Duration::from_millis(30), holder)
            .await
            .is_err());

        assert_eq!(pool.available(), 1);
        assert!(pool.acquire(Duration::from_millis(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_holder_frees_slot() {
        let pool = PagePool::new(2);
        let outcome: Result<()> = async {
            let _permit = pool.acquire(Duration::from_millis(10)).await?;
            Err::<(), Error>(RenderError::Network("reset".into()).into())
        }
        .await;
        assert!(outcome.is_err());
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_closed_pool_rejects() {
        let pool = PagePool::new(0);
        assert_eq!(pool.size(), 1);
        pool.close();
        let err = pool.acquire(Duration::from_millis(10)).await.unwrap_err();
        assert!(matches!(err, Error::Browser(BrowserError::PoolClosed)));
    }
}
