use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Concurrent thumbnail requests allowed by default
pub const DEFAULT_THUMBNAIL_CONCURRENCY: usize = 5;

/// Bounds the number of in-flight library requests when a picker grid
/// renders many tiles at once. Cloning shares the same permits.
#[derive(Debug, Clone)]
pub struct ThumbnailGate {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl ThumbnailGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Runs `task` once a slot is free
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, acquire only fails after close()
        let _permit = self.permits.acquire().await.ok();
        task.await
    }
}

impl Default for ThumbnailGate {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gate_limits_in_flight_requests() {
        let gate = ThumbnailGate::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                gate.run(async {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(gate.available(), 2);
    }

    #[test]
    fn test_gate_capacity_at_least_one() {
        assert_eq!(ThumbnailGate::new(0).capacity(), 1);
        assert_eq!(ThumbnailGate::default().capacity(), DEFAULT_THUMBNAIL_CONCURRENCY);
    }
}
