//! Admission gate bounding concurrent transcodes.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::error::{ClipError, ClipResult};
use crate::metrics;

/// Counting gate with a fixed number of slots.
///
/// Cloning shares the same slots.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots; zero is rejected.
    pub fn new(capacity: usize) -> ClipResult<Self> {
        if capacity == 0 {
            return Err(ClipError::config_error(
                "admission gate capacity must be at least 1",
            ));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Occupied slots right now.
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    /// Wait for a free slot.
    ///
    /// The slot is held until the returned permit is dropped.
    pub async fn acquire(&self, job_id: &str) -> ClipResult<GatePermit> {
        let started = Instant::now();

        if self.available() == 0 {
            info!(
                job_id,
                capacity = self.capacity,
                "All processing slots busy, waiting in queue"
            );
        }

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ClipError::internal("admission gate closed"))?;

        let waited = started.elapsed().as_secs_f64();
        metrics::record_gate_wait(waited);
        metrics::set_gate_in_use(self.in_use());
        debug!(job_id, waited_secs = waited, in_use = self.in_use(), "Acquired processing slot");

        Ok(GatePermit {
            permit: Some(permit),
            gate: self.clone(),
        })
    }
}

/// One occupied gate slot, released on drop.
#[derive(Debug)]
pub struct GatePermit {
    permit: Option<OwnedSemaphorePermit>,
    gate: AdmissionGate,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        drop(self.permit.take());
        metrics::set_gate_in_use(self.gate.in_use());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_rejected() {
        let err = AdmissionGate::new(0).unwrap_err();
        assert_eq!(err.category(), "config_error");
    }

    #[tokio::test]
    async fn test_permit_release_on_drop() {
        let gate = AdmissionGate::new(2).unwrap();
        assert_eq!(gate.in_use(), 0);

        let first = gate.acquire("a").await.unwrap();
        let second = gate.acquire("b").await.unwrap();
        assert_eq!(gate.in_use(), 2);
        assert_eq!(gate.available(), 0);

        drop(first);
        assert_eq!(gate.in_use(), 1);
        drop(second);
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_capacity_one_serializes() {
        let gate = AdmissionGate::new(1).unwrap();
        let held = gate.acquire("first").await.unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire("second").await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished(), "second acquire must wait for the slot");

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("second acquire should complete once the slot is free")
            .unwrap()
            .unwrap();
        assert_eq!(gate.in_use(), 0);
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let gate = AdmissionGate::new(2).unwrap();
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let gate = gate.clone();
                let current = current.clone();
                let peak = peak.clone();
                tokio::spawn(async move {
                    let _permit = gate.acquire(&format!("job-{i}")).await.unwrap();
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
        assert_eq!(gate.available(), 2);
    }
}
