//! Shared admission limit for entity analyses
//!
//! A fair semaphore: when all slots are taken, waiters are admitted in the
//! order they asked. One gate is created per run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// The gate's semaphore was closed while waiting
#[derive(Debug, thiserror::Error)]
#[error("concurrency gate closed")]
pub struct GateClosed;

/// Admission limit shared by the regional and block phases of one run.
///
/// Clones share the same slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyGate {
    /// A limit of 0 is treated as 1.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a slot. The slot is released when the permit drops.
    pub async fn admit(&self) -> Result<GatePermit, GateClosed> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GateClosed)?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(GatePermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Most permits ever held at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// A held slot
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn zero_limit_still_admits_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.limit(), 1);
        let permit = gate.admit().await.unwrap();
        assert_eq!(gate.in_flight(), 1);
        drop(permit);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn never_exceeds_limit() {
        let gate = ConcurrencyGate::new(3);
        let mut tasks = JoinSet::new();
        for _ in 0..12 {
            let permit = gate.admit().await.unwrap();
            let gate = gate.clone();
            tasks.spawn(async move {
                assert!(gate.in_flight() <= 3);
                tokio::time::sleep(Duration::from_millis(5)).await;
                drop(permit);
            });
        }
        while tasks.join_next().await.is_some() {}

        assert_eq!(gate.peak(), 3);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn waiters_are_admitted_in_order() {
        let gate = ConcurrencyGate::new(1);
        let held = gate.admit().await.unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let mut tasks = JoinSet::new();
        for i in 0..4 {
            let gate = gate.clone();
            let tx = tx.clone();
            tasks.spawn(async move {
                let _permit = gate.admit().await.unwrap();
                let _ = tx.send(i);
            });
            // Let each waiter enqueue before the next one is spawned.
            tokio::task::yield_now().await;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        drop(tx);
        drop(held);
        while tasks.join_next().await.is_some() {}

        let mut order = Vec::new();
        while let Some(i) = rx.recv().await {
            order.push(i);
        }
        assert_eq!(order, vec![0, 1, 2, 3]);
    }
}
