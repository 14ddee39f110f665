//! Concurrency model (SS5): a bounded worker pool gated by a
//! `tokio::sync::Semaphore`, with cooperative cancellation checked at
//! suspension points via `tokio::select!`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Notify, Semaphore};

/// A cloneable flag plus a waiter so in-flight tasks can be nudged
/// awake as soon as cancellation fires, instead of polling.
#[derive(Clone)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already cancelled, otherwise waits for
    /// the next `cancel()` call. Intended for `tokio::select!` alongside
    /// the real work future so a suspended task wakes promptly.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixed-size gate on concurrently running workers. Acquiring a
/// permit blocks the caller until a slot frees up or cancellation
/// fires, whichever comes first.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    cancel: CancellationSignal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolOutcome<T> {
    Completed(T),
    Cancelled,
}

impl WorkerPool {
    pub fn new(capacity: usize, cancel: CancellationSignal) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.max(1))),
            cancel,
        }
    }

    pub fn cancellation(&self) -> CancellationSignal {
        self.cancel.clone()
    }

    /// Run `task` once a permit is available. Returns `Cancelled`
    /// without ever acquiring a permit (or mid-flight, at the next
    /// suspension point) if cancellation fires first.
    pub async fn run<F, T>(&self, task: F) -> PoolOutcome<T>
    where
        F: Future<Output = T>,
    {
        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return PoolOutcome::Cancelled,
            permit = self.semaphore.acquire() => permit,
        };
        let Ok(_permit) = permit else {
            return PoolOutcome::Cancelled;
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => PoolOutcome::Cancelled,
            result = task => PoolOutcome::Completed(result),
        }
    }
}
