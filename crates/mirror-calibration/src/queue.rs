//! Bounded, backpressured queue for the asynchronous consistency-score
//! updates of spec §4.H step 6 (DESIGN NOTES §9: "a bounded task queue
//! with backpressure, not fire-and-forget without limits").

use crate::reputation::ReputationEngine;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Default channel capacity if the caller doesn't pick one.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

struct ConsistencyUpdate {
    org_id: String,
    delta: f64,
}

struct Shared {
    queue: parking_lot::Mutex<VecDeque<ConsistencyUpdate>>,
    capacity: usize,
    notify: Notify,
    closed: std::sync::atomic::AtomicBool,
}

/// Owns a bounded, mutex-guarded deque of pending updates and a
/// background task draining it into the [`ReputationEngine`]. Dropping
/// the queue signals the drain task to exit once it empties.
pub struct ConsistencyUpdateQueue {
    shared: Arc<Shared>,
    dropped: Arc<AtomicU64>,
}

impl ConsistencyUpdateQueue {
    pub fn spawn(reputation: Arc<dyn ReputationEngine>, capacity: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: parking_lot::Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            notify: Notify::new(),
            closed: std::sync::atomic::AtomicBool::new(false),
        });
        let dropped = Arc::new(AtomicU64::new(0));

        let drain_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            loop {
                let next = drain_shared.queue.lock().pop_front();
                match next {
                    Some(update) => {
                        reputation.update_consistency_score(&update.org_id, update.delta).await;
                    }
                    None => {
                        if drain_shared.closed.load(Ordering::Acquire) {
                            break;
                        }
                        drain_shared.notify.notified().await;
                    }
                }
            }
        });

        Self { shared, dropped }
    }

    /// Enqueues an update without blocking the caller. On a full queue
    /// the oldest pending update is evicted to make room for the new
    /// arrival (spec §9: "Overflow drops oldest pending updates and logs
    /// a counter").
    pub fn submit(&self, org_id: impl Into<String>, delta: f64) {
        let update = ConsistencyUpdate { org_id: org_id.into(), delta };
        {
            let mut queue = self.shared.queue.lock();
            if queue.len() >= self.shared.capacity {
                queue.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: "mirror_calibration", "consistency-update queue full; dropping oldest pending update");
            }
            queue.push_back(update);
        }
        self.shared.notify.notify_one();
    }

    pub fn dropped_updates(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for ConsistencyUpdateQueue {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.notify.notify_one();
    }
}
