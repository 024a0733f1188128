use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info};
use uuid::Uuid;

/// Lifecycle of a gate entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    /// A review is in flight for this key
    Processing,
    /// A review completed for this key; duplicates stay rejected until TTL
    Completed,
}

#[derive(Debug, Clone)]
struct GateEntry {
    status: GateStatus,
    request_id: Uuid,
    created_at: Instant,
}

/// Result of an acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired,
    /// A duplicate is already in flight; carries the holder's request id
    InFlight { holder: Uuid },
    /// This revision was already reviewed within the TTL window
    AlreadyCompleted { holder: Uuid },
}

impl AcquireOutcome {
    pub fn acquired(&self) -> bool {
        matches!(self, AcquireOutcome::Acquired)
    }
}

/// Exclusive-acquisition cache preventing duplicate reviews for one
/// (repo, change request, revision).
///
/// The check and the insert happen under one lock with no await point in
/// between; two concurrent duplicates cannot both observe "absent". Entries
/// expire after `ttl` regardless of status, bounding memory and allowing
/// eventual re-review of stuck keys. Single-instance only: scale-out needs a
/// shared store with the same try_acquire/mark_completed/release contract.
pub struct DeduplicationGate {
    entries: Mutex<HashMap<String, GateEntry>>,
    ttl: Duration,
}

impl DeduplicationGate {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Stable key for a (repo, number, revision) triple
    pub fn key(repo: &str, number: u64, revision: &str) -> String {
        format!("{:x}", md5::compute(format!("{}:{}:{}", repo, number, revision)))
    }

    /// Atomic test-and-set for the given key.
    ///
    /// Inserts a `Processing` entry and returns `Acquired` when the key is
    /// absent or its entry has outlived the TTL; otherwise reports the
    /// existing holder.
    pub fn try_acquire(&self, repo: &str, number: u64, revision: &str, request_id: Uuid) -> AcquireOutcome {
        let key = Self::key(repo, number, revision);
        let mut entries = self.entries.lock().expect("gate lock poisoned");

        if let Some(entry) = entries.get(&key) {
            if entry.created_at.elapsed() < self.ttl {
                let outcome = match entry.status {
                    GateStatus::Processing => AcquireOutcome::InFlight {
                        holder: entry.request_id,
                    },
                    GateStatus::Completed => AcquireOutcome::AlreadyCompleted {
                        holder: entry.request_id,
                    },
                };
                debug!(%key, request_id = %request_id, ?outcome, "Gate rejected duplicate");
                return outcome;
            }
            // Expired entry: fall through and replace it
        }

        entries.insert(
            key.clone(),
            GateEntry {
                status: GateStatus::Processing,
                request_id,
                created_at: Instant::now(),
            },
        );
        debug!(%key, request_id = %request_id, "Gate acquired");
        AcquireOutcome::Acquired
    }

    /// Flip a processing entry to completed, keeping duplicates rejected
    /// until the TTL elapses
    pub fn mark_completed(&self, repo: &str, number: u64, revision: &str) {
        let key = Self::key(repo, number, revision);
        let mut entries = self.entries.lock().expect("gate lock poisoned");
        if let Some(entry) = entries.get_mut(&key) {
            entry.status = GateStatus::Completed;
        }
    }

    /// Delete the entry outright, permitting a later duplicate to retry.
    /// Used when the executor fails.
    pub fn release(&self, repo: &str, number: u64, revision: &str) {
        let key = Self::key(repo, number, revision);
        let mut entries = self.entries.lock().expect("gate lock poisoned");
        entries.remove(&key);
    }

    /// Purge entries older than the TTL regardless of status
    pub fn sweep(&self) {
        let mut entries = self.entries.lock().expect("gate lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        let purged = before - entries.len();
        if purged > 0 {
            info!(purged, remaining = entries.len(), "Gate sweep purged expired entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("gate lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the periodic sweep task
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let gate = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                gate.sweep();
            }
        })
    }
}
