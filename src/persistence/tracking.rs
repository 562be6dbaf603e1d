//! Deferred tracking-map capture
//!
//! The tracking provider hands its map back through a [`MapSink`] whenever it
//! is ready, possibly from another thread. The sink writes the blob under the
//! store's I/O lock and records the outcome so callers can wait on it.
//!
//! Every sink carries the sequence number of the save that requested it. A
//! late delivery from an older save never replaces a map already written by
//! a newer one.

use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::files;

/// Outcome of the most recent tracking-map capture
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrackingStatus {
    /// No capture requested yet
    #[default]
    Idle,
    /// A capture was requested and has not been delivered
    Pending,
    /// Blob written to the tracking file
    Written { bytes: usize },
    /// Provider had no map to give (tracking not ready); nothing written
    NotReady,
    /// Blob delivered but the write failed
    Failed { reason: String },
    /// Blob delivered after a newer capture was written; discarded
    Superseded,
    /// Sink dropped without delivering
    Abandoned,
}

#[derive(Debug, Default)]
struct CaptureState {
    pending: usize,
    next_seq: u64,
    /// Sequence of the capture `last` came from
    last_seq: u64,
    last: TrackingStatus,
}

/// State shared between a store and its outstanding sinks
#[derive(Debug, Default)]
pub(crate) struct TrackingShared {
    state: Mutex<CaptureState>,
    settled: Condvar,
    /// Serializes tracking-file writes against load reads. Holds the
    /// sequence of the blob on disk (0 if none written by this store).
    io: Mutex<u64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TrackingShared {
    pub(crate) fn io_lock(&self) -> MutexGuard<'_, u64> {
        lock(&self.io)
    }

    pub(crate) fn status(&self) -> TrackingStatus {
        let state = lock(&self.state);
        if state.pending > 0 {
            TrackingStatus::Pending
        } else {
            state.last.clone()
        }
    }

    fn begin(&self) -> u64 {
        let mut state = lock(&self.state);
        state.pending += 1;
        state.next_seq += 1;
        state.next_seq
    }

    fn finish(&self, seq: u64, status: TrackingStatus) {
        let mut state = lock(&self.state);
        state.pending = state.pending.saturating_sub(1);
        if seq >= state.last_seq {
            state.last_seq = seq;
            state.last = status;
        }
        self.settled.notify_all();
    }

    pub(crate) fn wait(&self) -> TrackingStatus {
        let mut state = lock(&self.state);
        while state.pending > 0 {
            state = self
                .settled
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.last.clone()
    }

    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<TrackingStatus> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.wait());
        };
        let mut state = lock(&self.state);
        while state.pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            state = self
                .settled
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        Some(state.last.clone())
    }
}

/// One-shot completion handle for a tracking-map capture
#[derive(Debug)]
pub struct MapSink {
    shared: Option<Arc<TrackingShared>>,
    seq: u64,
    path: PathBuf,
}

impl MapSink {
    pub(crate) fn new(shared: Arc<TrackingShared>, path: PathBuf) -> Self {
        let seq = shared.begin();
        Self {
            shared: Some(shared),
            seq,
            path,
        }
    }

    /// Deliver the captured map (`None` when tracking is not ready)
    pub fn deliver(mut self, map: Option<Vec<u8>>) -> TrackingStatus {
        let Some(shared) = self.shared.take() else {
            return TrackingStatus::Abandoned;
        };

        let status = match map {
            Some(blob) if !blob.is_empty() => {
                let mut on_disk = shared.io_lock();
                if *on_disk > self.seq {
                    log::info!(
                        "Tracking map from capture {} discarded, capture {} already saved",
                        self.seq,
                        *on_disk
                    );
                    TrackingStatus::Superseded
                } else {
                    match files::write_atomic(&self.path, &blob) {
                        Ok(()) => {
                            *on_disk = self.seq;
                            log::info!("Tracking map saved ({} bytes)", blob.len());
                            TrackingStatus::Written { bytes: blob.len() }
                        }
                        Err(e) => {
                            log::warn!("Failed to save tracking map {}: {e}", self.path.display());
                            TrackingStatus::Failed {
                                reason: e.to_string(),
                            }
                        }
                    }
                }
            }
            _ => {
                log::info!("Tracking map not available, skipping");
                TrackingStatus::NotReady
            }
        };

        shared.finish(self.seq, status.clone());
        status
    }
}

impl Drop for MapSink {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            log::warn!("Tracking map capture dropped without delivering");
            shared.finish(self.seq, TrackingStatus::Abandoned);
        }
    }
}
