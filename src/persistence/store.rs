//! Session store: save and restore placements plus the tracking map
//!
//! One store operates on one session directory. Callers must not run `save`
//! and `load` concurrently against the same directory; the store only keeps
//! deferred tracking-map writes from interleaving with a load's read.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::codec::{self, CodecError, EncodedPose};
use super::envelope::{self, EnvelopeError};
use super::files;
use super::key::{composite_key, split_key};
use super::snapshot::SessionSnapshot;
use super::tracking::{MapSink, TrackingShared, TrackingStatus};
use crate::placement::Placement;
use crate::provider::{InstantiationError, SceneProvider, TrackingError, TrackingProvider};
use crate::settings::StoreSettings;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: EnvelopeError,
    },
}

/// Why a stored entry was not restored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Key does not split into a valid kind and anchor
    MalformedKey,
    /// Pose text could not be decoded
    Codec(CodecError),
    /// Scene provider refused the placement
    Instantiation(InstantiationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub key: String,
    pub reason: SkipReason,
}

/// Which file the placements came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Nothing saved yet
    Empty,
    Primary,
    /// Primary missing or corrupt; previous save used instead
    Backup,
}

/// What happened to the stored tracking map on load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingResume {
    /// Provider resumed from the stored map
    Resumed,
    /// No stored map; tracking starts fresh
    Fresh,
    /// Provider rejected the stored map
    Rejected(TrackingError),
    /// Stored map exists but could not be read
    Unreadable(String),
}

/// Decoded placements, before anything is instantiated
#[derive(Debug, Clone)]
pub struct DecodedSnapshot {
    pub placements: Vec<Placement>,
    pub skipped: Vec<SkippedEntry>,
    pub source: SnapshotSource,
    /// False if the file's digest did not match; entries were checked one by one
    pub verified: bool,
}

impl DecodedSnapshot {
    fn empty() -> Self {
        Self {
            placements: Vec::new(),
            skipped: Vec::new(),
            source: SnapshotSource::Empty,
            verified: true,
        }
    }

    /// Entries found in storage, decodable or not
    pub fn total(&self) -> usize {
        self.placements.len() + self.skipped.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Entries written to the pose map
    pub placements: usize,
    /// Tracking capture status when `save` returned (usually `Pending`)
    pub tracking: TrackingStatus,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Placements handed to the scene successfully
    pub restored: usize,
    /// Entries found in storage
    pub total: usize,
    pub skipped: Vec<SkippedEntry>,
    pub tracking: TrackingResume,
    pub source: SnapshotSource,
    /// False if the pose map was edited or damaged after it was written
    pub verified: bool,
}

impl LoadReport {
    /// True if every stored entry was restored
    pub fn is_complete(&self) -> bool {
        self.restored == self.total
    }
}

fn decode_entry(key: &str, value: Value) -> Result<Placement, SkipReason> {
    let (kind, anchor) = split_key(key).ok_or(SkipReason::MalformedKey)?;
    let encoded = EncodedPose::deserialize(&value).map_err(|e| {
        SkipReason::Codec(CodecError::Malformed {
            text: value.to_string(),
            reason: e.to_string(),
        })
    })?;
    let pose = codec::decode(&encoded).map_err(SkipReason::Codec)?;
    Ok(Placement::new(kind, anchor, pose))
}

/// Persists one AR session to one directory
#[derive(Debug)]
pub struct SessionStore {
    settings: StoreSettings,
    tracking: Arc<TrackingShared>,
}

impl SessionStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            tracking: Arc::new(TrackingShared::default()),
        }
    }

    /// Store with default file names in `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(StoreSettings::in_dir(dir))
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn dir(&self) -> &Path {
        &self.settings.dir
    }

    /// Persist every live placement and request the tracking map
    ///
    /// The pose map is written before returning. The tracking map is written
    /// whenever the provider delivers it; use [`Self::wait_for_tracking`]
    /// before loading if both artifacts are needed.
    pub fn save<S, T>(&self, scene: &S, tracking: &mut T) -> Result<SaveReport, StoreError>
    where
        S: SceneProvider + ?Sized,
        T: TrackingProvider + ?Sized,
    {
        let live = scene.list_placements();
        let snapshot = SessionSnapshot::capture(&live);
        if snapshot.len() < live.len() {
            log::debug!(
                "{} duplicate placement keys collapsed",
                live.len() - snapshot.len()
            );
        }

        tracking.capture_map(MapSink::new(
            Arc::clone(&self.tracking),
            self.settings.tracking_path(),
        ));

        let path = self.settings.transforms_path();
        let write_failed = |source: io::Error| StoreError::WriteFailed {
            path: path.clone(),
            source,
        };

        let bytes = envelope::seal(&snapshot).map_err(|e| write_failed(e.into()))?;
        let backup = self.settings.keep_backup.then(|| self.settings.backup_path());
        files::write_atomic_with_backup(&path, &bytes, backup.as_deref()).map_err(write_failed)?;

        log::info!("Saved {} placements to {}", snapshot.len(), path.display());
        Ok(SaveReport {
            placements: snapshot.len(),
            tracking: self.tracking.status(),
        })
    }

    /// Restore the tracking map and every decodable placement
    ///
    /// Entries that cannot be decoded or instantiated are skipped and listed
    /// in the report. Only an unreadable pose map, or one that is not a
    /// well-formed envelope, fails the load.
    pub fn load<S, T>(&self, scene: &mut S, tracking: &mut T) -> Result<LoadReport, StoreError>
    where
        S: SceneProvider + ?Sized,
        T: TrackingProvider + ?Sized,
    {
        let resume = self.resume_tracking(tracking);
        let DecodedSnapshot {
            placements,
            mut skipped,
            source,
            verified,
        } = self.read_snapshot()?;

        let total = placements.len() + skipped.len();
        let mut restored = 0;
        for placement in placements {
            match scene.instantiate(&placement) {
                Ok(()) => restored += 1,
                Err(e) => {
                    let key = composite_key(&placement.kind, &placement.anchor);
                    log::warn!("Skipping {key}: {e}");
                    skipped.push(SkippedEntry {
                        key,
                        reason: SkipReason::Instantiation(e),
                    });
                }
            }
        }

        log::info!("Restored {restored} of {total} placements");
        Ok(LoadReport {
            restored,
            total,
            skipped,
            tracking: resume,
            source,
            verified,
        })
    }

    /// Read and decode stored placements without touching any provider
    pub fn read_snapshot(&self) -> Result<DecodedSnapshot, StoreError> {
        let path = self.settings.transforms_path();
        let primary = files::read_optional(&path).map_err(|source| StoreError::ReadFailed {
            path: path.clone(),
            source,
        })?;

        // Only a document that does not parse is abandoned for the backup.
        // A digest mismatch still yields every entry that decodes.
        let (stored, source) = match primary.map(|bytes| envelope::open(&bytes)) {
            Some(Ok(stored)) => (stored, SnapshotSource::Primary),
            Some(Err(e)) => match self.read_backup() {
                Some(stored) => {
                    log::warn!("{} is corrupt ({e}), using backup", path.display());
                    (stored, SnapshotSource::Backup)
                }
                None => return Err(StoreError::Corrupt { path, source: e }),
            },
            None => match self.read_backup() {
                Some(stored) => {
                    log::warn!("{} missing, using backup", path.display());
                    (stored, SnapshotSource::Backup)
                }
                None => {
                    log::info!("No saved session in {}", self.settings.dir.display());
                    return Ok(DecodedSnapshot::empty());
                }
            },
        };

        if !stored.verified {
            log::warn!("Pose map digest mismatch ({source:?}), checking entries individually");
        }

        let mut decoded = DecodedSnapshot {
            placements: Vec::with_capacity(stored.entries.len()),
            skipped: Vec::new(),
            source,
            verified: stored.verified,
        };
        for (key, value) in stored.entries {
            match decode_entry(&key, value) {
                Ok(placement) => decoded.placements.push(placement),
                Err(reason) => {
                    log::warn!("Skipping stored entry {key:?}: {reason:?}");
                    decoded.skipped.push(SkippedEntry { key, reason });
                }
            }
        }
        Ok(decoded)
    }

    /// A valid backup envelope, if one exists
    fn read_backup(&self) -> Option<envelope::StoredPlacements> {
        if !self.settings.keep_backup {
            return None;
        }
        let path = self.settings.backup_path();
        match files::read_optional(&path) {
            Ok(Some(bytes)) => match envelope::open(&bytes) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    log::warn!("Backup {} unusable: {e}", path.display());
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("Cannot read backup {}: {e}", path.display());
                None
            }
        }
    }

    fn resume_tracking<T>(&self, tracking: &mut T) -> TrackingResume
    where
        T: TrackingProvider + ?Sized,
    {
        let path = self.settings.tracking_path();
        let blob = {
            let _io = self.tracking.io_lock();
            files::read_optional(&path)
        };

        match blob {
            Ok(Some(map)) if !map.is_empty() => match tracking.resume_from_map(map) {
                Ok(()) => {
                    log::info!("Tracking resumed from saved map");
                    TrackingResume::Resumed
                }
                Err(e) => {
                    log::warn!("Tracking provider rejected saved map: {e}");
                    TrackingResume::Rejected(e)
                }
            },
            Ok(_) => TrackingResume::Fresh,
            Err(e) => {
                log::warn!("Cannot read tracking map {}: {e}", path.display());
                TrackingResume::Unreadable(e.to_string())
            }
        }
    }

    /// Status of the most recent tracking capture, without blocking
    pub fn tracking_status(&self) -> TrackingStatus {
        self.tracking.status()
    }

    /// Block until every requested tracking capture has settled
    pub fn wait_for_tracking(&self) -> TrackingStatus {
        self.tracking.wait()
    }

    /// Like [`Self::wait_for_tracking`]; `None` if still pending at the timeout
    pub fn wait_for_tracking_timeout(&self, timeout: Duration) -> Option<TrackingStatus> {
        self.tracking.wait_timeout(timeout)
    }
}
