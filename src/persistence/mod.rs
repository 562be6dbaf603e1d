//! Save/load persistence with integrity verification
//!
//! Features:
//! - Pose text codec (shortest round-trip f32 decimals)
//! - Versioned JSON envelope
//! - BLAKE3 integrity digest
//! - Backup rotation (tmp → save, old save → backup)
//! - Corruption detection and recovery
//! - Deferred tracking-map capture

pub mod codec;
pub mod envelope;
pub mod files;
pub mod key;
pub mod snapshot;
pub mod store;
pub mod tracking;

pub use codec::{CodecError, EncodedPose};
pub use envelope::EnvelopeError;
pub use key::{composite_key, split_key};
pub use snapshot::SessionSnapshot;
pub use store::{
    DecodedSnapshot, LoadReport, SaveReport, SessionStore, SkipReason, SkippedEntry,
    SnapshotSource, StoreError, TrackingResume,
};
pub use tracking::{MapSink, TrackingStatus};
