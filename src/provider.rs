//! Collaborator interfaces
//!
//! The store never renders, tracks or loads assets itself. A scene provider
//! owns live objects and their anchors; a tracking provider owns the spatial
//! map. Both are driven through these traits.

use crate::placement::{ObjectKind, Placement};

pub use crate::persistence::tracking::MapSink;

/// Scene provider could not realize a placement
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstantiationError {
    #[error("unknown object kind {0}")]
    UnknownKind(ObjectKind),

    #[error("cannot instantiate {kind}: {reason}")]
    Rejected { kind: ObjectKind, reason: String },
}

/// Tracking provider could not resume from a stored map
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackingError {
    #[error("tracking map rejected: {0}")]
    Rejected(String),

    #[error("map relocalization not supported")]
    NotSupported,
}

/// Live anchors and objects
pub trait SceneProvider {
    /// Every live (kind, anchor, pose) triple
    fn list_placements(&self) -> Vec<Placement>;

    /// Create an anchor carrying `placement.anchor`, attach an object of
    /// `placement.kind` and apply `placement.pose`
    fn instantiate(&mut self, placement: &Placement) -> Result<(), InstantiationError>;

    /// Remove every anchor and object
    fn clear_all(&mut self);
}

/// Device tracking and its spatial map
pub trait TrackingProvider {
    /// Start capturing the current map; deliver it through `sink` eventually
    fn capture_map(&mut self, sink: MapSink);

    /// Restart tracking from a previously captured map
    fn resume_from_map(&mut self, map: Vec<u8>) -> Result<(), TrackingError>;
}
