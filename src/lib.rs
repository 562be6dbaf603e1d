//! AR Persistence - save and restore augmented-reality sessions
//!
//! Core modules:
//! - `persistence`: Pose codec, versioned envelope, atomic files, session store
//! - `placement`: Object kinds, anchor ids and placements
//! - `provider`: Scene/tracking collaborator traits
//! - `session`: Intent dispatch (place, save, load, reset)
//! - `scene`: In-memory collaborators for the CLI and tests
//! - `settings`: Storage location and file names
//! - `platform`: Per-user storage directory

pub mod persistence;
pub mod placement;
pub mod platform;
pub mod pose;
pub mod provider;
pub mod scene;
pub mod session;
pub mod settings;

pub use persistence::{
    CodecError, LoadReport, SaveReport, SessionStore, StoreError, TrackingResume, TrackingStatus,
};
pub use placement::{AnchorId, IdError, ObjectKind, Placement};
pub use pose::Pose;
pub use provider::{InstantiationError, MapSink, SceneProvider, TrackingError, TrackingProvider};
pub use session::{ArSession, Intent, Outcome, SessionError};
pub use settings::StoreSettings;

/// Storage format constants
pub mod consts {
    /// Separator between object kind and anchor id in storage keys
    pub const KEY_SEPARATOR: char = '@';

    /// Pose map file (versioned JSON envelope)
    pub const TRANSFORMS_FILE: &str = "session.transforms";
    /// Suffix appended to the transforms file for the rotated previous save
    pub const BACKUP_SUFFIX: &str = ".bak";
    /// Opaque tracking map blob
    pub const TRACKING_FILE: &str = "session.trackingmap";

    /// Envelope format version written by this build
    pub const FORMAT_VERSION: u32 = 1;

    /// Models the demo scene knows how to instantiate
    pub const MODEL_CATALOG: [&str; 4] = [
        "robot_walk_idle",
        "toy_biplane_idle",
        "toy_drummer_idle",
        "toy_car",
    ];
}
