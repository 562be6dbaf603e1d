//! Session driver
//!
//! Owns the collaborators and the store, and turns UI intents into calls.
//! Loading always starts from an empty scene so restored objects never mix
//! with whatever was placed before.

use crate::persistence::{LoadReport, SaveReport, SessionStore, StoreError};
use crate::placement::{AnchorId, ObjectKind, Placement};
use crate::pose::Pose;
use crate::provider::{InstantiationError, SceneProvider, TrackingProvider};

/// Actions the UI can request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Place a new object of this kind on a fresh anchor
    Place(ObjectKind),
    Save,
    /// Clear the scene, then restore the saved session
    Load,
    /// Clear the scene (storage is untouched)
    Reset,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Placed(Placement),
    Saved(SaveReport),
    Loaded(LoadReport),
    Reset { removed: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Place(#[from] InstantiationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ArSession<S, T> {
    scene: S,
    tracking: T,
    store: SessionStore,
}

impl<S, T> ArSession<S, T>
where
    S: SceneProvider,
    T: TrackingProvider,
{
    pub fn new(scene: S, tracking: T, store: SessionStore) -> Self {
        Self {
            scene,
            tracking,
            store,
        }
    }

    pub fn handle(&mut self, intent: Intent) -> Result<Outcome, SessionError> {
        Ok(match intent {
            Intent::Place(kind) => Outcome::Placed(self.place(kind)?),
            Intent::Save => Outcome::Saved(self.save()?),
            Intent::Load => Outcome::Loaded(self.load()?),
            Intent::Reset => Outcome::Reset {
                removed: self.reset(),
            },
        })
    }

    /// New object at the identity pose on a freshly generated anchor
    pub fn place(&mut self, kind: ObjectKind) -> Result<Placement, InstantiationError> {
        let placement = Placement::new(kind, AnchorId::generate(), Pose::IDENTITY);
        self.scene.instantiate(&placement)?;
        log::info!("Placed {} on anchor {}", placement.kind, placement.anchor);
        Ok(placement)
    }

    pub fn save(&mut self) -> Result<SaveReport, StoreError> {
        self.store.save(&self.scene, &mut self.tracking)
    }

    pub fn load(&mut self) -> Result<LoadReport, StoreError> {
        self.reset();
        self.store.load(&mut self.scene, &mut self.tracking)
    }

    /// Remove every object; returns how many were removed
    pub fn reset(&mut self) -> usize {
        let removed = self.scene.list_placements().len();
        self.scene.clear_all();
        removed
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn tracking(&self) -> &T {
        &self.tracking
    }

    pub fn tracking_mut(&mut self) -> &mut T {
        &mut self.tracking
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn into_parts(self) -> (S, T, SessionStore) {
        (self.scene, self.tracking, self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::TrackingStatus;
    use crate::scene::{MemoryScene, MemoryTracking};
    use glam::Vec3;

    fn kind(name: &str) -> ObjectKind {
        ObjectKind::new(name).unwrap()
    }

    fn session(dir: &std::path::Path) -> ArSession<MemoryScene, MemoryTracking> {
        ArSession::new(
            MemoryScene::default(),
            MemoryTracking::with_map(b"room".to_vec()),
            SessionStore::in_dir(dir),
        )
    }

    #[test]
    fn test_place_save_reset_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());

        let Outcome::Placed(robot) = s.handle(Intent::Place(kind("robot_walk_idle"))).unwrap() else {
            panic!("expected Placed");
        };
        assert_eq!(robot.pose, Pose::IDENTITY);
        s.handle(Intent::Place(kind("toy_car"))).unwrap();

        let Outcome::Saved(saved) = s.handle(Intent::Save).unwrap() else {
            panic!("expected Saved");
        };
        assert_eq!(saved.placements, 2);
        assert_eq!(s.store().wait_for_tracking(), TrackingStatus::Written { bytes: 4 });

        let Outcome::Reset { removed } = s.handle(Intent::Reset).unwrap() else {
            panic!("expected Reset");
        };
        assert_eq!(removed, 2);
        assert!(s.scene().is_empty());

        let Outcome::Loaded(report) = s.handle(Intent::Load).unwrap() else {
            panic!("expected Loaded");
        };
        assert_eq!(report.restored, 2);
        assert_eq!(s.scene().get(&robot.anchor), Some(&robot));
    }

    #[test]
    fn test_load_replaces_current_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let saved = s.place(kind("toy_car")).unwrap();
        s.save().unwrap();

        // Placed after saving: gone after load
        let extra = s.place(kind("toy_biplane_idle")).unwrap();
        s.load().unwrap();
        assert_eq!(s.scene().get(&saved.anchor), Some(&saved));
        assert_eq!(s.scene().get(&extra.anchor), None);
    }

    #[test]
    fn test_moved_object_restores_at_saved_pose() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let mut placed = s.place(kind("toy_drummer_idle")).unwrap();

        // The user drags the object before saving
        placed.pose = placed.pose.with_translation(Vec3::new(0.3, 0.0, -0.8));
        s.scene_mut().instantiate(&placed).unwrap();
        s.save().unwrap();

        let (_, _, store) = s.into_parts();
        let mut fresh = ArSession::new(MemoryScene::default(), MemoryTracking::not_ready(), store);
        fresh.load().unwrap();
        assert_eq!(fresh.scene().get(&placed.anchor), Some(&placed));
    }

    #[test]
    fn test_place_unknown_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let err = s.handle(Intent::Place(kind("teapot"))).unwrap_err();
        assert!(matches!(err, SessionError::Place(InstantiationError::UnknownKind(_))));
    }
}
