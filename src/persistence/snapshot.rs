//! In-memory pose map built on every save

use std::collections::BTreeMap;

use super::codec::{self, EncodedPose};
use super::key::composite_key;
use crate::placement::Placement;

/// Composite key -> encoded pose. Built fresh from live state, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    placements: BTreeMap<String, EncodedPose>,
}

impl SessionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode every placement; later duplicates overwrite earlier ones
    pub fn capture<'a>(placements: impl IntoIterator<Item = &'a Placement>) -> Self {
        let mut snapshot = Self::new();
        for placement in placements {
            snapshot.insert(placement);
        }
        snapshot
    }

    /// Insert one placement, returning the pose it replaced (if any)
    pub fn insert(&mut self, placement: &Placement) -> Option<EncodedPose> {
        let key = composite_key(&placement.kind, &placement.anchor);
        self.insert_encoded(key, codec::encode(&placement.pose))
    }

    /// Insert an already-encoded entry under a raw key
    pub fn insert_encoded(&mut self, key: String, encoded: EncodedPose) -> Option<EncodedPose> {
        let previous = self.placements.insert(key, encoded);
        if previous.is_some() {
            log::debug!("Duplicate placement key overwritten");
        }
        previous
    }

    pub fn get(&self, key: &str) -> Option<&EncodedPose> {
        self.placements.get(key)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EncodedPose)> {
        self.placements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{AnchorId, ObjectKind};
    use crate::pose::Pose;
    use glam::Vec3;

    fn placement(kind: &str, anchor: &str, x: f32) -> Placement {
        Placement::new(
            ObjectKind::new(kind).unwrap(),
            AnchorId::new(anchor).unwrap(),
            Pose::IDENTITY.with_translation(Vec3::new(x, 0.0, 0.0)),
        )
    }

    #[test]
    fn test_capture_keys() {
        let placements = [placement("robot_walk_idle", "A1", 1.0), placement("toy_car", "A2", 2.0)];
        let snapshot = SessionSnapshot::capture(&placements);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("robot_walk_idle@A1").is_some());
        assert_eq!(snapshot.get("toy_car@A2").unwrap().translation(), "[2,0,0]");
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let placements = [placement("toy_car", "A1", 1.0), placement("toy_car", "A1", 5.0)];
        let snapshot = SessionSnapshot::capture(&placements);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("toy_car@A1").unwrap().translation(), "[5,0,0]");
    }
}
