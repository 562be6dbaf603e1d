//! In-memory scene and tracking providers
//!
//! Stand-ins for a real rendering runtime and device tracker. The CLI demo
//! drives them, and the store tests use them as collaborators.

use std::collections::{BTreeMap, BTreeSet};

use crate::consts::MODEL_CATALOG;
use crate::persistence::tracking::MapSink;
use crate::placement::{AnchorId, Placement};
use crate::provider::{InstantiationError, SceneProvider, TrackingError, TrackingProvider};

/// Anchors and the objects attached to them, keyed by anchor
#[derive(Debug, Clone)]
pub struct MemoryScene {
    catalog: BTreeSet<String>,
    anchors: BTreeMap<AnchorId, Placement>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::with_catalog(MODEL_CATALOG)
    }
}

impl MemoryScene {
    /// Scene that can only instantiate the given model kinds
    pub fn with_catalog<I, K>(kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            catalog: kinds.into_iter().map(Into::into).collect(),
            anchors: BTreeMap::new(),
        }
    }

    pub fn knows(&self, kind: &str) -> bool {
        self.catalog.contains(kind)
    }

    pub fn catalog(&self) -> impl Iterator<Item = &str> {
        self.catalog.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn get(&self, anchor: &AnchorId) -> Option<&Placement> {
        self.anchors.get(anchor)
    }
}

impl SceneProvider for MemoryScene {
    fn list_placements(&self) -> Vec<Placement> {
        self.anchors.values().cloned().collect()
    }

    fn instantiate(&mut self, placement: &Placement) -> Result<(), InstantiationError> {
        if !self.knows(placement.kind.as_str()) {
            return Err(InstantiationError::UnknownKind(placement.kind.clone()));
        }
        self.anchors
            .insert(placement.anchor.clone(), placement.clone());
        Ok(())
    }

    fn clear_all(&mut self) {
        self.anchors.clear();
    }
}

/// When a requested capture is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// Inside `capture_map`
    #[default]
    Immediate,
    /// On the next `complete_captures` call
    Deferred,
}

/// Tracker holding an opaque map blob (`None` until tracking is ready)
#[derive(Debug, Default)]
pub struct MemoryTracking {
    map: Option<Vec<u8>>,
    mode: CaptureMode,
    queued: Vec<MapSink>,
    resumed: Option<Vec<u8>>,
    reject_maps: bool,
}

impl MemoryTracking {
    pub fn with_map(map: Vec<u8>) -> Self {
        Self {
            map: Some(map),
            ..Self::default()
        }
    }

    /// Tracker with no map yet; captures deliver `None`
    pub fn not_ready() -> Self {
        Self::default()
    }

    pub fn capture_mode(mut self, mode: CaptureMode) -> Self {
        self.mode = mode;
        self
    }

    /// Refuse every map offered to `resume_from_map`
    pub fn reject_maps(mut self, reject: bool) -> Self {
        self.reject_maps = reject;
        self
    }

    pub fn set_map(&mut self, map: Option<Vec<u8>>) {
        self.map = map;
    }

    pub fn pending_captures(&self) -> usize {
        self.queued.len()
    }

    /// Deliver every deferred capture; returns how many were delivered
    pub fn complete_captures(&mut self) -> usize {
        let sinks = std::mem::take(&mut self.queued);
        let count = sinks.len();
        for sink in sinks {
            sink.deliver(self.map.clone());
        }
        count
    }

    /// Map most recently accepted by `resume_from_map`
    pub fn resumed_map(&self) -> Option<&[u8]> {
        self.resumed.as_deref()
    }
}

impl TrackingProvider for MemoryTracking {
    fn capture_map(&mut self, sink: MapSink) {
        match self.mode {
            CaptureMode::Immediate => {
                sink.deliver(self.map.clone());
            }
            CaptureMode::Deferred => self.queued.push(sink),
        }
    }

    fn resume_from_map(&mut self, map: Vec<u8>) -> Result<(), TrackingError> {
        if self.reject_maps {
            return Err(TrackingError::Rejected("relocalization failed".to_string()));
        }
        if map.is_empty() {
            return Err(TrackingError::Rejected("empty map".to_string()));
        }
        self.map = Some(map.clone());
        self.resumed = Some(map);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::ObjectKind;
    use crate::pose::Pose;

    fn place(kind: &str) -> Placement {
        Placement::new(ObjectKind::new(kind).unwrap(), AnchorId::generate(), Pose::IDENTITY)
    }

    #[test]
    fn test_scene_catalog() {
        let mut scene = MemoryScene::default();
        assert!(scene.knows("toy_drummer_idle"));
        assert!(scene.instantiate(&place("toy_car")).is_ok());
        assert_eq!(
            scene.instantiate(&place("teapot")),
            Err(InstantiationError::UnknownKind(ObjectKind::new("teapot").unwrap()))
        );
        assert_eq!(scene.len(), 1);

        scene.clear_all();
        assert!(scene.is_empty());

        let limited = MemoryScene::with_catalog(["toy_car", "robot_walk_idle"]);
        assert_eq!(limited.catalog().collect::<Vec<_>>(), vec!["robot_walk_idle", "toy_car"]);
        assert!(!limited.knows("toy_drummer_idle"));
    }

    #[test]
    fn test_instantiate_replaces_same_anchor() {
        let mut scene = MemoryScene::default();
        let first = place("toy_car");
        let second = Placement {
            kind: ObjectKind::new("robot_walk_idle").unwrap(),
            ..first.clone()
        };
        scene.instantiate(&first).unwrap();
        scene.instantiate(&second).unwrap();
        assert_eq!(scene.list_placements(), vec![second]);
    }

    #[test]
    fn test_tracking_resume_rules() {
        let mut tracking = MemoryTracking::not_ready();
        assert!(tracking.resume_from_map(Vec::new()).is_err());
        assert!(tracking.resume_from_map(vec![1, 2]).is_ok());
        assert_eq!(tracking.resumed_map(), Some(&[1u8, 2][..]));

        let mut strict = MemoryTracking::default().reject_maps(true);
        assert!(strict.resume_from_map(vec![1]).is_err());
        assert!(strict.resumed_map().is_none());
    }
}
