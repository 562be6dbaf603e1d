//! Composite storage keys: `"{kind}@{anchor}"`

use crate::consts::KEY_SEPARATOR;
use crate::placement::{AnchorId, ObjectKind};

pub fn composite_key(kind: &ObjectKind, anchor: &AnchorId) -> String {
    format!("{kind}{KEY_SEPARATOR}{anchor}")
}

/// Split on the last separator. `None` unless both halves are valid ids.
pub fn split_key(key: &str) -> Option<(ObjectKind, AnchorId)> {
    let (kind, anchor) = key.rsplit_once(KEY_SEPARATOR)?;
    Some((ObjectKind::new(kind).ok()?, AnchorId::new(anchor).ok()?))
}
