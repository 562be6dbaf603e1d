//! Versioned JSON envelope with a BLAKE3 integrity digest
//!
//! ```json
//! { "version": 1, "digest": "<hex>", "placements": { "toy_car@A1": ["[..]", "[..]", "[..]"] } }
//! ```
//!
//! The digest covers the compact serialization of `placements`. A truncated
//! file or an unknown version fails to open as a whole and nothing from it is
//! applied. A digest mismatch on a well-formed document only marks it
//! unverified: entry values stay raw JSON so each one is checked on its own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::snapshot::SessionSnapshot;
use crate::consts::FORMAT_VERSION;

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("not a valid envelope: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    digest: String,
    placements: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

/// Parsed placements, entries not yet decoded
#[derive(Debug, Clone, Default)]
pub struct StoredPlacements {
    pub version: u32,
    /// False if the digest did not match (entries edited or damaged on disk)
    pub verified: bool,
    pub entries: BTreeMap<String, Value>,
}

fn digest(placements: &BTreeMap<String, Value>) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(placements)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Serialize a snapshot into envelope bytes
pub fn seal(snapshot: &SessionSnapshot) -> Result<Vec<u8>, serde_json::Error> {
    let placements = snapshot
        .iter()
        .map(|(key, pose)| Ok((key.clone(), serde_json::to_value(pose)?)))
        .collect::<Result<BTreeMap<_, _>, serde_json::Error>>()?;

    let envelope = Envelope {
        version: FORMAT_VERSION,
        digest: digest(&placements)?,
        placements,
    };
    serde_json::to_vec_pretty(&envelope)
}

/// Parse envelope bytes and check the digest
pub fn open(bytes: &[u8]) -> Result<StoredPlacements, EnvelopeError> {
    let header: Header = serde_json::from_slice(bytes)?;
    if header.version != FORMAT_VERSION {
        return Err(EnvelopeError::UnsupportedVersion(header.version));
    }

    let envelope: Envelope = serde_json::from_slice(bytes)?;
    let verified = digest(&envelope.placements)? == envelope.digest;

    Ok(StoredPlacements {
        version: envelope.version,
        verified,
        entries: envelope.placements,
    })
}
