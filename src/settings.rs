//! Store settings
//!
//! Where a session is stored and what its artifacts are called. Loaded from
//! an optional JSON file; every field falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{BACKUP_SUFFIX, TRACKING_FILE, TRANSFORMS_FILE};
use crate::platform;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Session directory (created on first save)
    pub dir: PathBuf,
    /// Pose map file name
    pub transforms_file: String,
    /// Tracking map file name
    pub tracking_file: String,
    /// Keep the previous pose map as `<transforms_file>.bak`
    pub keep_backup: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dir: platform::default_storage_dir(),
            transforms_file: TRANSFORMS_FILE.to_string(),
            tracking_file: TRACKING_FILE.to_string(),
            keep_backup: true,
        }
    }
}

impl StoreSettings {
    /// Default file names in a specific directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Ignoring invalid settings {}: {e}", path.display()),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Cannot read settings {}: {e}", path.display()),
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn transforms_path(&self) -> PathBuf {
        self.dir.join(&self.transforms_file)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}{}", self.transforms_file, BACKUP_SUFFIX))
    }

    pub fn tracking_path(&self) -> PathBuf {
        self.dir.join(&self.tracking_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let settings = StoreSettings::in_dir("/tmp/session");
        assert_eq!(settings.transforms_path(), Path::new("/tmp/session/session.transforms"));
        assert_eq!(settings.backup_path(), Path::new("/tmp/session/session.transforms.bak"));
        assert_eq!(settings.tracking_path(), Path::new("/tmp/session/session.trackingmap"));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "dir": "/data/ar", "keep_backup": false }"#).unwrap();

        let settings = StoreSettings::load(&path);
        assert_eq!(settings.dir, PathBuf::from("/data/ar"));
        assert!(!settings.keep_backup);
        assert_eq!(settings.transforms_file, TRANSFORMS_FILE);
    }

    #[test]
    fn test_load_missing_or_invalid_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(StoreSettings::load(&dir.path().join("nope.json")), StoreSettings::default());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert_eq!(StoreSettings::load(&bad), StoreSettings::default());
    }
}
