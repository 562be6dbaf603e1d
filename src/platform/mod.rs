//! Platform abstraction layer
//!
//! Resolves the per-user directory sessions are stored in.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Used when no home directory can be determined
const FALLBACK_DIR: &str = "ar-session";

/// Per-user data directory for saved sessions
pub fn default_storage_dir() -> PathBuf {
    match ProjectDirs::from("", "", "ar-persistence") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => {
            log::warn!("No home directory found, storing sessions in ./{FALLBACK_DIR}");
            PathBuf::from(FALLBACK_DIR)
        }
    }
}
