//! Atomic file replacement and optional reads
//!
//! Writes go to a temp file in the destination directory, are synced, then
//! renamed over the target. A reader sees the old file or the new one, never
//! a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Replace `path` with `bytes` atomically
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    write_atomic_with_backup(path, bytes, None)
}

/// Replace `path` atomically, first moving the current file to `backup`
///
/// Rotation order is tmp written, old -> backup, tmp -> path. A crash between
/// the two renames leaves only the backup, which readers fall back to.
pub fn write_atomic_with_backup(path: &Path, bytes: &[u8], backup: Option<&Path>) -> io::Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if let Some(backup) = backup {
        match fs::rename(path, backup) {
            Ok(()) => log::debug!("Rotated {} -> {}", path.display(), backup.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    tmp.persist(path).map_err(|e| e.error)?;
    log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Read a whole file; `Ok(None)` if it does not exist
pub fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/session.trackingmap");
        write_atomic(&path, b"map").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"map");
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.transforms");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_backup_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.transforms");
        let backup = dir.path().join("session.transforms.bak");

        // No previous file: nothing to rotate
        write_atomic_with_backup(&path, b"one", Some(&backup)).unwrap();
        assert!(!backup.exists());

        write_atomic_with_backup(&path, b"two", Some(&backup)).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert_eq!(fs::read(&backup).unwrap(), b"one");
    }

    #[test]
    fn test_read_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        assert!(read_optional(&path).unwrap().is_none());

        fs::write(&path, b"x").unwrap();
        assert_eq!(read_optional(&path).unwrap(), Some(b"x".to_vec()));

        // A directory is present but unreadable as a file
        assert!(read_optional(dir.path()).is_err());
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        assert!(write_atomic(&blocker.join("session.transforms"), b"x").is_err());
    }
}
