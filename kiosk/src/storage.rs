use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::KioskError;

/// Sub-directory created on each removable drive.
pub const PHOTO_DIR: &str = "photobooth";

/// Pick the directory this session's photos are written to.
///
/// Every entry under `media_root` (in name order) is a candidate mount; the
/// first one where `<mount>/photobooth` exists or can be created wins. With
/// no usable drive the `fallback` directory is created and used instead, and
/// only a failure to create that is an error.
pub fn resolve_output_dir(media_root: &Path, fallback: &Path) -> Result<PathBuf, KioskError> {
    let mut mounts: Vec<PathBuf> = match std::fs::read_dir(media_root) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(e) => {
            debug!(root = %media_root.display(), error = %e, "no removable media root");
            Vec::new()
        }
    };
    mounts.sort();

    for mount in mounts {
        let candidate = mount.join(PHOTO_DIR);
        match std::fs::create_dir_all(&candidate) {
            Ok(()) => {
                info!(path = %candidate.display(), "saving to removable media");
                return Ok(candidate);
            }
            Err(e) => {
                warn!(path = %candidate.display(), error = %e, "cannot use removable media");
            }
        }
    }

    std::fs::create_dir_all(fallback).map_err(|source| KioskError::Storage {
        path: fallback.to_path_buf(),
        source,
    })?;
    info!(path = %fallback.display(), "saving to local fallback directory");
    Ok(fallback.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;

    #[test]
    fn picks_the_mount_that_accepts_the_directory() {
        let media = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        // A plain file cannot hold a sub-directory, so "AAA" fails.
        std::fs::write(media.path().join("AAA"), b"not a drive").unwrap();
        std::fs::create_dir(media.path().join("USB1")).unwrap();

        let dir = resolve_output_dir(media.path(), &local.path().join(PHOTO_DIR)).unwrap();
        assert_eq!(dir, media.path().join("USB1").join(PHOTO_DIR));
        assert!(dir.is_dir());
    }

    #[test]
    fn first_usable_mount_in_name_order_wins() {
        let media = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        for name in ["USB2", "USB1"] {
            std::fs::create_dir(media.path().join(name)).unwrap();
        }
        let dir = resolve_output_dir(media.path(), &local.path().join(PHOTO_DIR)).unwrap();
        assert_eq!(dir, media.path().join("USB1").join(PHOTO_DIR));
    }

    #[test]
    fn existing_photo_dir_is_reused() {
        let media = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let existing = media.path().join("STICK").join(PHOTO_DIR);
        std::fs::create_dir_all(&existing).unwrap();
        std::fs::write(existing.join("old_1of3.jpg"), b"jpeg").unwrap();

        let dir = resolve_output_dir(media.path(), &local.path().join(PHOTO_DIR)).unwrap();
        assert_eq!(dir, existing);
        assert!(dir.join("old_1of3.jpg").exists());
    }

    #[test]
    fn no_media_falls_back() {
        let local = tempfile::tempdir().unwrap();
        let fallback = local.path().join(PHOTO_DIR);
        let dir = resolve_output_dir(&local.path().join("media-missing"), &fallback).unwrap();
        assert_eq!(dir, fallback);
        assert!(fallback.is_dir());
    }

    #[test]
    fn all_failing_mounts_fall_back() {
        let media = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        std::fs::write(media.path().join("USB1"), b"").unwrap();
        std::fs::create_dir(media.path().join("USB2")).unwrap();
        // photobooth exists as a file on USB2
        std::fs::write(media.path().join("USB2").join(PHOTO_DIR), b"").unwrap();

        let fallback = local.path().join(PHOTO_DIR);
        assert_eq!(resolve_output_dir(media.path(), &fallback).unwrap(), fallback);
    }

    #[test]
    fn uncreatable_fallback_is_a_storage_fault() {
        let local = tempfile::tempdir().unwrap();
        let blocker = local.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let err = resolve_output_dir(&local.path().join("none"), &blocker.join(PHOTO_DIR))
            .unwrap_err();
        assert_eq!(err.kind(), FaultKind::Storage);
    }
}
