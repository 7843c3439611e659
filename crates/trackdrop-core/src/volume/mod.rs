pub mod mounts;

use crate::platform;
use std::path::{Path, PathBuf};

pub use mounts::{MountSource, StaticMounts, SystemMounts};

/// Folder names making up the two-level device signature, e.g. `Garmin/GPX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSignature {
    pub vendor_dir: String,
    pub track_dir: String,
}

impl Default for DeviceSignature {
    fn default() -> Self {
        Self {
            vendor_dir: "Garmin".to_string(),
            track_dir: "GPX".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeKind {
    Plain,
    GpsDevice { import_root: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: String,
    pub root: PathBuf,
    pub kind: VolumeKind,
}

impl Volume {
    pub fn import_root(&self) -> Option<&Path> {
        match &self.kind {
            VolumeKind::GpsDevice { import_root } => Some(import_root),
            VolumeKind::Plain => None,
        }
    }

    pub fn is_gps_device(&self) -> bool {
        self.import_root().is_some()
    }
}

/// Decide whether the volume mounted at `root` is a GPS device.
///
/// Only the fixed path `<root>/<vendor_dir>/<track_dir>` is checked, by exact
/// directory name. Nothing deeper in the tree is considered.
pub fn classify(root: &Path, signature: &DeviceSignature) -> Volume {
    let id = volume_id(root);
    let kind = match child_dir(root, &signature.vendor_dir)
        .and_then(|vendor| child_dir(&vendor, &signature.track_dir))
    {
        Some(import_root) => VolumeKind::GpsDevice { import_root },
        None => VolumeKind::Plain,
    };
    Volume {
        id,
        root: root.to_path_buf(),
        kind,
    }
}

/// Drive letter where the platform has one, otherwise the mount path.
pub fn volume_id(root: &Path) -> String {
    match platform::get_drive_letter(root) {
        Some(drive) => drive.to_string_lossy().into_owned(),
        None => root.to_string_lossy().into_owned(),
    }
}

/// Looks up an immediate subdirectory by exact name. Directory listing is used
/// rather than `Path::join(..).is_dir()` so case-insensitive filesystems still
/// require an exact match.
fn child_dir(parent: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(parent).ok()?;
    entries
        .flatten()
        .find(|entry| entry.file_name() == name && entry.path().is_dir())
        .map(|entry| entry.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_classify_gps_device() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Garmin").join("GPX").join("Archive")).unwrap();

        let volume = classify(tmp.path(), &DeviceSignature::default());
        assert_eq!(
            volume.import_root(),
            Some(tmp.path().join("Garmin").join("GPX").as_path())
        );
    }

    #[test]
    fn test_classify_requires_both_levels() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Garmin").join("Photos")).unwrap();
        assert_eq!(
            classify(tmp.path(), &DeviceSignature::default()).kind,
            VolumeKind::Plain
        );
    }

    #[test]
    fn test_classify_ignores_signature_deeper_in_tree() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("backup").join("Garmin").join("GPX")).unwrap();
        assert!(!classify(tmp.path(), &DeviceSignature::default()).is_gps_device());
    }

    #[test]
    fn test_classify_is_case_exact() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("garmin").join("gpx")).unwrap();
        assert!(!classify(tmp.path(), &DeviceSignature::default()).is_gps_device());
    }

    #[test]
    fn test_classify_file_named_like_signature() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Garmin")).unwrap();
        fs::write(tmp.path().join("Garmin").join("GPX"), "not a folder").unwrap();
        assert!(!classify(tmp.path(), &DeviceSignature::default()).is_gps_device());
    }
}
