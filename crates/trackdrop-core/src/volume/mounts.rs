use crate::platform;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Source of the currently mounted volume roots.
pub trait MountSource: Send {
    fn mounted(&self) -> io::Result<Vec<PathBuf>>;
}

/// Mounted volumes as seen by the operating system: the system volume, any
/// drive letters, and the immediate children of each mount root.
#[derive(Debug, Clone)]
pub struct SystemMounts {
    mount_roots: Vec<PathBuf>,
    system_volume: PathBuf,
}

impl SystemMounts {
    pub fn new(mount_roots: Vec<PathBuf>, system_volume: PathBuf) -> Self {
        Self {
            mount_roots,
            system_volume,
        }
    }
}

impl MountSource for SystemMounts {
    fn mounted(&self) -> io::Result<Vec<PathBuf>> {
        let mut volumes = vec![self.system_volume.clone()];

        for drive in platform::drive_roots() {
            if !volumes.contains(&drive) {
                volumes.push(drive);
            }
        }

        for root in &self.mount_roots {
            let entries = match fs::read_dir(root) {
                Ok(entries) => entries,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    debug!("Mount root {} does not exist", root.display());
                    continue;
                }
                Err(err) => {
                    warn!("Cannot list mount root {}: {}", root.display(), err);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() && !volumes.contains(&path) {
                    volumes.push(path);
                }
            }
        }

        Ok(volumes)
    }
}

/// Fixed list of mounts, for callers that track volumes themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticMounts(pub Vec<PathBuf>);

impl MountSource for StaticMounts {
    fn mounted(&self) -> io::Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_children_of_mount_roots_are_volumes() {
        let media = tempdir().unwrap();
        let system = tempdir().unwrap();
        fs::create_dir(media.path().join("GARMIN")).unwrap();
        fs::create_dir(media.path().join("USB STICK")).unwrap();
        fs::write(media.path().join("stray.txt"), "x").unwrap();

        let mounts = SystemMounts::new(
            vec![media.path().to_path_buf(), media.path().join("missing")],
            system.path().to_path_buf(),
        );
        let mut found = mounts.mounted().unwrap();
        found.sort();

        let mut expected = vec![
            system.path().to_path_buf(),
            media.path().join("GARMIN"),
            media.path().join("USB STICK"),
        ];
        expected.sort();
        assert_eq!(found, expected);
    }
}
