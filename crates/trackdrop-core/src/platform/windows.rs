use std::env;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

pub fn get_drive_letter(path: &Path) -> Option<OsString> {
    for component in path.components() {
        if let Component::Prefix(prefix_comp) = component {
            match prefix_comp.kind() {
                std::path::Prefix::Disk(letter) | std::path::Prefix::VerbatimDisk(letter) => {
                    let drive_letter = format!("{}:", letter as char);
                    return Some(OsString::from(drive_letter));
                }
                _ => (),
            }
        }
    }
    None
}

pub fn system_drive() -> PathBuf {
    let drive = env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
    PathBuf::from(format!("{}\\", drive))
}

/// Probe every drive letter; a drive is mounted when its root is a directory.
pub fn drive_roots() -> Vec<PathBuf> {
    (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|root| root.is_dir())
        .collect()
}
