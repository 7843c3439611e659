#[cfg(target_os = "windows")]
pub mod windows;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg(target_os = "windows")]
pub fn get_drive_letter(path: &Path) -> Option<OsString> {
    windows::get_drive_letter(path)
}

#[cfg(not(target_os = "windows"))]
pub fn get_drive_letter(_path: &Path) -> Option<OsString> {
    None
}

/// Directories whose immediate children are removable volumes.
#[cfg(target_os = "windows")]
pub fn default_mount_roots() -> Vec<PathBuf> {
    Vec::new()
}

#[cfg(target_os = "macos")]
pub fn default_mount_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/Volumes")]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn default_mount_roots() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/media"),
        PathBuf::from("/run/media"),
        PathBuf::from("/mnt"),
    ]
}

#[cfg(target_os = "windows")]
pub fn default_system_volume() -> PathBuf {
    windows::system_drive()
}

#[cfg(not(target_os = "windows"))]
pub fn default_system_volume() -> PathBuf {
    PathBuf::from("/")
}

/// Volumes the OS exposes without a mount root, i.e. drive letters.
#[cfg(target_os = "windows")]
pub fn drive_roots() -> Vec<PathBuf> {
    windows::drive_roots()
}

#[cfg(not(target_os = "windows"))]
pub fn drive_roots() -> Vec<PathBuf> {
    Vec::new()
}

/// The user's home directory from the environment.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}
