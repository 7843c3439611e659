use std::io;
use std::path::{Path, PathBuf};
use tracing::error;
use walkdir::WalkDir;

/// Recursively collects files under `root` whose extension matches
/// `extension` (case-insensitive). Skips symlinks and 0-byte files.
///
/// The result is sorted by path so discovery order is deterministic.
/// Failing to read `root` itself is an error; unreadable subdirectories are
/// logged and skipped.
pub fn discover_track_files(root: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry_result in WalkDir::new(root).follow_links(false) {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                if err.depth() == 0 {
                    return Err(io::Error::from(err));
                }
                error!("Skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if !has_extension(entry.path(), extension) {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) if metadata.len() > 0 => found.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => error!(
                "Error getting metadata for {}: {}",
                entry.path().display(),
                err
            ),
        }
    }

    found.sort();
    Ok(found)
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
}
