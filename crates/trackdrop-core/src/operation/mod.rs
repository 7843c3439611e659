pub mod manifest;
pub mod records;
pub mod store;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub use records::ManifestRecord;
pub use store::OperationStore;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;

/// One search-and-rescue mission: all imported data is scoped to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub number_of_areas: u32,
    /// Roots the operation folder is written under. Never empty; the first
    /// one is primary.
    storage_paths: Vec<PathBuf>,
}

impl Operation {
    pub fn new(
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        number_of_areas: u32,
        primary_root: PathBuf,
    ) -> Self {
        Self {
            name: name.into(),
            start_time,
            number_of_areas,
            storage_paths: vec![primary_root],
        }
    }

    /// Folder and manifest stem: the name with spaces replaced by underscores.
    pub fn folder_name(&self) -> String {
        folder_name(&self.name)
    }

    pub fn primary_root(&self) -> &Path {
        &self.storage_paths[0]
    }

    pub fn storage_paths(&self) -> &[PathBuf] {
        &self.storage_paths
    }

    pub fn update_start_time(&mut self, start_time: DateTime<Utc>) {
        self.start_time = start_time;
    }

    /// Returns false when the path is already present.
    pub fn add_storage_path(&mut self, path: PathBuf) -> bool {
        if self.storage_paths.contains(&path) {
            return false;
        }
        self.storage_paths.push(path);
        true
    }
}

pub fn folder_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Outcome of the two independent name rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameCheck {
    pub length_ok: bool,
    pub charset_ok: bool,
}

impl NameCheck {
    pub fn is_valid(&self) -> bool {
        self.length_ok && self.charset_ok
    }
}

/// Names are 2 to 50 characters of letters, digits and spaces.
pub fn check_operation_name(name: &str) -> NameCheck {
    let len = name.chars().count();
    NameCheck {
        length_ok: (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len),
        charset_ok: len > 0 && name.chars().all(|c| c.is_alphanumeric() || c == ' '),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_with_slash_fails_charset() {
        let check = check_operation_name("Søk/Nord");
        assert!(check.length_ok);
        assert!(!check.charset_ok);
    }

    #[test]
    fn test_two_chars_pass_length() {
        assert!(check_operation_name("ab").is_valid());
        assert!(!check_operation_name("a").length_ok);
    }

    #[test]
    fn test_empty_fails_both() {
        assert_eq!(
            check_operation_name(""),
            NameCheck {
                length_ok: false,
                charset_ok: false
            }
        );
    }

    #[test]
    fn test_unicode_letters_and_length_limit() {
        assert!(check_operation_name("Søk ved Åsen 2").is_valid());
        assert!(!check_operation_name(&"x".repeat(51)).length_ok);
        assert!(check_operation_name(&"x".repeat(50)).length_ok);
        assert!(!check_operation_name("Leting_Nord").charset_ok);
    }

    #[test]
    fn test_storage_paths_are_an_ordered_set() {
        let mut op = Operation::new("Leting Nord", Utc::now(), 3, PathBuf::from("/data"));
        assert!(op.add_storage_path(PathBuf::from("/backup")));
        assert!(!op.add_storage_path(PathBuf::from("/data")));
        assert_eq!(
            op.storage_paths(),
            [PathBuf::from("/data"), PathBuf::from("/backup")]
        );
        assert_eq!(op.folder_name(), "Leting_Nord");
    }
}
