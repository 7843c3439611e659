use super::{check_operation_name, Operation};
use crate::error::Error;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

const KEY_NAME: &str = "name";
const KEY_AREAS: &str = "numberOfAreas";
const KEY_START: &str = "starttime";
const KEY_STORAGE: &str = "storagepath";

const HEADER: &str = "# trackdrop operation file\n# Lines starting with # are ignored\n";

/// Renders the `key=value` operation file.
pub fn render(operation: &Operation) -> String {
    let mut out = String::from(HEADER);
    out.push_str(&format!("{}={}\n", KEY_NAME, operation.folder_name()));
    out.push_str(&format!("{}={}\n", KEY_AREAS, operation.number_of_areas));
    out.push_str(&format!(
        "{}={}\n",
        KEY_START,
        operation.start_time.timestamp_millis()
    ));
    for root in operation.storage_paths() {
        out.push_str(&format!("{}={}\n", KEY_STORAGE, root.display()));
    }
    out
}

/// Parses an operation file. `default_root` becomes the only storage path when
/// the file lists none. `path` is only used in error messages.
pub fn parse(text: &str, path: &Path, default_root: &Path) -> Result<Operation, Error> {
    let malformed = |message: String| Error::ManifestParse {
        path: path.to_path_buf(),
        message,
    };

    let mut name = None;
    let mut number_of_areas = None;
    let mut start_time = None;
    let mut storage_paths: Vec<PathBuf> = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| malformed(format!("line {} has no '='", index + 1)))?;
        let value = value.trim();
        match key.trim() {
            KEY_NAME => {
                if value.is_empty() {
                    return Err(malformed("empty name".to_string()));
                }
                name = Some(value.replace('_', " "));
            }
            KEY_AREAS => {
                let areas = value
                    .parse::<u32>()
                    .map_err(|_| malformed(format!("{} is not a number: '{}'", KEY_AREAS, value)))?;
                number_of_areas = Some(areas);
            }
            KEY_START => {
                start_time = Some(parse_millis(value).ok_or_else(|| {
                    malformed(format!("{} is not epoch millis: '{}'", KEY_START, value))
                })?);
            }
            KEY_STORAGE => {
                let root = PathBuf::from(value);
                if !value.is_empty() && !storage_paths.contains(&root) {
                    storage_paths.push(root);
                }
            }
            _ => {}
        }
    }

    if storage_paths.is_empty() {
        storage_paths.push(default_root.to_path_buf());
    }

    let name = name.ok_or_else(|| malformed(format!("missing {}", KEY_NAME)))?;
    if !check_operation_name(&name).is_valid() {
        return Err(malformed(format!("invalid operation name '{}'", name)));
    }

    Ok(Operation {
        name,
        number_of_areas: number_of_areas
            .ok_or_else(|| malformed(format!("missing {}", KEY_AREAS)))?,
        start_time: start_time.ok_or_else(|| malformed(format!("missing {}", KEY_START)))?,
        storage_paths,
    })
}

fn parse_millis(value: &str) -> Option<DateTime<Utc>> {
    let millis = value.parse::<i64>().ok()?;
    DateTime::<Utc>::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn path() -> PathBuf {
        PathBuf::from("/data/Leting_Nord/Leting_Nord.txt")
    }

    #[test]
    fn test_parse_minimal_file() {
        let text = "# comment\nname=Leting_Nord\nnumberOfAreas=5\nstarttime=1717236000000\n";
        let op = parse(text, &path(), Path::new("/data")).unwrap();
        assert_eq!(op.name, "Leting Nord");
        assert_eq!(op.number_of_areas, 5);
        assert_eq!(
            op.start_time,
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(op.storage_paths, vec![PathBuf::from("/data")]);
    }

    #[test]
    fn test_render_then_parse_keeps_storage_order() {
        let op = Operation {
            name: "Leting Nord".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            number_of_areas: 12,
            storage_paths: vec![PathBuf::from("/data"), PathBuf::from("/backup")],
        };
        let text = render(&op);
        assert!(text.contains("name=Leting_Nord\n"));
        assert!(text.contains("starttime=1717236000000\n"));
        assert_eq!(parse(&text, &path(), Path::new("/elsewhere")).unwrap(), op);
    }

    #[test]
    fn test_non_numeric_areas_is_parse_error() {
        let text = "name=Leting_Nord\nnumberOfAreas=abc\nstarttime=1717236000000\n";
        assert!(matches!(
            parse(text, &path(), Path::new("/data")),
            Err(Error::ManifestParse { .. })
        ));
    }

    #[test]
    fn test_name_must_pass_name_rules() {
        for name in ["Søk/Nord", "..", "A"] {
            let text = format!("name={}\nnumberOfAreas=1\nstarttime=0\n", name);
            assert!(
                matches!(
                    parse(&text, &path(), Path::new("/data")),
                    Err(Error::ManifestParse { .. })
                ),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_missing_required_keys() {
        for text in [
            "numberOfAreas=1\nstarttime=0\n",
            "name=X1\nstarttime=0\n",
            "name=X1\nnumberOfAreas=1\n",
            "name=X1\nnumberOfAreas=1\nstarttime=yesterday\n",
        ] {
            assert!(parse(text, &path(), Path::new("/data")).is_err(), "{}", text);
        }
    }
}
