use super::records::{ManifestRecord, CSV_HEADER};
use super::{check_operation_name, folder_name, manifest, Operation};
use crate::error::Error;
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const RAW_DIR: &str = "Raw";
pub const PROCESSED_DIR: &str = "Processed";

/// Which manifest CSV a record goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Track,
    Waypoint,
}

impl RecordKind {
    fn file_suffix(self) -> &'static str {
        match self {
            RecordKind::Track => "tracks",
            RecordKind::Waypoint => "waypoints",
        }
    }
}

/// Flat-file persistence for operations:
///
/// ```text
/// <root>/<Operation>/<Operation>.txt
/// <root>/<Operation>/<Operation>_tracks.csv
/// <root>/<Operation>/<Operation>_waypoints.csv
/// <root>/<Operation>/Raw/<file>
/// <root>/<Operation>/Processed/<file>
/// ```
///
/// Every write goes to each of the operation's storage paths.
#[derive(Debug, Clone)]
pub struct OperationStore {
    app_root: PathBuf,
}

impl OperationStore {
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
        }
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    /// Creates the application root. Failure here is fatal to the caller.
    pub fn bootstrap(&self) -> Result<(), Error> {
        fs::create_dir_all(&self.app_root).map_err(|source| Error::Bootstrap {
            path: self.app_root.clone(),
            source,
        })?;
        debug!("Application root ready at {}", self.app_root.display());
        Ok(())
    }

    pub fn create(
        &self,
        name: &str,
        start_time: DateTime<Utc>,
        number_of_areas: u32,
    ) -> Result<Operation, Error> {
        let name = name.trim();
        if !check_operation_name(name).is_valid() {
            return Err(Error::InvalidOperationName(name.to_string()));
        }
        let manifest_path = self.manifest_path_under(&self.app_root, &folder_name(name));
        if manifest_path.exists() {
            return Err(Error::OperationExists(name.to_string()));
        }

        self.bootstrap()?;
        let operation = Operation::new(name, start_time, number_of_areas, self.app_root.clone());
        self.persist(&operation)?;
        info!(
            "Created operation '{}' starting {}",
            operation.name, operation.start_time
        );
        Ok(operation)
    }

    /// Reads an operation file. The operation's default storage path is the
    /// directory containing the operation folder.
    pub fn load(&self, manifest_path: &Path) -> Result<Operation, Error> {
        let text = fs::read_to_string(manifest_path).map_err(|e| Error::ManifestParse {
            path: manifest_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let default_root = manifest_path
            .parent()
            .and_then(Path::parent)
            .unwrap_or(&self.app_root);
        manifest::parse(&text, manifest_path, default_root)
    }

    /// All operations under the application root that load cleanly, newest
    /// start time first. Malformed ones are logged and left out.
    pub fn load_existing_operations(&self) -> Vec<Operation> {
        let entries = match fs::read_dir(&self.app_root) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("Cannot list {}: {}", self.app_root.display(), err);
                return Vec::new();
            }
        };

        let mut operations: Vec<Operation> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let folder = entry.file_name().to_string_lossy().into_owned();
                let manifest_path = self.manifest_path_under(&self.app_root, &folder);
                if !manifest_path.is_file() {
                    return None;
                }
                match self.load(&manifest_path) {
                    Ok(operation) => Some(operation),
                    Err(err) => {
                        warn!("Skipping operation: {}", err);
                        None
                    }
                }
            })
            .collect();

        operations.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        operations
    }

    /// Looks up an operation by name (spaces or underscores).
    pub fn find(&self, name: &str) -> Result<Operation, Error> {
        let wanted = folder_name(name);
        self.load_existing_operations()
            .into_iter()
            .find(|op| op.folder_name() == wanted)
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))
    }

    /// Rewrites the operation file and ensures the folder layout under every
    /// storage path. Safe to repeat.
    pub fn persist(&self, operation: &Operation) -> Result<(), Error> {
        let text = manifest::render(operation);
        for root in operation.storage_paths() {
            let dir = self.operation_dir_under(root, operation);
            for sub in [RAW_DIR, PROCESSED_DIR] {
                let path = dir.join(sub);
                fs::create_dir_all(&path).map_err(|source| Error::Persistence { path, source })?;
            }
            let path = self.manifest_path_under(root, &operation.folder_name());
            fs::write(&path, &text).map_err(|source| Error::Persistence { path, source })?;
        }
        Ok(())
    }

    pub fn manifest_path(&self, operation: &Operation) -> PathBuf {
        self.manifest_path_under(operation.primary_root(), &operation.folder_name())
    }

    pub fn raw_dir(&self, operation: &Operation) -> PathBuf {
        self.operation_dir_under(operation.primary_root(), operation)
            .join(RAW_DIR)
    }

    pub fn processed_dir(&self, operation: &Operation) -> PathBuf {
        self.operation_dir_under(operation.primary_root(), operation)
            .join(PROCESSED_DIR)
    }

    /// Files in the primary `Raw` folder, sorted. A missing folder is empty.
    pub fn list_raw(&self, operation: &Operation) -> io::Result<Vec<PathBuf>> {
        let dir = self.raw_dir(operation);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Stores an unmodified copy of an imported file. Returns the file name
    /// used, which gets a `_<n>` suffix if `file_name` is taken.
    pub fn write_raw(
        &self,
        operation: &Operation,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, Error> {
        let chosen = self.free_name(operation, RAW_DIR, file_name);
        self.write_artifact(operation, RAW_DIR, &chosen, bytes)?;
        Ok(chosen)
    }

    pub fn write_processed(
        &self,
        operation: &Operation,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, Error> {
        let chosen = self.processed_file_name(operation, file_name);
        self.write_artifact(operation, PROCESSED_DIR, &chosen, bytes)?;
        Ok(chosen)
    }

    /// `file_name`, or a suffixed variant if the primary `Processed` folder
    /// already has it.
    pub fn processed_file_name(&self, operation: &Operation, file_name: &str) -> String {
        self.free_name(operation, PROCESSED_DIR, file_name)
    }

    /// Writes a processed artifact under exactly `file_name`, replacing any
    /// earlier copy.
    pub fn replace_processed(
        &self,
        operation: &Operation,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), Error> {
        self.write_artifact(operation, PROCESSED_DIR, file_name, bytes)
    }

    pub fn append_track_record(
        &self,
        operation: &Operation,
        record: &ManifestRecord,
    ) -> Result<(), Error> {
        self.append_record(operation, RecordKind::Track, record)
    }

    pub fn append_waypoint_record(
        &self,
        operation: &Operation,
        record: &ManifestRecord,
    ) -> Result<(), Error> {
        self.append_record(operation, RecordKind::Waypoint, record)
    }

    /// Appends `record` to the `kind` CSV under one storage root only.
    pub fn append_record_at(
        &self,
        root: &Path,
        operation: &Operation,
        kind: RecordKind,
        record: &ManifestRecord,
    ) -> Result<(), Error> {
        let path = self.csv_path_under(root, operation, kind);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| Error::Persistence {
                path: path.clone(),
                source,
            })?;
        let is_new = file
            .metadata()
            .map(|m| m.len() == 0)
            .map_err(|source| Error::Persistence {
                path: path.clone(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(CSV_HEADER)?;
        }
        writer.serialize(record)?;
        writer
            .flush()
            .map_err(|source| Error::Persistence { path, source })
    }

    /// Rows of the primary CSV for `kind`. A missing file has no rows.
    pub fn read_records(
        &self,
        operation: &Operation,
        kind: RecordKind,
    ) -> Result<Vec<ManifestRecord>, Error> {
        let path = self.csv_path_under(operation.primary_root(), operation, kind);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let records = reader
            .deserialize::<ManifestRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn csv_path(&self, operation: &Operation, kind: RecordKind) -> PathBuf {
        self.csv_path_under(operation.primary_root(), operation, kind)
    }

    fn append_record(
        &self,
        operation: &Operation,
        kind: RecordKind,
        record: &ManifestRecord,
    ) -> Result<(), Error> {
        for root in operation.storage_paths() {
            self.append_record_at(root, operation, kind, record)?;
        }
        Ok(())
    }

    fn free_name(&self, operation: &Operation, sub_dir: &str, file_name: &str) -> String {
        let primary_dir = self
            .operation_dir_under(operation.primary_root(), operation)
            .join(sub_dir);
        unique_file_name(&primary_dir, file_name)
    }

    /// Writes `file_name` under every storage root. If any root fails, the
    /// copies already written by this call are removed again.
    fn write_artifact(
        &self,
        operation: &Operation,
        sub_dir: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), Error> {
        let mut written: Vec<PathBuf> = Vec::new();
        for root in operation.storage_paths() {
            let dir = self.operation_dir_under(root, operation).join(sub_dir);
            let path = dir.join(file_name);
            let result = fs::create_dir_all(&dir)
                .map_err(|source| Error::Persistence {
                    path: dir.clone(),
                    source,
                })
                .and_then(|()| {
                    fs::write(&path, bytes).map_err(|source| Error::Persistence {
                        path: path.clone(),
                        source,
                    })
                });
            if let Err(err) = result {
                for done in &written {
                    if let Err(cleanup) = fs::remove_file(done) {
                        warn!("Could not remove partial copy {}: {}", done.display(), cleanup);
                    }
                }
                return Err(err);
            }
            written.push(path);
        }
        debug!("Wrote {}/{} for '{}'", sub_dir, file_name, operation.name);
        Ok(())
    }

    fn operation_dir_under(&self, root: &Path, operation: &Operation) -> PathBuf {
        root.join(operation.folder_name())
    }

    fn manifest_path_under(&self, root: &Path, folder: &str) -> PathBuf {
        root.join(folder).join(format!("{}.txt", folder))
    }

    fn csv_path_under(&self, root: &Path, operation: &Operation, kind: RecordKind) -> PathBuf {
        let folder = operation.folder_name();
        root.join(&folder)
            .join(format!("{}_{}.csv", folder, kind.file_suffix()))
    }
}

/// `name` if free in `dir`, otherwise `stem_1.ext`, `stem_2.ext`, ...
fn unique_file_name(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| format!("{}_{}{}", stem, n, extension))
        .find(|candidate| !dir.join(candidate).exists())
        .unwrap_or_else(|| name.to_string())
}
