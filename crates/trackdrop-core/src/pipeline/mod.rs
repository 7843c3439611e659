pub mod outcome;
pub mod poller;

use crate::annotation::TrackAnnotation;
use crate::config::AppConfig;
use crate::error::Error;
use crate::hasher;
use crate::operation::store::RecordKind;
use crate::operation::{ManifestRecord, Operation, OperationStore};
use crate::scanner;
use crate::track::{self, TrackCodec, TrackFile, TrackKind};
use crate::volume::{self, MountSource, Volume};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

pub use outcome::{
    Advance, BatchReport, Finalized, ImportCandidate, ImportOutcome, PendingItem, PollEvent,
    Rejection, Status,
};
pub use poller::{Poller, PollerHandle};

struct RegisteredVolume {
    volume: Volume,
    /// GPS device still to be imported (no active operation yet, or unreadable).
    pending: bool,
}

#[derive(Default)]
struct PipelineState {
    volumes: BTreeMap<String, RegisteredVolume>,
    queue: VecDeque<ImportCandidate>,
    operation: Option<Operation>,
    /// Parsed contents of the active operation's `Raw` folder.
    raw_index: Vec<TrackFile>,
    bootstrapped: bool,
    next_item_id: u64,
}

/// Owns the volume registry, the import queue and the active operation.
///
/// Every method takes the internal lock for the whole read-modify-write, so a
/// `Pipeline` can be shared through an `Arc` between the poller thread and the
/// operator's control path.
pub struct Pipeline {
    config: AppConfig,
    store: OperationStore,
    codec: Box<dyn TrackCodec>,
    state: Mutex<PipelineState>,
}

impl Pipeline {
    pub fn new(config: AppConfig, codec: Box<dyn TrackCodec>) -> Self {
        let store = OperationStore::new(config.app_root.clone());
        Self {
            config,
            store,
            codec,
            state: Mutex::new(PipelineState::default()),
        }
    }

    pub fn store(&self) -> &OperationStore {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        // A panic while holding the lock leaves the state structurally intact.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes `operation` the active one and indexes its `Raw` folder for
    /// duplicate checks. Items queued for a previous operation are dropped;
    /// their raw copies stay on disk.
    pub fn activate_operation(&self, operation: Operation) -> Result<(), Error> {
        let raw_index = self.load_raw_index(&operation)?;
        let mut state = self.lock();
        if !state.queue.is_empty() {
            warn!(
                "Dropping {} queued item(s) while switching operation",
                state.queue.len()
            );
            state.queue.clear();
        }
        info!(
            "Operation '{}' active ({} raw file(s) indexed)",
            operation.name,
            raw_index.len()
        );
        state.raw_index = raw_index;
        state.operation = Some(operation);
        Ok(())
    }

    pub fn active_operation(&self) -> Option<Operation> {
        self.lock().operation.clone()
    }

    /// Changes the active operation's start time and re-persists it.
    /// Queued items are not re-checked for staleness.
    pub fn update_start_time(&self, start_time: DateTime<Utc>) -> Result<Operation, Error> {
        let mut state = self.lock();
        let mut updated = state.operation.clone().ok_or(Error::NoActiveOperation)?;
        updated.update_start_time(start_time);
        self.store.persist(&updated)?;
        state.operation = Some(updated.clone());
        Ok(updated)
    }

    /// Adds a storage root to the active operation and re-persists it.
    pub fn add_storage_path(&self, path: PathBuf) -> Result<bool, Error> {
        let mut state = self.lock();
        let mut updated = state.operation.clone().ok_or(Error::NoActiveOperation)?;
        if !updated.add_storage_path(path) {
            return Ok(false);
        }
        self.store.persist(&updated)?;
        state.operation = Some(updated);
        Ok(true)
    }

    pub fn status(&self) -> Status {
        match self.current() {
            Some(item) => Status::AwaitingAnnotation(item),
            None => Status::Idle,
        }
    }

    pub fn current(&self) -> Option<PendingItem> {
        let state = self.lock();
        state
            .queue
            .front()
            .map(|head| PendingItem::from_candidate(head, state.queue.len() - 1))
    }

    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn known_volumes(&self) -> Vec<Volume> {
        self.lock()
            .volumes
            .values()
            .map(|registered| registered.volume.clone())
            .collect()
    }

    /// One poll cycle: reconcile the registry with `mounts`, bootstrap the
    /// application root when the system volume is first seen, and import
    /// every GPS device still pending.
    ///
    /// Only a failed bootstrap is returned as an error.
    pub fn poll(&self, mounts: &dyn MountSource) -> Result<Vec<PollEvent>, Error> {
        let mounted = match mounts.mounted() {
            Ok(mounted) => mounted,
            Err(err) => {
                warn!("Cannot enumerate mounted volumes: {}", err);
                return Ok(Vec::new());
            }
        };
        let mounted: BTreeMap<String, PathBuf> = mounted
            .into_iter()
            .map(|root| (volume::volume_id(&root), root))
            .collect();

        let mut events = Vec::new();

        let new_roots: Vec<PathBuf> = {
            let mut state = self.lock();
            let gone: Vec<String> = state
                .volumes
                .keys()
                .filter(|id| !mounted.contains_key(*id))
                .cloned()
                .collect();
            for id in gone {
                if let Some(registered) = state.volumes.remove(&id) {
                    info!("Volume {} removed", id);
                    events.push(PollEvent::VolumeRemoved(registered.volume));
                }
            }
            mounted
                .iter()
                .filter(|(id, _)| !state.volumes.contains_key(*id))
                .map(|(_, root)| root.clone())
                .collect()
        };

        let signature = self.config.device_signature();
        for root in new_roots {
            let volume = volume::classify(&root, &signature);

            if root == self.config.system_volume {
                if let Some(event) = self.bootstrap_once()? {
                    events.push(event);
                }
            }

            info!(
                "Volume {} added{}",
                volume.id,
                if volume.is_gps_device() { " (GPS device)" } else { "" }
            );
            let pending = volume.is_gps_device();
            let mut state = self.lock();
            events.push(PollEvent::VolumeAdded(volume.clone()));
            if pending && state.operation.is_none() {
                events.push(PollEvent::DeviceDeferred(volume.clone()));
            }
            state
                .volumes
                .insert(volume.id.clone(), RegisteredVolume { volume, pending });
        }

        let pending: Vec<Volume> = {
            let state = self.lock();
            if state.operation.is_none() {
                Vec::new()
            } else {
                state
                    .volumes
                    .values()
                    .filter(|registered| registered.pending)
                    .map(|registered| registered.volume.clone())
                    .collect()
            }
        };

        for volume in pending {
            match self.handle_device(&volume) {
                Ok(report) => {
                    self.mark_handled(&volume.id);
                    events.push(PollEvent::DeviceImported { volume, report });
                }
                Err(Error::VolumeUnreadable { source, .. }) => {
                    warn!("Skipping volume {} this cycle: {}", volume.id, source);
                    events.push(PollEvent::VolumeUnreadable {
                        volume,
                        message: source.to_string(),
                    });
                }
                Err(Error::NoActiveOperation) => {}
                Err(err) => {
                    error!("Import from {} failed: {}", volume.id, err);
                    self.mark_handled(&volume.id);
                }
            }
        }

        Ok(events)
    }

    fn bootstrap_once(&self) -> Result<Option<PollEvent>, Error> {
        if self.lock().bootstrapped {
            return Ok(None);
        }
        self.store.bootstrap()?;
        self.lock().bootstrapped = true;
        info!("Local storage ready at {}", self.store.app_root().display());
        Ok(Some(PollEvent::Bootstrapped(
            self.store.app_root().to_path_buf(),
        )))
    }

    fn mark_handled(&self, volume_id: &str) {
        if let Some(registered) = self.lock().volumes.get_mut(volume_id) {
            registered.pending = false;
        }
    }

    /// Imports every track file under the device's import root, in sorted
    /// path order. Plain volumes yield an empty report.
    pub fn handle_device(&self, volume: &Volume) -> Result<BatchReport, Error> {
        let Some(import_root) = volume.import_root() else {
            return Ok(BatchReport::default());
        };
        let files = scanner::discover_track_files(import_root, &self.config.track_extension)
            .map_err(|source| Error::VolumeUnreadable {
                volume: volume.id.clone(),
                source,
            })?;
        debug!("{} candidate file(s) on {}", files.len(), volume.id);
        let report = self.import_files(&files)?;
        if report.no_relevant_files() {
            info!("No relevant files on {}", volume.id);
        }
        Ok(report)
    }

    /// Manual import of a single file; same rules as a device batch.
    pub fn import_file(&self, path: &Path) -> Result<BatchReport, Error> {
        self.import_files(&[path.to_path_buf()])
    }

    /// Reads, parses and screens `paths`, queueing accepted files in the
    /// order given. Accepted files are copied to `Raw` immediately.
    pub fn import_files(&self, paths: &[PathBuf]) -> Result<BatchReport, Error> {
        if self.lock().operation.is_none() {
            return Err(Error::NoActiveOperation);
        }

        let mut outcomes = Vec::with_capacity(paths.len());
        let mut parsed = Vec::with_capacity(paths.len());
        for path in paths {
            match self.read_candidate(path) {
                Ok((bytes, track)) => parsed.push((path.clone(), bytes, track)),
                Err(reason) => outcomes.push(ImportOutcome::Rejected {
                    source: path.clone(),
                    reason,
                }),
            }
        }

        let mut state = self.lock();
        let operation = state.operation.clone().ok_or(Error::NoActiveOperation)?;
        let was_empty = state.queue.is_empty();

        for (source, bytes, track) in parsed {
            let kind = match screen(&track, &state.raw_index, operation.start_time) {
                Ok(kind) => kind,
                Err(reason) => {
                    info!("Rejected {}: {}", source.display(), reason);
                    outcomes.push(ImportOutcome::Rejected { source, reason });
                    continue;
                }
            };

            let source_filename = source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("import.{}", self.codec.extension()));
            let raw_filename = match self.store.write_raw(&operation, &source_filename, &bytes) {
                Ok(name) => name,
                Err(err) => {
                    error!("Could not store raw copy of {}: {}", source.display(), err);
                    outcomes.push(ImportOutcome::Rejected {
                        source,
                        reason: Rejection::WriteFailed(err.to_string()),
                    });
                    continue;
                }
            };

            state.next_item_id += 1;
            let id = state.next_item_id;
            info!("Accepted {} as item {}", source.display(), id);
            state.raw_index.push(track.clone());
            state.queue.push_back(ImportCandidate {
                id,
                source: source.clone(),
                source_filename,
                raw_filename,
                track,
                kind,
                raw_content_hash: hasher::hash_data(&bytes),
                processed_filename: None,
                recorded_roots: Vec::new(),
            });
            outcomes.push(ImportOutcome::Accepted {
                source,
                item_id: id,
            });
        }

        // Report in the caller's order, not parse-then-screen order.
        outcomes.sort_by_key(|outcome| {
            let source = match outcome {
                ImportOutcome::Accepted { source, .. } | ImportOutcome::Rejected { source, .. } => {
                    source
                }
            };
            paths.iter().position(|p| p == source)
        });

        let surfaced = if was_empty {
            state
                .queue
                .front()
                .map(|head| PendingItem::from_candidate(head, state.queue.len() - 1))
        } else {
            None
        };

        Ok(BatchReport { outcomes, surfaced })
    }

    /// Trims the in-flight item to the operation window, writes the processed
    /// artifact and manifest row, and advances the queue. On any failure the
    /// item stays at the head of the queue so the call can be retried; a
    /// retry reuses the processed file name and skips storage roots whose
    /// manifest already has the row.
    pub fn finalize_current(&self, annotation: &TrackAnnotation) -> Result<Finalized, Error> {
        let mut state = self.lock();
        let operation = state.operation.clone().ok_or(Error::NoActiveOperation)?;
        let item = state.queue.front_mut().ok_or(Error::NoActiveItem)?;
        annotation.validate(operation.number_of_areas)?;

        let processed = match item.kind {
            TrackKind::Track => track::trim(&item.track, operation.start_time),
            TrackKind::Waypoints => item.track.clone(),
        };
        let bytes = self
            .codec
            .serialize(&processed)
            .map_err(|e| Error::TrackSerialize {
                path: item.source.clone(),
                message: e.to_string(),
            })?;

        let processed_filename = match item.processed_filename.clone() {
            Some(name) => name,
            None => {
                let file_name = self.config.generate_filename(
                    &operation.folder_name(),
                    annotation,
                    Utc::now(),
                    self.codec.extension(),
                );
                let name = self.store.processed_file_name(&operation, &file_name);
                item.processed_filename = Some(name.clone());
                name
            }
        };
        self.store.replace_processed(&operation, &processed_filename, &bytes)?;

        let record = ManifestRecord::new(
            annotation,
            &processed,
            &item.raw_filename,
            &processed_filename,
            &item.raw_content_hash,
        );
        let record_kind = match item.kind {
            TrackKind::Track => RecordKind::Track,
            TrackKind::Waypoints => RecordKind::Waypoint,
        };
        for root in operation.storage_paths() {
            if item.recorded_roots.contains(root) {
                continue;
            }
            self.store.append_record_at(root, &operation, record_kind, &record)?;
            item.recorded_roots.push(root.clone());
        }
        info!(
            "Finalized item {} as {} ({} point(s))",
            item.id,
            processed_filename,
            processed.relevant_points().len()
        );

        state.queue.pop_front();
        Ok(Finalized {
            processed_filename,
            record,
            next: advance(&state),
        })
    }

    /// Drops the in-flight item without writing a processed artifact or
    /// manifest row. Its raw copy is kept.
    pub fn skip_current(&self) -> Result<Advance, Error> {
        let mut state = self.lock();
        let skipped = state.queue.pop_front().ok_or(Error::NoActiveItem)?;
        info!("Skipped item {} ({})", skipped.id, skipped.source_filename);
        Ok(advance(&state))
    }

    fn read_candidate(&self, path: &Path) -> Result<(Vec<u8>, TrackFile), Rejection> {
        let bytes = hasher::read_full_file(path).map_err(|e| {
            warn!("Cannot read {}: {}", path.display(), e);
            Rejection::Unreadable(e.to_string())
        })?;
        let track = self.codec.parse(&bytes).map_err(|e| {
            let err = Error::TrackParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            };
            warn!("{}", err);
            Rejection::Unparseable(e.to_string())
        })?;
        Ok((bytes, track))
    }

    fn load_raw_index(&self, operation: &Operation) -> Result<Vec<TrackFile>, Error> {
        let mut index = Vec::new();
        for path in self.store.list_raw(operation)? {
            if !scanner::has_extension(&path, self.codec.extension()) {
                continue;
            }
            match hasher::read_full_file(&path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| self.codec.parse(&bytes).map_err(|e| e.to_string()))
            {
                Ok(track) => index.push(track),
                Err(message) => warn!("Raw file {} not indexed: {}", path.display(), message),
            }
        }
        Ok(index)
    }
}

/// Acceptance policy: non-empty, not a duplicate, not stale, in that order.
fn screen(
    track: &TrackFile,
    raw_index: &[TrackFile],
    start_time: DateTime<Utc>,
) -> Result<TrackKind, Rejection> {
    let kind = track.kind().ok_or(Rejection::Empty)?;
    if track::is_duplicate(track, raw_index) {
        return Err(Rejection::Duplicate);
    }
    if track::is_stale(track, start_time) {
        let last_point = track::last_timestamp(track).unwrap_or(start_time);
        return Err(Rejection::Stale { last_point });
    }
    Ok(kind)
}

fn advance(state: &PipelineState) -> Advance {
    match state.queue.front() {
        Some(head) => {
            Advance::AwaitingAnnotation(PendingItem::from_candidate(head, state.queue.len() - 1))
        }
        None => Advance::QueueEmpty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackPoint;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn track(hours: &[u32]) -> TrackFile {
        TrackFile {
            segments: vec![hours
                .iter()
                .map(|&h| TrackPoint::new(60.0 + h as f64 / 100.0, 10.0).with_time(at(h)))
                .collect()],
            ..Default::default()
        }
    }

    #[test]
    fn test_screen_order() {
        let start = at(10);
        assert_eq!(
            screen(&TrackFile::default(), &[], start),
            Err(Rejection::Empty)
        );
        assert_eq!(
            screen(&track(&[8, 9]), &[track(&[8, 9])], start),
            Err(Rejection::Duplicate)
        );
        assert_eq!(
            screen(&track(&[8, 9]), &[], start),
            Err(Rejection::Stale { last_point: at(9) })
        );
        assert_eq!(screen(&track(&[9, 11]), &[], start), Ok(TrackKind::Track));
    }
}
