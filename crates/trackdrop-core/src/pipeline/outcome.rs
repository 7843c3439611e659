use crate::operation::ManifestRecord;
use crate::track::{TrackFile, TrackKind};
use crate::volume::Volume;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// An accepted file waiting in the import queue.
#[derive(Debug, Clone)]
pub struct ImportCandidate {
    pub id: u64,
    pub source: PathBuf,
    pub source_filename: String,
    /// Name of the unmodified copy in the operation's `Raw` folder.
    pub raw_filename: String,
    pub track: TrackFile,
    pub kind: TrackKind,
    pub raw_content_hash: String,
    /// Processed name picked by an earlier finalize attempt that failed.
    pub processed_filename: Option<String>,
    /// Storage roots whose manifest CSV already has this item's row.
    pub recorded_roots: Vec<PathBuf>,
}

/// Read-only view of the queue head handed to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingItem {
    pub id: u64,
    pub source_filename: String,
    pub raw_filename: String,
    pub kind: TrackKind,
    pub point_count: usize,
    pub time_span: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Items queued behind this one.
    pub remaining: usize,
}

impl PendingItem {
    pub(crate) fn from_candidate(candidate: &ImportCandidate, remaining: usize) -> Self {
        Self {
            id: candidate.id,
            source_filename: candidate.source_filename.clone(),
            raw_filename: candidate.raw_filename.clone(),
            kind: candidate.kind,
            point_count: candidate.track.relevant_points().len(),
            time_span: candidate.track.time_span(),
            remaining,
        }
    }
}

/// Why a file was not queued. None of these are errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Unreadable(String),
    Unparseable(String),
    Empty,
    Duplicate,
    Stale { last_point: DateTime<Utc> },
    WriteFailed(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Unreadable(msg) => write!(f, "unreadable ({})", msg),
            Rejection::Unparseable(msg) => write!(f, "not a valid track file ({})", msg),
            Rejection::Empty => write!(f, "no track points or waypoints"),
            Rejection::Duplicate => write!(f, "already imported"),
            Rejection::Stale { last_point } => {
                write!(f, "ends before the operation started (last point {})", last_point)
            }
            Rejection::WriteFailed(msg) => write!(f, "raw copy could not be written ({})", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Accepted { source: PathBuf, item_id: u64 },
    Rejected { source: PathBuf, reason: Rejection },
}

/// Result of importing one batch of files (a device or a manual pick).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<ImportOutcome>,
    /// Set when the queue was empty before the batch and now has a head.
    pub surfaced: Option<PendingItem>,
}

impl BatchReport {
    pub fn accepted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ImportOutcome::Accepted { .. }))
            .count()
    }

    pub fn rejected(&self) -> impl Iterator<Item = (&PathBuf, &Rejection)> {
        self.outcomes.iter().filter_map(|o| match o {
            ImportOutcome::Rejected { source, reason } => Some((source, reason)),
            ImportOutcome::Accepted { .. } => None,
        })
    }

    pub fn no_relevant_files(&self) -> bool {
        self.accepted() == 0
    }
}

/// Where the queue stands after the head was finalized or skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    AwaitingAnnotation(PendingItem),
    QueueEmpty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    AwaitingAnnotation(PendingItem),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    pub processed_filename: String,
    pub record: ManifestRecord,
    pub next: Advance,
}

/// Something that happened during one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Bootstrapped(PathBuf),
    VolumeAdded(Volume),
    VolumeRemoved(Volume),
    /// A GPS device appeared while no operation was active.
    DeviceDeferred(Volume),
    DeviceImported { volume: Volume, report: BatchReport },
    VolumeUnreadable { volume: Volume, message: String },
}
