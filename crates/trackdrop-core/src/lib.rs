pub mod annotation;
pub mod config;
pub mod error;
pub mod hasher;
pub mod operation;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod scanner;
pub mod track;
pub mod volume;

pub use annotation::TrackAnnotation;
pub use config::AppConfig;
pub use error::Error;
pub use operation::{Operation, OperationStore};
pub use pipeline::{Advance, BatchReport, PendingItem, Pipeline, PollEvent, Poller, Status};
pub use progress::{ImportReporter, SilentReporter};
pub use track::{GpxCodec, TrackCodec, TrackFile, TrackPoint};
pub use volume::{classify, MountSource, StaticMounts, SystemMounts, Volume, VolumeKind};
