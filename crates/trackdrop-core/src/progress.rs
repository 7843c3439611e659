use crate::error::Error;
use crate::pipeline::{BatchReport, PollEvent};
use crate::volume::Volume;
use std::path::Path;

/// Trait for surfacing what the background poller does.
///
/// The CLI implements it with terminal output; tests use [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ImportReporter: Send + Sync {
    fn on_bootstrapped(&self, _app_root: &Path) {}
    fn on_volume_added(&self, _volume: &Volume) {}
    fn on_volume_removed(&self, _volume: &Volume) {}
    fn on_device_deferred(&self, _volume: &Volume) {}
    fn on_device_imported(&self, _volume: &Volume, _report: &BatchReport) {}
    fn on_volume_unreadable(&self, _volume: &Volume, _message: &str) {}
    fn on_poller_stopped(&self, _error: Option<&Error>) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl ImportReporter for SilentReporter {}

pub fn dispatch(reporter: &dyn ImportReporter, event: &PollEvent) {
    match event {
        PollEvent::Bootstrapped(root) => reporter.on_bootstrapped(root),
        PollEvent::VolumeAdded(volume) => reporter.on_volume_added(volume),
        PollEvent::VolumeRemoved(volume) => reporter.on_volume_removed(volume),
        PollEvent::DeviceDeferred(volume) => reporter.on_device_deferred(volume),
        PollEvent::DeviceImported { volume, report } => {
            reporter.on_device_imported(volume, report)
        }
        PollEvent::VolumeUnreadable { volume, message } => {
            reporter.on_volume_unreadable(volume, message)
        }
    }
}
