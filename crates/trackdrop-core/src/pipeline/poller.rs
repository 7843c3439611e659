use super::Pipeline;
use crate::progress::{self, ImportReporter};
use crate::volume::MountSource;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Background volume poller. All registry and queue mutations it causes go
/// through the shared [`Pipeline`].
pub struct Poller;

pub struct PollerHandle {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn(
        pipeline: Arc<Pipeline>,
        mounts: Box<dyn MountSource>,
        interval: Duration,
        reporter: Arc<dyn ImportReporter>,
    ) -> io::Result<PollerHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("volume-poller".to_string())
            .spawn(move || run(&pipeline, mounts.as_ref(), interval, &*reporter, &thread_stop))?;

        Ok(PollerHandle {
            stop,
            handle: Some(handle),
        })
    }
}

fn run(
    pipeline: &Pipeline,
    mounts: &dyn MountSource,
    interval: Duration,
    reporter: &dyn ImportReporter,
    stop: &AtomicBool,
) {
    debug!("Volume poller started ({:?} interval)", interval);
    while !stop.load(Ordering::SeqCst) {
        match pipeline.poll(mounts) {
            Ok(events) => {
                for event in &events {
                    progress::dispatch(reporter, event);
                }
            }
            Err(err) => {
                error!("Volume poller stopping: {}", err);
                reporter.on_poller_stopped(Some(&err));
                return;
            }
        }

        let next = Instant::now() + interval;
        while Instant::now() < next && !stop.load(Ordering::SeqCst) {
            thread::sleep(STOP_CHECK_INTERVAL.min(next.saturating_duration_since(Instant::now())));
        }
    }
    debug!("Volume poller stopped");
    reporter.on_poller_stopped(None);
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Requests shutdown and waits for the current cycle to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Volume poller panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
