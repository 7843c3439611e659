use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::Mutex;
use trackdrop_core::pipeline::ImportOutcome;
use trackdrop_core::{BatchReport, Error, ImportReporter, Volume};

/// What the poller thread tells the annotation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ItemSurfaced,
    PollerStopped,
}

/// Terminal reporter for the background poller.
///
/// Shows a spinner while waiting for devices and forwards newly surfaced
/// queue items to the annotation loop over `notices`.
pub struct CliReporter {
    spinner: ProgressBar,
    notices: Mutex<Sender<Notice>>,
}

impl CliReporter {
    pub fn new(notices: Sender<Notice>) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        spinner.set_message("Waiting for GPS devices...");
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            notices: Mutex::new(notices),
        }
    }

    /// Runs `f` with the spinner hidden, for interactive prompts.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.spinner.suspend(f)
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    fn notify(&self, notice: Notice) {
        let sender = self.notices.lock().unwrap_or_else(|p| p.into_inner());
        // The receiver is gone once the annotation loop has exited.
        let _ = sender.send(notice);
    }
}

impl ImportReporter for CliReporter {
    fn on_bootstrapped(&self, app_root: &Path) {
        self.spinner.println(format!(
            "  {} Local storage ready at {}",
            "✓".green(),
            app_root.display()
        ));
    }

    fn on_volume_added(&self, volume: &Volume) {
        if volume.is_gps_device() {
            self.spinner
                .println(format!("  {} GPS device on {}", "+".cyan(), volume.id.bold()));
        }
    }

    fn on_volume_removed(&self, volume: &Volume) {
        if volume.is_gps_device() {
            self.spinner
                .println(format!("  {} {} removed", "-".dimmed(), volume.id));
        }
    }

    fn on_device_deferred(&self, volume: &Volume) {
        self.spinner.println(format!(
            "  {} {} will be imported once an operation is active",
            "!".yellow(),
            volume.id
        ));
    }

    fn on_device_imported(&self, volume: &Volume, report: &BatchReport) {
        self.spinner.println(format_report(&volume.id, report));
        if report.surfaced.is_some() {
            self.notify(Notice::ItemSurfaced);
        }
    }

    fn on_volume_unreadable(&self, volume: &Volume, message: &str) {
        self.spinner.println(format!(
            "  {} Cannot read {} ({}), retrying",
            "✗".red(),
            volume.id,
            message
        ));
    }

    fn on_poller_stopped(&self, error: Option<&Error>) {
        if let Some(err) = error {
            self.spinner
                .println(format!("  {} Device watching stopped: {}", "✗".red(), err));
        }
        self.notify(Notice::PollerStopped);
    }
}

/// One summary line plus a line per rejected file.
pub fn format_report(source: &str, report: &BatchReport) -> String {
    if report.no_relevant_files() && report.outcomes.is_empty() {
        return format!("  {} No track files on {}", "·".dimmed(), source);
    }

    let mut out = format!(
        "  {} {}: {} new, {} skipped",
        "✓".green(),
        source,
        report.accepted().to_string().green(),
        report.rejected().count().to_string().yellow()
    );
    for outcome in &report.outcomes {
        if let ImportOutcome::Rejected { source, reason } = outcome {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string());
            out.push_str(&format!("\n      {} {}", name.dimmed(), reason));
        }
    }
    out
}
