use crate::annotation::TrackAnnotation;
use crate::platform;
use crate::volume::{DeviceSignature, SystemMounts};
use chrono::{DateTime, Utc};
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FILENAME_PATTERN: &str =
    "{crew_type}_{crew_number}_{areas}_{track_number}_{timestamp}";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_root: PathBuf,
    pub mount_roots: Vec<PathBuf>,
    pub system_volume: PathBuf,
    pub poll_interval_secs: u64,
    pub vendor_dir: String,
    pub track_dir: String,
    pub track_extension: String,
    pub filename_pattern: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let signature = DeviceSignature::default();
        Self {
            app_root: platform::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("trackdrop"),
            mount_roots: platform::default_mount_roots(),
            system_volume: platform::default_system_volume(),
            poll_interval_secs: 5,
            vendor_dir: signature.vendor_dir,
            track_dir: signature.track_dir,
            track_extension: "gpx".to_string(),
            filename_pattern: DEFAULT_FILENAME_PATTERN.to_string(),
        }
    }
}

/// Loads `Config.toml` (optional) overlaid with `TRACKDROP_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("TRACKDROP"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

impl AppConfig {
    pub fn device_signature(&self) -> DeviceSignature {
        DeviceSignature {
            vendor_dir: self.vendor_dir.clone(),
            track_dir: self.track_dir.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn system_mounts(&self) -> SystemMounts {
        SystemMounts::new(self.mount_roots.clone(), self.system_volume.clone())
    }

    /// Output file name for a processed artifact, with `extension` appended.
    pub fn generate_filename(
        &self,
        operation: &str,
        annotation: &TrackAnnotation,
        at: DateTime<Utc>,
        extension: &str,
    ) -> String {
        let stem = self
            .filename_pattern
            .replace("{operation}", operation)
            .replace("{crew_type}", annotation.crew_type.trim())
            .replace("{crew_number}", &annotation.crew_number.to_string())
            .replace("{crew_count}", &annotation.crew_count.to_string())
            .replace("{areas}", &annotation.areas_joined("-"))
            .replace("{track_number}", &annotation.track_number.to_string())
            .replace("{timestamp}", &at.format(TIMESTAMP_FORMAT).to_string());
        format!("{}.{}", sanitize_file_name(&stem), extension)
    }
}

/// Replaces characters that are not allowed in file names on common platforms.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
