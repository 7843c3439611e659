#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use trackdrop_core::{AppConfig, TrackAnnotation};

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
}

/// GPX 1.1 document with one track segment. Points are (lat, lon, ele, time).
pub fn gpx_track(points: &[(f64, f64, f64, &str)]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <gpx version=\"1.1\" creator=\"eTrex 30\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n\
         <trk><name>Spor</name><trkseg>\n",
    );
    for (lat, lon, ele, time) in points {
        out.push_str(&format!(
            "<trkpt lat=\"{}\" lon=\"{}\"><ele>{}</ele><time>{}</time></trkpt>\n",
            lat, lon, ele, time
        ));
    }
    out.push_str("</trkseg></trk>\n</gpx>\n");
    out
}

/// GPX 1.1 document with waypoints only. Points are (lat, lon, time).
pub fn gpx_waypoints(points: &[(f64, f64, &str)]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <gpx version=\"1.1\" creator=\"eTrex 30\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n",
    );
    for (lat, lon, time) in points {
        out.push_str(&format!(
            "<wpt lat=\"{}\" lon=\"{}\"><time>{}</time><name>Funn</name></wpt>\n",
            lat, lon, time
        ));
    }
    out.push_str("</gpx>\n");
    out
}

/// The 09:00 + 11:00 track used throughout the scenarios.
pub fn morning_track() -> String {
    gpx_track(&[
        (59.91, 10.71, 120.0, "2024-06-01T09:00:00Z"),
        (59.92, 10.72, 125.5, "2024-06-01T11:00:00Z"),
    ])
}

/// Creates `<volume>/Garmin/GPX` and returns it.
pub fn make_device(volume: &Path) -> PathBuf {
    let import_root = volume.join("Garmin").join("GPX");
    fs::create_dir_all(&import_root).unwrap();
    import_root
}

pub fn test_config(app_root: &Path, system_volume: &Path) -> AppConfig {
    AppConfig {
        app_root: app_root.to_path_buf(),
        mount_roots: Vec::new(),
        system_volume: system_volume.to_path_buf(),
        ..Default::default()
    }
}

pub fn annotation(track_number: u32) -> TrackAnnotation {
    TrackAnnotation {
        crew_type: "Mannskap".to_string(),
        crew_number: 3,
        crew_count: 4,
        areas_searched: [1, 2].into_iter().collect(),
        track_number,
        comment: format!("spor {}", track_number),
    }
}
