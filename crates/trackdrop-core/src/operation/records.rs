use crate::annotation::TrackAnnotation;
use crate::track::TrackFile;
use serde::{Deserialize, Serialize};

pub const CSV_HEADER: [&str; 11] = [
    "Lagtype",
    "Lagnummer",
    "Antall mann",
    "Teiger",
    "Lengde",
    "Spornummer",
    "Kommentar",
    "Tid",
    "Original fil",
    "Prosessert fil",
    "Original hash",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One manifest CSV row for a processed track or waypoint file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    #[serde(rename = "Lagtype")]
    pub crew_type: String,
    #[serde(rename = "Lagnummer")]
    pub crew_number: u32,
    #[serde(rename = "Antall mann")]
    pub crew_count: u32,
    #[serde(rename = "Teiger")]
    pub areas: String,
    #[serde(rename = "Lengde")]
    pub length_km: String,
    #[serde(rename = "Spornummer")]
    pub track_number: u32,
    #[serde(rename = "Kommentar")]
    pub comment: String,
    #[serde(rename = "Tid")]
    pub time: String,
    #[serde(rename = "Original fil")]
    pub original_file: String,
    #[serde(rename = "Prosessert fil")]
    pub processed_file: String,
    #[serde(rename = "Original hash")]
    pub original_hash: String,
}

impl ManifestRecord {
    /// Builds the row for `processed`. Waypoint files leave the length empty.
    pub fn new(
        annotation: &TrackAnnotation,
        processed: &TrackFile,
        original_file: &str,
        processed_file: &str,
        original_hash: &str,
    ) -> Self {
        let length_km = if processed.segments.is_empty() {
            String::new()
        } else {
            format!("{:.2}", processed.length_km())
        };
        let time = processed
            .time_span()
            .map(|(first, last)| {
                format!("{} - {}", first.format(TIME_FORMAT), last.format(TIME_FORMAT))
            })
            .unwrap_or_default();

        Self {
            crew_type: annotation.crew_type.trim().to_string(),
            crew_number: annotation.crew_number,
            crew_count: annotation.crew_count,
            areas: annotation.areas_joined(","),
            length_km,
            track_number: annotation.track_number,
            comment: annotation.comment.clone(),
            time,
            original_file: original_file.to_string(),
            processed_file: processed_file.to_string(),
            original_hash: original_hash.to_string(),
        }
    }
}
