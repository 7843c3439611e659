use super::{TrackFile, TrackPoint};
use chrono::{DateTime, Utc};
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("{0}")]
    Malformed(String),

    #[error("timestamp out of range: {0}")]
    Timestamp(String),
}

/// Parse/serialize contract between raw file bytes and [`TrackFile`].
pub trait TrackCodec: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<TrackFile, CodecError>;
    fn serialize(&self, track: &TrackFile) -> Result<Vec<u8>, CodecError>;
    /// File suffix (without dot) of files this codec reads and writes.
    fn extension(&self) -> &str;
}

const CREATOR: &str = "trackdrop";

#[derive(Debug, Clone, Copy, Default)]
pub struct GpxCodec;

impl TrackCodec for GpxCodec {
    fn parse(&self, bytes: &[u8]) -> Result<TrackFile, CodecError> {
        let gpx = gpx::read(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;

        let mut segments = Vec::new();
        let mut name = None;
        for track in &gpx.tracks {
            if name.is_none() {
                name = track.name.clone();
            }
            for segment in &track.segments {
                let points = segment
                    .points
                    .iter()
                    .map(from_waypoint)
                    .collect::<Result<Vec<_>, _>>()?;
                segments.push(points);
            }
        }

        let waypoints = gpx
            .waypoints
            .iter()
            .map(from_waypoint)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TrackFile {
            name,
            segments,
            waypoints,
        })
    }

    fn serialize(&self, track: &TrackFile) -> Result<Vec<u8>, CodecError> {
        let mut gpx = Gpx {
            version: GpxVersion::Gpx11,
            creator: Some(CREATOR.to_string()),
            ..Default::default()
        };

        gpx.waypoints = track
            .waypoints
            .iter()
            .map(to_waypoint)
            .collect::<Result<Vec<_>, _>>()?;

        if !track.segments.is_empty() {
            let mut gpx_track = Track::new();
            gpx_track.name = track.name.clone();
            for segment in &track.segments {
                let mut gpx_segment = TrackSegment::new();
                gpx_segment.points = segment
                    .iter()
                    .map(to_waypoint)
                    .collect::<Result<Vec<_>, _>>()?;
                gpx_track.segments.push(gpx_segment);
            }
            gpx.tracks.push(gpx_track);
        }

        let mut buffer = Vec::new();
        gpx::write(&gpx, &mut buffer).map_err(|e| CodecError::Malformed(e.to_string()))?;
        Ok(buffer)
    }

    fn extension(&self) -> &str {
        "gpx"
    }
}

fn from_waypoint(waypoint: &Waypoint) -> Result<TrackPoint, CodecError> {
    let point = waypoint.point();
    let time = match waypoint.time {
        Some(t) => {
            let odt: OffsetDateTime = t.into();
            let converted = DateTime::<Utc>::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
                .ok_or_else(|| CodecError::Timestamp(odt.to_string()))?;
            Some(converted)
        }
        None => None,
    };
    Ok(TrackPoint {
        lat: point.y(),
        lon: point.x(),
        elevation: waypoint.elevation,
        time,
    })
}

fn to_waypoint(point: &TrackPoint) -> Result<Waypoint, CodecError> {
    let mut waypoint = Waypoint::new(Point::new(point.lon, point.lat));
    waypoint.elevation = point.elevation;
    if let Some(t) = point.time {
        let odt = OffsetDateTime::from_unix_timestamp(t.timestamp())
            .and_then(|odt| odt.replace_nanosecond(t.timestamp_subsec_nanos()))
            .map_err(|e| CodecError::Timestamp(e.to_string()))?;
        waypoint.time = Some(odt.into());
    }
    Ok(waypoint)
}
