pub mod codec;
pub mod dedupe;
pub mod window;

use chrono::{DateTime, Utc};

pub use codec::{CodecError, GpxCodec, TrackCodec};
pub use dedupe::is_duplicate;
pub use window::{is_stale, last_timestamp, trim};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A single recorded position. Used for both track points and waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            elevation: None,
            time: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Same position: latitude, longitude and elevation compared exactly.
    pub fn same_position(&self, other: &TrackPoint) -> bool {
        self.lat == other.lat && self.lon == other.lon && self.elevation == other.elevation
    }
}

/// In-memory model of one track file as produced by a [`TrackCodec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackFile {
    pub name: Option<String>,
    pub segments: Vec<Vec<TrackPoint>>,
    pub waypoints: Vec<TrackPoint>,
}

/// What a parsed file holds, which decides how it is compared and recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Track,
    Waypoints,
}

impl TrackFile {
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// All track points across segments, in recorded order.
    pub fn points(&self) -> impl Iterator<Item = &TrackPoint> {
        self.segments.iter().flatten()
    }

    /// `None` when the file holds neither track points nor waypoints.
    pub fn kind(&self) -> Option<TrackKind> {
        if self.point_count() > 0 {
            Some(TrackKind::Track)
        } else if !self.waypoints.is_empty() {
            Some(TrackKind::Waypoints)
        } else {
            None
        }
    }

    /// The point sequence relevant for the file's kind.
    pub fn relevant_points(&self) -> Vec<&TrackPoint> {
        match self.kind() {
            Some(TrackKind::Track) => self.points().collect(),
            Some(TrackKind::Waypoints) => self.waypoints.iter().collect(),
            None => Vec::new(),
        }
    }

    /// Earliest and latest timestamp among the relevant points.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut times = self.relevant_points().into_iter().filter_map(|p| p.time);
        let first = times.next()?;
        let (min, max) = times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        Some((min, max))
    }

    /// Great-circle length of the track in kilometres. Segment breaks are not bridged.
    pub fn length_km(&self) -> f64 {
        self.segments
            .iter()
            .map(|segment| {
                segment
                    .windows(2)
                    .map(|pair| haversine_km(&pair[0], &pair[1]))
                    .sum::<f64>()
            })
            .sum()
    }
}

pub fn haversine_km(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_prefers_track_points() {
        let mut file = TrackFile::default();
        assert_eq!(file.kind(), None);

        file.waypoints.push(TrackPoint::new(60.0, 10.0));
        assert_eq!(file.kind(), Some(TrackKind::Waypoints));

        file.segments.push(vec![TrackPoint::new(60.1, 10.1)]);
        assert_eq!(file.kind(), Some(TrackKind::Track));
        assert_eq!(file.relevant_points().len(), 1);
    }

    #[test]
    fn test_length_of_one_degree_latitude() {
        let file = TrackFile {
            segments: vec![vec![TrackPoint::new(60.0, 10.0), TrackPoint::new(61.0, 10.0)]],
            ..Default::default()
        };
        let km = file.length_km();
        assert!((km - 111.19).abs() < 0.1, "got {}", km);
    }
}
