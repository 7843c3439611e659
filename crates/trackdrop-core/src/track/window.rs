use super::TrackFile;
use chrono::{DateTime, Utc};

/// A file is stale when its last timestamped relevant point is strictly
/// earlier than `start`. Files without any timestamps are never stale.
pub fn is_stale(track: &TrackFile, start: DateTime<Utc>) -> bool {
    last_timestamp(track).map_or(false, |last| last < start)
}

/// Timestamp of the last relevant point that has one, in recorded order.
pub fn last_timestamp(track: &TrackFile) -> Option<DateTime<Utc>> {
    track.relevant_points().into_iter().rev().find_map(|p| p.time)
}

/// Returns a copy of `track` whose points before `start` are dropped and whose
/// remaining points are collapsed into a single segment. Untimed points are kept.
/// Waypoints are carried over unchanged.
pub fn trim(track: &TrackFile, start: DateTime<Utc>) -> TrackFile {
    let kept: Vec<_> = track
        .points()
        .filter(|p| p.time.map_or(true, |t| t >= start))
        .cloned()
        .collect();

    let segments = if track.segments.is_empty() {
        Vec::new()
    } else {
        vec![kept]
    };

    TrackFile {
        name: track.name.clone(),
        segments,
        waypoints: track.waypoints.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackPoint;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    fn sample() -> TrackFile {
        TrackFile {
            name: Some("Lag 1".into()),
            segments: vec![
                vec![
                    TrackPoint::new(60.0, 10.0).with_time(at(9, 0)),
                    TrackPoint::new(60.1, 10.1).with_time(at(9, 59)),
                ],
                vec![
                    TrackPoint::new(60.2, 10.2).with_time(at(10, 0)),
                    TrackPoint::new(60.3, 10.3).with_time(at(11, 0)),
                ],
            ],
            waypoints: vec![TrackPoint::new(60.5, 10.5).with_time(at(8, 0))],
        }
    }

    #[test]
    fn test_stale_when_last_point_before_start() {
        let track = sample();
        assert!(is_stale(&track, at(11, 1)));
        assert!(!is_stale(&track, at(11, 0)));
        assert!(!is_stale(&track, at(6, 0)));
    }

    #[test]
    fn test_untimed_track_is_never_stale() {
        let track = TrackFile {
            segments: vec![vec![TrackPoint::new(60.0, 10.0)]],
            ..Default::default()
        };
        assert!(!is_stale(&track, at(23, 0)));
    }

    #[test]
    fn test_stale_uses_last_timestamped_point() {
        let mut track = sample();
        track.segments[1].push(TrackPoint::new(60.4, 10.4));
        assert!(is_stale(&track, at(12, 0)));
    }

    #[test]
    fn test_trim_drops_points_strictly_before_start() {
        let trimmed = trim(&sample(), at(10, 0));
        assert_eq!(trimmed.segments.len(), 1);
        let times: Vec<_> = trimmed.points().map(|p| p.time.unwrap()).collect();
        assert_eq!(times, vec![at(10, 0), at(11, 0)]);
        assert_eq!(trimmed.waypoints, sample().waypoints);
    }

    #[test]
    fn test_trim_is_idempotent() {
        let start = at(9, 30);
        let once = trim(&sample(), start);
        let twice = trim(&once, start);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_trim_before_all_points_only_flattens() {
        let track = sample();
        let trimmed = trim(&track, at(9, 0) - Duration::hours(1));
        let original: Vec<_> = track.points().cloned().collect();
        assert_eq!(trimmed.segments, vec![original]);
    }

    #[test]
    fn test_trim_after_all_points_leaves_empty_segment() {
        let trimmed = trim(&sample(), at(12, 0));
        assert_eq!(trimmed.point_count(), 0);
        assert_eq!(trimmed.segments.len(), 1);
    }

    #[test]
    fn test_trim_keeps_untimed_points_in_order() {
        let mut track = sample();
        track.segments[0].insert(1, TrackPoint::new(61.0, 11.0));
        let trimmed = trim(&track, at(10, 0));
        let lats: Vec<_> = trimmed.points().map(|p| p.lat).collect();
        assert_eq!(lats, vec![61.0, 60.2, 60.3]);
    }
}
