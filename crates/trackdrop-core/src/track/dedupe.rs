use super::TrackFile;

/// A candidate duplicates an existing file when both hold the same kind of
/// content, the same number of relevant points, and every point pair at the
/// same index has identical latitude, longitude and elevation.
///
/// File names, whole-file checksums and timestamps are not compared.
pub fn is_duplicate<'a, I>(candidate: &TrackFile, existing: I) -> bool
where
    I: IntoIterator<Item = &'a TrackFile>,
{
    existing
        .into_iter()
        .any(|stored| same_point_sequence(candidate, stored))
}

pub fn same_point_sequence(a: &TrackFile, b: &TrackFile) -> bool {
    if a.kind() != b.kind() {
        return false;
    }
    let a_points = a.relevant_points();
    let b_points = b.relevant_points();
    a_points.len() == b_points.len()
        && a_points
            .iter()
            .zip(b_points.iter())
            .all(|(p, q)| p.same_position(q))
}
