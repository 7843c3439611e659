use crate::error::Error;
use std::collections::BTreeSet;

/// Operator-supplied metadata for the item currently awaiting annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackAnnotation {
    pub crew_type: String,
    pub crew_number: u32,
    pub crew_count: u32,
    pub areas_searched: BTreeSet<u32>,
    pub track_number: u32,
    pub comment: String,
}

impl TrackAnnotation {
    /// Area ids joined with `sep`, ascending.
    pub fn areas_joined(&self, sep: &str) -> String {
        self.areas_searched
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// Checks the annotation against an operation with `number_of_areas`
    /// areas. Zero areas disables the range check.
    pub fn validate(&self, number_of_areas: u32) -> Result<(), Error> {
        if self.crew_type.trim().is_empty() {
            return Err(Error::InvalidAnnotation("crew type is empty".to_string()));
        }
        if number_of_areas > 0 {
            if let Some(area) = self
                .areas_searched
                .iter()
                .find(|&&area| area == 0 || area > number_of_areas)
            {
                return Err(Error::InvalidAnnotation(format!(
                    "area {} is outside 1..={}",
                    area, number_of_areas
                )));
            }
        }
        Ok(())
    }
}
