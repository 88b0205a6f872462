use chrono::{DateTime, Utc};

/// Result of locating the upper end of a year's id space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryEstimate {
    pub year: u8,

    /// Highest id confirmed to exist (0 when none was found)
    pub high_water_mark: u32,

    /// Highest id probed and found empty while confirming the boundary
    pub confidence_upper: u32,

    /// Number of probe requests the search issued
    pub probes: u32,

    /// False when the search hit its id ceiling or probe budget first
    pub resolved: bool,

    pub computed_at: DateTime<Utc>,
}

impl BoundaryEstimate {
    /// The last id a batch run should visit when no explicit end is given
    ///
    /// An unresolved search with no confirmed id falls back to the hard ceiling.
    pub fn effective_end(&self, max_id: u32) -> u32 {
        if !self.resolved && self.high_water_mark == 0 {
            max_id
        } else {
            self.high_water_mark
        }
    }
}
