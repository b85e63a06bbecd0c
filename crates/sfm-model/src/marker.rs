use serde::{Deserialize, Serialize};

/// Occurrence statistics for one marker in a data file.
///
/// Produced fresh by every scan and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMarkerStat {
    /// Marker token without the leading backslash.
    pub marker: String,
    pub count: usize,
    /// Occurrences with no non-whitespace content.
    pub empty_count: usize,
    /// Zero-based index of the marker's first appearance among distinct markers.
    pub order: usize,
}

impl RawMarkerStat {
    pub fn new(marker: impl Into<String>, order: usize) -> Self {
        Self {
            marker: marker.into(),
            count: 0,
            empty_count: 0,
            order,
        }
    }

    /// Occurrences that carried data.
    pub fn filled_count(&self) -> usize {
        self.count.saturating_sub(self.empty_count)
    }
}
