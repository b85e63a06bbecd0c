//! Structured phase-1 import log.

use serde::{Deserialize, Serialize};

/// A single error or warning, optionally tied to a data-file line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub line: Option<usize>,
    pub message: String,
}

/// Errors or warnings: a total count plus the entries listed in detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSection {
    pub count: usize,
    pub entries: Vec<LogEntry>,
}

impl LogSection {
    /// Maximum number of entries listed in detail per section.
    pub const MAX_LISTED: usize = 100;

    /// Count the entry; keep its detail only while under the listing cap.
    pub fn record(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.count += 1;
        if self.entries.len() < Self::MAX_LISTED {
            self.entries.push(LogEntry {
                line,
                message: message.into(),
            });
        }
    }

    /// Number of entries listed in detail.
    pub fn listed(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// A field that arrived out of sequence within an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfOrderCaution {
    /// Headword (begin-field text) of the entry the field appeared in.
    pub entry: String,
    /// Class the field belongs to.
    pub class: String,
    pub marker: String,
    pub line: usize,
}

/// Per-marker counts seen by phase 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerTally {
    pub marker: String,
    pub count: usize,
    pub empty: usize,
}

/// The structured log written next to the phase-1 output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase1Log {
    pub errors: LogSection,
    pub warnings: LogSection,
    pub out_of_order: Vec<OutOfOrderCaution>,
    /// Number of top-level records built.
    pub records: usize,
    pub stats: Vec<MarkerTally>,
}

impl Phase1Log {
    pub fn tally(&mut self, marker: &str, empty: bool) {
        let index = match self.stats.iter().position(|t| t.marker == marker) {
            Some(index) => index,
            None => {
                self.stats.push(MarkerTally {
                    marker: marker.to_string(),
                    count: 0,
                    empty: 0,
                });
                self.stats.len() - 1
            }
        };
        let tally = &mut self.stats[index];
        tally.count += 1;
        if empty {
            tally.empty += 1;
        }
    }
}
