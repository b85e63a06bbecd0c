//! Per-marker statistics rows.

use sfm_model::MarkerTally;

#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub marker: String,
    pub count: usize,
    pub empty: usize,
    /// Share of occurrences carrying data, 0 to 100.
    pub usage_percent: f64,
}

impl StatsRow {
    pub fn from_tally(tally: &MarkerTally) -> Self {
        let filled = tally.count.saturating_sub(tally.empty);
        let usage_percent = if tally.count == 0 {
            0.0
        } else {
            filled as f64 * 100.0 / tally.count as f64
        };
        Self {
            marker: tally.marker.clone(),
            count: tally.count,
            empty: tally.empty,
            usage_percent,
        }
    }

    /// Sort key: case-folded marker, then the marker itself so `\Lx` and
    /// `\lx` stay distinct and ordered.
    pub fn key(&self) -> String {
        format!("{}\0{}", self.marker.to_lowercase(), self.marker)
    }
}

/// Rows for every tallied marker, sorted by [`StatsRow::key`].
pub fn stats_rows(stats: &[MarkerTally]) -> Vec<StatsRow> {
    let mut rows: Vec<StatsRow> = stats.iter().map(StatsRow::from_tally).collect();
    rows.sort_by_cached_key(StatsRow::key);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(marker: &str, count: usize, empty: usize) -> MarkerTally {
        MarkerTally {
            marker: marker.to_string(),
            count,
            empty,
        }
    }

    #[test]
    fn rows_sorted_case_insensitively() {
        let rows = stats_rows(&[
            tally("ps", 10, 0),
            tally("lx", 10, 0),
            tally("Ge", 10, 2),
            tally("ge", 1, 1),
        ]);
        let markers: Vec<&str> = rows.iter().map(|r| r.marker.as_str()).collect();
        assert_eq!(markers, vec!["Ge", "ge", "lx", "ps"]);
        assert!((rows[0].usage_percent - 80.0).abs() < f64::EPSILON);
        assert_eq!(rows[1].usage_percent, 0.0);
    }

    #[test]
    fn zero_count_has_zero_usage() {
        assert_eq!(StatsRow::from_tally(&tally("xx", 0, 0)).usage_percent, 0.0);
    }
}
