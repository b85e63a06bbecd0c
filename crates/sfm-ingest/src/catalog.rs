//! Per-marker statistics for a data file.

use std::collections::BTreeMap;
use std::path::Path;

use sfm_model::RawMarkerStat;

use crate::error::Result;
use crate::reader::{SfmField, read_sfm_file};

/// Occurrence statistics for every marker in one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerCatalog {
    stats: BTreeMap<String, RawMarkerStat>,
    total_fields: usize,
}

impl MarkerCatalog {
    /// Accumulate statistics over tokenized fields.
    pub fn scan(fields: &[SfmField]) -> Self {
        let mut catalog = Self::default();
        for field in fields {
            let next_order = catalog.stats.len();
            let stat = catalog
                .stats
                .entry(field.marker.clone())
                .or_insert_with(|| RawMarkerStat::new(field.marker.clone(), next_order));
            stat.count += 1;
            if field.is_empty() {
                stat.empty_count += 1;
            }
            catalog.total_fields += 1;
        }
        catalog
    }

    pub fn scan_file(path: &Path) -> Result<Self> {
        let fields = read_sfm_file(path)?;
        let catalog = Self::scan(&fields);
        tracing::info!(
            path = %path.display(),
            markers = catalog.len(),
            fields = catalog.total_fields,
            "scanned data file"
        );
        Ok(catalog)
    }

    pub fn get(&self, marker: &str) -> Option<&RawMarkerStat> {
        self.stats.get(marker)
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.stats.contains_key(marker)
    }

    /// Statistics ordered by first appearance.
    pub fn stats_in_order(&self) -> Vec<&RawMarkerStat> {
        let mut stats: Vec<&RawMarkerStat> = self.stats.values().collect();
        stats.sort_by_key(|stat| stat.order);
        stats
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn total_fields(&self) -> usize {
        self.total_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_sfm;

    #[test]
    fn counts_and_orders_markers() {
        let fields = parse_sfm("\\lx a\n\\ge\n\\lx b\n\\ps n\n\\ge c\n");
        let catalog = MarkerCatalog::scan(&fields);
        let lx = catalog.get("lx").unwrap();
        assert_eq!((lx.count, lx.empty_count, lx.order), (2, 0, 0));
        let ge = catalog.get("ge").unwrap();
        assert_eq!((ge.count, ge.empty_count, ge.order), (2, 1, 1));
        let order: Vec<&str> = catalog
            .stats_in_order()
            .iter()
            .map(|s| s.marker.as_str())
            .collect();
        assert_eq!(order, vec!["lx", "ge", "ps"]);
    }
}
