//! Resolved marker-to-destination mappings.

use serde::{Deserialize, Serialize};

use crate::field::CustomFieldKey;
use crate::marker::RawMarkerStat;

/// Sentinel shown for destinations, classes and languages that could not be
/// resolved.
pub const UNKNOWN: &str = "Unknown";

/// Where a marker's data goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// Appended into the enclosing object's auto-import field; no class.
    AutoImport,
    /// A specific field of a specific class.
    Field {
        class: String,
        field_id: String,
        /// Display name of the field.
        name: String,
        custom: Option<CustomFieldKey>,
    },
    /// The saved description named a field that no longer resolves.
    Unknown,
}

impl Destination {
    pub fn field(
        class: impl Into<String>,
        field_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Destination::Field {
            class: class.into(),
            field_id: field_id.into(),
            name: name.into(),
            custom: None,
        }
    }

    pub fn is_auto_import(&self) -> bool {
        matches!(self, Destination::AutoImport)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Destination::Unknown)
    }

    /// Destination class; blank for auto-import.
    pub fn class_name(&self) -> &str {
        match self {
            Destination::AutoImport => "",
            Destination::Field { class, .. } => class,
            Destination::Unknown => UNKNOWN,
        }
    }

    /// Destination display name; blank for auto-import.
    pub fn display_name(&self) -> &str {
        match self {
            Destination::AutoImport => "",
            Destination::Field { name, .. } => name,
            Destination::Unknown => UNKNOWN,
        }
    }

    pub fn field_id(&self) -> Option<&str> {
        match self {
            Destination::Field { field_id, .. } => Some(field_id),
            _ => None,
        }
    }

    pub fn custom_key(&self) -> Option<CustomFieldKey> {
        match self {
            Destination::Field { custom, .. } => *custom,
            _ => None,
        }
    }
}

/// Writing system chosen for a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerLanguage {
    /// A key from the writing-system table and its display name.
    Named { key: String, name: String },
    /// The saved language key is not in the writing-system table.
    Unknown,
    /// No writing system could be chosen at all.
    Unassigned,
}

impl MarkerLanguage {
    pub fn key(&self) -> Option<&str> {
        match self {
            MarkerLanguage::Named { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            MarkerLanguage::Named { name, .. } => name,
            MarkerLanguage::Unknown => UNKNOWN,
            MarkerLanguage::Unassigned => "",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, MarkerLanguage::Unknown)
    }
}

/// The mapping for one marker. Exactly one exists per marker string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMapping {
    pub marker: String,
    pub destination: Destination,
    pub language: MarkerLanguage,
    pub exclude: bool,
    pub is_begin_marker: bool,
    /// Match list values by abbreviation instead of name.
    pub is_abbr: bool,
    pub count: usize,
    pub empty_count: usize,
    pub order: usize,
}

impl ContentMapping {
    pub fn new(
        marker: impl Into<String>,
        destination: Destination,
        language: MarkerLanguage,
    ) -> Self {
        Self {
            marker: marker.into(),
            destination,
            language,
            exclude: false,
            is_begin_marker: false,
            is_abbr: false,
            count: 0,
            empty_count: 0,
            order: 0,
        }
    }

    pub fn auto_import(&self) -> bool {
        self.destination.is_auto_import()
    }

    pub fn class_name(&self) -> &str {
        self.destination.class_name()
    }

    /// Copy the latest scan numbers, leaving user-set fields untouched.
    pub fn refresh_stats(&mut self, stat: &RawMarkerStat) {
        self.count = stat.count;
        self.empty_count = stat.empty_count;
        self.order = stat.order;
    }

    /// Feeds records of a known destination class.
    pub fn is_class_member(&self) -> bool {
        !self.exclude && !self.auto_import() && !self.destination.is_unknown()
    }

    /// Participates in class grouping; also requires a resolved language.
    pub fn is_structural(&self) -> bool {
        self.is_class_member() && !self.language.is_unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_import_has_no_class() {
        let mapping =
            ContentMapping::new("ps", Destination::AutoImport, MarkerLanguage::Unassigned);
        assert!(mapping.auto_import());
        assert_eq!(mapping.class_name(), "");
        assert!(!mapping.is_structural());
        assert!(!mapping.is_class_member());
    }

    #[test]
    fn unknown_language_keeps_class_membership() {
        let mapping = ContentMapping::new(
            "lx",
            Destination::field("Entry", "lex", "Lexeme Form"),
            MarkerLanguage::Unknown,
        );
        assert!(mapping.is_class_member());
        assert!(!mapping.is_structural());
    }

    #[test]
    fn unknown_destination_renders_sentinel() {
        let mapping = ContentMapping::new("zz", Destination::Unknown, MarkerLanguage::Unknown);
        assert_eq!(mapping.destination.display_name(), UNKNOWN);
        assert_eq!(mapping.class_name(), UNKNOWN);
        assert_eq!(mapping.language.display_name(), UNKNOWN);
    }

    #[test]
    fn refresh_keeps_user_flags() {
        let mut mapping = ContentMapping::new(
            "lx",
            Destination::field("Entry", "lex", "Lexeme Form"),
            MarkerLanguage::Unassigned,
        );
        mapping.is_begin_marker = true;
        mapping.exclude = true;
        let mut stat = RawMarkerStat::new("lx", 4);
        stat.count = 9;
        stat.empty_count = 1;
        mapping.refresh_stats(&stat);
        assert!(mapping.is_begin_marker && mapping.exclude);
        assert_eq!((mapping.count, mapping.empty_count, mapping.order), (9, 1, 4));
    }
}
