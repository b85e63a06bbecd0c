//! In-memory form of the persisted mapping file (`sfmMapping`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::CustomFieldKey;
use crate::language::{WritingSystem, WritingSystems};

/// A `langDef` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDef {
    /// Key referenced by field descriptions.
    pub id: String,
    /// Language code (`xml:lang`).
    pub xml_lang: String,
    /// Name of an encoding converter; carried through untouched.
    pub converter: Option<String>,
    pub ignore: bool,
}

/// A `hierarchy/level` entry: a class, its parent and its begin markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLevel {
    pub name: String,
    pub part_of: Option<String>,
    pub begin_fields: Vec<String>,
}

/// A `meaning` reference from a standard description to a catalog field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeaningRef {
    pub id: String,
    /// Class to disambiguate ids registered under several classes.
    pub class: Option<String>,
}

/// Standard vs. custom payload of a field description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptionKind {
    Standard {
        meaning: Option<MeaningRef>,
    },
    Custom {
        key: CustomFieldKey,
        label: String,
        big: bool,
        ws_selector: i32,
    },
}

/// Saved description of one marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub marker: String,
    /// Display name of the destination at save time.
    pub name: String,
    pub data_type: String,
    /// Language key.
    pub language: Option<String>,
    pub is_abbr: bool,
    pub exclude: bool,
    pub auto_import: bool,
    pub kind: DescriptionKind,
}

impl FieldDescription {
    pub fn standard(marker: impl Into<String>, meaning: Option<MeaningRef>) -> Self {
        Self {
            marker: marker.into(),
            name: String::new(),
            data_type: "string".to_string(),
            language: None,
            is_abbr: false,
            exclude: false,
            auto_import: false,
            kind: DescriptionKind::Standard { meaning },
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.kind, DescriptionKind::Custom { .. })
    }
}

/// An `options/option` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOption {
    pub id: String,
    pub kind: String,
    pub checked: bool,
}

/// An inline (in-field) marker definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFieldMarker {
    /// Element name used for the marked span.
    pub element: String,
    pub begin: String,
    pub end: Vec<String>,
    /// The span also ends at the next whitespace.
    pub end_with_word: bool,
    /// The span also ends at the end of the field.
    pub end_with_field: bool,
    pub language: Option<String>,
    pub style: Option<String>,
    /// Strip the markers but keep the text unmarked.
    pub ignore: bool,
}

/// Everything the mapping file persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFileDescriptor {
    pub languages: Vec<LanguageDef>,
    pub hierarchy: Vec<HierarchyLevel>,
    /// Standard and custom descriptions keyed by marker.
    pub fields: BTreeMap<String, FieldDescription>,
    pub options: Vec<ImportOption>,
    pub in_field_markers: Vec<InFieldMarker>,
}

impl MapFileDescriptor {
    pub fn description(&self, marker: &str) -> Option<&FieldDescription> {
        self.fields.get(marker)
    }

    pub fn level(&self, class: &str) -> Option<&HierarchyLevel> {
        self.hierarchy.iter().find(|level| level.name == class)
    }

    pub fn language(&self, id: &str) -> Option<&LanguageDef> {
        self.languages.iter().find(|lang| lang.id == id)
    }

    pub fn option_checked(&self, id: &str) -> bool {
        self.options
            .iter()
            .any(|option| option.id == id && option.checked)
    }

    /// Writing-system table derived from the `languages` section, used when
    /// the caller supplies none.
    pub fn writing_systems(&self) -> WritingSystems {
        self.languages
            .iter()
            .map(|lang| WritingSystem {
                key: lang.id.clone(),
                code: lang.xml_lang.clone(),
                name: lang.id.clone(),
                ignored: lang.ignore,
            })
            .collect()
    }
}
