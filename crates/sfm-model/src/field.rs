//! Destination fields, classes, and user-defined custom fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Behavioural flags carried by a destination field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFlags {
    /// Values are items of a possibility list (split on `;`).
    pub is_list: bool,
    /// The field may legitimately occur more than once per object.
    pub is_multi: bool,
    /// Values are references to other objects.
    pub is_ref: bool,
    /// Receives auto-imported data for its class.
    pub is_auto_field: bool,
    /// At most one occurrence per object is expected.
    pub is_unique: bool,
    /// Values can be matched by name or by abbreviation.
    pub is_abbr_field: bool,
}

/// A destination field a marker can be mapped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportField {
    /// Field id, unique within each owning class.
    pub id: String,
    /// Classes the field is registered under.
    pub classes: Vec<String>,
    /// Display name shown to users.
    pub ui_name: String,
    /// Property name in the destination model.
    pub property: String,
    /// Destination signature (e.g. `MultiUnicode`, `PartOfSpeech`).
    pub signature: String,
    /// Free-form field type from the catalog.
    pub field_type: String,
    /// Default MDF markers for this field.
    pub mdf_markers: Vec<String>,
    pub flags: FieldFlags,
    /// Set for fields that come from a user-defined custom field.
    pub custom: Option<CustomFieldKey>,
}

impl ImportField {
    pub fn new(id: impl Into<String>, ui_name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            property: id.clone(),
            id,
            classes: Vec::new(),
            ui_name: ui_name.into(),
            signature: String::new(),
            field_type: String::new(),
            mdf_markers: Vec::new(),
            flags: FieldFlags::default(),
            custom: None,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }
}

/// Identity of a custom field: storage class id plus field id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomFieldKey {
    pub class_id: u32,
    pub flid: u32,
}

impl CustomFieldKey {
    /// Destination id used for this field. Derived from the numeric field id
    /// so two fields with the same label never share an id.
    pub fn field_id(&self) -> String {
        format!("custom{}", self.flid)
    }
}

impl fmt::Display for CustomFieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class_id, self.flid)
    }
}

/// A user-defined field living in the destination lexicon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    /// Numeric storage class id in the destination lexicon.
    pub class_id: u32,
    /// Numeric field id in the destination lexicon.
    pub flid: u32,
    /// User-visible label. Labels may collide across storage fields.
    pub label: String,
    #[serde(default)]
    pub field_type: String,
    /// Long-text field.
    #[serde(default)]
    pub big: bool,
    /// Writing-system selector code.
    #[serde(default)]
    pub ws_selector: i32,
}

impl CustomField {
    pub fn key(&self) -> CustomFieldKey {
        CustomFieldKey {
            class_id: self.class_id,
            flid: self.flid,
        }
    }

    pub fn field_id(&self) -> String {
        self.key().field_id()
    }

    /// Canonical text this field contributes to a custom-field fingerprint.
    pub fn fingerprint_contribution(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.class_id, self.flid, self.label, self.field_type, self.big, self.ws_selector
        )
    }

    /// Build the import field registered for this custom field.
    pub fn to_import_field(&self) -> ImportField {
        ImportField {
            id: self.field_id(),
            classes: Vec::new(),
            ui_name: self.label.clone(),
            property: self.label.clone(),
            signature: self.field_type.clone(),
            field_type: "custom".to_string(),
            mdf_markers: Vec::new(),
            flags: FieldFlags::default(),
            custom: Some(self.key()),
        }
    }
}

/// Storage classes of the destination lexicon that can own custom fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StorageClass {
    Entry,
    Example,
    Etymology,
    Pronunciation,
    Sense,
    Allomorph,
}

impl StorageClass {
    /// Storage class ids of the lexicon occupy this range.
    pub const LEXICON_ID_RANGE: std::ops::RangeInclusive<u32> = 5000..=5999;

    pub const ALL: [StorageClass; 6] = [
        StorageClass::Entry,
        StorageClass::Example,
        StorageClass::Etymology,
        StorageClass::Pronunciation,
        StorageClass::Sense,
        StorageClass::Allomorph,
    ];

    pub fn id(self) -> u32 {
        match self {
            StorageClass::Entry => 5002,
            StorageClass::Example => 5004,
            StorageClass::Etymology => 5010,
            StorageClass::Pronunciation => 5014,
            StorageClass::Sense => 5016,
            StorageClass::Allomorph => 5035,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.id() == id)
    }

    /// Logical import classes that receive fields of this storage class.
    pub fn logical_classes(self) -> &'static [&'static str] {
        match self {
            StorageClass::Entry => &["Entry", "Subentry", "Variant"],
            StorageClass::Example => &["Example"],
            StorageClass::Etymology => &["Etymology"],
            StorageClass::Pronunciation => &["Pronunciation"],
            StorageClass::Sense => &["Sense"],
            StorageClass::Allomorph => &["Allomorph"],
        }
    }

    pub fn is_lexicon_id(id: u32) -> bool {
        Self::LEXICON_ID_RANGE.contains(&id)
    }
}

/// A destination class and its place in the `partOf` tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    /// Parent class, or `None` for top-level record classes.
    pub part_of: Option<String>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, part_of: Option<&str>) -> Self {
        Self {
            name: name.into(),
            part_of: part_of
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_storage_class_covers_subentries_and_variants() {
        let class = StorageClass::from_id(5002).unwrap();
        assert_eq!(class, StorageClass::Entry);
        assert_eq!(class.logical_classes(), &["Entry", "Subentry", "Variant"]);
        assert!(StorageClass::from_id(42).is_none());
        assert!(StorageClass::is_lexicon_id(5016));
        assert!(!StorageClass::is_lexicon_id(7001));
    }

    #[test]
    fn custom_field_ids_follow_flid_not_label() {
        let a = CustomField {
            class_id: 5002,
            flid: 3,
            label: "Notes".to_string(),
            field_type: String::new(),
            big: false,
            ws_selector: 0,
        };
        let b = CustomField { flid: 4, ..a.clone() };
        assert_eq!(a.field_id(), "custom3");
        assert_ne!(a.field_id(), b.field_id());
        assert_eq!(a.to_import_field().custom, Some(a.key()));
    }
}
