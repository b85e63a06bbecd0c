//! Data model for SFM dictionary import.
//!
//! Plain types shared by every stage of the import: destination fields and
//! classes, per-marker statistics and mappings, the persisted mapping-file
//! descriptor, writing systems, and the phase-1 diagnostic log.

pub mod diagnostics;
pub mod field;
pub mod language;
pub mod mapfile;
pub mod mapping;
pub mod marker;

pub use diagnostics::{LogEntry, LogSection, MarkerTally, OutOfOrderCaution, Phase1Log};
pub use field::{
    ClassDescriptor, CustomField, CustomFieldKey, FieldFlags, ImportField, StorageClass,
};
pub use language::{WritingSystem, WritingSystems};
pub use mapfile::{
    DescriptionKind, FieldDescription, HierarchyLevel, ImportOption, InFieldMarker, LanguageDef,
    MapFileDescriptor, MeaningRef,
};
pub use mapping::{ContentMapping, Destination, MarkerLanguage, UNKNOWN};
pub use marker::RawMarkerStat;
