#![deny(unsafe_code)]

//! Destination field schema for SFM import.
//!
//! - **registry**: the [`FieldSchema`] of classes, fields and custom fields
//! - **catalog**: loader for the XML field catalog
//! - **reconcile**: order-sensitive custom-field fingerprints
//! - **provider**: the [`SchemaProvider`] capability for live custom fields
//! - **xml**: small element-tree reader/writer shared by the workspace

pub mod catalog;
pub mod error;
pub mod hash;
pub mod provider;
pub mod reconcile;
pub mod registry;
pub mod xml;

pub use crate::catalog::{load_field_catalog, parse_field_catalog};
pub use crate::error::SchemaError;
pub use crate::provider::{SchemaProvider, StaticSchemaProvider};
pub use crate::reconcile::{CustomFieldReconciler, FieldFingerprint};
pub use crate::registry::FieldSchema;
