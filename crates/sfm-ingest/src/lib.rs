//! SFM data ingestion.
//!
//! This crate reads legacy Standard Format Marker files and summarizes them.
//!
//! # Features
//!
//! - **Decoding**: BOM-sniffed UTF-8/UTF-16, strict UTF-8, Windows-1252 fallback
//! - **Tokenizing**: `\marker value` fields with continuation lines and line numbers
//! - **Marker statistics**: per-marker counts, empty counts, first-appearance order
//! - **Change detection**: modification time plus SHA-256 content stamps
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use sfm_ingest::{MarkerCatalog, read_sfm_file};
//!
//! let fields = read_sfm_file(Path::new("dictionary.db"))?;
//! let catalog = MarkerCatalog::scan(&fields);
//! for stat in catalog.stats_in_order() {
//!     println!("{} {}", stat.marker, stat.count);
//! }
//! ```

mod catalog;
mod error;
mod reader;
mod stamp;

// === Error Types ===
pub use error::{IngestError, Result};

// === Reading ===
pub use reader::{RESERVED_MARKER_PREFIX, SfmField, decode_bytes, parse_sfm, read_sfm_file};

// === Statistics ===
pub use catalog::MarkerCatalog;

// === Change Detection ===
pub use stamp::DataFileStamp;
