//! Marker-to-destination mapping.
//!
//! - **mapfile**: reader/writer for the persisted `sfmMapping` file
//! - **resolver**: the merge engine producing one [`ContentMapping`] per marker
//! - **hierarchy**: begin-marker propagation and per-class validity
//! - **defaults**: a starting mapping seeded from catalog MDF markers
//! - **session**: ties the resolver to one data file and mapping file
//!
//! [`ContentMapping`]: sfm_model::ContentMapping

pub mod defaults;
mod error;
pub mod hierarchy;
pub mod language;
pub mod mapfile;
pub mod resolver;
pub mod session;

pub use defaults::seed_descriptor;
pub use error::{MapError, Result};
pub use hierarchy::{ClassGroup, HierarchyValidator};
pub use language::{auto_language, resolve_language};
pub use mapfile::{
    is_valid_map_file, parse_map_file, read_map_file, render_map_file, write_map_file,
};
pub use resolver::MappingResolver;
pub use session::ImportSession;
