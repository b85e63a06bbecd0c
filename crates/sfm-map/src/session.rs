//! One import session: a data file, an optional mapping file, and the
//! resolver kept in sync with both.

use std::path::{Path, PathBuf};

use sfm_ingest::{DataFileStamp, MarkerCatalog};
use sfm_model::{MapFileDescriptor, WritingSystems};
use sfm_schema::{FieldSchema, SchemaProvider};

use crate::error::{MapError, Result};
use crate::mapfile::{is_valid_map_file, read_map_file, write_map_file};
use crate::resolver::MappingResolver;

#[derive(Debug)]
pub struct ImportSession<P> {
    data_path: PathBuf,
    map_path: Option<PathBuf>,
    stamp: DataFileStamp,
    resolver: MappingResolver<P>,
}

impl<P: SchemaProvider> ImportSession<P> {
    /// Scan the data file, load the mapping file when it is valid, and run a
    /// full merge.
    pub fn open(
        data_path: &Path,
        map_path: Option<&Path>,
        schema: FieldSchema,
        provider: P,
        writing_systems: WritingSystems,
    ) -> Result<Self> {
        let descriptor = load_descriptor(map_path)?;
        let stamp = DataFileStamp::capture(data_path)?;
        let catalog = MarkerCatalog::scan_file(data_path)?;
        let mut resolver = MappingResolver::new(schema, provider, descriptor, writing_systems);
        resolver.set_catalog(catalog);
        resolver.merge(false);
        Ok(Self {
            data_path: data_path.to_path_buf(),
            map_path: map_path.map(Path::to_path_buf),
            stamp,
            resolver,
        })
    }

    /// Re-scan when the data file changed, then merge incrementally.
    ///
    /// Returns whether the mapping set changed.
    pub fn refresh(&mut self) -> Result<bool> {
        if self.stamp.has_changed()? {
            tracing::info!(path = %self.data_path.display(), "data file changed");
            self.stamp = DataFileStamp::capture(&self.data_path)?;
            self.resolver
                .set_catalog(MarkerCatalog::scan_file(&self.data_path)?);
        }
        Ok(self.resolver.merge(true))
    }

    /// Switch to another data file and rebuild every mapping.
    pub fn swap_data_file(&mut self, data_path: &Path) -> Result<()> {
        self.stamp = DataFileStamp::capture(data_path)?;
        self.resolver
            .set_catalog(MarkerCatalog::scan_file(data_path)?);
        self.data_path = data_path.to_path_buf();
        self.rebuild();
        Ok(())
    }

    /// Switch to another mapping file and rebuild every mapping.
    pub fn swap_map_file(&mut self, map_path: Option<&Path>) -> Result<()> {
        self.resolver.set_descriptor(load_descriptor(map_path)?);
        self.map_path = map_path.map(Path::to_path_buf);
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.resolver.reset_reconciler();
        self.resolver.merge(false);
    }

    /// Fail unless every mapped class has a begin marker.
    pub fn ensure_complete(&self) -> Result<()> {
        let classes = self.resolver.validator().invalid_classes();
        if classes.is_empty() {
            Ok(())
        } else {
            Err(MapError::Incomplete { classes })
        }
    }

    /// Write the current mappings to `path` and make it the session's file.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let descriptor = self.resolver.to_descriptor();
        write_map_file(&descriptor, path)?;
        self.map_path = Some(path.to_path_buf());
        self.resolver.set_descriptor(descriptor);
        Ok(())
    }

    pub fn resolver(&self) -> &MappingResolver<P> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut MappingResolver<P> {
        &mut self.resolver
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn map_path(&self) -> Option<&Path> {
        self.map_path.as_deref()
    }
}

/// Missing or structurally invalid mapping files start from an empty
/// descriptor; a file that looks valid but fails to parse is an error.
fn load_descriptor(map_path: Option<&Path>) -> Result<MapFileDescriptor> {
    match map_path {
        Some(path) if is_valid_map_file(path) => Ok(read_map_file(path)?),
        Some(path) => {
            tracing::warn!(path = %path.display(), "ignoring missing or invalid mapping file");
            Ok(MapFileDescriptor::default())
        }
        None => Ok(MapFileDescriptor::default()),
    }
}
