//! Merge engine: one [`ContentMapping`] per marker in the data file.

use std::collections::BTreeMap;

use sfm_ingest::MarkerCatalog;
use sfm_model::{
    ContentMapping, DescriptionKind, Destination, FieldDescription, HierarchyLevel,
    MapFileDescriptor, MarkerLanguage, MeaningRef, RawMarkerStat, StorageClass, WritingSystems,
};
use sfm_schema::{CustomFieldReconciler, FieldSchema, SchemaProvider};

use crate::hierarchy::HierarchyValidator;
use crate::language::{auto_language, resolve_language};
use crate::mapfile::index_descriptions;

/// Builds and refreshes the mapping set from the schema, the latest marker
/// scan, and the saved mapping file.
#[derive(Debug)]
pub struct MappingResolver<P> {
    schema: FieldSchema,
    provider: P,
    reconciler: CustomFieldReconciler,
    descriptor: MapFileDescriptor,
    writing_systems: WritingSystems,
    catalog: MarkerCatalog,
    mappings: BTreeMap<String, ContentMapping>,
}

impl<P: SchemaProvider> MappingResolver<P> {
    /// An empty writing-system table falls back to the mapping file's
    /// `languages` section.
    pub fn new(
        schema: FieldSchema,
        provider: P,
        descriptor: MapFileDescriptor,
        writing_systems: WritingSystems,
    ) -> Self {
        let writing_systems = if writing_systems.is_empty() {
            descriptor.writing_systems()
        } else {
            writing_systems
        };
        Self {
            schema,
            provider,
            reconciler: CustomFieldReconciler::new(),
            descriptor,
            writing_systems,
            catalog: MarkerCatalog::default(),
            mappings: BTreeMap::new(),
        }
    }

    /// Replace the latest scan; takes effect on the next merge.
    pub fn set_catalog(&mut self, catalog: MarkerCatalog) {
        self.catalog = catalog;
    }

    /// Replace the saved mapping file; takes effect on the next full merge.
    pub fn set_descriptor(&mut self, descriptor: MapFileDescriptor) {
        self.descriptor = descriptor;
    }

    /// Forget the custom-field snapshot, e.g. when another lexicon is opened.
    pub fn reset_reconciler(&mut self) {
        self.reconciler.reset();
    }

    /// Merge the latest scan into the mapping set.
    ///
    /// A full merge rebuilds every mapping. An incremental merge drops
    /// markers no longer in the scan, keeps user edits on existing markers
    /// (refreshing only their statistics), and adds new ones. Returns whether
    /// the set changed.
    pub fn merge(&mut self, incremental: bool) -> bool {
        let mut changed = self.refresh_custom_fields(incremental);

        if incremental {
            let before = self.mappings.len();
            let catalog = &self.catalog;
            self.mappings.retain(|marker, _| catalog.contains(marker));
            if self.mappings.len() != before {
                tracing::debug!(removed = before - self.mappings.len(), "dropped stale markers");
                changed = true;
            }
        } else {
            self.mappings.clear();
        }

        for stat in self.catalog.stats_in_order() {
            if let Some(existing) = self.mappings.get_mut(&stat.marker) {
                existing.refresh_stats(stat);
                continue;
            }
            let mapping = self.synthesize(stat);
            tracing::debug!(
                marker = %mapping.marker,
                destination = %mapping.destination.display_name(),
                class = %mapping.class_name(),
                "mapped marker"
            );
            self.mappings.insert(stat.marker.clone(), mapping);
            changed = true;
        }

        HierarchyValidator::apply_begin_fields(&self.descriptor, &mut self.mappings);
        tracing::info!(
            markers = self.mappings.len(),
            incremental,
            changed,
            "merged mappings"
        );
        changed
    }

    /// Re-read custom fields from the provider. When they changed, the
    /// schema is updated and mappings to removed fields degrade to
    /// auto-import.
    fn refresh_custom_fields(&mut self, incremental: bool) -> bool {
        let customs = self.provider.custom_fields();
        if !self.reconciler.reconcile(&customs) {
            return false;
        }
        self.schema.replace_custom_fields(&customs);
        if !incremental {
            return true;
        }
        for mapping in self.mappings.values_mut() {
            let Some(key) = mapping.destination.custom_key() else {
                continue;
            };
            if self.schema.custom_field(key).is_none() {
                tracing::info!(marker = %mapping.marker, field = %key, "custom field removed");
                mapping.destination = Destination::AutoImport;
                mapping.language = auto_language(&self.writing_systems);
            }
        }
        true
    }

    fn synthesize(&self, stat: &RawMarkerStat) -> ContentMapping {
        let description = self
            .descriptor
            .description(&stat.marker)
            .filter(|description| self.custom_still_exists(description));

        let mut mapping = match description {
            None => ContentMapping::new(
                &stat.marker,
                Destination::AutoImport,
                auto_language(&self.writing_systems),
            ),
            Some(description) => {
                let (destination, language) = if description.auto_import {
                    (Destination::AutoImport, auto_language(&self.writing_systems))
                } else {
                    (
                        self.resolve_destination(description),
                        resolve_language(description.language.as_deref(), &self.writing_systems),
                    )
                };
                let mut mapping = ContentMapping::new(&stat.marker, destination, language);
                mapping.exclude = description.exclude;
                mapping.is_abbr = description.is_abbr;
                mapping
            }
        };
        mapping.refresh_stats(stat);
        mapping
    }

    fn custom_still_exists(&self, description: &FieldDescription) -> bool {
        match &description.kind {
            DescriptionKind::Custom { key, .. } => self.schema.custom_field(*key).is_some(),
            DescriptionKind::Standard { .. } => true,
        }
    }

    fn resolve_destination(&self, description: &FieldDescription) -> Destination {
        match &description.kind {
            DescriptionKind::Custom { key, label, .. } => {
                let class = StorageClass::from_id(key.class_id)
                    .and_then(|storage| storage.logical_classes().first().copied());
                let field_id = self.schema.custom_field(*key).map(|field| field.field_id());
                match (class, field_id) {
                    (Some(class), Some(field_id)) => Destination::Field {
                        class: class.to_string(),
                        field_id,
                        name: label.clone(),
                        custom: Some(*key),
                    },
                    _ => Destination::Unknown,
                }
            }
            DescriptionKind::Standard { meaning: Some(meaning) } => {
                let field = match &meaning.class {
                    Some(class) => self
                        .schema
                        .get_field_in(class, &meaning.id)
                        .map(|field| (class.as_str(), field)),
                    None => self.schema.get_field(&meaning.id).and_then(|field| {
                        field.classes.first().map(|class| (class.as_str(), field))
                    }),
                };
                match field {
                    Some((class, field)) => Destination::field(class, &field.id, &field.ui_name),
                    None => Destination::Unknown,
                }
            }
            DescriptionKind::Standard { meaning: None } => Destination::Unknown,
        }
    }

    pub fn mappings(&self) -> &BTreeMap<String, ContentMapping> {
        &self.mappings
    }

    /// Edit one mapping in place; edits survive incremental merges.
    pub fn mapping_mut(&mut self, marker: &str) -> Option<&mut ContentMapping> {
        self.mappings.get_mut(marker)
    }

    pub fn validator(&self) -> HierarchyValidator<'_> {
        HierarchyValidator::new(&self.mappings)
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn catalog(&self) -> &MarkerCatalog {
        &self.catalog
    }

    pub fn descriptor(&self) -> &MapFileDescriptor {
        &self.descriptor
    }

    pub fn writing_systems(&self) -> &WritingSystems {
        &self.writing_systems
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Mapping-file descriptor reflecting the current mapping set.
    ///
    /// Languages, options and in-field markers carry over from the loaded
    /// file. Unknown destinations are saved without a meaning and keep their
    /// original language key, so they stay unknown on reload.
    pub fn to_descriptor(&self) -> MapFileDescriptor {
        let fields = self
            .mappings
            .values()
            .map(|mapping| self.describe(mapping))
            .collect::<Vec<_>>();

        MapFileDescriptor {
            languages: self.descriptor.languages.clone(),
            hierarchy: self.hierarchy_levels(),
            fields: index_descriptions(fields),
            options: self.descriptor.options.clone(),
            in_field_markers: self.descriptor.in_field_markers.clone(),
        }
    }

    fn describe(&self, mapping: &ContentMapping) -> FieldDescription {
        let previous = self.descriptor.description(&mapping.marker);
        let language = match &mapping.language {
            MarkerLanguage::Named { key, .. } => Some(key.clone()),
            MarkerLanguage::Unknown => previous.and_then(|p| p.language.clone()),
            MarkerLanguage::Unassigned => None,
        };
        let kind = match &mapping.destination {
            Destination::Field {
                class,
                field_id,
                custom,
                ..
            } => match custom.and_then(|key| self.schema.custom_field(key)) {
                Some(field) => DescriptionKind::Custom {
                    key: field.key(),
                    label: field.label.clone(),
                    big: field.big,
                    ws_selector: field.ws_selector,
                },
                None => DescriptionKind::Standard {
                    meaning: Some(MeaningRef {
                        id: field_id.clone(),
                        class: Some(class.clone()),
                    }),
                },
            },
            Destination::AutoImport | Destination::Unknown => {
                DescriptionKind::Standard { meaning: None }
            }
        };
        FieldDescription {
            marker: mapping.marker.clone(),
            name: mapping.destination.display_name().to_string(),
            data_type: previous.map_or_else(|| "string".to_string(), |p| p.data_type.clone()),
            language,
            is_abbr: mapping.is_abbr,
            exclude: mapping.exclude,
            auto_import: mapping.auto_import(),
            kind,
        }
    }

    /// One level per class that has structural mappings or a saved level,
    /// in schema order, then saved levels for classes the schema lacks.
    fn hierarchy_levels(&self) -> Vec<HierarchyLevel> {
        let groups = self.validator().group_by_class();
        let begin_fields = |class: &str| -> Vec<String> {
            groups
                .iter()
                .find(|group| group.class == class)
                .map(|group| group.begin_markers().map(str::to_string).collect())
                .unwrap_or_default()
        };

        let mut levels: Vec<HierarchyLevel> = self
            .schema
            .classes()
            .iter()
            .filter(|entry| {
                groups.iter().any(|group| group.class == entry.name())
                    || self.descriptor.level(entry.name()).is_some()
            })
            .map(|entry| HierarchyLevel {
                name: entry.name().to_string(),
                part_of: entry.descriptor.part_of.clone(),
                begin_fields: begin_fields(entry.name()),
            })
            .collect();
        for saved in &self.descriptor.hierarchy {
            if self.schema.class(&saved.name).is_none() {
                levels.push(saved.clone());
            }
        }
        levels
    }
}
