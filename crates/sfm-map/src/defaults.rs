//! Starting mapping file seeded from catalog MDF markers.

use std::collections::BTreeMap;

use sfm_ingest::MarkerCatalog;
use sfm_model::{
    FieldDescription, HierarchyLevel, LanguageDef, MapFileDescriptor, MeaningRef, WritingSystems,
};
use sfm_schema::FieldSchema;

use crate::language::auto_language;

/// Build a descriptor for a data file that has no mapping file yet.
///
/// Markers listed in a catalog field's `MDF` attribute map to that field
/// (first class wins); the rest auto-import. The first data marker mapped
/// into each class becomes its begin field.
pub fn seed_descriptor(
    schema: &FieldSchema,
    catalog: &MarkerCatalog,
    writing_systems: &WritingSystems,
) -> MapFileDescriptor {
    let language = auto_language(writing_systems).key().map(str::to_string);
    let mut descriptor = MapFileDescriptor {
        languages: writing_systems
            .iter()
            .map(|ws| LanguageDef {
                id: ws.key.clone(),
                xml_lang: ws.code.clone(),
                converter: None,
                ignore: ws.ignored,
            })
            .collect(),
        ..MapFileDescriptor::default()
    };

    let mut begin_fields: BTreeMap<&str, String> = BTreeMap::new();
    for stat in catalog.stats_in_order() {
        let mut description = match schema.mdf_field(&stat.marker) {
            Some((class, field)) => {
                begin_fields
                    .entry(class)
                    .or_insert_with(|| stat.marker.clone());
                let mut description = FieldDescription::standard(
                    &stat.marker,
                    Some(MeaningRef {
                        id: field.id.clone(),
                        class: Some(class.to_string()),
                    }),
                );
                description.name = field.ui_name.clone();
                description.is_abbr = field.flags.is_abbr_field;
                description
            }
            None => {
                let mut description = FieldDescription::standard(&stat.marker, None);
                description.auto_import = true;
                description
            }
        };
        description.language = language.clone();
        descriptor.fields.insert(stat.marker.clone(), description);
    }

    descriptor.hierarchy = schema
        .classes()
        .iter()
        .filter_map(|entry| {
            begin_fields.get(entry.name()).map(|marker| HierarchyLevel {
                name: entry.name().to_string(),
                part_of: entry.descriptor.part_of.clone(),
                begin_fields: vec![marker.clone()],
            })
        })
        .collect();
    tracing::info!(
        markers = descriptor.fields.len(),
        levels = descriptor.hierarchy.len(),
        "seeded mapping from catalog defaults"
    );
    descriptor
}

#[cfg(test)]
mod tests {
    use sfm_ingest::parse_sfm;
    use sfm_model::{ImportField, WritingSystem};

    use super::*;

    #[test]
    fn mdf_markers_map_and_first_marker_begins_class() {
        let mut schema = FieldSchema::new();
        let mut lex = ImportField::new("lex", "Lexeme Form");
        lex.mdf_markers = vec!["lx".to_string()];
        schema.add_field("Entry", None, lex);
        let mut glos = ImportField::new("glos", "Gloss");
        glos.mdf_markers = vec!["ge".to_string()];
        schema.add_field("Sense", Some("Entry"), glos);

        let catalog = MarkerCatalog::scan(&parse_sfm("\\lx a\n\\ge b\n\\zz c\n"));
        let ws = WritingSystems::new(vec![WritingSystem::new("Eng", "en", "English")]);
        let descriptor = seed_descriptor(&schema, &catalog, &ws);

        assert!(descriptor.description("zz").unwrap().auto_import);
        assert_eq!(descriptor.description("ge").unwrap().name, "Gloss");
        assert_eq!(descriptor.level("Sense").unwrap().begin_fields, vec!["ge"]);
        assert_eq!(descriptor.level("Sense").unwrap().part_of.as_deref(), Some("Entry"));
        assert_eq!(descriptor.languages[0].xml_lang, "en");
    }
}
