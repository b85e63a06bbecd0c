use std::path::Path;

use sfm_map::{ImportSession, MapError, is_valid_map_file, seed_descriptor, write_map_file};
use sfm_model::{CustomField, WritingSystem, WritingSystems};
use sfm_schema::{FieldSchema, StaticSchemaProvider, parse_field_catalog};

const CATALOG: &str = r#"<ImportFields>
  <Class name="Entry">
    <Field id="lex" uiname="Lexeme Form" property="LexemeForm" MDF="lx"/>
    <Field id="eires" uiname="Import Residue" property="ImportResidue" autofield="yes"/>
  </Class>
  <Class name="Sense" partOf="Entry">
    <Field id="glos" uiname="Gloss" property="Gloss" MDF="ge"/>
  </Class>
</ImportFields>"#;

fn schema() -> FieldSchema {
    parse_field_catalog(CATALOG, Path::new("catalog.xml")).expect("catalog")
}

fn writing_systems() -> WritingSystems {
    WritingSystems::new(vec![
        WritingSystem::new("Vern", "qaa-x-kal", "Kala"),
        WritingSystem::new("Eng", "en", "English"),
    ])
}

fn data(with_empty: bool) -> String {
    let mut text = String::new();
    for index in 0..10 {
        text.push_str(&format!("\\lx word{index}\n"));
        if with_empty && index < 2 {
            text.push_str("\\ge\n");
        } else {
            text.push_str(&format!("\\ge gloss{index}\n"));
        }
        text.push_str("\\ps n\n");
    }
    text
}

#[test]
fn worked_example_without_mapping_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_path = dir.path().join("dict.db");
    std::fs::write(&data_path, data(true)).expect("write data");

    let session = ImportSession::open(
        &data_path,
        None,
        schema(),
        StaticSchemaProvider::default(),
        writing_systems(),
    )
    .expect("open");

    let catalog = session.resolver().catalog();
    let ge = catalog.get("ge").expect("ge");
    assert_eq!((ge.count, ge.empty_count), (10, 2));
    let ps = &session.resolver().mappings()["ps"];
    assert!(ps.auto_import());
    assert_eq!(ps.language.key(), Some("Eng"));
    assert!(session.ensure_complete().is_ok(), "only auto-import markers so far");
}

#[test]
fn seeded_mapping_is_complete_after_save_and_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_path = dir.path().join("dict.db");
    let map_path = dir.path().join("dict.map");
    std::fs::write(&data_path, data(false)).expect("write data");

    let schema = schema();
    let catalog = sfm_ingest::MarkerCatalog::scan_file(&data_path).expect("scan");
    let seeded = seed_descriptor(&schema, &catalog, &writing_systems());
    write_map_file(&seeded, &map_path).expect("write map");
    assert!(is_valid_map_file(&map_path));

    let mut session = ImportSession::open(
        &data_path,
        Some(&map_path),
        schema,
        StaticSchemaProvider::default(),
        writing_systems(),
    )
    .expect("open");
    assert!(session.ensure_complete().is_ok());
    assert!(session.resolver().mappings()["lx"].is_begin_marker);

    session
        .resolver_mut()
        .mapping_mut("lx")
        .expect("lx")
        .is_begin_marker = false;
    let err = session.ensure_complete().unwrap_err();
    assert!(matches!(
        err,
        MapError::Incomplete { ref classes } if classes == &["Entry".to_string()]
    ));
}

#[test]
fn refresh_is_a_no_op_until_the_file_changes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_path = dir.path().join("dict.db");
    std::fs::write(&data_path, data(false)).expect("write data");

    let mut session = ImportSession::open(
        &data_path,
        None,
        schema(),
        StaticSchemaProvider::default(),
        writing_systems(),
    )
    .expect("open");
    assert!(!session.refresh().expect("refresh"));

    std::fs::write(&data_path, format!("{}\\nt a note\n", data(false))).expect("rewrite");
    assert!(session.refresh().expect("refresh"));
    assert!(session.resolver().mappings().contains_key("nt"));
    assert!(!session.refresh().expect("refresh"));
}

#[test]
fn custom_field_removal_is_detected_on_refresh() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_path = dir.path().join("dict.db");
    let map_path = dir.path().join("dict.map");
    std::fs::write(&data_path, format!("{}\\zz extra\n", data(false))).expect("write data");
    std::fs::write(
        &map_path,
        r#"<sfmMapping><languages><langDef id="Eng" xml:lang="en"/></languages><hierarchy/>
<fieldDescriptions/>
<customFieldDescriptions><field sfm="zz" lang="Eng" classId="5002" flid="3" label="custom3"/></customFieldDescriptions>
</sfmMapping>"#,
    )
    .expect("write map");

    let custom = CustomField {
        class_id: 5002,
        flid: 3,
        label: "custom3".to_string(),
        field_type: "String".to_string(),
        big: false,
        ws_selector: -1,
    };
    let mut session = ImportSession::open(
        &data_path,
        Some(&map_path),
        schema(),
        StaticSchemaProvider::new(vec![custom.clone()]),
        writing_systems(),
    )
    .expect("open");
    assert_eq!(session.resolver().mappings()["zz"].class_name(), "Entry");

    session.resolver_mut().provider_mut().remove(custom.key());
    assert!(session.refresh().expect("refresh"));
    assert!(session.resolver().mappings()["zz"].auto_import());
}
