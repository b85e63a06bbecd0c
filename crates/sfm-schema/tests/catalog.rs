use std::path::Path;

use sfm_schema::{SchemaError, load_field_catalog, parse_field_catalog};

const CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ImportFields>
  <Class name="Entry">
    <Field id="lex" uiname="Lexeme Form" property="LexemeForm" signature="MultiUnicode" unique="yes" MDF="lx"/>
    <Field id="cit" uiname="Citation Form" property="CitationForm" signature="MultiUnicode" MDF="lc"/>
    <Field id="eires" uiname="Import Residue" property="ImportResidue" autofield="yes"/>
  </Class>
  <Class name="Sense" partOf="Entry">
    <Field id="glos" uiname="Gloss" property="Gloss" signature="MultiUnicode" MDF="ge, gn"/>
    <Field id="pos" uiname="Category" property="MorphoSyntaxAnalysis" signature="PartOfSpeech" list="yes" MDF="ps"/>
    <Field id="sem" uiname="Semantic Domain" property="SemanticDomains" signature="SemanticDomain" list="yes" multi="yes"/>
    <Field id="sres" uiname="Import Residue" property="ImportResidue" autofield="true"/>
  </Class>
  <AbbreviationSignatures>PartOfSpeech MorphType</AbbreviationSignatures>
</ImportFields>
"#;

#[test]
fn loads_classes_fields_and_flags() {
    let schema = parse_field_catalog(CATALOG, Path::new("catalog.xml")).expect("parse catalog");
    assert_eq!(schema.classes().len(), 2);
    assert_eq!(schema.parent("Sense"), Some("Entry"));
    assert_eq!(schema.parent("Entry"), None);

    let lex = schema.get_field("lex").expect("lex field");
    assert_eq!(lex.property, "LexemeForm");
    assert!(lex.flags.is_unique);
    assert_eq!(lex.mdf_markers, vec!["lx"]);

    let glos = schema.get_field_in("Sense", "glos").expect("gloss");
    assert_eq!(glos.mdf_markers, vec!["ge", "gn"]);

    let sem = schema.get_field("sem").expect("semantic domain");
    assert!(sem.flags.is_list && sem.flags.is_multi);
    assert_eq!(schema.get_auto_field("Sense").map(|f| f.id.as_str()), Some("sres"));
}

#[test]
fn abbreviation_signatures_flag_fields() {
    let schema = parse_field_catalog(CATALOG, Path::new("catalog.xml")).expect("parse catalog");
    assert!(schema.get_field("pos").expect("pos").flags.is_abbr_field);
    assert!(!schema.get_field("glos").expect("glos").flags.is_abbr_field);
    assert!(schema.is_abbreviation_signature("MorphType"));
}

#[test]
fn mdf_lookup_finds_first_match() {
    let schema = parse_field_catalog(CATALOG, Path::new("catalog.xml")).expect("parse catalog");
    let (class, field) = schema.mdf_field("ps").expect("ps default");
    assert_eq!(class, "Sense");
    assert_eq!(field.id, "pos");
    assert!(schema.mdf_field("zz").is_none());
}

#[test]
fn field_without_id_is_rejected() {
    let bad = r#"<ImportFields><Class name="Entry"><Field uiname="x"/></Class></ImportFields>"#;
    let err = parse_field_catalog(bad, Path::new("bad.xml")).unwrap_err();
    assert!(matches!(err, SchemaError::MissingAttribute { attribute: "id", .. }));
}

#[test]
fn malformed_xml_is_a_schema_error() {
    let err = parse_field_catalog("<ImportFields><Class>", Path::new("bad.xml")).unwrap_err();
    assert!(matches!(err, SchemaError::Xml { .. }));
}

#[test]
fn catalog_without_classes_is_rejected() {
    let err = parse_field_catalog("<ImportFields/>", Path::new("empty.xml")).unwrap_err();
    assert!(matches!(err, SchemaError::MissingSection { .. }));
}

#[test]
fn loads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.xml");
    std::fs::write(&path, CATALOG).expect("write catalog");
    let schema = load_field_catalog(&path).expect("load");
    assert!(schema.class("Entry").is_some());

    let missing = load_field_catalog(&dir.path().join("missing.xml")).unwrap_err();
    assert!(matches!(missing, SchemaError::Io { .. }));
}
