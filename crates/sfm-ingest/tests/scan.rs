use sfm_ingest::{IngestError, MarkerCatalog, read_sfm_file};

fn sample() -> String {
    let mut text = String::from("\\_sh v3.0  400  MDF 4.0\n\\_DateStampHasFourDigitYear\n\n");
    for index in 0..10 {
        text.push_str(&format!("\\lx word{index}\n"));
        if index < 2 {
            text.push_str("\\ge\n");
        } else {
            text.push_str(&format!("\\ge gloss {index}\n"));
        }
        text.push_str("\\ps n\n\n");
    }
    text
}

#[test]
fn catalog_matches_marker_counts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dict.db");
    std::fs::write(&path, sample()).expect("write");

    let catalog = MarkerCatalog::scan_file(&path).expect("scan");
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.total_fields(), 30);

    let lx = catalog.get("lx").expect("lx");
    assert_eq!((lx.count, lx.empty_count), (10, 0));
    let ge = catalog.get("ge").expect("ge");
    assert_eq!((ge.count, ge.empty_count), (10, 2));
    assert_eq!(catalog.get("ps").expect("ps").count, 10);
    assert!(!catalog.contains("_sh"));
}

#[test]
fn field_lines_are_one_based() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dict.db");
    std::fs::write(&path, sample()).expect("write");
    let fields = read_sfm_file(&path).expect("read");
    assert_eq!(fields[0].line, 4);
    assert_eq!(fields[0].marker, "lx");
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = MarkerCatalog::scan_file(&dir.path().join("none.db")).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}
