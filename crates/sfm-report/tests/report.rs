use std::fs;

use sfm_model::{MarkerTally, OutOfOrderCaution, Phase1Log};
use sfm_report::{DiagnosticReporter, LogTokens, render_html, write_report};
use sfm_transform::{
    LoadError, LoadOutcome, PipelineError, PipelineOutcome, PipelineRun, PipelineState,
    read_phase1_log, write_phase1_log,
};

fn phase1_log() -> Phase1Log {
    let mut log = Phase1Log {
        records: 2,
        ..Phase1Log::default()
    };
    log.warnings.record(Some(5), "marker \\zz is not in the mapping file");
    log.out_of_order.push(OutOfOrderCaution {
        entry: "kala".to_string(),
        class: "Entry".to_string(),
        marker: "dt".to_string(),
        line: 8,
    });
    for (marker, count, empty) in [("ps", 10, 0), ("lx", 10, 0), ("ge", 10, 2)] {
        log.stats.push(MarkerTally {
            marker: marker.to_string(),
            count,
            empty,
        });
    }
    log
}

#[test]
fn report_combines_phase1_and_load_logs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("Phase1Log.xml");
    write_phase1_log(&phase1_log(), &log_path).expect("write phase 1 log");
    let phase1 = read_phase1_log(&log_path).expect("read phase 1 log");

    let import_log = dir.path().join("Phase4Output-Import.log");
    let text = "Info: Import started\nCreated Entry 1\nWarnung: leer\nCreated Entry 7\n\
                Import took 0.10 s\n";
    fs::write(&import_log, text).expect("write import log");
    let outcome = LoadOutcome {
        elapsed_template: "Import took {0}".to_string(),
        created_templates: vec!["Created Entry {0}".to_string()],
        is_valid_object_id: Box::new(|id| id == 1),
        log_path: Some(import_log),
        objects_created: 1,
    };

    let tokens = LogTokens::with_localized(&["Warnung:".to_string()], &[]);
    let reporter = DiagnosticReporter::new(tokens);
    let data_file = dir.path().join("dict.db");
    let report = reporter
        .build(&data_file, "Loaded 1 objects", Some(&phase1), Some(&outcome))
        .expect("report");

    let totals = report.totals();
    assert_eq!((totals.errors, totals.warnings, totals.cautions), (0, 2, 1));
    assert_eq!(report.elapsed(), Some("Import took 0.10 s"));
    let markers: Vec<&str> = report.stats.iter().map(|r| r.marker.as_str()).collect();
    assert_eq!(markers, vec!["ge", "lx", "ps"]);

    let html = render_html(&report);
    assert!(html.contains(r#"<a href="lexicon://object/1">1</a>"#));
    assert!(html.contains("Created Entry 7"));
    assert!(!html.contains("lexicon://object/7"));
    assert!(html.contains("80.0%"));

    let out = dir.path().join("report.html");
    assert!(write_report(&report, &out));
    assert!(out.exists());
}

#[test]
fn unwritable_report_is_swallowed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let report = DiagnosticReporter::default()
        .build(dir.path(), "Transformed", None, None)
        .expect("report");
    assert!(!write_report(&report, &dir.path().join("missing").join("report.html")));
}

#[test]
fn failed_load_still_reports_its_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let import_log = dir.path().join("Phase4Output-Import.log");
    let text = "Info: started\nWarning: entry 3 rejected\nCreated Entry 1\n";
    fs::write(&import_log, text).expect("write import log");
    let run = PipelineRun {
        outcome: PipelineOutcome::Failed(PipelineError::Load(LoadError::Failed {
            message: "lexicon rejected the import".to_string(),
        })),
        phase1_log: Some(phase1_log()),
        phase1_log_path: None,
        load_log_path: Some(import_log),
        state: PipelineState::Failed,
    };

    let report = DiagnosticReporter::default().from_run(&dir.path().join("dict.db"), &run);

    assert!(report.status.starts_with("Failed"));
    let load = report.load.as_ref().expect("load log");
    assert_eq!(load.warnings.len(), 1);
    assert_eq!(load.info.len(), 1);
    let created = &load.others[0];
    assert_eq!(created.text(), "Created Entry 1");
    assert_eq!(created.object_ids().count(), 0);
    assert_eq!(report.totals().warnings, 2);
}

#[test]
fn failed_load_without_a_log_reports_phase1_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let run = PipelineRun {
        outcome: PipelineOutcome::Failed(PipelineError::Load(LoadError::Failed {
            message: "lexicon unavailable".to_string(),
        })),
        phase1_log: Some(phase1_log()),
        phase1_log_path: None,
        load_log_path: None,
        state: PipelineState::Failed,
    };
    let report = DiagnosticReporter::default().from_run(&dir.path().join("dict.db"), &run);
    assert!(report.load.is_none());
    assert_eq!(report.phase1.records, 2);
}
