//! The loader collaborator that consumes phase 4 output.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use sfm_schema::xml::{XmlElement, parse_document};

use crate::error::LoadError;
use crate::phase4::ROOT;
use crate::pipeline::ProgressSink;

/// Placeholder the reporter replaces in load-log templates.
pub const PLACEHOLDER: &str = "{0}";

/// Predicate telling the reporter whether an id names a created object.
pub type ObjectIdPredicate = Box<dyn Fn(u64) -> bool + Send + Sync>;

/// What a loader hands back for the report.
pub struct LoadOutcome {
    /// Load-log line announcing the elapsed time, e.g. `Import took {0}`.
    pub elapsed_template: String,
    /// Load-log lines announcing a created object, e.g. `Created Entry {0}`.
    pub created_templates: Vec<String>,
    pub is_valid_object_id: ObjectIdPredicate,
    /// Free-text load log, when the loader wrote one.
    pub log_path: Option<PathBuf>,
    pub objects_created: u64,
}

impl LoadOutcome {
    /// Outcome for a load that failed part way: only the log is known.
    /// No object ids are valid, so the report links nothing.
    pub fn failed(log_path: Option<PathBuf>) -> Self {
        Self {
            elapsed_template: String::new(),
            created_templates: Vec::new(),
            is_valid_object_id: Box::new(|_| false),
            log_path,
            objects_created: 0,
        }
    }

    pub fn is_valid(&self, id: u64) -> bool {
        (self.is_valid_object_id)(id)
    }
}

impl fmt::Debug for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOutcome")
            .field("elapsed_template", &self.elapsed_template)
            .field("created_templates", &self.created_templates)
            .field("log_path", &self.log_path)
            .field("objects_created", &self.objects_created)
            .finish_non_exhaustive()
    }
}

/// Where a loader writes its log: `<phase4 stem>-Import.log` beside the
/// phase 4 file.
pub fn load_log_path(phase4: &Path) -> PathBuf {
    let stem = phase4
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Phase4Output".to_string());
    phase4.with_file_name(format!("{stem}-Import.log"))
}

/// Loads phase 4 XML into a lexicon.
pub trait Loader {
    fn load(
        &mut self,
        phase4: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<LoadOutcome, LoadError>;
}

/// Loader that validates phase 4 output and records what it would create.
///
/// Writes `<phase4 stem>-Import.log` next to the phase 4 file and never
/// touches a lexicon.
#[derive(Debug, Default)]
pub struct DryRunLoader {
    created: Vec<(String, u64)>,
}

impl DryRunLoader {
    pub const ELAPSED_TEMPLATE: &'static str = "Import took {0}";

    pub fn new() -> Self {
        Self::default()
    }

    /// Objects created by the last load, as (class, id).
    pub fn created(&self) -> &[(String, u64)] {
        &self.created
    }

    fn created_template(class: &str) -> String {
        format!("Created {class} {PLACEHOLDER}")
    }
}

impl Loader for DryRunLoader {
    fn load(
        &mut self,
        phase4: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<LoadOutcome, LoadError> {
        let started = Instant::now();
        let text = fs::read_to_string(phase4).map_err(|source| LoadError::Io {
            path: phase4.to_path_buf(),
            source,
        })?;
        let root = parse_document(&text).map_err(|e| LoadError::Xml {
            path: phase4.to_path_buf(),
            message: e.to_string(),
        })?;
        if root.name != ROOT {
            return Err(LoadError::Failed {
                message: format!("expected <{ROOT}>, found <{}>", root.name),
            });
        }

        let mut lines = vec![
            format!("Info: Import started {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
            format!("Info: Reading {}", phase4.display()),
        ];
        self.created.clear();
        let mut warnings = Vec::new();
        for object in root.elements() {
            self.visit(object, &mut warnings);
        }
        progress.step(0, &format!("Loaded {} objects", self.created.len()));

        lines.extend(warnings);
        let mut classes = BTreeSet::new();
        for (class, id) in &self.created {
            lines.push(Self::created_template(class).replace(PLACEHOLDER, &id.to_string()));
            classes.insert(class.clone());
        }
        let elapsed = format!("{:.2} s", started.elapsed().as_secs_f64());
        lines.push(Self::ELAPSED_TEMPLATE.replace(PLACEHOLDER, &elapsed));

        let log_path = load_log_path(phase4);
        let mut body = lines.join("\n");
        body.push('\n');
        fs::write(&log_path, body).map_err(|source| LoadError::Io {
            path: log_path.clone(),
            source,
        })?;
        tracing::info!(
            objects = self.created.len(),
            log = %log_path.display(),
            "dry-run load complete"
        );

        let ids: BTreeSet<u64> = self.created.iter().map(|(_, id)| *id).collect();
        Ok(LoadOutcome {
            elapsed_template: Self::ELAPSED_TEMPLATE.to_string(),
            created_templates: classes.iter().map(|c| Self::created_template(c)).collect(),
            is_valid_object_id: Box::new(move |id| ids.contains(&id)),
            log_path: Some(log_path),
            objects_created: self.created.len() as u64,
        })
    }
}

impl DryRunLoader {
    fn visit(&mut self, object: &XmlElement, warnings: &mut Vec<String>) {
        let Some(id) = object.attr("id").and_then(|id| id.parse::<u64>().ok()) else {
            warnings.push(format!("Warning: <{}> without an object id skipped", object.name));
            return;
        };
        // Fields never carry an id; nested objects always do.
        let is_object = |e: &XmlElement| e.attr("id").is_some();
        if !object.elements().any(|child| !is_object(child)) {
            warnings.push(format!("Warning: {} {id} has no fields", object.name));
        }
        self.created.push((object.name.clone(), id));
        for child in object.elements().filter(|child| is_object(child)) {
            self.visit(child, warnings);
        }
    }
}
