//! Free-text load log classification.

use std::fs;
use std::path::Path;

use regex::Regex;

use sfm_transform::LoadOutcome;
use sfm_transform::loader::PLACEHOLDER;

use crate::error::{ReportError, Result};

/// Line prefixes that classify load-log lines. Loaders may write localized
/// prefixes next to the literal ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTokens {
    pub warning: Vec<String>,
    pub info: Vec<String>,
}

impl Default for LogTokens {
    fn default() -> Self {
        Self {
            warning: vec!["Warning:".to_string()],
            info: vec!["Info:".to_string()],
        }
    }
}

impl LogTokens {
    /// Literal tokens plus any localized ones.
    pub fn with_localized(warning: &[String], info: &[String]) -> Self {
        let mut tokens = Self::default();
        tokens.warning.extend(warning.iter().filter(|t| !t.is_empty()).cloned());
        tokens.info.extend(info.iter().filter(|t| !t.is_empty()).cloned());
        tokens
    }

    fn classify(&self, line: &str) -> LineKind {
        let line = line.trim_start();
        if self.warning.iter().any(|token| line.starts_with(token.as_str())) {
            LineKind::Warning
        } else if self.info.iter().any(|token| line.starts_with(token.as_str())) {
            LineKind::Info
        } else {
            LineKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Warning,
    Info,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSegment {
    Text(String),
    /// An id the loader confirmed as a created object.
    Object { id: u64, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadLogLine {
    /// 1-based line number in the load log.
    pub number: usize,
    pub kind: LineKind,
    pub segments: Vec<LineSegment>,
}

impl LoadLogLine {
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                LineSegment::Text(text) | LineSegment::Object { text, .. } => text.as_str(),
            })
            .collect()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            LineSegment::Object { id, .. } => Some(*id),
            LineSegment::Text(_) => None,
        })
    }
}

/// The load log, grouped for display: warnings, then info, then everything
/// else in original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadLog {
    pub warnings: Vec<LoadLogLine>,
    pub info: Vec<LoadLogLine>,
    pub others: Vec<LoadLogLine>,
    /// The elapsed-time line, kept out of the groups.
    pub elapsed: Option<String>,
}

impl LoadLog {
    pub fn read(path: &Path, tokens: &LogTokens, outcome: &LoadOutcome) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ReportError::LoadLog {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, tokens, outcome)
    }

    pub fn parse(text: &str, tokens: &LogTokens, outcome: &LoadOutcome) -> Result<Self> {
        let created = outcome
            .created_templates
            .iter()
            .filter_map(|template| template_regex(template).transpose())
            .collect::<Result<Vec<_>>>()?;
        let elapsed_prefix = elapsed_prefix(&outcome.elapsed_template);

        let mut log = Self::default();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(prefix) = elapsed_prefix
                && line.trim_start().starts_with(prefix)
            {
                log.elapsed = Some(line.trim().to_string());
                continue;
            }
            let entry = LoadLogLine {
                number: index + 1,
                kind: tokens.classify(line),
                segments: link_objects(line, &created, outcome),
            };
            match entry.kind {
                LineKind::Warning => log.warnings.push(entry),
                LineKind::Info => log.info.push(entry),
                LineKind::Other => log.others.push(entry),
            }
        }
        tracing::debug!(
            warnings = log.warnings.len(),
            info = log.info.len(),
            others = log.others.len(),
            "classified load log"
        );
        Ok(log)
    }

    pub fn lines(&self) -> impl Iterator<Item = &LoadLogLine> {
        self.warnings
            .iter()
            .chain(&self.info)
            .chain(&self.others)
    }
}

/// Template text before the placeholder; `None` when that text is empty.
fn elapsed_prefix(template: &str) -> Option<&str> {
    let prefix = template
        .split(PLACEHOLDER)
        .next()
        .unwrap_or_default()
        .trim();
    (!prefix.is_empty()).then_some(prefix)
}

/// `Created Entry {0}` becomes `Created Entry (\d+)`. Templates without a
/// placeholder cannot locate an id and are skipped.
fn template_regex(template: &str) -> Result<Option<Regex>> {
    let Some((before, after)) = template.split_once(PLACEHOLDER) else {
        tracing::warn!(template, "object template has no placeholder");
        return Ok(None);
    };
    let pattern = format!(r"{}(\d+){}", regex::escape(before), regex::escape(after));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|source| ReportError::Template {
            template: template.to_string(),
            source,
        })
}

fn link_objects(line: &str, templates: &[Regex], outcome: &LoadOutcome) -> Vec<LineSegment> {
    let mut spans: Vec<(usize, usize, u64)> = templates
        .iter()
        .flat_map(|regex| regex.captures_iter(line))
        .filter_map(|captures| {
            let digits = captures.get(1)?;
            let id = digits.as_str().parse::<u64>().ok()?;
            outcome
                .is_valid(id)
                .then_some((digits.start(), digits.end(), id))
        })
        .collect();
    spans.sort_unstable();
    spans.dedup_by_key(|(start, _, _)| *start);

    let mut segments = Vec::new();
    let mut cursor = 0;
    for (start, end, id) in spans {
        if start < cursor {
            continue;
        }
        if start > cursor {
            segments.push(LineSegment::Text(line[cursor..start].to_string()));
        }
        segments.push(LineSegment::Object {
            id,
            text: line[start..end].to_string(),
        });
        cursor = end;
    }
    if cursor < line.len() {
        segments.push(LineSegment::Text(line[cursor..].to_string()));
    }
    segments
}
