//! `Phase1Log.xml` reader and writer.
//!
//! ```xml
//! <Phase1Log>
//!   <Errors count="1" listed="1"><Error line="7">...</Error></Errors>
//!   <Warnings count="0" listed="0"/>
//!   <OutOfOrder count="1"><Caution entry="kala" class="Entry" marker="dt" line="12"/></OutOfOrder>
//!   <SfmStats records="10"><Marker name="lx" count="10" empty="0"/></SfmStats>
//! </Phase1Log>
//! ```

use std::path::Path;

use sfm_model::{LogEntry, LogSection, MarkerTally, OutOfOrderCaution, Phase1Log};
use sfm_schema::xml::{Layout, XmlElement, parse_document, write_document};

use crate::error::TransformError;

const ROOT: &str = "Phase1Log";

pub fn write_phase1_log(log: &Phase1Log, path: &Path) -> Result<(), TransformError> {
    let mut root = XmlElement::new(ROOT);
    root.push(section_element("Errors", "Error", &log.errors));
    root.push(section_element("Warnings", "Warning", &log.warnings));

    let mut out_of_order =
        XmlElement::new("OutOfOrder").with_attr("count", log.out_of_order.len().to_string());
    for caution in &log.out_of_order {
        out_of_order.push(
            XmlElement::new("Caution")
                .with_attr("entry", caution.entry.as_str())
                .with_attr("class", caution.class.as_str())
                .with_attr("marker", caution.marker.as_str())
                .with_attr("line", caution.line.to_string()),
        );
    }
    root.push(out_of_order);

    let mut stats = XmlElement::new("SfmStats").with_attr("records", log.records.to_string());
    for tally in &log.stats {
        stats.push(
            XmlElement::new("Marker")
                .with_attr("name", tally.marker.as_str())
                .with_attr("count", tally.count.to_string())
                .with_attr("empty", tally.empty.to_string()),
        );
    }
    root.push(stats);

    let text = write_document(&root, Layout::Indented).map_err(|e| TransformError::xml(path, e))?;
    std::fs::write(path, text).map_err(|e| TransformError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn section_element(name: &str, item: &str, section: &LogSection) -> XmlElement {
    let mut element = XmlElement::new(name)
        .with_attr("count", section.count.to_string())
        .with_attr("listed", section.listed().to_string());
    for entry in &section.entries {
        let mut child = XmlElement::new(item).with_text(entry.message.as_str());
        if let Some(line) = entry.line {
            child.set_attr("line", line.to_string());
        }
        element.push(child);
    }
    element
}

pub fn read_phase1_log(path: &Path) -> Result<Phase1Log, TransformError> {
    let text = std::fs::read_to_string(path).map_err(|e| TransformError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let root = parse_document(&text).map_err(|e| TransformError::xml(path, e))?;
    if root.name != ROOT {
        return Err(TransformError::malformed(
            path,
            format!("expected <{ROOT}>, found <{}>", root.name),
        ));
    }

    let mut log = Phase1Log {
        errors: read_section(root.child("Errors")),
        warnings: read_section(root.child("Warnings")),
        ..Phase1Log::default()
    };
    if let Some(section) = root.child("OutOfOrder") {
        log.out_of_order = section
            .children_named("Caution")
            .map(|caution| OutOfOrderCaution {
                entry: caution.attr("entry").unwrap_or_default().to_string(),
                class: caution.attr("class").unwrap_or_default().to_string(),
                marker: caution.attr("marker").unwrap_or_default().to_string(),
                line: number(caution, "line"),
            })
            .collect();
    }
    if let Some(stats) = root.child("SfmStats") {
        log.records = number(stats, "records");
        log.stats = stats
            .children_named("Marker")
            .map(|marker| MarkerTally {
                marker: marker.attr("name").unwrap_or_default().to_string(),
                count: number(marker, "count"),
                empty: number(marker, "empty"),
            })
            .collect();
    }
    Ok(log)
}

fn read_section(element: Option<&XmlElement>) -> LogSection {
    let Some(element) = element else {
        return LogSection::default();
    };
    let entries: Vec<LogEntry> = element
        .elements()
        .map(|item| LogEntry {
            line: item.attr("line").and_then(|line| line.parse().ok()),
            message: item.text(),
        })
        .collect();
    LogSection {
        count: element
            .attr("count")
            .and_then(|count| count.parse().ok())
            .unwrap_or(entries.len()),
        entries,
    }
}

fn number(element: &XmlElement, attribute: &str) -> usize {
    element
        .attr(attribute)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_survives_a_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Phase1Log.xml");
        let mut log = Phase1Log::default();
        log.errors.record(Some(4), "no owner for \\ge");
        log.warnings.record(None, "marker \\zz is not in the mapping file");
        log.out_of_order.push(OutOfOrderCaution {
            entry: "kala".to_string(),
            class: "Entry".to_string(),
            marker: "dt".to_string(),
            line: 9,
        });
        log.records = 3;
        log.tally("lx", false);
        log.tally("ge", true);

        write_phase1_log(&log, &path).unwrap();
        assert_eq!(read_phase1_log(&path).unwrap(), log);
    }
}
