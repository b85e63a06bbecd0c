//! HTML rendering of an [`ImportReport`].

use std::fs;
use std::path::Path;

use sfm_model::LogSection;
use sfm_schema::xml::{Layout, XmlElement, write_document};

use crate::load_log::{LineSegment, LoadLogLine};
use crate::reporter::ImportReport;

/// Link scheme for objects the loader created.
const OBJECT_LINK: &str = "lexicon://object/";

fn text(name: &str, content: impl Into<String>) -> XmlElement {
    XmlElement::new(name).with_text(content)
}

fn section(title: &str) -> XmlElement {
    let mut div = XmlElement::new("div").with_attr("class", "section");
    div.push(text("h2", title));
    div
}

fn log_section(title: &str, log: &LogSection) -> XmlElement {
    let mut div = section(&format!("{title} ({})", log.count));
    if log.listed() < log.count {
        div.push(text(
            "p",
            format!("Showing the first {} of {}.", log.listed(), log.count),
        ));
    }
    if !log.entries.is_empty() {
        let mut list = XmlElement::new("ul");
        for entry in &log.entries {
            let line = match entry.line {
                Some(line) => format!("Line {line}: {}", entry.message),
                None => entry.message.clone(),
            };
            list.push(text("li", line));
        }
        div.push(list);
    }
    div
}

fn load_line(line: &LoadLogLine) -> XmlElement {
    let mut item = XmlElement::new("li").with_attr("class", "load-line");
    for segment in &line.segments {
        match segment {
            LineSegment::Text(content) => item.push_text(content.as_str()),
            LineSegment::Object { id, text: label } => item.push(
                XmlElement::new("a")
                    .with_attr("href", format!("{OBJECT_LINK}{id}"))
                    .with_text(label.as_str()),
            ),
        }
    }
    item
}

pub fn render_html(report: &ImportReport) -> String {
    let totals = report.totals();
    let mut body = XmlElement::new("body");
    body.push(text("h1", "SFM Import Report"));
    body.push(text(
        "p",
        format!(
            "{} | generated {}",
            report.data_file.display(),
            report.generated.format("%Y-%m-%d %H:%M:%S")
        ),
    ));
    body.push(text("p", report.status.as_str()).with_attr("class", "status"));
    if let Some(elapsed) = report.elapsed() {
        body.push(text("p", elapsed).with_attr("class", "elapsed"));
    }

    let mut summary = XmlElement::new("table").with_attr("class", "summary");
    for (label, value) in [
        ("Records", report.phase1.records),
        ("Errors", totals.errors),
        ("Warnings", totals.warnings),
        ("Cautions", totals.cautions),
    ] {
        let mut row = XmlElement::new("tr");
        row.push(text("th", label));
        row.push(text("td", value.to_string()));
        summary.push(row);
    }
    body.push(summary);

    body.push(log_section("Errors", &report.phase1.errors));
    body.push(log_section("Warnings", &report.phase1.warnings));

    let mut cautions = section(&format!("Out of order ({})", report.phase1.out_of_order.len()));
    if !report.phase1.out_of_order.is_empty() {
        let mut table = XmlElement::new("table");
        let mut head = XmlElement::new("tr");
        for title in ["Entry", "Class", "Marker", "Line"] {
            head.push(text("th", title));
        }
        table.push(head);
        for caution in &report.phase1.out_of_order {
            let mut row = XmlElement::new("tr");
            row.push(text("td", caution.entry.as_str()));
            row.push(text("td", caution.class.as_str()));
            row.push(text("td", format!("\\{}", caution.marker)));
            row.push(text("td", caution.line.to_string()));
            table.push(row);
        }
        cautions.push(table);
    }
    body.push(cautions);

    if let Some(load) = &report.load {
        let mut div = section("Import log");
        let mut list = XmlElement::new("ul");
        for line in load.lines() {
            list.push(load_line(line));
        }
        div.push(list);
        body.push(div);
    }

    let mut stats = section("Marker statistics");
    let mut table = XmlElement::new("table").with_attr("class", "stats");
    let mut head = XmlElement::new("tr");
    for title in ["Marker", "Count", "Empty", "Usage"] {
        head.push(text("th", title));
    }
    table.push(head);
    for row in &report.stats {
        let mut tr = XmlElement::new("tr");
        tr.push(text("td", format!("\\{}", row.marker)));
        tr.push(text("td", row.count.to_string()));
        tr.push(text("td", row.empty.to_string()));
        tr.push(text("td", format!("{:.1}%", row.usage_percent)));
        table.push(tr);
    }
    stats.push(table);
    body.push(stats);

    let mut head = XmlElement::new("head");
    head.push(text("title", "SFM Import Report"));
    head.push(text(
        "style",
        "body{font-family:sans-serif}table{border-collapse:collapse}\
         td,th{border:1px solid #ccc;padding:2px 6px}",
    ));
    let mut html = XmlElement::new("html").with_attr("xmlns", "http://www.w3.org/1999/xhtml");
    html.push(head);
    html.push(body);

    // Mixed content in log lines needs the compact layout.
    write_document(&html, Layout::Compact).unwrap_or_else(|error| {
        tracing::warn!(%error, "report rendering failed");
        String::new()
    })
}

/// Write the report. Failures are logged and reported as `false`; a report
/// that cannot be written is simply not shown.
pub fn write_report(report: &ImportReport, path: &Path) -> bool {
    let html = render_html(report);
    if html.is_empty() {
        return false;
    }
    match fs::write(path, html) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "report written");
            true
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "report not written");
            false
        }
    }
}
