use std::fmt::Write as _;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use sfm_ingest::MarkerCatalog;
use sfm_map::MappingResolver;
use sfm_model::{ContentMapping, Destination};
use sfm_report::ImportReport;
use sfm_schema::{FieldSchema, SchemaProvider};

pub fn print_scan(catalog: &MarkerCatalog) {
    let mut table = new_table(&["Marker", "Count", "Empty", "First seen"]);
    for column in 1..=3 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for stat in catalog.stats_in_order() {
        table.add_row(vec![
            marker_cell(&stat.marker),
            Cell::new(stat.count),
            count_cell(stat.empty_count, Color::Yellow),
            Cell::new(stat.order + 1),
        ]);
    }
    println!("{table}");
    println!(
        "{} markers, {} fields",
        catalog.len(),
        catalog.total_fields()
    );
}

pub fn print_fields(schema: &FieldSchema, class: Option<&str>) {
    let mut table = new_table(&[
        "Class",
        "Part of",
        "Field",
        "Name",
        "Signature",
        "Flags",
        "MDF",
    ]);
    for entry in schema
        .classes()
        .iter()
        .filter(|entry| class.is_none_or(|name| entry.name() == name))
    {
        for field in &entry.fields {
            let flags = field.flags;
            let mut tags = Vec::new();
            for (set, tag) in [
                (flags.is_list, "list"),
                (flags.is_multi, "multi"),
                (flags.is_ref, "ref"),
                (flags.is_auto_field, "auto"),
                (flags.is_unique, "unique"),
                (flags.is_abbr_field, "abbr"),
            ] {
                if set {
                    tags.push(tag);
                }
            }
            table.add_row(vec![
                Cell::new(entry.name()).fg(Color::Blue),
                dim_or(entry.descriptor.part_of.as_deref()),
                Cell::new(&field.id),
                Cell::new(&field.ui_name),
                dim_or(Some(field.signature.as_str()).filter(|s| !s.is_empty())),
                Cell::new(tags.join(" ")),
                Cell::new(
                    field
                        .mdf_markers
                        .iter()
                        .map(|m| format!("\\{m}"))
                        .collect::<Vec<_>>()
                        .join(" "),
                ),
            ]);
        }
    }
    println!("{table}");
}

pub fn print_mappings<P: SchemaProvider>(resolver: &MappingResolver<P>) {
    let mut table = new_table(&[
        "Marker",
        "Destination",
        "Class",
        "Language",
        "Begin",
        "Count",
        "Empty",
    ]);
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Right);
    let mut mappings: Vec<&ContentMapping> = resolver.mappings().values().collect();
    mappings.sort_by_key(|mapping| mapping.order);
    for mapping in mappings {
        table.add_row(vec![
            marker_cell(&mapping.marker),
            destination_cell(mapping),
            Cell::new(mapping.class_name()),
            Cell::new(mapping.language.display_name()),
            if mapping.is_begin_marker {
                Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
            } else {
                Cell::new("")
            },
            Cell::new(mapping.count),
            count_cell(mapping.empty_count, Color::Yellow),
        ]);
    }
    println!("{table}");

    let validator = resolver.validator();
    let mut hierarchy = new_table(&["Class", "Begin markers", "Status"]);
    for group in validator.group_by_class() {
        let markers: Vec<String> = group.begin_markers().map(|m| format!("\\{m}")).collect();
        let status = if group.has_begin_marker() {
            Cell::new("ok").fg(Color::Green)
        } else {
            Cell::new("no begin marker")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold)
        };
        hierarchy.add_row(vec![
            Cell::new(group.class).fg(Color::Blue),
            Cell::new(markers.join(" ")),
            status,
        ]);
    }
    println!("{hierarchy}");
}

/// Plain-text summary of a report, stable enough for snapshots.
pub fn report_text(report: &ImportReport) -> String {
    let totals = report.totals();
    let mut out = String::new();
    let _ = writeln!(out, "Status:   {}", report.status);
    let _ = writeln!(out, "Records:  {}", report.phase1.records);
    let _ = writeln!(out, "Errors:   {}", totals.errors);
    let _ = writeln!(out, "Warnings: {}", totals.warnings);
    let _ = writeln!(out, "Cautions: {}", totals.cautions);
    if let Some(elapsed) = report.elapsed() {
        let _ = writeln!(out, "Elapsed:  {elapsed}");
    }
    for entry in &report.phase1.errors.entries {
        let _ = writeln!(out, "error: {}", with_line(entry.line, &entry.message));
    }
    for entry in &report.phase1.warnings.entries {
        let _ = writeln!(out, "warning: {}", with_line(entry.line, &entry.message));
    }
    for caution in &report.phase1.out_of_order {
        let _ = writeln!(
            out,
            "caution: line {}: \\{} out of order in {} ({})",
            caution.line, caution.marker, caution.entry, caution.class
        );
    }
    out.push_str("Markers:\n");
    for row in &report.stats {
        let _ = writeln!(
            out,
            "  \\{:<6} {:>5} {:>5} {:>6.1}%",
            row.marker, row.count, row.empty, row.usage_percent
        );
    }
    out
}

pub fn print_report(report: &ImportReport) {
    print!("{}", report_text(report));
    if let Some(load) = &report.load
        && !load.warnings.is_empty()
    {
        eprintln!("Load warnings:");
        for line in &load.warnings {
            eprintln!("- {}", line.text());
        }
    }
}

fn with_line(line: Option<usize>, message: &str) -> String {
    match line {
        Some(line) => format!("line {line}: {message}"),
        None => message.to_string(),
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|label| header_cell(label)));
    table
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn marker_cell(marker: &str) -> Cell {
    Cell::new(format!("\\{marker}"))
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn destination_cell(mapping: &ContentMapping) -> Cell {
    if mapping.exclude {
        return dim_cell("(excluded)");
    }
    match &mapping.destination {
        Destination::AutoImport => Cell::new("(auto-import)").fg(Color::DarkGrey),
        Destination::Field { name, .. } => Cell::new(name),
        Destination::Unknown => Cell::new("Unknown").fg(Color::Red),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn dim_or(value: Option<&str>) -> Cell {
    value.map_or_else(|| dim_cell("-"), Cell::new)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
