//! Phase 1: SFM fields to nested class objects.
//!
//! Output shape:
//!
//! ```xml
//! <database>
//!   <object class="Entry" line="3">
//!     <field marker="lx" id="lex" lang="Vern" line="3">kala</field>
//!     <field marker="nt" auto="true" lang="Eng" line="4">a note</field>
//!     <object class="Sense" line="5">...</object>
//!   </object>
//! </database>
//! ```

use std::collections::{BTreeMap, BTreeSet};

use sfm_ingest::SfmField;
use sfm_model::{DescriptionKind, OutOfOrderCaution, Phase1Log};
use sfm_schema::xml::XmlElement;

use crate::context::ImportContext;

pub const ROOT: &str = "database";
pub const OBJECT: &str = "object";
pub const FIELD: &str = "field";

/// What phase 1 does with a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Exclude,
    Auto {
        lang: Option<String>,
    },
    Field {
        class: String,
        id: String,
        lang: Option<String>,
        abbr: bool,
    },
    /// Described, but the destination no longer resolves.
    Unknown,
}

struct Rules {
    by_marker: BTreeMap<String, Rule>,
    /// Begin markers per class.
    begins: BTreeMap<String, BTreeSet<String>>,
}

impl Rules {
    fn build(ctx: &ImportContext<'_>) -> Self {
        let mut by_marker = BTreeMap::new();
        for (marker, description) in &ctx.descriptor.fields {
            let rule = if description.exclude {
                Rule::Exclude
            } else if description.auto_import {
                Rule::Auto {
                    lang: description.language.clone(),
                }
            } else {
                let target = match &description.kind {
                    DescriptionKind::Standard {
                        meaning: Some(meaning),
                    } => meaning
                        .class
                        .clone()
                        .or_else(|| {
                            ctx.schema
                                .get_field(&meaning.id)
                                .and_then(|field| field.classes.first().cloned())
                        })
                        .map(|class| (class, meaning.id.clone())),
                    DescriptionKind::Standard { meaning: None } => None,
                    DescriptionKind::Custom { key, .. } => ImportContext::custom_class(key.class_id)
                        .map(|class| (class.to_string(), key.field_id())),
                };
                match target {
                    Some((class, id)) => Rule::Field {
                        class,
                        id,
                        lang: description.language.clone(),
                        abbr: description.is_abbr,
                    },
                    None => Rule::Unknown,
                }
            };
            by_marker.insert(marker.clone(), rule);
        }

        let mut begins: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for level in &ctx.descriptor.hierarchy {
            for marker in &level.begin_fields {
                if let Some(Rule::Field { class, .. }) = by_marker.get(marker)
                    && *class == level.name
                {
                    begins
                        .entry(level.name.clone())
                        .or_default()
                        .insert(marker.clone());
                }
            }
        }
        Self { by_marker, begins }
    }

    fn is_begin(&self, class: &str, marker: &str) -> bool {
        self.begins
            .get(class)
            .is_some_and(|markers| markers.contains(marker))
    }
}

struct Frame {
    class: String,
    element: XmlElement,
    seen_markers: BTreeSet<String>,
    seen_ids: BTreeSet<String>,
}

struct Builder<'c, 'a> {
    ctx: &'c ImportContext<'a>,
    rules: Rules,
    root: XmlElement,
    stack: Vec<Frame>,
    log: Phase1Log,
    headword: String,
    warned_markers: BTreeSet<String>,
}

/// Build the phase-1 document and its log from tokenized fields.
pub fn build(fields: &[SfmField], ctx: &ImportContext<'_>) -> (XmlElement, Phase1Log) {
    let mut builder = Builder {
        ctx,
        rules: Rules::build(ctx),
        root: XmlElement::new(ROOT),
        stack: Vec::new(),
        log: Phase1Log::default(),
        headword: String::new(),
        warned_markers: BTreeSet::new(),
    };
    for field in fields {
        builder.log.tally(&field.marker, field.is_empty());
        builder.accept(field);
    }
    builder.close_to(0);
    tracing::info!(
        records = builder.log.records,
        errors = builder.log.errors.count,
        warnings = builder.log.warnings.count,
        cautions = builder.log.out_of_order.len(),
        "phase 1 built records"
    );
    (builder.root, builder.log)
}

impl Builder<'_, '_> {
    fn accept(&mut self, field: &SfmField) {
        let rule = match self.rules.by_marker.get(&field.marker) {
            Some(rule) => rule.clone(),
            None => {
                self.warn_once(
                    field,
                    format!(
                        "marker \\{} is not in the mapping file; data auto-imported",
                        field.marker
                    ),
                );
                Rule::Auto { lang: None }
            }
        };
        match rule {
            Rule::Exclude => {}
            Rule::Unknown => self.warn_once(
                field,
                format!("marker \\{} has no known destination; data skipped", field.marker),
            ),
            Rule::Auto { lang } => self.accept_auto(field, lang),
            Rule::Field {
                class,
                id,
                lang,
                abbr,
            } => {
                let mut element = field_element(field, lang);
                element.set_attr("id", id.as_str());
                if abbr {
                    element.set_attr("abbr", "true");
                }
                if self.rules.is_begin(&class, &field.marker) {
                    self.accept_begin(field, &class, &id, element);
                } else if !field.is_empty() {
                    self.accept_member(field, &class, &id, element);
                }
            }
        }
    }

    fn accept_begin(&mut self, field: &SfmField, class: &str, id: &str, element: XmlElement) {
        // A begin marker not yet seen in the open object continues it.
        if let Some(pos) = self.find_open(class)
            && !self.stack[pos].seen_markers.contains(&field.marker)
        {
            if pos + 1 != self.stack.len() {
                self.caution(field, class);
                self.close_to(pos + 1);
            }
            self.attach(pos, field, id, element);
            return;
        }
        if let Some(implicit) = self.start_object(field, class) {
            if implicit > 0 {
                self.caution(field, class);
            }
            if self.stack.len() == 1 {
                self.headword = field.value.trim().to_string();
            }
            let top = self.stack.len() - 1;
            self.attach(top, field, id, element);
        }
    }

    fn accept_member(&mut self, field: &SfmField, class: &str, id: &str, element: XmlElement) {
        if let Some(pos) = self.find_open(class) {
            if pos + 1 != self.stack.len() {
                self.caution(field, class);
                self.close_to(pos + 1);
            }
            self.attach(pos, field, id, element);
            return;
        }
        if self.ctx.parent(class).is_none() {
            self.no_owner(field);
            return;
        }
        // The class is not open: open it implicitly under an open ancestor.
        if self.start_object(field, class).is_some() {
            self.caution(field, class);
            let top = self.stack.len() - 1;
            self.stack[top].element.set_attr("implicit", "true");
            self.attach(top, field, id, element);
        }
    }

    fn accept_auto(&mut self, field: &SfmField, lang: Option<String>) {
        if field.is_empty() {
            return;
        }
        let Some(top) = self.stack.len().checked_sub(1) else {
            self.no_owner(field);
            return;
        };
        let has_auto_field = self
            .stack
            .iter()
            .any(|frame| self.ctx.schema.get_auto_field(&frame.class).is_some());
        if !has_auto_field {
            self.log.warnings.record(
                Some(field.line),
                format!(
                    "no auto-import field in scope for \\{} in {}",
                    field.marker, self.stack[top].class
                ),
            );
        }
        let mut element = field_element(field, lang);
        element.set_attr("auto", "true");
        self.stack[top].element.push(element);
    }

    /// Open a new object of `class` under its nearest open ancestor,
    /// creating implicit intermediate objects. Root classes close every open
    /// object and start a new record.
    ///
    /// Returns the number of implicit objects opened, or `None` when nothing
    /// can own the object.
    fn start_object(&mut self, field: &SfmField, class: &str) -> Option<usize> {
        let ancestors = self.ctx.ancestors(class);
        if ancestors.is_empty() {
            self.close_to(0);
            self.log.records += 1;
            self.open(class, field.line);
            return Some(0);
        }
        let Some(pos) = self
            .stack
            .iter()
            .rposition(|frame| ancestors.contains(&frame.class.as_str()))
        else {
            self.no_owner(field);
            return None;
        };
        self.close_to(pos + 1);
        let owner = self.stack[pos].class.clone();
        let missing: Vec<&str> = ancestors
            .iter()
            .take_while(|ancestor| **ancestor != owner)
            .copied()
            .collect();
        let implicit = missing.len();
        for intermediate in missing.into_iter().rev() {
            self.open(intermediate, field.line);
            if let Some(frame) = self.stack.last_mut() {
                frame.element.set_attr("implicit", "true");
            }
        }
        self.open(class, field.line);
        Some(implicit)
    }

    fn attach(&mut self, pos: usize, field: &SfmField, id: &str, element: XmlElement) {
        let frame = &mut self.stack[pos];
        let unique = self
            .ctx
            .schema
            .get_field_in(&frame.class, id)
            .is_some_and(|f| f.flags.is_unique);
        if unique && frame.seen_ids.contains(id) {
            self.log.warnings.record(
                Some(field.line),
                format!(
                    "\\{} repeats a unique field of {} '{}'",
                    field.marker, frame.class, self.headword
                ),
            );
        }
        frame.seen_markers.insert(field.marker.clone());
        frame.seen_ids.insert(id.to_string());
        frame.element.push(element);
    }

    fn find_open(&self, class: &str) -> Option<usize> {
        self.stack.iter().rposition(|frame| frame.class == class)
    }

    fn open(&mut self, class: &str, line: usize) {
        self.stack.push(Frame {
            class: class.to_string(),
            element: XmlElement::new(OBJECT)
                .with_attr("class", class)
                .with_attr("line", line.to_string()),
            seen_markers: BTreeSet::new(),
            seen_ids: BTreeSet::new(),
        });
    }

    fn close_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            match self.stack.last_mut() {
                Some(parent) => parent.element.push(frame.element),
                None => self.root.push(frame.element),
            }
        }
    }

    fn caution(&mut self, field: &SfmField, class: &str) {
        self.log.out_of_order.push(OutOfOrderCaution {
            entry: self.headword.clone(),
            class: class.to_string(),
            marker: field.marker.clone(),
            line: field.line,
        });
    }

    fn no_owner(&mut self, field: &SfmField) {
        self.log.errors.record(
            Some(field.line),
            format!("\\{} has no record to belong to; data skipped", field.marker),
        );
    }

    fn warn_once(&mut self, field: &SfmField, message: String) {
        if self.warned_markers.insert(field.marker.clone()) {
            self.log.warnings.record(Some(field.line), message);
        }
    }
}

fn field_element(field: &SfmField, lang: Option<String>) -> XmlElement {
    let mut element = XmlElement::new(FIELD)
        .with_attr("marker", field.marker.as_str())
        .with_attr("line", field.line.to_string());
    if let Some(lang) = lang {
        element.set_attr("lang", lang);
    }
    element.push_text(field.value.as_str());
    element
}

#[cfg(test)]
mod tests {
    use sfm_ingest::parse_sfm;
    use sfm_model::{
        FieldDescription, FieldFlags, HierarchyLevel, ImportField, MapFileDescriptor, MeaningRef,
        WritingSystems,
    };
    use sfm_schema::FieldSchema;

    use super::*;

    fn schema() -> FieldSchema {
        let mut schema = FieldSchema::new();
        let mut lex = ImportField::new("lex", "Lexeme Form");
        lex.flags.is_unique = true;
        schema.add_field("Entry", None, lex);
        schema.add_field("Entry", None, ImportField::new("date", "Date"));
        schema.add_field(
            "Entry",
            None,
            ImportField::new("eires", "Import Residue").with_flags(FieldFlags {
                is_auto_field: true,
                ..FieldFlags::default()
            }),
        );
        schema.add_field("Sense", Some("Entry"), ImportField::new("pos", "Category"));
        schema.add_field("Sense", Some("Entry"), ImportField::new("glos", "Gloss"));
        schema.add_field("Example", Some("Sense"), ImportField::new("ex", "Example"));
        schema
    }

    fn descriptor() -> MapFileDescriptor {
        let mut descriptor = MapFileDescriptor::default();
        let markers = [
            ("lx", "lex"),
            ("dt", "date"),
            ("ps", "pos"),
            ("ge", "glos"),
            ("xv", "ex"),
        ];
        for (marker, id) in markers {
            descriptor.fields.insert(
                marker.to_string(),
                FieldDescription::standard(
                    marker,
                    Some(MeaningRef {
                        id: id.to_string(),
                        class: None,
                    }),
                ),
            );
        }
        let mut nt = FieldDescription::standard("nt", None);
        nt.auto_import = true;
        descriptor.fields.insert("nt".to_string(), nt);
        descriptor.hierarchy = vec![
            HierarchyLevel {
                name: "Entry".to_string(),
                part_of: None,
                begin_fields: vec!["lx".to_string()],
            },
            HierarchyLevel {
                name: "Sense".to_string(),
                part_of: Some("Entry".to_string()),
                begin_fields: vec!["ps".to_string(), "ge".to_string()],
            },
            HierarchyLevel {
                name: "Example".to_string(),
                part_of: Some("Sense".to_string()),
                begin_fields: vec!["xv".to_string()],
            },
        ];
        descriptor
    }

    fn run(text: &str) -> (XmlElement, Phase1Log) {
        let schema = schema();
        let descriptor = descriptor();
        let ws = WritingSystems::default();
        let ctx = ImportContext::new(&schema, &descriptor, &ws);
        build(&parse_sfm(text), &ctx)
    }

    fn classes(element: &XmlElement) -> Vec<String> {
        element
            .children_named(OBJECT)
            .filter_map(|o| o.attr("class"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn begin_markers_nest_objects() {
        let (root, log) = run("\\lx a\n\\ps n\n\\ge one\n\\ge two\n\\lx b\n");
        assert_eq!(log.records, 2);
        let entries: Vec<&XmlElement> = root.children_named(OBJECT).collect();
        assert_eq!(entries.len(), 2);
        // `\ps` then `\ge` share a sense; the second `\ge` starts another.
        assert_eq!(classes(entries[0]), vec!["Sense", "Sense"]);
        assert!(log.errors.is_empty() && log.out_of_order.is_empty());
    }

    #[test]
    fn outer_field_after_nested_object_is_a_caution() {
        let (root, log) = run("\\lx kala\n\\ge fish\n\\dt 2001\n");
        assert_eq!(log.out_of_order.len(), 1);
        let caution = &log.out_of_order[0];
        assert_eq!((caution.entry.as_str(), caution.marker.as_str()), ("kala", "dt"));
        let entry = root.child(OBJECT).unwrap();
        assert!(entry.children_named(FIELD).any(|f| f.attr("marker") == Some("dt")));
    }

    #[test]
    fn example_without_sense_opens_one_implicitly() {
        let (root, log) = run("\\lx a\n\\xv sentence\n");
        assert_eq!(log.out_of_order.len(), 1);
        let sense = root.child(OBJECT).unwrap().child(OBJECT).unwrap();
        assert_eq!(sense.attr("implicit"), Some("true"));
        assert_eq!(classes(sense), vec!["Example"]);
    }

    #[test]
    fn fields_before_any_record_are_errors() {
        let (_, log) = run("\\ge stray\n\\nt note\n\\lx a\n");
        assert_eq!(log.errors.count, 2);
        assert_eq!(log.errors.entries[0].line, Some(1));
    }

    #[test]
    fn unmapped_markers_warn_once_and_auto_import() {
        let (root, log) = run("\\lx a\n\\zz x\n\\zz y\n");
        assert_eq!(log.warnings.count, 1);
        let entry = root.child(OBJECT).unwrap();
        let autos = entry
            .children_named(FIELD)
            .filter(|f| f.attr("auto") == Some("true"))
            .count();
        assert_eq!(autos, 2);
    }

    #[test]
    fn repeated_unique_field_warns() {
        let (_, log) = run("\\lx a\n\\ps n\n\\lx b\n");
        assert!(log.warnings.is_empty());
        let (_, log) = run("\\lx a\n\\dt x\n\\dt y\n");
        assert!(log.warnings.is_empty());
        let mut descriptor = descriptor();
        descriptor.hierarchy[0].begin_fields.clear();
        descriptor.hierarchy[0].begin_fields.push("dt".to_string());
        let schema = schema();
        let ws = WritingSystems::default();
        let ctx = ImportContext::new(&schema, &descriptor, &ws);
        let (_, log) = build(&parse_sfm("\\dt 1\n\\lx a\n\\lx b\n"), &ctx);
        assert_eq!(log.warnings.count, 1);
    }

    #[test]
    fn stats_count_every_marker() {
        let (_, log) = run("\\lx a\n\\ge\n\\lx b\n");
        assert_eq!(log.stats[0].count, 2);
        assert_eq!(log.stats[1].empty, 1);
    }
}
