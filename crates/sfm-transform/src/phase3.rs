//! Phase 3: field normalization against the catalog.
//!
//! - auto-import fields move into the auto field of the nearest object
//!   (self or ancestor) whose class has one, as `<para marker="..">` items
//! - repeated fields that are not multi-valued merge, joined with `; `
//! - list fields split on `;` into `<item>` children
//! - reference fields carry a normalized `target`
//! - abbreviation fields carry `match="abbr"` or `match="name"`

use sfm_model::ImportField;
use sfm_schema::xml::{XmlElement, XmlNode};

use crate::context::ImportContext;
use crate::phase1::{FIELD, OBJECT};
use crate::phase2::normalize_whitespace;

pub const PARA: &str = "para";
pub const ITEM: &str = "item";
const LIST_SEPARATOR: char = ';';
const JOINER: &str = "; ";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Phase3Stats {
    pub auto_grouped: usize,
    pub auto_dropped: usize,
    pub merged: usize,
}

pub fn apply(root: &mut XmlElement, ctx: &ImportContext<'_>) -> Phase3Stats {
    let mut stats = Phase3Stats::default();
    for object in root.elements_mut().filter(|e| e.name == OBJECT) {
        let orphans = normalize_object(object, ctx, &mut stats);
        stats.auto_dropped += orphans.len();
    }
    if stats.auto_dropped > 0 {
        tracing::warn!(
            dropped = stats.auto_dropped,
            "auto-import data had no auto field to receive it"
        );
    }
    tracing::info!(
        grouped = stats.auto_grouped,
        merged = stats.merged,
        "phase 3 normalized fields"
    );
    stats
}

/// Normalize one object and its descendants. Returns auto-import paragraphs
/// that no object at or below this one could take.
fn normalize_object(
    object: &mut XmlElement,
    ctx: &ImportContext<'_>,
    stats: &mut Phase3Stats,
) -> Vec<XmlElement> {
    let class = object.attr("class").unwrap_or_default().to_string();
    let mut pending: Vec<XmlElement> = Vec::new();
    let mut kept: Vec<XmlNode> = Vec::new();

    for node in std::mem::take(&mut object.children) {
        let XmlNode::Element(mut child) = node else {
            continue;
        };
        if child.name == OBJECT {
            pending.extend(normalize_object(&mut child, ctx, stats));
            kept.push(XmlNode::Element(child));
        } else if child.name == FIELD && child.flag("auto") {
            pending.push(into_para(child));
        } else {
            kept.push(XmlNode::Element(child));
        }
    }
    object.children = kept;
    stats.merged += merge_repeats(object, &class, ctx);

    for field in object.elements_mut().filter(|e| e.name == FIELD) {
        let id = field.attr("id").unwrap_or_default().to_string();
        if let Some(definition) = ctx.schema.get_field_in(&class, &id) {
            shape_field(field, definition);
        }
    }

    match ctx.schema.get_auto_field(&class) {
        Some(auto_field) if !pending.is_empty() => {
            stats.auto_grouped += pending.len();
            let mut holder = XmlElement::new(FIELD)
                .with_attr("id", auto_field.id.as_str())
                .with_attr("autoField", "true");
            for para in pending {
                holder.push(para);
            }
            insert_before_objects(object, holder);
            Vec::new()
        }
        _ => pending,
    }
}

fn into_para(field: XmlElement) -> XmlElement {
    let mut para = XmlElement::new(PARA);
    para.attributes = field
        .attributes
        .into_iter()
        .filter(|(key, _)| key == "marker" || key == "lang" || key == "line")
        .collect();
    para.children = field.children;
    para
}

/// Merge repeated occurrences of non-multi fields into the first.
fn merge_repeats(object: &mut XmlElement, class: &str, ctx: &ImportContext<'_>) -> usize {
    let mut merged = 0;
    let mut result: Vec<XmlNode> = Vec::with_capacity(object.children.len());
    for node in std::mem::take(&mut object.children) {
        if let XmlNode::Element(field) = &node
            && field.name == FIELD
            && let Some(id) = field.attr("id")
            && ctx
                .schema
                .get_field_in(class, id)
                .is_some_and(|definition| !definition.flags.is_multi)
            && let Some(first) = result.iter_mut().find_map(|existing| match existing {
                XmlNode::Element(e) if e.name == FIELD && e.attr("id") == Some(id) => Some(e),
                _ => None,
            })
        {
            first.push_text(JOINER);
            first.children.extend(field.children.iter().cloned());
            merged += 1;
            continue;
        }
        result.push(node);
    }
    object.children = result;
    merged
}

fn shape_field(field: &mut XmlElement, definition: &ImportField) {
    let flags = definition.flags;
    if flags.is_abbr_field {
        let mode = if field.flag("abbr") { "abbr" } else { "name" };
        field.set_attr("match", mode);
    }
    field.remove_attr("abbr");

    if flags.is_list {
        let text = field.text();
        field.children = text
            .split(LIST_SEPARATOR)
            .map(normalize_whitespace)
            .filter(|value| !value.is_empty())
            .map(|value| {
                let mut item = XmlElement::new(ITEM);
                if flags.is_ref {
                    item.set_attr("target", reference_target(&value));
                }
                XmlNode::Element(item.with_text(value))
            })
            .collect();
    } else if flags.is_ref {
        let target = reference_target(&field.text());
        field.set_attr("target", target);
    }
}

/// Normalized form used to match a reference against headwords: collapsed
/// whitespace with a trailing homograph number split off as `headword#n`.
pub fn reference_target(text: &str) -> String {
    let text = normalize_whitespace(text);
    let stem = text.trim_end_matches(|c: char| c.is_ascii_digit());
    if stem.len() < text.len() && !stem.is_empty() && !stem.ends_with(' ') {
        format!("{stem}#{}", &text[stem.len()..])
    } else {
        text
    }
}

fn insert_before_objects(object: &mut XmlElement, field: XmlElement) {
    let index = object
        .children
        .iter()
        .position(|node| matches!(node, XmlNode::Element(e) if e.name == OBJECT))
        .unwrap_or(object.children.len());
    object.children.insert(index, XmlNode::Element(field));
}

#[cfg(test)]
mod tests {
    use sfm_model::{FieldFlags, MapFileDescriptor, WritingSystems};
    use sfm_schema::FieldSchema;

    use super::*;

    fn schema() -> FieldSchema {
        let mut schema = FieldSchema::new();
        schema.add_field(
            "Entry",
            None,
            ImportField::new("eires", "Residue").with_flags(FieldFlags {
                is_auto_field: true,
                ..FieldFlags::default()
            }),
        );
        schema.add_field("Entry", None, ImportField::new("note", "Note"));
        schema.add_field(
            "Entry",
            None,
            ImportField::new("cf", "Cross Reference").with_flags(FieldFlags {
                is_ref: true,
                is_multi: true,
                ..FieldFlags::default()
            }),
        );
        schema.add_field(
            "Sense",
            Some("Entry"),
            ImportField::new("sem", "Semantic Domain").with_flags(FieldFlags {
                is_list: true,
                ..FieldFlags::default()
            }),
        );
        schema.add_field(
            "Sense",
            Some("Entry"),
            ImportField::new("pos", "Category").with_flags(FieldFlags {
                is_abbr_field: true,
                ..FieldFlags::default()
            }),
        );
        schema
    }

    fn field(id: &str, text: &str) -> XmlElement {
        XmlElement::new(FIELD).with_attr("id", id).with_text(text)
    }

    fn auto(marker: &str, text: &str) -> XmlElement {
        XmlElement::new(FIELD)
            .with_attr("marker", marker)
            .with_attr("auto", "true")
            .with_text(text)
    }

    fn run(root: &mut XmlElement) -> Phase3Stats {
        let schema = schema();
        let descriptor = MapFileDescriptor::default();
        let ws = WritingSystems::default();
        apply(root, &ImportContext::new(&schema, &descriptor, &ws))
    }

    #[test]
    fn sense_auto_data_moves_to_entry_auto_field() {
        let mut sense = XmlElement::new(OBJECT).with_attr("class", "Sense");
        sense.push(auto("zz", "odd"));
        let mut entry = XmlElement::new(OBJECT).with_attr("class", "Entry");
        entry.push(auto("nt", "first"));
        entry.push(sense);
        let mut root = XmlElement::new("database");
        root.push(entry);

        let stats = run(&mut root);
        assert_eq!(stats.auto_grouped, 2);
        let entry = root.child(OBJECT).unwrap();
        let holder = entry.child(FIELD).unwrap();
        assert_eq!(holder.attr("id"), Some("eires"));
        let markers: Vec<&str> = holder
            .children_named(PARA)
            .filter_map(|p| p.attr("marker"))
            .collect();
        assert_eq!(markers, vec!["nt", "zz"]);
    }

    #[test]
    fn repeats_merge_lists_split_and_abbr_marked() {
        let mut sense = XmlElement::new(OBJECT).with_attr("class", "Sense");
        sense.push(field("sem", "animals; fish"));
        sense.push(field("sem", "food"));
        sense.push(field("pos", "n").with_attr("abbr", "true"));
        let mut entry = XmlElement::new(OBJECT).with_attr("class", "Entry");
        entry.push(field("cf", "kala2"));
        entry.push(field("cf", "big fish"));
        entry.push(sense);
        let mut root = XmlElement::new("database");
        root.push(entry);

        let stats = run(&mut root);
        assert_eq!(stats.merged, 1);
        let entry = root.child(OBJECT).unwrap();
        let targets: Vec<&str> = entry
            .children_named(FIELD)
            .filter_map(|f| f.attr("target"))
            .collect();
        assert_eq!(targets, vec!["kala#2", "big fish"]);

        let sense = entry.child(OBJECT).unwrap();
        let sem = sense.child(FIELD).unwrap();
        let items: Vec<String> = sem.children_named(ITEM).map(XmlElement::text).collect();
        assert_eq!(items, vec!["animals", "fish", "food"]);
        let pos = sense.children_named(FIELD).nth(1).unwrap();
        assert_eq!(pos.attr("match"), Some("abbr"));
        assert_eq!(pos.attr("abbr"), None);
    }

    #[test]
    fn auto_data_without_auto_field_is_dropped() {
        let mut sense = XmlElement::new(OBJECT).with_attr("class", "Sense");
        sense.push(auto("zz", "odd"));
        let mut root = XmlElement::new("database");
        root.push(sense);
        assert_eq!(run(&mut root).auto_dropped, 1);
    }

    #[test]
    fn reference_targets_split_homograph_numbers() {
        assert_eq!(reference_target(" kala  2"), "kala 2");
        assert_eq!(reference_target("kala2"), "kala#2");
        assert_eq!(reference_target("2"), "2");
    }
}
