//! Phase 4: load-ready lexicon XML.
//!
//! Objects become elements named after their class with a sequential `id`;
//! fields are renamed to their catalog property (custom fields become
//! `<Custom name=".." flid="..">`), language keys become writing-system
//! codes, and fields come out in catalog order ahead of nested objects.

use sfm_schema::xml::{XmlElement, XmlNode};

use crate::context::ImportContext;
use crate::phase1::{FIELD, OBJECT};
use crate::phase2::SPAN;
use crate::phase3::PARA;

pub const ROOT: &str = "LexiconImport";
pub const CUSTOM: &str = "Custom";

/// Attributes carried from phase 3 fields into load-ready fields.
const KEPT_FIELD_ATTRS: &[&str] = &["marker", "line", "target", "match"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Phase4Stats {
    pub objects: u64,
    pub fields: usize,
    pub dropped_fields: usize,
}

pub fn build(phase3: &XmlElement, ctx: &ImportContext<'_>) -> (XmlElement, Phase4Stats) {
    let mut stats = Phase4Stats::default();
    let mut root = XmlElement::new(ROOT);
    for object in phase3.children_named(OBJECT) {
        root.push(convert_object(object, ctx, &mut stats));
    }
    tracing::info!(
        objects = stats.objects,
        fields = stats.fields,
        dropped = stats.dropped_fields,
        "phase 4 produced load-ready XML"
    );
    (root, stats)
}

fn convert_object(
    object: &XmlElement,
    ctx: &ImportContext<'_>,
    stats: &mut Phase4Stats,
) -> XmlElement {
    stats.objects += 1;
    let class = object.attr("class").unwrap_or_default();
    let mut element = XmlElement::new(class).with_attr("id", stats.objects.to_string());
    if let Some(line) = object.attr("line") {
        element.set_attr("line", line);
    }

    let mut fields: Vec<(usize, XmlElement)> = Vec::new();
    for field in object.children_named(FIELD) {
        let id = field.attr("id").unwrap_or_default();
        let (Some(definition), Some(index)) = (
            ctx.schema.get_field_in(class, id),
            ctx.schema.field_index(class, id),
        ) else {
            tracing::warn!(class, field = id, "field unknown to the catalog dropped");
            stats.dropped_fields += 1;
            continue;
        };

        let mut out = match definition.custom.and_then(|key| ctx.schema.custom_field(key)) {
            Some(custom) => XmlElement::new(CUSTOM)
                .with_attr("name", custom.label.as_str())
                .with_attr("flid", custom.flid.to_string()),
            None => XmlElement::new(definition.property.as_str()),
        };
        if let Some(lang) = field.attr("lang") {
            out.set_attr("ws", ctx.ws_code(lang));
        }
        for (key, value) in &field.attributes {
            if KEPT_FIELD_ATTRS.contains(&key.as_str()) {
                out.set_attr(key.as_str(), value.as_str());
            }
        }
        out.children = field.children.iter().map(|node| convert_node(node, ctx)).collect();
        fields.push((index, out));
        stats.fields += 1;
    }
    // Stable sort keeps repeated multi fields in data order.
    fields.sort_by_key(|(index, _)| *index);
    for (_, field) in fields {
        element.push(field);
    }

    for child in object.children_named(OBJECT) {
        element.push(convert_object(child, ctx, stats));
    }
    element
}

/// Field content: text, spans, items and paragraphs, with `lang` resolved
/// to `ws` at every level.
fn convert_node(node: &XmlNode, ctx: &ImportContext<'_>) -> XmlNode {
    let XmlNode::Element(element) = node else {
        return node.clone();
    };
    let mut out = XmlElement::new(element.name.as_str());
    for (key, value) in &element.attributes {
        match key.as_str() {
            "lang" => out.set_attr("ws", ctx.ws_code(value)),
            "line" if element.name == SPAN => {}
            _ => out.set_attr(key.as_str(), value.as_str()),
        }
    }
    if element.name == PARA {
        out.remove_attr("line");
    }
    out.children = element.children.iter().map(|child| convert_node(child, ctx)).collect();
    XmlNode::Element(out)
}

#[cfg(test)]
mod tests {
    use sfm_model::{
        CustomField, FieldFlags, ImportField, MapFileDescriptor, WritingSystem, WritingSystems,
    };
    use sfm_schema::FieldSchema;

    use super::*;

    fn schema() -> FieldSchema {
        let mut schema = FieldSchema::new();
        let mut lex = ImportField::new("lex", "Lexeme");
        lex.property = "LexemeForm".to_string();
        let mut note = ImportField::new("note", "Note");
        note.property = "Comment".to_string();
        note.flags = FieldFlags {
            is_multi: true,
            ..FieldFlags::default()
        };
        schema.add_field("Entry", None, lex);
        schema.add_field("Entry", None, note);
        let mut gloss = ImportField::new("glos", "Gloss");
        gloss.property = "Gloss".to_string();
        schema.add_field("Sense", Some("Entry"), gloss);
        schema.add_custom_field(
            5002,
            CustomField {
                class_id: 5002,
                flid: 3,
                label: "Dialect".to_string(),
                field_type: "String".to_string(),
                big: false,
                ws_selector: -1,
            },
        );
        schema
    }

    fn field(id: &str, lang: &str, text: &str) -> XmlElement {
        XmlElement::new(FIELD)
            .with_attr("id", id)
            .with_attr("lang", lang)
            .with_text(text)
    }

    #[test]
    fn objects_numbered_and_fields_ordered() {
        let schema = schema();
        let descriptor = MapFileDescriptor::default();
        let ws: WritingSystems = [
            WritingSystem::new("Vern", "qaa-x-kal", "Kala"),
            WritingSystem::new("Eng", "en", "English"),
        ]
        .into_iter()
        .collect();
        let ctx = ImportContext::new(&schema, &descriptor, &ws);

        let mut sense = XmlElement::new(OBJECT).with_attr("class", "Sense");
        sense.push(field("glos", "Eng", "fish"));
        let mut entry = XmlElement::new(OBJECT).with_attr("class", "Entry");
        entry.push(field("note", "Eng", "second"));
        entry.push(field("lex", "Vern", "kala"));
        entry.push(field("custom3", "Eng", "coastal"));
        entry.push(field("bogus", "Eng", "dropped"));
        entry.push(sense);
        let mut phase3 = XmlElement::new("database");
        phase3.push(entry);

        let (root, stats) = build(&phase3, &ctx);
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.dropped_fields, 1);

        let entry = root.child("Entry").unwrap();
        assert_eq!(entry.attr("id"), Some("1"));
        let names: Vec<&str> = entry.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["LexemeForm", "Comment", "Custom", "Sense"]);
        let lex = entry.child("LexemeForm").unwrap();
        assert_eq!(lex.attr("ws"), Some("qaa-x-kal"));
        assert_eq!(lex.attr("id"), None);
        let custom = entry.child(CUSTOM).unwrap();
        assert_eq!(custom.attr("name"), Some("Dialect"));
        assert_eq!(custom.attr("flid"), Some("3"));
        assert_eq!(entry.child("Sense").unwrap().attr("id"), Some("2"));
    }
}
