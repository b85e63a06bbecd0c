//! Reader and writer for the `sfmMapping` file.

use std::collections::BTreeMap;
use std::path::Path;

use sfm_model::{
    CustomFieldKey, DescriptionKind, FieldDescription, HierarchyLevel, ImportOption,
    InFieldMarker, LanguageDef, MapFileDescriptor, MeaningRef,
};
use sfm_schema::SchemaError;
use sfm_schema::xml::{Layout, XmlElement, parse_document, write_document};

const ROOT: &str = "sfmMapping";
const LANGUAGES: &str = "languages";
const HIERARCHY: &str = "hierarchy";
const FIELD_DESCRIPTIONS: &str = "fieldDescriptions";
const CUSTOM_FIELD_DESCRIPTIONS: &str = "customFieldDescriptions";
const OPTIONS: &str = "options";
const IN_FIELD_MARKERS: &str = "inFieldMarkers";
const MEANING_APP: &str = "lexicon";

/// True when the file parses and has the root plus the `languages`,
/// `hierarchy` and `fieldDescriptions` sections.
pub fn is_valid_map_file(path: &Path) -> bool {
    let Ok(text) = std::fs::read_to_string(path) else {
        return false;
    };
    let Ok(root) = parse_document(&text) else {
        return false;
    };
    root.name == ROOT
        && [LANGUAGES, HIERARCHY, FIELD_DESCRIPTIONS]
            .iter()
            .all(|section| root.child(section).is_some())
}

pub fn read_map_file(path: &Path) -> Result<MapFileDescriptor, SchemaError> {
    let text = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
    let descriptor = parse_map_file(&text, path)?;
    tracing::debug!(
        path = %path.display(),
        fields = descriptor.fields.len(),
        levels = descriptor.hierarchy.len(),
        "read mapping file"
    );
    Ok(descriptor)
}

/// Parse mapping-file text. `path` is used for error context only.
pub fn parse_map_file(text: &str, path: &Path) -> Result<MapFileDescriptor, SchemaError> {
    let root = parse_document(text).map_err(|e| SchemaError::xml(path, e))?;
    if root.name != ROOT {
        return Err(SchemaError::UnexpectedRoot {
            path: path.to_path_buf(),
            expected: ROOT,
            found: root.name,
        });
    }
    let section = |name: &'static str| {
        root.child(name).ok_or_else(|| SchemaError::MissingSection {
            path: path.to_path_buf(),
            section: name,
        })
    };

    let mut descriptor = MapFileDescriptor::default();
    for lang in section(LANGUAGES)?.children_named("langDef") {
        descriptor.languages.push(LanguageDef {
            id: required(lang, "id", path)?.to_string(),
            xml_lang: lang.attr("xml:lang").unwrap_or_default().to_string(),
            converter: non_empty(lang.attr("map")),
            ignore: lang.flag("ignore"),
        });
    }
    for level in section(HIERARCHY)?.children_named("level") {
        descriptor.hierarchy.push(HierarchyLevel {
            name: required(level, "name", path)?.to_string(),
            part_of: non_empty(level.attr("partOf")),
            begin_fields: split_list(level.attr("beginFields")),
        });
    }
    for field in section(FIELD_DESCRIPTIONS)?.children_named("field") {
        let meaning = field.child("meaning").and_then(|meaning| {
            non_empty(meaning.attr("id")).map(|id| MeaningRef {
                id,
                class: non_empty(meaning.attr("class")),
            })
        });
        let description = common_description(field, DescriptionKind::Standard { meaning }, path)?;
        descriptor.fields.insert(description.marker.clone(), description);
    }
    if let Some(customs) = root.child(CUSTOM_FIELD_DESCRIPTIONS) {
        for field in customs.children_named("field") {
            let kind = DescriptionKind::Custom {
                key: CustomFieldKey {
                    class_id: number(field, "classId", path)?,
                    flid: number(field, "flid", path)?,
                },
                label: field.attr("label").unwrap_or_default().to_string(),
                big: field.flag("big"),
                ws_selector: field
                    .attr("wsSelector")
                    .map(|value| {
                        value.trim().parse::<i32>().map_err(|_| SchemaError::InvalidValue {
                            path: path.to_path_buf(),
                            attribute: "wsSelector",
                            value: value.to_string(),
                        })
                    })
                    .transpose()?
                    .unwrap_or_default(),
            };
            let description = common_description(field, kind, path)?;
            descriptor.fields.insert(description.marker.clone(), description);
        }
    }
    if let Some(options) = root.child(OPTIONS) {
        for option in options.children_named("option") {
            descriptor.options.push(ImportOption {
                id: required(option, "id", path)?.to_string(),
                kind: option.attr("type").unwrap_or_default().to_string(),
                checked: option.flag("checked"),
            });
        }
    }
    if let Some(markers) = root.child(IN_FIELD_MARKERS) {
        for ifm in markers.children_named("ifm") {
            descriptor.in_field_markers.push(InFieldMarker {
                element: ifm.attr("element").unwrap_or("span").to_string(),
                begin: required(ifm, "begin", path)?.to_string(),
                end: split_list(ifm.attr("end")),
                end_with_word: ifm.flag("endWithWord"),
                end_with_field: ifm.flag("endWithField"),
                language: non_empty(ifm.attr("lang")),
                style: non_empty(ifm.attr("style")),
                ignore: ifm.flag("ignore"),
            });
        }
    }
    Ok(descriptor)
}

fn common_description(
    field: &XmlElement,
    kind: DescriptionKind,
    path: &Path,
) -> Result<FieldDescription, SchemaError> {
    Ok(FieldDescription {
        marker: required(field, "sfm", path)?.to_string(),
        name: field.attr("name").unwrap_or_default().to_string(),
        data_type: field.attr("type").unwrap_or("string").to_string(),
        language: non_empty(field.attr("lang")),
        is_abbr: field.flag("abbr"),
        exclude: field.flag("exclude"),
        auto_import: field.flag("autoImport"),
        kind,
    })
}

fn required<'a>(
    element: &'a XmlElement,
    attribute: &'static str,
    path: &Path,
) -> Result<&'a str, SchemaError> {
    element
        .attr(attribute)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| SchemaError::missing_attribute(path, element.name.as_str(), attribute))
}

fn number(element: &XmlElement, attribute: &'static str, path: &Path) -> Result<u32, SchemaError> {
    let value = required(element, attribute, path)?;
    value.trim().parse().map_err(|_| SchemaError::InvalidValue {
        path: path.to_path_buf(),
        attribute,
        value: value.to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn yes_no(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Serialize a descriptor as an `sfmMapping` document.
pub fn render_map_file(
    descriptor: &MapFileDescriptor,
) -> Result<String, sfm_schema::xml::XmlError> {
    let mut root = XmlElement::new(ROOT).with_attr("version", "1");

    let mut languages = XmlElement::new(LANGUAGES);
    for lang in &descriptor.languages {
        let mut element = XmlElement::new("langDef")
            .with_attr("id", lang.id.as_str())
            .with_attr("xml:lang", lang.xml_lang.as_str());
        if let Some(converter) = &lang.converter {
            element.set_attr("map", converter.as_str());
        }
        element.set_attr("ignore", yes_no(lang.ignore));
        languages.push(element);
    }
    root.push(languages);

    let mut hierarchy = XmlElement::new(HIERARCHY);
    for level in &descriptor.hierarchy {
        hierarchy.push(
            XmlElement::new("level")
                .with_attr("name", level.name.as_str())
                .with_attr("partOf", level.part_of.as_deref().unwrap_or_default())
                .with_attr("beginFields", level.begin_fields.join(" ")),
        );
    }
    root.push(hierarchy);

    let mut standard = XmlElement::new(FIELD_DESCRIPTIONS);
    let mut custom = XmlElement::new(CUSTOM_FIELD_DESCRIPTIONS);
    for description in descriptor.fields.values() {
        let mut element = XmlElement::new("field")
            .with_attr("sfm", description.marker.as_str())
            .with_attr("name", description.name.as_str())
            .with_attr("type", description.data_type.as_str())
            .with_attr("lang", description.language.as_deref().unwrap_or_default())
            .with_attr("abbr", yes_no(description.is_abbr))
            .with_attr("exclude", yes_no(description.exclude))
            .with_attr("autoImport", yes_no(description.auto_import));
        match &description.kind {
            DescriptionKind::Standard { meaning } => {
                if let Some(meaning) = meaning {
                    let mut reference = XmlElement::new("meaning")
                        .with_attr("app", MEANING_APP)
                        .with_attr("id", meaning.id.as_str());
                    if let Some(class) = &meaning.class {
                        reference.set_attr("class", class.as_str());
                    }
                    element.push(reference);
                }
                standard.push(element);
            }
            DescriptionKind::Custom {
                key,
                label,
                big,
                ws_selector,
            } => {
                element.set_attr("classId", key.class_id.to_string());
                element.set_attr("flid", key.flid.to_string());
                element.set_attr("label", label.as_str());
                element.set_attr("big", yes_no(*big));
                element.set_attr("wsSelector", ws_selector.to_string());
                custom.push(element);
            }
        }
    }
    root.push(standard);
    root.push(custom);

    let mut options = XmlElement::new(OPTIONS);
    for option in &descriptor.options {
        options.push(
            XmlElement::new("option")
                .with_attr("id", option.id.as_str())
                .with_attr("type", option.kind.as_str())
                .with_attr("checked", yes_no(option.checked)),
        );
    }
    root.push(options);

    let mut markers = XmlElement::new(IN_FIELD_MARKERS);
    for ifm in &descriptor.in_field_markers {
        let mut element = XmlElement::new("ifm")
            .with_attr("element", ifm.element.as_str())
            .with_attr("begin", ifm.begin.as_str())
            .with_attr("end", ifm.end.join(" "))
            .with_attr("endWithWord", yes_no(ifm.end_with_word))
            .with_attr("endWithField", yes_no(ifm.end_with_field))
            .with_attr("ignore", yes_no(ifm.ignore));
        if let Some(lang) = &ifm.language {
            element.set_attr("lang", lang.as_str());
        }
        if let Some(style) = &ifm.style {
            element.set_attr("style", style.as_str());
        }
        markers.push(element);
    }
    root.push(markers);

    write_document(&root, Layout::Indented)
}

pub fn write_map_file(descriptor: &MapFileDescriptor, path: &Path) -> Result<(), SchemaError> {
    let text = render_map_file(descriptor).map_err(|e| SchemaError::xml(path, e))?;
    std::fs::write(path, text).map_err(|e| SchemaError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), fields = descriptor.fields.len(), "wrote mapping file");
    Ok(())
}

/// Descriptions keyed by marker, as stored on a descriptor.
pub(crate) fn index_descriptions(
    descriptions: impl IntoIterator<Item = FieldDescription>,
) -> BTreeMap<String, FieldDescription> {
    descriptions
        .into_iter()
        .map(|description| (description.marker.clone(), description))
        .collect()
}
