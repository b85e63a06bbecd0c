//! Field-catalog loader.
//!
//! The catalog lists destination classes and their fields:
//!
//! ```xml
//! <ImportFields>
//!   <Class name="Entry">
//!     <Field id="lex" uiname="Lexeme Form" property="LexemeForm"
//!            signature="MultiUnicode" unique="yes" MDF="lx"/>
//!   </Class>
//!   <Class name="Sense" partOf="Entry"> ... </Class>
//!   <AbbreviationSignatures>PartOfSpeech MorphType</AbbreviationSignatures>
//! </ImportFields>
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use sfm_model::{FieldFlags, ImportField};

use crate::error::SchemaError;
use crate::registry::FieldSchema;
use crate::xml::{XmlElement, parse_document};

/// Read and parse a catalog file.
pub fn load_field_catalog(path: &Path) -> Result<FieldSchema, SchemaError> {
    let text = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
    let schema = parse_field_catalog(&text, path)?;
    tracing::info!(
        path = %path.display(),
        classes = schema.classes().len(),
        "loaded field catalog"
    );
    Ok(schema)
}

/// Parse catalog text. `path` is used for error context only.
///
/// The registry is built locally and only returned once the whole document
/// has been accepted.
pub fn parse_field_catalog(text: &str, path: &Path) -> Result<FieldSchema, SchemaError> {
    let root = parse_document(text).map_err(|e| SchemaError::xml(path, e))?;
    let mut schema = FieldSchema::new();
    let mut abbreviation_signatures = BTreeSet::new();
    let mut saw_class = false;

    for element in root.elements() {
        match element.name.as_str() {
            "Class" => {
                saw_class = true;
                read_class(element, path, &mut schema)?;
            }
            "AbbreviationSignatures" => {
                abbreviation_signatures.extend(read_signatures(element));
            }
            _ => {}
        }
    }
    if !saw_class {
        return Err(SchemaError::MissingSection {
            path: path.to_path_buf(),
            section: "Class",
        });
    }

    schema.set_abbreviation_signatures(abbreviation_signatures);
    Ok(schema)
}

fn read_class(
    element: &XmlElement,
    path: &Path,
    schema: &mut FieldSchema,
) -> Result<(), SchemaError> {
    let name = element
        .attr("name")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| SchemaError::missing_attribute(path, "Class", "name"))?;
    let part_of = element.attr("partOf");

    for field in element.children_named("Field") {
        let field = read_field(field, path)?;
        schema.add_field(name, part_of, field);
    }
    Ok(())
}

fn read_field(element: &XmlElement, path: &Path) -> Result<ImportField, SchemaError> {
    let id = element
        .attr("id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SchemaError::missing_attribute(path, "Field", "id"))?;
    let ui_name = element.attr("uiname").unwrap_or(id);

    let mut field = ImportField::new(id, ui_name);
    if let Some(property) = element.attr("property").filter(|p| !p.trim().is_empty()) {
        field.property = property.trim().to_string();
    }
    field.signature = element.attr("signature").unwrap_or_default().trim().to_string();
    field.field_type = element.attr("type").unwrap_or_default().trim().to_string();
    field.mdf_markers = element
        .attr("MDF")
        .map(|value| {
            value
                .split([' ', ','])
                .filter(|marker| !marker.is_empty())
                .map(|marker| marker.trim_start_matches('\\').to_string())
                .collect()
        })
        .unwrap_or_default();
    field.flags = FieldFlags {
        is_list: element.flag("list"),
        is_multi: element.flag("multi"),
        is_ref: element.flag("ref"),
        is_auto_field: element.flag("autofield"),
        is_unique: element.flag("unique"),
        is_abbr_field: false,
    };
    Ok(field)
}

/// Signature names either as `<Signature name=".."/>` children or as a
/// whitespace-separated text list.
fn read_signatures(element: &XmlElement) -> Vec<String> {
    let mut names: Vec<String> = element
        .children_named("Signature")
        .filter_map(|sig| sig.attr("name"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        names = element
            .text()
            .split_whitespace()
            .map(str::to_string)
            .collect();
    }
    names
}
