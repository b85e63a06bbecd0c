//! Registry of destination classes, their fields, and custom fields.

use std::collections::{BTreeMap, BTreeSet};

use sfm_model::{ClassDescriptor, CustomField, CustomFieldKey, ImportField, StorageClass};

/// One class and the fields registered under it, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub descriptor: ClassDescriptor,
    pub fields: Vec<ImportField>,
    /// Index into `fields` of the class auto-import field.
    auto_field: Option<usize>,
}

impl ClassEntry {
    fn new(descriptor: ClassDescriptor) -> Self {
        Self {
            descriptor,
            fields: Vec::new(),
            auto_field: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn field(&self, id: &str) -> Option<&ImportField> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn auto_field(&self) -> Option<&ImportField> {
        self.auto_field.and_then(|index| self.fields.get(index))
    }

    fn reindex_auto_field(&mut self) {
        self.auto_field = self
            .fields
            .iter()
            .rposition(|field| field.flags.is_auto_field);
    }
}

/// Destination field schema: classes in catalog order, their fields, the
/// `partOf` tree, and the custom fields currently registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    classes: Vec<ClassEntry>,
    customs: BTreeMap<CustomFieldKey, CustomField>,
    abbreviation_signatures: BTreeSet<String>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `field` under `class`, creating the class on first use.
    ///
    /// Returns `false` when the class already holds a field with the same id;
    /// the first registration wins. When several fields of one class are
    /// flagged auto-import, the last one registered becomes the auto field.
    pub fn add_field(
        &mut self,
        class: &str,
        part_of: Option<&str>,
        mut field: ImportField,
    ) -> bool {
        let entry = self.class_entry_mut(class, part_of);
        if entry.field(&field.id).is_some() {
            tracing::debug!(class, field = %field.id, "duplicate field ignored");
            return false;
        }
        field.classes = vec![class.to_string()];
        if field.flags.is_auto_field {
            if let Some(previous) = entry.auto_field() {
                tracing::warn!(
                    class,
                    previous = %previous.id,
                    replacement = %field.id,
                    "class defines more than one auto field; keeping the last"
                );
            }
            entry.auto_field = Some(entry.fields.len());
        }
        entry.fields.push(field);
        true
    }

    /// Register a custom field under every logical class its storage class
    /// maps to. Classes already holding the id are skipped.
    ///
    /// Returns `false` when the storage class is unknown or no class accepted
    /// the field.
    pub fn add_custom_field(&mut self, storage_class_id: u32, custom: CustomField) -> bool {
        let Some(storage) = StorageClass::from_id(storage_class_id) else {
            tracing::debug!(
                storage_class_id,
                label = %custom.label,
                "custom field on unsupported class"
            );
            return false;
        };
        let field = custom.to_import_field();
        let mut inserted = false;
        for class in storage.logical_classes() {
            inserted |= self.add_field(class, None, field.clone());
        }
        if inserted {
            self.customs.insert(custom.key(), custom);
        }
        inserted
    }

    /// Drop every custom field from every class.
    pub fn remove_custom_fields(&mut self) {
        for entry in &mut self.classes {
            entry.fields.retain(|field| field.custom.is_none());
            entry.reindex_auto_field();
        }
        self.customs.clear();
    }

    /// Replace the registered custom fields with `fields`.
    pub fn replace_custom_fields(&mut self, fields: &[CustomField]) {
        self.remove_custom_fields();
        for field in fields {
            self.add_custom_field(field.class_id, field.clone());
        }
    }

    /// Resolve a destination id registered under exactly one class.
    ///
    /// Ids shared by several classes are ambiguous and resolve to `None`;
    /// use [`FieldSchema::get_field_in`] with an explicit class instead.
    pub fn get_field(&self, id: &str) -> Option<&ImportField> {
        let mut found = self.classes.iter().filter_map(|entry| entry.field(id));
        let first = found.next()?;
        match found.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    pub fn get_field_in(&self, class: &str, id: &str) -> Option<&ImportField> {
        self.class(class)?.field(id)
    }

    /// Classes holding a field with this id, in catalog order.
    pub fn classes_with_field(&self, id: &str) -> Vec<&str> {
        self.classes
            .iter()
            .filter(|entry| entry.field(id).is_some())
            .map(ClassEntry::name)
            .collect()
    }

    pub fn get_auto_field(&self, class: &str) -> Option<&ImportField> {
        self.class(class)?.auto_field()
    }

    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.iter().find(|entry| entry.name() == name)
    }

    pub fn classes(&self) -> &[ClassEntry] {
        &self.classes
    }

    pub fn fields(&self, class: &str) -> &[ImportField] {
        self.class(class)
            .map(|entry| entry.fields.as_slice())
            .unwrap_or_default()
    }

    /// Position of a field within its class, used for catalog ordering.
    pub fn field_index(&self, class: &str, id: &str) -> Option<usize> {
        self.class(class)?
            .fields
            .iter()
            .position(|field| field.id == id)
    }

    pub fn parent(&self, class: &str) -> Option<&str> {
        self.class(class)?.descriptor.part_of.as_deref()
    }

    /// True when `ancestor` appears on the `partOf` chain above `class`.
    pub fn is_ancestor(&self, ancestor: &str, class: &str) -> bool {
        let mut current = self.parent(class);
        // Bounded by the class count so a cyclic catalog cannot loop.
        for _ in 0..self.classes.len() {
            match current {
                Some(name) if name == ancestor => return true,
                Some(name) => current = self.parent(name),
                None => return false,
            }
        }
        false
    }

    /// Number of `partOf` hops from `class` to its root.
    pub fn depth(&self, class: &str) -> usize {
        let mut depth = 0;
        let mut current = self.parent(class);
        while let Some(name) = current {
            depth += 1;
            if depth > self.classes.len() {
                break;
            }
            current = self.parent(name);
        }
        depth
    }

    pub fn custom_field(&self, key: CustomFieldKey) -> Option<&CustomField> {
        self.customs.get(&key)
    }

    pub fn custom_fields(&self) -> impl Iterator<Item = &CustomField> {
        self.customs.values()
    }

    /// First catalog field whose default MDF markers include `marker`.
    pub fn mdf_field(&self, marker: &str) -> Option<(&str, &ImportField)> {
        self.classes.iter().find_map(|entry| {
            entry
                .fields
                .iter()
                .find(|field| field.mdf_markers.iter().any(|m| m == marker))
                .map(|field| (entry.name(), field))
        })
    }

    pub fn is_abbreviation_signature(&self, signature: &str) -> bool {
        self.abbreviation_signatures.contains(signature)
    }

    pub fn abbreviation_signatures(&self) -> impl Iterator<Item = &str> {
        self.abbreviation_signatures.iter().map(String::as_str)
    }

    pub(crate) fn set_abbreviation_signatures(&mut self, signatures: BTreeSet<String>) {
        self.abbreviation_signatures = signatures;
        let signatures = &self.abbreviation_signatures;
        for entry in &mut self.classes {
            for field in &mut entry.fields {
                if signatures.contains(&field.signature) {
                    field.flags.is_abbr_field = true;
                }
            }
        }
    }

    fn class_entry_mut(&mut self, class: &str, part_of: Option<&str>) -> &mut ClassEntry {
        let index = match self.classes.iter().position(|entry| entry.name() == class) {
            Some(index) => index,
            None => {
                self.classes
                    .push(ClassEntry::new(ClassDescriptor::new(class, part_of)));
                self.classes.len() - 1
            }
        };
        let entry = &mut self.classes[index];
        if entry.descriptor.part_of.is_none() {
            entry.descriptor = ClassDescriptor::new(class, part_of);
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use sfm_model::FieldFlags;

    use super::*;

    fn auto(id: &str) -> ImportField {
        ImportField::new(id, id).with_flags(FieldFlags {
            is_auto_field: true,
            ..FieldFlags::default()
        })
    }

    fn custom(class_id: u32, flid: u32, label: &str) -> CustomField {
        CustomField {
            class_id,
            flid,
            label: label.to_string(),
            field_type: "String".to_string(),
            big: false,
            ws_selector: -1,
        }
    }

    #[test]
    fn first_registration_wins() {
        let mut schema = FieldSchema::new();
        assert!(schema.add_field("Entry", None, ImportField::new("lex", "Lexeme")));
        assert!(!schema.add_field("Entry", None, ImportField::new("lex", "Other")));
        assert_eq!(schema.get_field("lex").unwrap().ui_name, "Lexeme");
    }

    #[test]
    fn shared_ids_are_ambiguous_without_class() {
        let mut schema = FieldSchema::new();
        schema.add_field("Entry", None, ImportField::new("note", "Note"));
        schema.add_field("Sense", Some("Entry"), ImportField::new("note", "Note"));
        assert!(schema.get_field("note").is_none());
        assert!(schema.get_field_in("Sense", "note").is_some());
        assert_eq!(schema.classes_with_field("note"), vec!["Entry", "Sense"]);
    }

    #[test]
    fn last_auto_field_wins() {
        let mut schema = FieldSchema::new();
        schema.add_field("Entry", None, auto("import1"));
        schema.add_field("Entry", None, auto("import2"));
        assert_eq!(schema.get_auto_field("Entry").unwrap().id, "import2");
    }

    #[test]
    fn entry_custom_fields_reach_subentries_and_variants() {
        let mut schema = FieldSchema::new();
        schema.add_field("Entry", None, ImportField::new("lex", "Lexeme"));
        assert!(schema.add_custom_field(5002, custom(5002, 3, "Notes")));
        for class in ["Entry", "Subentry", "Variant"] {
            let field = schema.get_field_in(class, "custom3").unwrap();
            assert!(field.is_custom());
        }
        assert!(!schema.add_custom_field(9999, custom(9999, 1, "Nope")));
    }

    #[test]
    fn colliding_labels_keep_distinct_identities() {
        let mut schema = FieldSchema::new();
        schema.add_custom_field(5016, custom(5016, 7, "Notes"));
        schema.add_custom_field(5016, custom(5016, 8, "Notes"));
        assert_eq!(schema.fields("Sense").len(), 2);
        assert_eq!(schema.custom_fields().count(), 2);
    }

    #[test]
    fn replacing_customs_drops_removed_ones() {
        let mut schema = FieldSchema::new();
        schema.add_custom_field(5002, custom(5002, 3, "Notes"));
        schema.replace_custom_fields(&[custom(5016, 4, "Gloss note")]);
        assert!(schema.get_field_in("Entry", "custom3").is_none());
        assert!(
            schema
                .custom_field(CustomFieldKey {
                    class_id: 5002,
                    flid: 3
                })
                .is_none()
        );
        assert!(schema.get_field_in("Sense", "custom4").is_some());
    }

    #[test]
    fn ancestry_follows_part_of() {
        let mut schema = FieldSchema::new();
        schema.add_field("Entry", None, ImportField::new("lex", "Lexeme"));
        schema.add_field("Sense", Some("Entry"), ImportField::new("gloss", "Gloss"));
        schema.add_field("Example", Some("Sense"), ImportField::new("ex", "Example"));
        assert!(schema.is_ancestor("Entry", "Example"));
        assert!(!schema.is_ancestor("Example", "Entry"));
        assert_eq!(schema.depth("Example"), 2);
    }
}
