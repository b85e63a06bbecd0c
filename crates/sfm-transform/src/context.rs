use sfm_model::{MapFileDescriptor, StorageClass, WritingSystems};
use sfm_schema::FieldSchema;

/// Read-only inputs every phase consults.
#[derive(Debug, Clone, Copy)]
pub struct ImportContext<'a> {
    pub schema: &'a FieldSchema,
    pub descriptor: &'a MapFileDescriptor,
    pub writing_systems: &'a WritingSystems,
}

impl<'a> ImportContext<'a> {
    pub fn new(
        schema: &'a FieldSchema,
        descriptor: &'a MapFileDescriptor,
        writing_systems: &'a WritingSystems,
    ) -> Self {
        Self {
            schema,
            descriptor,
            writing_systems,
        }
    }

    /// Parent class from the mapping file's hierarchy, else the catalog.
    pub fn parent(&self, class: &str) -> Option<&'a str> {
        match self.descriptor.level(class) {
            Some(level) => level.part_of.as_deref(),
            None => self.schema.parent(class),
        }
    }

    /// Classes above `class`, nearest first.
    pub fn ancestors(&self, class: &str) -> Vec<&'a str> {
        let mut chain = Vec::new();
        let mut current = self.parent(class);
        while let Some(name) = current {
            // A cyclic hierarchy stops at the first repeat.
            if chain.contains(&name) {
                break;
            }
            chain.push(name);
            current = self.parent(name);
        }
        chain
    }

    pub fn is_ancestor(&self, ancestor: &str, class: &str) -> bool {
        self.ancestors(class).contains(&ancestor)
    }

    /// Writing-system code for a language key, falling back to the mapping
    /// file's `xml:lang`, then to the key itself.
    pub fn ws_code(&self, key: &str) -> String {
        if let Some(ws) = self.writing_systems.get(key) {
            return ws.code.clone();
        }
        match self.descriptor.language(key) {
            Some(lang) if !lang.xml_lang.is_empty() => lang.xml_lang.clone(),
            _ => key.to_string(),
        }
    }

    /// Class that receives fields of a custom field's storage class.
    pub fn custom_class(class_id: u32) -> Option<&'static str> {
        StorageClass::from_id(class_id)
            .and_then(|storage| storage.logical_classes().first().copied())
    }
}
