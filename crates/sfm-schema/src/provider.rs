//! Access to the live destination schema.

use sfm_model::{CustomField, CustomFieldKey};

/// Supplies the custom fields currently defined in the destination lexicon.
///
/// Injected into the resolver so custom fields are re-read on every merge.
pub trait SchemaProvider {
    /// Custom fields in destination order.
    fn custom_fields(&self) -> Vec<CustomField>;
}

/// Provider over a fixed, editable list.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaProvider {
    fields: Vec<CustomField>,
}

impl StaticSchemaProvider {
    pub fn new(fields: Vec<CustomField>) -> Self {
        Self { fields }
    }

    pub fn set_fields(&mut self, fields: Vec<CustomField>) {
        self.fields = fields;
    }

    /// Remove a field; returns whether it was present.
    pub fn remove(&mut self, key: CustomFieldKey) -> bool {
        let before = self.fields.len();
        self.fields.retain(|field| field.key() != key);
        self.fields.len() != before
    }
}

impl SchemaProvider for StaticSchemaProvider {
    fn custom_fields(&self) -> Vec<CustomField> {
        self.fields.clone()
    }
}

impl<P: SchemaProvider + ?Sized> SchemaProvider for &P {
    fn custom_fields(&self) -> Vec<CustomField> {
        (**self).custom_fields()
    }
}
