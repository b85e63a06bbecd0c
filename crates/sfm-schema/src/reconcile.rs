//! Change detection for the live custom-field list.

use sfm_model::{CustomField, CustomFieldKey, StorageClass};

use crate::hash::{chain_hex, sha256_hex};

/// Fingerprint of one custom field at its position in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFingerprint {
    pub key: CustomFieldKey,
    /// Digest of this field alone.
    pub field: String,
    /// Digest of this field and every field before it.
    pub cumulative: String,
}

/// Retains the last seen custom-field fingerprints and reports whether a new
/// list differs from them.
#[derive(Debug, Clone, Default)]
pub struct CustomFieldReconciler {
    retained: Vec<FieldFingerprint>,
}

impl CustomFieldReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint the lexicon custom fields of `fields`, in order.
    ///
    /// Fields on storage classes outside the lexicon id range are skipped.
    pub fn fingerprints(fields: &[CustomField]) -> Vec<FieldFingerprint> {
        let mut cumulative = String::new();
        fields
            .iter()
            .filter(|field| StorageClass::is_lexicon_id(field.class_id))
            .map(|field| {
                let digest = sha256_hex(field.fingerprint_contribution().as_bytes());
                cumulative = chain_hex(&cumulative, &digest);
                FieldFingerprint {
                    key: field.key(),
                    field: digest,
                    cumulative: cumulative.clone(),
                }
            })
            .collect()
    }

    /// Compare `fields` to the retained snapshot, then retain them.
    ///
    /// Returns `true` when the length or any fingerprint differs.
    pub fn reconcile(&mut self, fields: &[CustomField]) -> bool {
        let current = Self::fingerprints(fields);
        let changed = current.len() != self.retained.len()
            || current
                .iter()
                .zip(&self.retained)
                .any(|(now, before)| now != before);
        if changed {
            tracing::debug!(
                before = self.retained.len(),
                after = current.len(),
                "custom fields changed"
            );
        }
        self.retained = current;
        changed
    }

    pub fn retained(&self) -> &[FieldFingerprint] {
        &self.retained
    }

    /// Forget the snapshot; the next reconcile reports a change if any
    /// custom fields exist.
    pub fn reset(&mut self) {
        self.retained.clear();
    }
}
