//! Begin-marker propagation and per-class validity.

use std::collections::BTreeMap;

use sfm_model::{ContentMapping, MapFileDescriptor};

/// Structural mappings of one destination class, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassGroup<'a> {
    pub class: String,
    pub mappings: Vec<&'a ContentMapping>,
}

impl ClassGroup<'_> {
    pub fn has_begin_marker(&self) -> bool {
        self.mappings.iter().any(|mapping| mapping.is_begin_marker)
    }

    pub fn begin_markers(&self) -> impl Iterator<Item = &str> {
        self.mappings
            .iter()
            .filter(|mapping| mapping.is_begin_marker)
            .map(|mapping| mapping.marker.as_str())
    }
}

/// Read-only view over a mapping set for hierarchy checks.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyValidator<'a> {
    mappings: &'a BTreeMap<String, ContentMapping>,
}

impl<'a> HierarchyValidator<'a> {
    pub fn new(mappings: &'a BTreeMap<String, ContentMapping>) -> Self {
        Self { mappings }
    }

    /// Set `is_begin_marker` on mappings named by each level's begin fields,
    /// when the mapping targets that level's class.
    pub fn apply_begin_fields(
        descriptor: &MapFileDescriptor,
        mappings: &mut BTreeMap<String, ContentMapping>,
    ) {
        for level in &descriptor.hierarchy {
            for marker in &level.begin_fields {
                match mappings.get_mut(marker) {
                    Some(mapping) if mapping.class_name() == level.name => {
                        mapping.is_begin_marker = true;
                    }
                    Some(mapping) => tracing::debug!(
                        marker = %marker,
                        level = %level.name,
                        class = %mapping.class_name(),
                        "begin field maps to another class"
                    ),
                    None => {}
                }
            }
        }
    }

    /// Structural mappings partitioned by class; groups ordered by the source
    /// order of their first member.
    pub fn group_by_class(&self) -> Vec<ClassGroup<'a>> {
        let mut groups: BTreeMap<&str, Vec<&'a ContentMapping>> = BTreeMap::new();
        for mapping in self.mappings.values().filter(|m| m.is_structural()) {
            groups.entry(mapping.class_name()).or_default().push(mapping);
        }
        let mut groups: Vec<ClassGroup<'a>> = groups
            .into_iter()
            .map(|(class, mut mappings)| {
                mappings.sort_by_key(|mapping| mapping.order);
                ClassGroup {
                    class: class.to_string(),
                    mappings,
                }
            })
            .collect();
        groups.sort_by_key(|group| group.mappings.first().map_or(usize::MAX, |m| m.order));
        groups
    }

    /// True once a non-excluded marker of `class` is flagged begin marker.
    pub fn class_is_valid(&self, class: &str) -> bool {
        self.mappings.values().any(|mapping| {
            mapping.is_class_member() && mapping.is_begin_marker && mapping.class_name() == class
        })
    }

    /// Classes with mapped markers but no begin marker, ordered by the source
    /// order of their first marker.
    pub fn invalid_classes(&self) -> Vec<String> {
        let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
        for mapping in self.mappings.values().filter(|m| m.is_class_member()) {
            let order = first_seen.entry(mapping.class_name()).or_insert(mapping.order);
            *order = (*order).min(mapping.order);
        }
        let mut classes: Vec<(&str, usize)> = first_seen
            .into_iter()
            .filter(|(class, _)| !self.class_is_valid(class))
            .collect();
        classes.sort_by_key(|(_, order)| *order);
        classes
            .into_iter()
            .map(|(class, _)| class.to_string())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.invalid_classes().is_empty()
    }
}
