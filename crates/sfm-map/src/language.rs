//! Writing-system choice for mapped markers.

use sfm_model::{MarkerLanguage, WritingSystem, WritingSystems};

const PREFERRED_CODE: &str = "en";

fn named(ws: &WritingSystem) -> MarkerLanguage {
    MarkerLanguage::Named {
        key: ws.key.clone(),
        name: ws.name.clone(),
    }
}

/// Writing system for markers without an explicit language: the `en`
/// system, else the first not ignored, else the first of any kind.
pub fn auto_language(writing_systems: &WritingSystems) -> MarkerLanguage {
    let mut first_active = None;
    let mut first_any = None;
    for ws in writing_systems.iter() {
        if ws.code == PREFERRED_CODE {
            return named(ws);
        }
        if first_active.is_none() && !ws.ignored {
            first_active = Some(ws);
        }
        first_any.get_or_insert(ws);
    }
    first_active
        .or(first_any)
        .map_or(MarkerLanguage::Unassigned, named)
}

/// Resolve a saved language key; keys missing from the table are `Unknown`.
pub fn resolve_language(key: Option<&str>, writing_systems: &WritingSystems) -> MarkerLanguage {
    key.and_then(|key| writing_systems.get(key))
        .map_or(MarkerLanguage::Unknown, named)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str, bool)]) -> WritingSystems {
        entries
            .iter()
            .map(|(key, code, ignored)| {
                let mut ws = WritingSystem::new(*key, *code, *key);
                ws.ignored = *ignored;
                ws
            })
            .collect()
    }

    #[test]
    fn english_wins_regardless_of_position() {
        let ws = table(&[("Vern", "qaa", false), ("Eng", "en", true)]);
        assert_eq!(auto_language(&ws).key(), Some("Eng"));
    }

    #[test]
    fn first_active_then_first_any() {
        let ws = table(&[("A", "aaa", true), ("B", "bbb", false)]);
        assert_eq!(auto_language(&ws).key(), Some("B"));
        let ws = table(&[("A", "aaa", true), ("B", "bbb", true)]);
        assert_eq!(auto_language(&ws).key(), Some("A"));
        assert_eq!(auto_language(&WritingSystems::default()), MarkerLanguage::Unassigned);
    }

    #[test]
    fn unknown_keys_resolve_to_sentinel() {
        let ws = table(&[("Eng", "en", false)]);
        assert_eq!(resolve_language(Some("Eng"), &ws).key(), Some("Eng"));
        assert!(resolve_language(Some("Klingon"), &ws).is_unknown());
        assert!(resolve_language(None, &ws).is_unknown());
    }
}
