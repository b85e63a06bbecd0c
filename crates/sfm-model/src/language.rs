//! Writing systems available to the import.

use serde::{Deserialize, Serialize};

/// One writing system the caller makes available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingSystem {
    /// Language key used by mapping-file descriptions.
    pub key: String,
    /// Language code (e.g. `en`, `fr`, `qaa-x-kal`).
    pub code: String,
    /// Display name.
    pub name: String,
    /// Flagged as ignored by the user.
    #[serde(default)]
    pub ignored: bool,
}

impl WritingSystem {
    pub fn new(key: impl Into<String>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            name: name.into(),
            ignored: false,
        }
    }
}

/// Ordered writing-system table. Iteration order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WritingSystems {
    entries: Vec<WritingSystem>,
}

impl WritingSystems {
    pub fn new(entries: Vec<WritingSystem>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&WritingSystem> {
        self.entries.iter().find(|ws| ws.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WritingSystem> {
        self.entries.iter()
    }

    pub fn push(&mut self, ws: WritingSystem) {
        self.entries.push(ws);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<WritingSystem> for WritingSystems {
    fn from_iter<I: IntoIterator<Item = WritingSystem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_deserializes_as_a_list() {
        let table: WritingSystems = serde_json::from_str(
            r#"[{"key":"Vern","code":"qaa-x-kal","name":"Kala"},
                {"key":"Fr","code":"fr","name":"French","ignored":true}]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert!(!table.get("Vern").unwrap().ignored);
        assert!(table.get("Fr").unwrap().ignored);
        assert!(table.get("Eng").is_none());
    }
}
