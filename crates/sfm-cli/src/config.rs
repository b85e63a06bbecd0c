//! Optional TOML project file.
//!
//! ```toml
//! data_file = "kala.db"
//! map_file = "kala.map"
//! field_catalog = "ImportFields.xml"
//! work_dir = "import"
//!
//! [[writing_systems]]
//! key = "Vern"
//! code = "qaa-x-kal"
//! name = "Kala"
//!
//! [[custom_fields]]
//! class_id = 5002
//! flid = 3
//! label = "Dialect"
//!
//! [log_tokens]
//! warning = ["Avertissement:"]
//! ```
//!
//! Relative paths are resolved against the project file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use sfm_model::{CustomField, WritingSystem, WritingSystems};
use sfm_report::LogTokens;

/// Environment variable naming the default field catalog.
pub const CATALOG_ENV: &str = "SFM_FIELD_CATALOG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub data_file: Option<PathBuf>,
    pub map_file: Option<PathBuf>,
    pub field_catalog: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub writing_systems: Vec<WritingSystem>,
    /// Custom fields of the destination lexicon.
    pub custom_fields: Vec<CustomField>,
    pub log_tokens: LogTokenConfig,
}

/// Localized load-log tokens, in addition to `Warning:` and `Info:`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogTokenConfig {
    pub warning: Vec<String>,
    pub info: Vec<String>,
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read project file {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("parse project file {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        tracing::info!(path = %path.display(), "loaded project file");
        Ok(config)
    }

    /// Load `path` when given, else defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    fn rebase(&mut self, base: &Path) {
        for path in [
            &mut self.data_file,
            &mut self.map_file,
            &mut self.field_catalog,
            &mut self.work_dir,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Writing systems from the project file, or a vernacular plus English
    /// table when none are configured.
    pub fn writing_systems(&self) -> WritingSystems {
        if self.writing_systems.is_empty() {
            WritingSystems::new(vec![
                WritingSystem::new("Vern", "qaa", "Vernacular"),
                WritingSystem::new("Eng", "en", "English"),
            ])
        } else {
            self.writing_systems.iter().cloned().collect()
        }
    }

    pub fn log_tokens(&self) -> LogTokens {
        LogTokens::with_localized(&self.log_tokens.warning, &self.log_tokens.info)
    }

    pub fn data_file(&self, cli: Option<&Path>) -> Result<PathBuf> {
        pick(cli, self.data_file.as_deref(), "data file", "data_file")
    }

    pub fn map_file(&self, cli: Option<&Path>) -> Option<PathBuf> {
        cli.or(self.map_file.as_deref()).map(Path::to_path_buf)
    }

    /// Command line, then project file, then `SFM_FIELD_CATALOG`.
    pub fn field_catalog(&self, cli: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli.or(self.field_catalog.as_deref()) {
            return Ok(path.to_path_buf());
        }
        match std::env::var_os(CATALOG_ENV) {
            Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
            _ => bail!("no field catalog: pass --catalog, set field_catalog, or set {CATALOG_ENV}"),
        }
    }
}

fn pick(cli: Option<&Path>, config: Option<&Path>, what: &str, key: &str) -> Result<PathBuf> {
    match cli.or(config) {
        Some(path) => Ok(path.to_path_buf()),
        None => bail!("no {what}: pass it on the command line or set `{key}` in the project file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_file_paths_are_relative_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.toml");
        fs::write(
            &path,
            r#"
data_file = "kala.db"
field_catalog = "/opt/catalog.xml"

[[writing_systems]]
key = "Vern"
code = "qaa-x-kal"
name = "Kala"

[[custom_fields]]
class_id = 5002
flid = 3
label = "Dialect"

[log_tokens]
warning = ["Avertissement:"]
"#,
        )
        .unwrap();

        let config = ImportConfig::load(&path).unwrap();
        assert_eq!(config.data_file(None).unwrap(), dir.path().join("kala.db"));
        assert_eq!(
            config.field_catalog(None).unwrap(),
            PathBuf::from("/opt/catalog.xml")
        );
        assert_eq!(config.writing_systems().len(), 1);
        assert_eq!(config.custom_fields[0].label, "Dialect");
        assert_eq!(config.log_tokens().warning.len(), 2);
        assert_eq!(
            config.data_file(Some(Path::new("other.db"))).unwrap(),
            PathBuf::from("other.db")
        );
    }

    #[test]
    fn missing_data_file_is_an_error() {
        assert!(ImportConfig::default().data_file(None).is_err());
        assert_eq!(ImportConfig::default().writing_systems().len(), 2);
    }
}
