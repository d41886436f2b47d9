//! Application configuration loaded from TOML with `SWGPLAN_*` overrides.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "swgplan";

const ENV_PREFIX: &str = "SWGPLAN";

const DEFAULT_CONFIG: &str = r#"# swgplan configuration
#
# Every key can be overridden with an environment variable such as
# SWGPLAN_DEFAULT_SPECIES=wookiee.

# Root for saved templates and logs.
# data_dir = "/home/me/.local/share/swgplan"

# Alternative catalog document; the built-in catalog is used when unset.
# catalog_path = "/home/me/swg/catalog.json"

default_species = "human"
default_profession = "brawler"
log_filter = "info"
"#;

/// Runtime settings shared by the library and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory for the template store and log files.
    pub data_dir: PathBuf,
    /// Catalog document to use instead of the built-in one.
    pub catalog_path: Option<PathBuf>,
    /// Species for new builds.
    pub default_species: String,
    /// Profession viewed by new builds.
    pub default_profession: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CONFIG_DIR),
            catalog_path: None,
            default_species: "human".to_string(),
            default_profession: "brawler".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Location of the user's config file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join("config.toml")
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path` (optional) layered with environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Directory backing the template store.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    /// Directory receiving log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Write a commented default config on first run; returns its path.
pub fn ensure_default_config() -> Result<PathBuf> {
    ensure_default_config_at(&AppConfig::config_path())
}

/// Like [`ensure_default_config`] for an explicit path. Existing files are left alone.
pub fn ensure_default_config_at(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("swgplan").join("config.toml");

        ensure_default_config_at(&path)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.default_species, "human");
        assert_eq!(config.default_profession, "brawler");
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.data_dir, AppConfig::default().data_dir);

        fs::write(&path, "default_species = \"wookiee\"\n")?;
        ensure_default_config_at(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "default_species = \"wookiee\"\n");
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "data_dir = \"/tmp/swg\"\ncatalog_path = \"/tmp/swg/catalog.json\"\nlog_filter = \"debug\"\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_dir, PathBuf::from("/tmp/swg"));
        assert_eq!(config.store_dir(), PathBuf::from("/tmp/swg/store"));
        assert_eq!(
            config.catalog_path.as_deref(),
            Some(Path::new("/tmp/swg/catalog.json"))
        );
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.default_profession, "brawler");
        Ok(())
    }

    #[test]
    fn missing_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("absent.toml"))?;
        assert_eq!(config.log_filter, AppConfig::default().log_filter);
        Ok(())
    }
}
