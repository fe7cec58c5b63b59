//! Configuration management.
//!
//! Settings resolve in order: built-in defaults, then an optional TOML
//! config file, then environment overrides. External service endpoints are
//! plain configuration values handed to the adapter constructors.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::identify::IdentifyConfig;
use crate::llm::LlmConfig;
use crate::models::CategoryMode;
use crate::repository::DbContext;

/// Default database filename inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "bioscout.db";
/// Subdirectory of the data dir holding sighting images.
pub const SIGHTINGS_SUBDIR: &str = "sightings";
/// Subdirectory of the data dir holding knowledge corpus files.
pub const KNOWLEDGE_SUBDIR: &str = "knowledge";
/// Per-category corpus filename prefix.
pub const DEFAULT_CORPUS_PREFIX: &str = "margalla";

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Supports sqlite: URLs. Set via DATABASE_URL env var or config.
    pub database_url: Option<String>,
    /// Directory for sighting images.
    pub sightings_dir: PathBuf,
    /// Directory for knowledge corpus files.
    pub knowledge_dir: PathBuf,
    /// Corpus filename prefix ("{prefix}_{category}.txt").
    pub corpus_prefix: String,
    /// Which category set the classifier uses.
    pub category_mode: CategoryMode,
    /// HTTP server bind host.
    pub server_host: String,
    /// HTTP server bind port.
    pub server_port: u16,
    /// LLM service configuration.
    pub llm: LlmConfig,
    /// Species identification API configuration.
    pub identify: IdentifyConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/bioscout/ for user data
        // Falls back gracefully: Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bioscout");

        Self {
            sightings_dir: data_dir.join(SIGHTINGS_SUBDIR),
            knowledge_dir: data_dir.join(KNOWLEDGE_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            corpus_prefix: DEFAULT_CORPUS_PREFIX.to_string(),
            category_mode: CategoryMode::Extended,
            server_host: "127.0.0.1".to_string(),
            server_port: 8000,
            llm: LlmConfig::default(),
            identify: IdentifyConfig::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            sightings_dir: data_dir.join(SIGHTINGS_SUBDIR),
            knowledge_dir: data_dir.join(KNOWLEDGE_SUBDIR),
            data_dir,
            ..Default::default()
        }
    }

    /// Load settings: defaults, then the config file (explicit path or the
    /// default location), then environment overrides.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = Self::default();

        let file = match config_path {
            Some(path) => Some(ConfigFile::read(path)?),
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Some(ConfigFile::read(&default_path)?)
                } else {
                    None
                }
            }
        };
        if let Some(file) = file {
            file.apply(&mut settings);
        }

        settings.apply_env();
        Ok(settings)
    }

    /// Default config file location (~/.config/bioscout/config.toml).
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bioscout")
            .join("config.toml")
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.database_url = Some(url);
            }
        }
        if let Ok(dir) = std::env::var("BIOSCOUT_DATA_DIR") {
            if !dir.is_empty() {
                let expanded = shellexpand::tilde(&dir).to_string();
                let data_dir = PathBuf::from(expanded);
                self.sightings_dir = data_dir.join(SIGHTINGS_SUBDIR);
                self.knowledge_dir = data_dir.join(KNOWLEDGE_SUBDIR);
                self.data_dir = data_dir;
            }
        }
        if let Ok(endpoint) = std::env::var("BIOSCOUT_LLM_ENDPOINT") {
            if !endpoint.is_empty() {
                self.llm.endpoint = endpoint;
            }
        }
        if let Ok(token) = std::env::var("BIOSCOUT_INATURALIST_TOKEN") {
            if !token.is_empty() {
                self.identify.api_token = Some(token);
            }
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            let path = self.data_dir.join(&self.database_filename);
            format!("sqlite:{}", path.display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        if self.database_url.is_some() {
            true
        } else {
            self.database_path().exists()
        }
    }

    /// Ensure all data directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (dir, label) in [
            (&self.data_dir, "data directory"),
            (&self.sightings_dir, "sightings directory"),
            (&self.knowledge_dir, "knowledge directory"),
        ] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("Failed to create {} '{}': {}", label, dir.display(), e),
                )
            })?;
        }
        Ok(())
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Data directory path (tilde-expanded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Database URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Corpus filename prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_prefix: Option<String>,
    /// Category set: "basic" or "extended".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_mode: Option<CategoryMode>,
    /// Server bind host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_host: Option<String>,
    /// Server bind port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,
    /// LLM configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,
    /// Identification API configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identify: Option<IdentifyConfig>,
}

impl ConfigFile {
    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config '{}': {}", path.display(), e))?;
        let file: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path.display(), e))?;
        Ok(file)
    }

    fn apply(self, settings: &mut Settings) {
        if let Some(dir) = self.data_dir {
            let expanded = shellexpand::tilde(&dir).to_string();
            let data_dir = PathBuf::from(expanded);
            settings.sightings_dir = data_dir.join(SIGHTINGS_SUBDIR);
            settings.knowledge_dir = data_dir.join(KNOWLEDGE_SUBDIR);
            settings.data_dir = data_dir;
        }
        if let Some(database) = self.database {
            settings.database_filename = database;
        }
        if let Some(url) = self.database_url {
            settings.database_url = Some(url);
        }
        if let Some(prefix) = self.corpus_prefix {
            settings.corpus_prefix = prefix;
        }
        if let Some(mode) = self.category_mode {
            settings.category_mode = mode;
        }
        if let Some(host) = self.server_host {
            settings.server_host = host;
        }
        if let Some(port) = self.server_port {
            settings.server_port = port;
        }
        if let Some(llm) = self.llm {
            settings.llm = llm;
        }
        if let Some(identify) = self.identify {
            settings.identify = identify;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.data_dir.ends_with("bioscout"));
        assert_eq!(settings.database_filename, DEFAULT_DATABASE_FILENAME);
        assert!(settings.database_url.is_none());
        assert_eq!(settings.corpus_prefix, "margalla");
        assert_eq!(settings.category_mode, CategoryMode::Extended);
        assert_eq!(settings.server_port, 8000);
        assert!(settings.sightings_dir.ends_with("sightings"));
        assert!(settings.knowledge_dir.ends_with("knowledge"));
    }

    #[test]
    fn test_database_url_from_path() {
        let settings = Settings::with_data_dir(PathBuf::from("/tmp/bs"));
        assert_eq!(settings.database_url(), "sqlite:/tmp/bs/bioscout.db");
    }

    #[test]
    fn test_explicit_database_url_wins() {
        let mut settings = Settings::default();
        settings.database_url = Some("sqlite:/elsewhere/db.sqlite".to_string());
        assert_eq!(settings.database_url(), "sqlite:/elsewhere/db.sqlite");
        assert!(settings.database_exists());
    }

    #[test]
    fn test_config_file_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/tmp/bioscout-test"
corpus_prefix = "hills"
category_mode = "basic"
server_port = 9001

[llm]
model = "llama3.2:3b"
"#,
        )
        .unwrap();

        let file = ConfigFile::read(&path).unwrap();
        let mut settings = Settings::default();
        file.apply(&mut settings);

        assert_eq!(settings.data_dir, PathBuf::from("/tmp/bioscout-test"));
        assert_eq!(
            settings.sightings_dir,
            PathBuf::from("/tmp/bioscout-test/sightings")
        );
        assert_eq!(settings.corpus_prefix, "hills");
        assert_eq!(settings.category_mode, CategoryMode::Basic);
        assert_eq!(settings.server_port, 9001);
        assert_eq!(settings.llm.model, "llama3.2:3b");
    }

    #[test]
    fn test_ensure_directories() {
        let dir = tempdir().unwrap();
        let settings = Settings::with_data_dir(dir.path().join("data"));
        settings.ensure_directories().unwrap();
        assert!(settings.sightings_dir.is_dir());
        assert!(settings.knowledge_dir.is_dir());
    }
}
