use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Root harvester configuration, loaded from `~/.config/oupcrawl/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub storage: StorageConfig,
    pub transfer: TransferConfig,
    pub publisher: PublisherConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where bundles are downloaded and unpacked.
    pub download_dir: PathBuf,
    /// Where JSON record files are written.
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub port: u16,
    /// Root folder on the remote host holding one subfolder per delivery.
    pub folder: String,
    /// netrc file holding the login for `host`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netrc: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Publisher name stamped on every record as its `source`.
    pub display_name: String,
    pub collections: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of documents extracted in parallel.
    pub concurrency: usize,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("oupcrawl");

        Self {
            download_dir: data_dir.join("packages"),
            output_dir: data_dir.join("records"),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 21,
            folder: "hooks".to_string(),
            netrc: None,
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            display_name: "Oxford University Press".to_string(),
            collections: vec!["Progress of Theoretical and Experimental Physics".to_string()],
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl HarvestConfig {
    /// Standard config file path: `~/.config/oupcrawl/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("OUPCRAWL_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("oupcrawl")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.concurrency == 0 {
            return Err(CoreError::ConfigError(
                "pipeline.concurrency must be at least 1".to_string(),
            ));
        }
        if self.publisher.display_name.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "publisher.display_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = HarvestConfig::default();
        assert_eq!(cfg.transfer.folder, "hooks");
        assert_eq!(cfg.transfer.port, 21);
        assert_eq!(cfg.publisher.display_name, "Oxford University Press");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = HarvestConfig::default();
        cfg.transfer.host = Some("ftp.example.org".to_string());
        cfg.pipeline.concurrency = 8;
        cfg.save_to(&path).unwrap();

        let loaded = HarvestConfig::load_from(&path).unwrap();
        assert_eq!(loaded.transfer.host.as_deref(), Some("ftp.example.org"));
        assert_eq!(loaded.pipeline.concurrency, 8);
        assert_eq!(loaded.publisher.collections, cfg.publisher.collections);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[transfer]\nfolder = \"incoming\"\n").unwrap();

        let loaded = HarvestConfig::load_from(&path).unwrap();
        assert_eq!(loaded.transfer.folder, "incoming");
        assert_eq!(loaded.transfer.port, 21);
        assert_eq!(loaded.pipeline.concurrency, 4);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nconcurrency = 0\n").unwrap();

        let err = HarvestConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::ConfigError(_)));
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg =
            HarvestConfig::load_from(Path::new("/tmp/nonexistent_oupcrawl_config.toml")).unwrap();
        assert_eq!(cfg.transfer.folder, "hooks");
    }
}
