use serde::Deserialize;
use std::path::PathBuf;
use std::{num::NonZeroUsize, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO Error")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse Error")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid TOML error")]
    Invalid { message: String },
}

/// Engine configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the backing data file.
    pub data_dir: PathBuf,
    /// Directory the rolling log files are written to.
    pub logs_dir: PathBuf,
    /// Number of frames in the buffer pool.
    pub buffer_pages: NonZeroUsize,
    /// The K of the LRU-K replacement policy.
    #[serde(default = "default_k_dist")]
    pub k_dist: NonZeroUsize,
}

fn default_k_dist() -> NonZeroUsize {
    NonZeroUsize::new(2).expect("2 is non-zero")
}

impl EngineConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        let cfg: EngineConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseToml {
            path: path.clone(),
            source: e,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // buffer_pages and k_dist are NonZeroUsize, so "0" can't happen.
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "storage.data_dir must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/var/lib/ferrodb"
            logs_dir = "/var/log/ferrodb"
            buffer_pages = 128
            k_dist = 3
            "#,
        )
        .unwrap();

        assert_eq!(cfg.storage.data_dir, PathBuf::from("/var/lib/ferrodb"));
        assert_eq!(cfg.storage.buffer_pages.get(), 128);
        assert_eq!(cfg.storage.k_dist.get(), 3);
    }

    #[test]
    fn k_dist_defaults_to_two() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "./data"
            logs_dir = "./logs"
            buffer_pages = 16
            "#,
        )
        .unwrap();

        assert_eq!(cfg.storage.k_dist.get(), 2);
    }

    #[test]
    fn zero_buffer_pages_is_rejected_by_the_type() {
        let result: Result<EngineConfig, _> = toml::from_str(
            r#"
            [storage]
            data_dir = "./data"
            logs_dir = "./logs"
            buffer_pages = 0
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn empty_data_dir_fails_validation() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            [storage]
            data_dir = ""
            logs_dir = "./logs"
            buffer_pages = 16
            "#,
        )
        .unwrap();

        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { message }) if message.contains("data_dir")
        ));
    }
}
