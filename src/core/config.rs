use crate::core::ledger::CurrencyMode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LedgerConfig {
    #[serde(default)]
    pub currency_mode: CurrencyMode,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExportConfig {
    /// Rows per sheet when a preview is requested
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    pub output_dir: Option<String>,
}

fn default_preview_rows() -> usize {
    5
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            preview_rows: default_preview_rows(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Directory that relative statement paths are resolved against
    pub input_dir: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Loads the default config file, falling back to built-in defaults when
    /// it has not been created yet.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load()
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "stmtx", "stmtx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .as_ref()
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
ledger:
  currency_mode: require_single
export:
  preview_rows: 10
  output_dir: "/tmp/stmtx"
input_dir: "/data/statements"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.ledger.currency_mode, CurrencyMode::RequireSingle);
        assert_eq!(config.export.preview_rows, 10);
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/stmtx"));
        assert_eq!(config.input_dir.as_deref(), Some("/data/statements"));
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.ledger.currency_mode, CurrencyMode::Partition);
        assert_eq!(config.export.preview_rows, 5);
        assert_eq!(config.output_dir(), PathBuf::from("."));
        assert!(config.input_dir.is_none());

        let partial: AppConfig = serde_yaml::from_str(
            r#"
export:
  output_dir: "out"
"#,
        )
        .expect("Failed to deserialize");
        assert_eq!(partial.export.preview_rows, 5);
        assert_eq!(partial.ledger.currency_mode, CurrencyMode::Partition);
    }

    #[test]
    fn test_invalid_currency_mode_is_rejected() {
        let result: Result<AppConfig, _> = serde_yaml::from_str(
            r#"
ledger:
  currency_mode: sum_everything
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("config.yaml");
        fs::write(&path, "export:\n  preview_rows: 3\n")?;

        let config = AppConfig::load_from_path(&path)?;
        assert_eq!(config.export.preview_rows, 3);

        let missing = AppConfig::load_from_path(dir.path().join("missing.yaml"));
        assert!(
            missing
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
        Ok(())
    }
}
