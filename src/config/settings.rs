use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Result, RulegenError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulegenConfig {
    /// Fragment catalog directory, relative to the project root.
    pub fragments_dir: PathBuf,
    /// Targets generated when the CLI doesn't name any.
    pub targets: Vec<String>,
    pub generate: GenerateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Remove generated files whose source was deselected.
    pub prune: bool,
}

impl Default for RulegenConfig {
    fn default() -> Self {
        Self {
            fragments_dir: PathBuf::from("fragments"),
            targets: vec!["claude".to_string()],
            generate: GenerateConfig::default(),
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self { prune: true }
    }
}

impl RulegenConfig {
    pub async fn load(rulegen_dir: &Path) -> Result<Self> {
        let config_path = rulegen_dir.join("config.toml");
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, rulegen_dir: &Path) -> Result<()> {
        self.validate()?;
        let config_path = rulegen_dir.join("config.toml");
        let content =
            toml::to_string_pretty(self).map_err(|e| RulegenError::Config(e.to_string()))?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    /// Validate configuration values for consistency.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.fragments_dir.as_os_str().is_empty() {
            errors.push("fragments_dir must not be empty");
        }
        if self.fragments_dir.is_absolute() {
            errors.push("fragments_dir must be relative to the project root");
        }
        if self.targets.is_empty() {
            errors.push("targets must name at least one target");
        }
        for target in &self.targets {
            if target.is_empty() {
                errors.push("target names must not be empty");
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RulegenError::Config(errors.join("; ")))
        }
    }
}

/// Resolved directory layout for one project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    /// `.rulegen` directory holding config.toml.
    pub rulegen_dir: PathBuf,
    /// Absolute fragments catalog directory.
    pub fragments_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: PathBuf, config: &RulegenConfig) -> Self {
        let rulegen_dir = root.join(".rulegen");
        let fragments_dir = root.join(&config.fragments_dir);
        Self {
            root,
            rulegen_dir,
            fragments_dir,
        }
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.rulegen_dir).await?;
        fs::create_dir_all(&self.fragments_dir).await?;
        Ok(())
    }

    pub fn config_file(&self) -> PathBuf {
        self.rulegen_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = RulegenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fragments_dir, PathBuf::from("fragments"));
        assert_eq!(config.targets, vec!["claude".to_string()]);
        assert!(config.generate.prune);
    }

    #[test]
    fn empty_targets_rejected() {
        let config = RulegenConfig {
            targets: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn absolute_fragments_dir_rejected() {
        let config = RulegenConfig {
            fragments_dir: PathBuf::from("/etc/fragments"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let config = RulegenConfig {
            targets: vec!["claude".into(), "cursor".into()],
            ..Default::default()
        };
        config.save(tmp.path()).await.unwrap();

        let loaded = RulegenConfig::load(tmp.path()).await.unwrap();
        assert_eq!(loaded.targets, config.targets);
    }

    #[tokio::test]
    async fn missing_config_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let loaded = RulegenConfig::load(tmp.path()).await.unwrap();
        assert_eq!(loaded.targets, vec!["claude".to_string()]);
    }
}
