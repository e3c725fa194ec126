//! Configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use rewardtree_distribution::{DuplicatePolicy, IngestOptions, ParseErrorPolicy};
use rewardtree_merkle::{HashFunction, MerkleTreeBuilder};

use crate::{default_settings_path, Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Raw record ingestion
    #[serde(default)]
    pub ingest: IngestSettings,

    /// Tree construction
    #[serde(default)]
    pub merkle: MerkleSettings,

    /// JSON output
    #[serde(default)]
    pub output: OutputSettings,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let mut settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            settings.config_path = Some(path.to_path_buf());
            info!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            Ok(Self {
                config_path: Some(path.to_path_buf()),
                ..Self::default()
            })
        }
    }

    /// Save settings to the path they were loaded from, or the default
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Ingestion options for the distribution library
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions::from(&self.ingest)
    }

    /// Tree builder for the configured hash
    pub fn tree_builder(&self) -> MerkleTreeBuilder {
        MerkleTreeBuilder::new(self.merkle.hash)
    }
}

/// How raw earner lines are turned into a distribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSettings {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    #[serde(default)]
    pub parse_error_policy: ParseErrorPolicy,
}

impl From<&IngestSettings> for IngestOptions {
    fn from(settings: &IngestSettings) -> Self {
        IngestOptions {
            duplicate_policy: settings.duplicate_policy,
            parse_error_policy: settings.parse_error_policy,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleSettings {
    /// Node hash; changing it changes every root
    #[serde(default)]
    pub hash: HashFunction,
}

impl From<&MerkleSettings> for HashFunction {
    fn from(settings: &MerkleSettings) -> Self {
        settings.hash
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Pretty-print written JSON
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            pretty: default_true(),
        }
    }
}
