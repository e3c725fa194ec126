//! RewardTree Settings
//!
//! Configuration for the `rewardtree` tool, stored as JSON.
//!
//! ## Usage
//!
//! ```no_run
//! use rewardtree_settings::{DuplicatePolicy, Settings};
//!
//! let mut settings = Settings::load_or_default()?;
//! settings.ingest.duplicate_policy = DuplicatePolicy::KeepLatestSnapshot;
//! settings.save()?;
//! # Ok::<(), rewardtree_settings::SettingsError>(())
//! ```

mod config;
mod paths;

pub use config::{IngestSettings, MerkleSettings, OutputSettings, Settings};
pub use paths::{default_config_dir, expand_path};
pub use rewardtree_distribution::{DuplicatePolicy, ParseErrorPolicy};
pub use rewardtree_merkle::HashFunction;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}
