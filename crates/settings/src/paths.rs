//! Config file locations

use std::path::{Path, PathBuf};

/// Expand a path, replacing `~` with the user's home directory
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

/// Get the default config directory for the current platform
///
/// - macOS: `~/Library/Application Support/RewardTree`
/// - Linux: `$XDG_CONFIG_HOME/rewardtree` or `~/.config/rewardtree`
/// - Windows: `%APPDATA%\RewardTree`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir()
            .map(|h| h.join("Library/Application Support/RewardTree"))
            .unwrap_or_else(|| PathBuf::from(".rewardtree"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("."))
            })
            .join("rewardtree")
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("RewardTree")
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        home_dir()
            .map(|h| h.join(".rewardtree"))
            .unwrap_or_else(|| PathBuf::from(".rewardtree"))
    }
}
