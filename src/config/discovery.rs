//! Plugin discovery configuration

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Plugin discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directory of installed packages to scan for plugin manifests
    pub packages_directory: PathBuf,

    /// Directory whose subdirectories are local plugins
    pub local_directory: PathBuf,

    /// Key of the plugin section inside `package.json`
    pub manifest_key: String,

    /// Whether to scan installed packages
    pub auto_discover: bool,

    /// Whether to scan the local plugins directory
    pub local_plugins: bool,
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.manifest_key.trim().is_empty() {
            return Err(anyhow!("Discovery manifest key must not be empty"));
        }
        Ok(())
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            packages_directory: PathBuf::from("./node_modules"),
            local_directory: PathBuf::from("./plugins"),
            manifest_key: "pluginHost".to_string(),
            auto_discover: true,
            local_plugins: true,
        }
    }
}
