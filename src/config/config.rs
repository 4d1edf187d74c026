//! Main configuration structure and implementation

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::{DiscoveryConfig, PublishConfig};
use crate::utils::{expand_path, get_config_dir};

/// Supported configuration version
pub const CONFIG_VERSION: &str = "1.0";

/// File names looked up in the working directory, in order
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["plugin-host.yaml", "plugin-host.yml"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Configuration version
    pub version: String,

    /// Where plugins are discovered from
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Where publishable resources are copied to
    #[serde(default)]
    pub publish: PublishConfig,

    /// Initial host config store, keyed by config key
    #[serde(default)]
    pub app: Map<String, Value>,
}

impl HostConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let mut config: HostConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        config.expand_paths()?;
        Ok(config)
    }

    /// Load `path` if given, else the first default file found, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::find_default() {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// First existing default config file in the working directory or the
    /// user config directory
    pub fn find_default() -> Option<PathBuf> {
        let local = DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file());
        if local.is_some() {
            return local;
        }

        get_config_dir()
            .ok()
            .map(|dir| dir.join("config.yaml"))
            .filter(|path| path.is_file())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(anyhow!(
                "Unsupported configuration version: {}",
                self.version
            ));
        }

        self.discovery.validate()?;

        for (key, value) in &self.app {
            if !value.is_object() {
                return Err(anyhow!("App config \"{}\" must be a map", key));
            }
        }

        Ok(())
    }

    fn expand_paths(&mut self) -> Result<()> {
        self.discovery.packages_directory = expand_path(&self.discovery.packages_directory)?;
        self.discovery.local_directory = expand_path(&self.discovery.local_directory)?;
        self.publish.base_directory = expand_path(&self.publish.base_directory)?;
        Ok(())
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            discovery: DiscoveryConfig::default(),
            publish: PublishConfig::default(),
            app: Map::new(),
        }
    }
}
