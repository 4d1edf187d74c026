//! Resource publishing configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resource publishing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Base directory publish destinations are resolved against
    pub base_directory: PathBuf,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("."),
        }
    }
}
