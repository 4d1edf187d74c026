//! Configuration management for the plugin host

pub mod config;
pub mod discovery;
pub mod publish;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use config::{HostConfig, CONFIG_VERSION, DEFAULT_CONFIG_FILES};
pub use discovery::DiscoveryConfig;
pub use publish::PublishConfig;
