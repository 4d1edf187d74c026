//! Plugin discovery from installed packages and the local plugins directory

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::PluginError;
use crate::registry::{PluginRegistry, PluginSource};

pub mod loader;
pub mod local;
pub mod package;

pub use loader::*;
pub use local::*;
pub use package::*;

/// What a discovered candidate points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateKind {
    /// A declarative descriptor file
    Descriptor { path: PathBuf },

    /// A package that only names a service provider
    LegacyProvider {
        package: String,
        version: String,
        provider: String,
    },
}

/// A plugin found by a discovery strategy, not yet loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Plugin root directory
    pub root: PathBuf,

    pub source: PluginSource,

    pub kind: CandidateKind,
}

/// One place plugins can be discovered from
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Find candidates; a missing search directory yields none
    async fn scan(&self) -> Result<Vec<Candidate>>;
}

/// Outcome of a discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Names handed to the registry, in registration order
    pub registered: Vec<String>,

    /// Candidates that could not be loaded
    pub failures: Vec<String>,
}

/// Runs discovery strategies and feeds loaded descriptors into the registry
pub struct DiscoveryEngine {
    registry: Arc<PluginRegistry>,
    loader: Arc<dyn PluginLoader>,
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl DiscoveryEngine {
    pub fn new(registry: Arc<PluginRegistry>, loader: Arc<dyn PluginLoader>) -> Self {
        Self {
            registry,
            loader,
            strategies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn DiscoveryStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Scan every strategy in order and register what loads
    pub async fn discover(&self) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for strategy in &self.strategies {
            let candidates = match strategy.scan().await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Plugin discovery via {} failed: {}", strategy.name(), e);
                    continue;
                }
            };
            info!(
                "Discovered {} plugin candidate(s) via {}",
                candidates.len(),
                strategy.name()
            );

            for candidate in candidates {
                match self.loader.load(&candidate).await {
                    Ok(descriptor) => {
                        let name = descriptor.name.clone();
                        if !self.registry.has(&name).await {
                            self.registry
                                .set_plugin_root(&name, candidate.root.clone())
                                .await;
                        }
                        debug!("Registering discovered plugin {} from {:?}", name, candidate.root);
                        self.registry.register(descriptor, candidate.source).await;
                        report.registered.push(name);
                    }
                    Err(e) => {
                        let error = PluginError::Discovery {
                            path: candidate.root.clone(),
                            message: format!("{:#}", e),
                        };
                        warn!("{}", error);
                        report.failures.push(error.to_string());
                    }
                }
            }
        }

        report
    }
}
