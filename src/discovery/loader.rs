//! Turning discovered candidates into plugin descriptors

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use plugin_host_api::{
    ConfigContract, ConfigValidator, DependencySpec, Middleware, PluginDescriptor, PluginHooks,
    PublishSpec, ResourceDeclarations, ServiceProvider,
};

use super::{Candidate, CandidateKind};

/// Loads a descriptor for a discovered candidate
#[async_trait]
pub trait PluginLoader: Send + Sync {
    async fn load(&self, candidate: &Candidate) -> Result<PluginDescriptor>;
}

/// Compiled-in implementations that descriptor files refer to by name
#[derive(Default, Clone)]
pub struct PluginCatalog {
    hooks: HashMap<String, Arc<dyn PluginHooks>>,
    providers: HashMap<String, Arc<dyn ServiceProvider>>,
    middleware: HashMap<String, Arc<dyn Middleware>>,
    validators: HashMap<String, ConfigValidator>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hooks(mut self, name: impl Into<String>, hooks: Arc<dyn PluginHooks>) -> Self {
        self.hooks.insert(name.into(), hooks);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn ServiceProvider>) -> Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware
            .insert(middleware.name().to_string(), middleware);
        self
    }

    pub fn with_validator(mut self, name: impl Into<String>, validator: ConfigValidator) -> Self {
        self.validators.insert(name.into(), validator);
        self
    }

    fn hooks(&self, name: &str) -> Result<Arc<dyn PluginHooks>> {
        self.hooks
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("No hooks named {} in the plugin catalog", name))
    }

    fn provider(&self, name: &str) -> Result<Arc<dyn ServiceProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("No service provider named {} in the plugin catalog", name))
    }

    fn middleware(&self, name: &str) -> Result<Arc<dyn Middleware>> {
        self.middleware
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("No middleware named {} in the plugin catalog", name))
    }

    fn validator(&self, name: &str) -> Result<ConfigValidator> {
        self.validators
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("No config validator named {} in the plugin catalog", name))
    }
}

/// On-disk plugin descriptor (`index.yaml`, `index.json`, or a package entry file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorManifest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    pub description: Option<String>,

    /// Catalog name of the hook implementation
    pub hooks: Option<String>,

    /// Catalog name of the service provider
    pub provider: Option<String>,

    pub config: Option<ConfigManifest>,

    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,

    /// Catalog names of global middleware
    #[serde(default)]
    pub middleware: Vec<String>,

    /// Alias to catalog middleware name, in declaration order
    #[serde(default)]
    pub route_middleware: Map<String, Value>,

    pub resources: Option<ResourceDeclarations>,

    #[serde(default)]
    pub publishable: Vec<PublishSpec>,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// Config section of a descriptor file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigManifest {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub defaults: Value,

    /// Catalog name of the validator
    pub validator: Option<String>,

    #[serde(default)]
    pub env: Vec<String>,
}

impl DescriptorManifest {
    /// Parse a descriptor file; `.json` as JSON, anything else as YAML
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read plugin descriptor {:?}", path))?;

        let manifest = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(manifest)
    }

    /// Bind catalog names and build the descriptor
    pub fn into_descriptor(self, catalog: &PluginCatalog) -> Result<PluginDescriptor> {
        let mut descriptor = PluginDescriptor::new(self.name, self.version);
        descriptor.description = self.description;
        descriptor.dependencies = self.dependencies;
        descriptor.resources = self.resources;
        descriptor.publishable = self.publishable;
        descriptor.tags = self.tags;

        if let Some(hooks) = &self.hooks {
            descriptor.hooks = Some(catalog.hooks(hooks)?);
        }

        if let Some(provider) = &self.provider {
            descriptor.provider = Some(catalog.provider(provider)?);
        }

        if let Some(config) = self.config {
            let mut contract = ConfigContract::new(config.key, config.defaults);
            contract.env = config.env;
            if let Some(validator) = &config.validator {
                contract.validator = Some(catalog.validator(validator)?);
            }
            descriptor.config = Some(contract);
        }

        for name in &self.middleware {
            descriptor.middleware.push(catalog.middleware(name)?);
        }

        for (alias, name) in &self.route_middleware {
            let name = name
                .as_str()
                .ok_or_else(|| anyhow!("Route middleware \"{}\" must name catalog middleware", alias))?;
            descriptor
                .route_middleware
                .push((alias.clone(), catalog.middleware(name)?));
        }

        Ok(descriptor)
    }
}

/// Loader backed by descriptor files and a [`PluginCatalog`]
pub struct CatalogLoader {
    catalog: PluginCatalog,
}

impl CatalogLoader {
    pub fn new(catalog: PluginCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl PluginLoader for CatalogLoader {
    async fn load(&self, candidate: &Candidate) -> Result<PluginDescriptor> {
        match &candidate.kind {
            CandidateKind::Descriptor { path } => DescriptorManifest::from_file(path)
                .await?
                .into_descriptor(&self.catalog),
            CandidateKind::LegacyProvider {
                package,
                version,
                provider,
            } => Ok(PluginDescriptor::new(package.clone(), version.clone())
                .with_provider(self.catalog.provider(provider)?)),
        }
    }
}
