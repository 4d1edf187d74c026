//! Plugin descriptor model

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::host::{Middleware, ServiceProvider};
use crate::traits::PluginHooks;

/// Plugin name, unique within a registry
pub type PluginName = String;

/// Validator applied to a plugin's merged configuration
pub type ConfigValidator = Arc<dyn Fn(&Map<String, Value>) -> Result<()> + Send + Sync>;

/// Immutable description of a plugin
#[derive(Clone)]
pub struct PluginDescriptor {
    /// Unique plugin name
    pub name: PluginName,

    /// Plugin version (semver-like)
    pub version: String,

    /// Human readable description
    pub description: Option<String>,

    /// Lifecycle hook implementation
    pub hooks: Option<Arc<dyn PluginHooks>>,

    /// Configuration contract
    pub config: Option<ConfigContract>,

    /// Declared dependencies, in declaration order
    pub dependencies: Vec<DependencySpec>,

    /// Global middleware, mounted in declaration order
    pub middleware: Vec<Arc<dyn Middleware>>,

    /// Named route middleware, merged into the shared namespace
    pub route_middleware: Vec<(String, Arc<dyn Middleware>)>,

    /// Resource directories relative to the plugin root
    pub resources: Option<ResourceDeclarations>,

    /// Files the plugin offers for publishing into the host
    pub publishable: Vec<PublishSpec>,

    /// Free-form labels
    pub tags: Vec<String>,

    /// Service provider registered with the host container
    pub provider: Option<Arc<dyn ServiceProvider>>,
}

impl PluginDescriptor {
    /// Create a descriptor with only metadata set
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            hooks: None,
            config: None,
            dependencies: Vec::new(),
            middleware: Vec::new(),
            route_middleware: Vec::new(),
            resources: None,
            publishable: Vec::new(),
            tags: Vec::new(),
            provider: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn PluginHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn with_config(mut self, config: ConfigContract) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_dependency(mut self, dependency: DependencySpec) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn with_route_middleware(
        mut self,
        name: impl Into<String>,
        middleware: Arc<dyn Middleware>,
    ) -> Self {
        self.route_middleware.push((name.into(), middleware));
        self
    }

    pub fn with_resources(mut self, resources: ResourceDeclarations) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_publishable(mut self, spec: PublishSpec) -> Self {
        self.publishable.push(spec);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn ServiceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Structural validation of the descriptor.
    ///
    /// Returns the first violation found. Hooks are never consulted here.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("plugin name must not be empty".to_string());
        }

        if self.version.trim().is_empty() {
            return Err(format!("plugin \"{}\" has an empty version", self.name));
        }

        if let Some(config) = &self.config {
            if config.key.trim().is_empty() {
                return Err(format!("plugin \"{}\" declares config with an empty key", self.name));
            }
            if !config.defaults.is_object() {
                return Err(format!(
                    "plugin \"{}\" config defaults for \"{}\" must be a map",
                    self.name, config.key
                ));
            }
        }

        if let Some(position) = self
            .dependencies
            .iter()
            .position(|dep| dep.name.trim().is_empty())
        {
            return Err(format!(
                "plugin \"{}\" dependency #{} has an empty name",
                self.name,
                position + 1
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("description", &self.description)
            .field("has_hooks", &self.hooks.is_some())
            .field("config", &self.config)
            .field("dependencies", &self.dependencies)
            .field("middleware", &self.middleware.len())
            .field(
                "route_middleware",
                &self.route_middleware.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("resources", &self.resources)
            .field("publishable", &self.publishable)
            .field("tags", &self.tags)
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

/// A declared dependency on another plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySpec {
    /// Name of the plugin depended upon
    #[serde(default)]
    pub name: PluginName,

    /// Version constraint (`1.2.3`, `^1.2.0` or `>=1.0.0`)
    #[serde(default, alias = "version")]
    pub version_constraint: Option<String>,

    /// Whether boot fails when the dependency is unavailable
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl DependencySpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_constraint: None,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_constraint: None,
            required: false,
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.version_constraint = Some(constraint.into());
        self
    }
}

/// Configuration contract of a plugin
#[derive(Clone)]
pub struct ConfigContract {
    /// Host config key the plugin's settings live under
    pub key: String,

    /// Default values; must be a JSON object
    pub defaults: Value,

    /// Optional validator run against the merged settings
    pub validator: Option<ConfigValidator>,

    /// Environment variables the plugin reads
    pub env: Vec<String>,
}

impl ConfigContract {
    pub fn new(key: impl Into<String>, defaults: Value) -> Self {
        Self {
            key: key.into(),
            defaults,
            validator: None,
            env: Vec::new(),
        }
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<()> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_env(mut self, name: impl Into<String>) -> Self {
        self.env.push(name.into());
        self
    }
}

impl fmt::Debug for ConfigContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigContract")
            .field("key", &self.key)
            .field("defaults", &self.defaults)
            .field("has_validator", &self.validator.is_some())
            .field("env", &self.env)
            .finish()
    }
}

/// Resource directories, each relative to the plugin root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDeclarations {
    pub migrations: Option<String>,
    pub seeders: Option<String>,
    pub models: Option<String>,
    pub config: Option<String>,
    pub lang: Option<String>,
}

/// A copy instruction offered for publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSpec {
    /// Path relative to the plugin root
    pub source: String,

    /// Path relative to the host's publish directory
    pub destination: String,

    /// Group label used to select what to publish
    pub tag: String,
}

impl PublishSpec {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            tag: tag.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_descriptor_is_valid() {
        let descriptor = PluginDescriptor::new("blog", "1.0.0");
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn test_empty_metadata_is_rejected() {
        assert!(PluginDescriptor::new("", "1.0.0").validate().is_err());
        assert!(PluginDescriptor::new("blog", " ").validate().is_err());
    }

    #[test]
    fn test_config_contract_validation() {
        let descriptor = PluginDescriptor::new("blog", "1.0.0")
            .with_config(ConfigContract::new("blog", json!(["not", "a", "map"])));
        let err = descriptor.validate().unwrap_err();
        assert!(err.contains("must be a map"));

        let descriptor = PluginDescriptor::new("blog", "1.0.0")
            .with_config(ConfigContract::new("", json!({})));
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_dependency_without_name_is_rejected() {
        let descriptor = PluginDescriptor::new("blog", "1.0.0")
            .with_dependency(DependencySpec::required("auth"))
            .with_dependency(DependencySpec::optional(""));
        let err = descriptor.validate().unwrap_err();
        assert!(err.contains("#2"));
    }

    #[test]
    fn test_dependency_spec_defaults_to_required() {
        let spec: DependencySpec = serde_json::from_value(json!({
            "name": "auth",
            "version": "^1.2.0"
        }))
        .unwrap();

        assert!(spec.required);
        assert_eq!(spec.version_constraint.as_deref(), Some("^1.2.0"));
    }
}
