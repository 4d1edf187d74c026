//! Plugin registry: validation, configuration merge and registration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use plugin_host_api::{Host, Middleware, PluginDescriptor, PublishSpec};

use crate::error::{HookPhase, PluginError};
use crate::events::{EventBus, PluginEventKind};
use crate::resolver::DependencyNode;

/// Runtime status of a registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    Registered,
    Booted,
    Failed,
    Disabled,
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PluginStatus::Registered => "registered",
            PluginStatus::Booted => "booted",
            PluginStatus::Failed => "failed",
            PluginStatus::Disabled => "disabled",
        };
        f.write_str(label)
    }
}

/// Where a plugin came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginSource {
    Manual,
    Local,
    AutoDiscover,
}

impl fmt::Display for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PluginSource::Manual => "manual",
            PluginSource::Local => "local",
            PluginSource::AutoDiscover => "auto-discover",
        };
        f.write_str(label)
    }
}

/// A plugin descriptor and its runtime state
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub descriptor: PluginDescriptor,
    pub status: PluginStatus,
    pub loaded_at: DateTime<Utc>,
    pub error: Option<String>,
    pub source: PluginSource,
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Timing and error counters for a registered plugin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetrics {
    pub register_time: Duration,
    pub boot_time: Duration,
    pub error_count: u32,
}

/// A publishable file offered by a registered plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishableResource {
    pub plugin: String,
    pub source: String,
    pub destination: String,
    pub tag: String,
}

impl PublishableResource {
    fn from_spec(plugin: &str, spec: &PublishSpec) -> Self {
        Self {
            plugin: plugin.to_string(),
            source: spec.source.clone(),
            destination: spec.destination.clone(),
            tag: spec.tag.clone(),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<String, RegistryEntry>,
    order: Vec<String>,
    metrics: HashMap<String, PluginMetrics>,
    roots: HashMap<String, PathBuf>,
    route_middleware: Vec<(String, String, Arc<dyn Middleware>)>,
    publishable: Vec<PublishableResource>,
}

impl RegistryState {
    fn ordered(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }
}

/// In-memory plugin registry
///
/// A name maps to at most one entry for the lifetime of the registry.
/// Entries are never removed.
pub struct PluginRegistry {
    state: RwLock<RegistryState>,
    host: Arc<dyn Host>,
    events: Arc<EventBus>,
    lifecycle: Mutex<()>,
}

impl PluginRegistry {
    pub fn new(host: Arc<dyn Host>, events: Arc<EventBus>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            host,
            events,
            lifecycle: Mutex::new(()),
        }
    }

    /// Serializes registration, boot and shutdown against each other
    pub(crate) async fn lock_lifecycle(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().await
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Register a plugin.
    ///
    /// Never fails: a rejected plugin is kept with status `failed` and a
    /// `plugin:failed` event. Registering a known name is a no-op.
    pub async fn register(&self, descriptor: PluginDescriptor, source: PluginSource) {
        let _guard = self.lock_lifecycle().await;
        let name = descriptor.name.clone();

        {
            let mut state = self.state.write().await;
            if state.entries.contains_key(&name) {
                warn!("Plugin {} is already registered, skipping", name);
                return;
            }

            state.order.push(name.clone());
            state.entries.insert(
                name.clone(),
                RegistryEntry {
                    descriptor: descriptor.clone(),
                    status: PluginStatus::Registered,
                    loaded_at: Utc::now(),
                    error: None,
                    source,
                },
            );
        }

        let started = Instant::now();

        if let Err(err) = self.register_steps(&descriptor).await {
            self.fail(&name, err).await;
            return;
        }

        let register_time = started.elapsed();
        {
            let mut state = self.state.write().await;
            if let Some(entry) = state.entries.get_mut(&name) {
                entry.status = PluginStatus::Registered;
                entry.loaded_at = Utc::now();
            }
            state.metrics.insert(
                name.clone(),
                PluginMetrics {
                    register_time,
                    ..PluginMetrics::default()
                },
            );
        }

        info!("Registered plugin {} v{} ({})", name, descriptor.version, source);
        self.events
            .emit(
                PluginEventKind::Registered,
                &name,
                Some(json!({ "source": source.to_string() })),
            )
            .await;
    }

    async fn register_steps(&self, descriptor: &PluginDescriptor) -> Result<(), PluginError> {
        descriptor
            .validate()
            .map_err(PluginError::InvalidDescriptor)?;

        if let Some(contract) = &descriptor.config {
            let merged = self.merge_config(&contract.key, &contract.defaults).await;

            for var in &contract.env {
                if std::env::var_os(var).is_none() {
                    debug!("Plugin {} declares unset env var {}", descriptor.name, var);
                }
            }

            if let Some(validator) = &contract.validator {
                validator(&merged)
                    .map_err(|e| PluginError::ConfigValidation(e.to_string()))?;
            }
        }

        if let Some(provider) = &descriptor.provider {
            self.host
                .register_provider(Arc::clone(provider))
                .await
                .map_err(|e| PluginError::Provider(e.to_string()))?;
        }

        if let Some(registrable) = descriptor.hooks.as_ref().and_then(|h| h.as_registrable()) {
            registrable
                .register(self.host.as_ref())
                .await
                .map_err(|e| PluginError::hook(HookPhase::Register, &e))?;
        }

        for middleware in &descriptor.middleware {
            self.host.use_middleware(Arc::clone(middleware)).await;
        }

        let mut state = self.state.write().await;

        for (alias, middleware) in &descriptor.route_middleware {
            if let Some((_, owner, _)) = state
                .route_middleware
                .iter()
                .find(|(existing, _, _)| existing == alias)
            {
                warn!(
                    "Route middleware \"{}\" from {} conflicts with {}, keeping existing handler",
                    alias, descriptor.name, owner
                );
                continue;
            }
            state.route_middleware.push((
                alias.clone(),
                descriptor.name.clone(),
                Arc::clone(middleware),
            ));
        }

        state.publishable.extend(
            descriptor
                .publishable
                .iter()
                .map(|spec| PublishableResource::from_spec(&descriptor.name, spec)),
        );

        Ok(())
    }

    /// Overlay the host's current value onto the defaults and write it back
    async fn merge_config(&self, key: &str, defaults: &Value) -> Map<String, Value> {
        let mut merged = defaults.as_object().cloned().unwrap_or_default();

        if let Some(Value::Object(current)) = self.host.config(key).await {
            for (field, value) in current {
                merged.insert(field, value);
            }
        }

        self.host
            .set_config(key, Value::Object(merged.clone()))
            .await;
        merged
    }

    /// Mark a plugin failed, log the reason and emit `plugin:failed`
    pub(crate) async fn fail(&self, name: &str, error: PluginError) {
        let reason = error.to_string();
        {
            let mut state = self.state.write().await;
            if let Some(entry) = state.entries.get_mut(name) {
                entry.status = PluginStatus::Failed;
                entry.error = Some(reason.clone());
            }
        }

        warn!("Plugin {} failed: {}", name, reason);
        self.events
            .emit(
                PluginEventKind::Failed,
                name,
                Some(json!({ "error": reason })),
            )
            .await;
    }

    /// Record a successful boot
    pub(crate) async fn mark_booted(&self, name: &str, boot_time: Duration) {
        let mut state = self.state.write().await;
        if let Some(entry) = state.entries.get_mut(name) {
            entry.status = PluginStatus::Booted;
        }
        if let Some(metrics) = state.metrics.get_mut(name) {
            metrics.boot_time = boot_time;
        }
    }

    pub(crate) async fn increment_errors(&self, name: &str) {
        if let Some(metrics) = self.state.write().await.metrics.get_mut(name) {
            metrics.error_count += 1;
        }
    }

    /// Take a registered plugin out of boot and command registration
    pub async fn disable(&self, name: &str) -> bool {
        let _guard = self.lock_lifecycle().await;
        let mut state = self.state.write().await;
        match state.entries.get_mut(name) {
            Some(entry) if entry.status == PluginStatus::Registered => {
                entry.status = PluginStatus::Disabled;
                info!("Disabled plugin {}", name);
                true
            }
            _ => false,
        }
    }

    /// Remember the directory a plugin was discovered in
    pub async fn set_plugin_root(&self, name: &str, root: PathBuf) {
        self.state
            .write()
            .await
            .roots
            .insert(name.to_string(), root);
    }

    pub async fn plugin_root(&self, name: &str) -> Option<PathBuf> {
        self.state.read().await.roots.get(name).cloned()
    }

    pub async fn get(&self, name: &str) -> Option<RegistryEntry> {
        self.state.read().await.entries.get(name).cloned()
    }

    pub async fn has(&self, name: &str) -> bool {
        self.state.read().await.entries.contains_key(name)
    }

    /// All entries in registration order
    pub async fn all(&self) -> Vec<RegistryEntry> {
        self.state.read().await.ordered().cloned().collect()
    }

    pub async fn booted(&self) -> Vec<RegistryEntry> {
        self.with_status(PluginStatus::Booted).await
    }

    pub async fn failed(&self) -> Vec<RegistryEntry> {
        self.with_status(PluginStatus::Failed).await
    }

    pub async fn with_status(&self, status: PluginStatus) -> Vec<RegistryEntry> {
        self.state
            .read()
            .await
            .ordered()
            .filter(|entry| entry.status == status)
            .cloned()
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn metrics(&self, name: &str) -> Option<PluginMetrics> {
        self.state.read().await.metrics.get(name).copied()
    }

    pub async fn all_metrics(&self) -> HashMap<String, PluginMetrics> {
        self.state.read().await.metrics.clone()
    }

    /// Publishable resources in registration order, optionally filtered by tag
    pub async fn publishable_resources(&self, tag: Option<&str>) -> Vec<PublishableResource> {
        self.state
            .read()
            .await
            .publishable
            .iter()
            .filter(|resource| tag.map_or(true, |tag| resource.tag == tag))
            .cloned()
            .collect()
    }

    /// Named route middleware with the plugin that contributed each
    pub async fn route_middleware(&self) -> Vec<(String, String)> {
        self.state
            .read()
            .await
            .route_middleware
            .iter()
            .map(|(alias, owner, _)| (alias.clone(), owner.clone()))
            .collect()
    }

    pub async fn route_middleware_handler(&self, alias: &str) -> Option<Arc<dyn Middleware>> {
        self.state
            .read()
            .await
            .route_middleware
            .iter()
            .find(|(existing, _, _)| existing == alias)
            .map(|(_, _, middleware)| Arc::clone(middleware))
    }

    /// Dependency graph over every entry, in registration order
    pub async fn dependency_graph(&self) -> Vec<DependencyNode> {
        self.state
            .read()
            .await
            .ordered()
            .map(|entry| {
                DependencyNode::new(
                    entry.descriptor.name.clone(),
                    entry
                        .descriptor
                        .dependencies
                        .iter()
                        .map(|dep| dep.name.clone())
                        .collect(),
                )
            })
            .collect()
    }
}
