//! The plugin host: one owner for the host, registry, orchestrator and ledger

use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use plugin_host_api::{CommandProgram, Host, PluginDescriptor, StandaloneHost};

use crate::config::{DiscoveryConfig, HostConfig};
use crate::discovery::{
    CatalogLoader, DiscoveryEngine, DiscoveryReport, LocalDirectoryScanner, PackageScanner,
    PluginCatalog, PluginLoader,
};
use crate::events::{EventBus, PluginEvent, PluginEventKind};
use crate::orchestrator::LifecycleOrchestrator;
use crate::publish::Publisher;
use crate::registry::{
    PluginMetrics, PluginRegistry, PluginSource, PluginStatus, PublishableResource, RegistryEntry,
};
use crate::resources::ResourceAggregator;

/// Owns a plugin registry together with everything that drives it
///
/// ```no_run
/// # async fn example() -> anyhow::Result<()> {
/// use plugin_host::{HostConfig, PluginHost};
/// use plugin_host::discovery::PluginCatalog;
///
/// let config = HostConfig::default();
/// let host = PluginHost::from_config(&config);
/// host.discover(&config.discovery, PluginCatalog::new()).await;
/// host.boot_all().await;
/// host.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct PluginHost {
    host: Arc<dyn Host>,
    events: Arc<EventBus>,
    registry: Arc<PluginRegistry>,
    resources: Arc<ResourceAggregator>,
    orchestrator: LifecycleOrchestrator,
}

impl PluginHost {
    pub fn new(host: Arc<dyn Host>) -> Self {
        let events = Arc::new(EventBus::new());
        let registry = Arc::new(PluginRegistry::new(host.clone(), events.clone()));
        let resources = Arc::new(ResourceAggregator::new());
        let orchestrator = LifecycleOrchestrator::new(registry.clone(), resources.clone());

        Self {
            host,
            events,
            registry,
            resources,
            orchestrator,
        }
    }

    /// In-memory host with a scheduler, seeded with the `app` config map
    pub fn from_config(config: &HostConfig) -> Self {
        let host = StandaloneHost::new()
            .with_scheduler()
            .with_config(config.app.clone());
        Self::new(Arc::new(host))
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn orchestrator(&self) -> &LifecycleOrchestrator {
        &self.orchestrator
    }

    /// Register a descriptor supplied by the application
    pub async fn register(&self, descriptor: PluginDescriptor) {
        self.registry.register(descriptor, PluginSource::Manual).await;
    }

    /// Register a descriptor whose files live under `root`
    pub async fn register_at(&self, descriptor: PluginDescriptor, root: PathBuf) {
        if !self.registry.has(&descriptor.name).await {
            self.registry.set_plugin_root(&descriptor.name, root).await;
        }
        self.registry.register(descriptor, PluginSource::Manual).await;
    }

    /// Run the discovery strategies enabled in `config`
    pub async fn discover(&self, config: &DiscoveryConfig, catalog: PluginCatalog) -> DiscoveryReport {
        let loader: Arc<dyn PluginLoader> = Arc::new(CatalogLoader::new(catalog));
        let mut engine = DiscoveryEngine::new(self.registry.clone(), loader);

        if config.auto_discover {
            engine = engine.with_strategy(Box::new(PackageScanner::new(
                config.packages_directory.clone(),
                config.manifest_key.clone(),
            )));
        }
        if config.local_plugins {
            engine = engine.with_strategy(Box::new(LocalDirectoryScanner::new(
                config.local_directory.clone(),
            )));
        }

        engine.discover().await
    }

    pub async fn boot_all(&self) {
        self.orchestrator.boot_all().await;
    }

    pub async fn register_commands(&self, program: &mut CommandProgram) {
        self.orchestrator.register_commands(program).await;
    }

    pub async fn health_check(&self) -> BTreeMap<String, bool> {
        self.orchestrator.health_check().await
    }

    pub async fn shutdown(&self) {
        self.orchestrator.shutdown().await;
    }

    /// Mark a registered plugin disabled; returns whether it was
    pub async fn disable(&self, name: &str) -> bool {
        self.registry.disable(name).await
    }

    pub async fn on<F>(&self, kind: PluginEventKind, listener: F)
    where
        F: Fn(&PluginEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.events.on(kind, listener).await;
    }

    pub fn publisher(&self, base_directory: PathBuf) -> Publisher {
        Publisher::new(self.registry.clone(), base_directory)
    }

    pub async fn get(&self, name: &str) -> Option<RegistryEntry> {
        self.registry.get(name).await
    }

    pub async fn has(&self, name: &str) -> bool {
        self.registry.has(name).await
    }

    pub async fn all(&self) -> Vec<RegistryEntry> {
        self.registry.all().await
    }

    pub async fn booted(&self) -> Vec<RegistryEntry> {
        self.registry.booted().await
    }

    pub async fn failed(&self) -> Vec<RegistryEntry> {
        self.registry.failed().await
    }

    pub async fn with_status(&self, status: PluginStatus) -> Vec<RegistryEntry> {
        self.registry.with_status(status).await
    }

    pub async fn count(&self) -> usize {
        self.registry.count().await
    }

    pub async fn event_log(&self) -> Vec<PluginEvent> {
        self.events.log().await
    }

    pub async fn metrics(&self, name: &str) -> Option<PluginMetrics> {
        self.registry.metrics(name).await
    }

    pub async fn all_metrics(&self) -> HashMap<String, PluginMetrics> {
        self.registry.all_metrics().await
    }

    pub async fn migration_paths(&self) -> Vec<String> {
        self.resources.migration_paths().await
    }

    pub async fn seeder_paths(&self) -> Vec<String> {
        self.resources.seeder_paths().await
    }

    pub async fn entity_paths(&self) -> Vec<String> {
        self.resources.entity_paths().await
    }

    pub async fn publishable_resources(&self, tag: Option<&str>) -> Vec<PublishableResource> {
        self.registry.publishable_resources(tag).await
    }

    pub async fn plugin_root(&self, name: &str) -> Option<PathBuf> {
        self.registry.plugin_root(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugin_host_api::testing::{CallLog, Phase, ScriptedPlugin};
    use plugin_host_api::ResourceDeclarations;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_listeners_see_lifecycle_events() {
        let host = PluginHost::new(Arc::new(StandaloneHost::new()));
        let booted = Arc::new(AtomicUsize::new(0));
        let counter = booted.clone();
        host.on(PluginEventKind::Booted, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

        let log = CallLog::new();
        host.register(ScriptedPlugin::new("blog", &log).descriptor("1.0.0"))
            .await;
        host.register(
            ScriptedPlugin::new("broken", &log)
                .failing(Phase::Boot)
                .descriptor("1.0.0"),
        )
        .await;
        host.boot_all().await;

        assert_eq!(booted.load(Ordering::SeqCst), 1);
        assert_eq!(host.failed().await.len(), 1);
        assert_eq!(host.with_status(PluginStatus::Booted).await.len(), 1);
        assert_eq!(host.metrics("broken").await.unwrap().error_count, 1);
    }

    #[tokio::test]
    async fn test_register_at_feeds_resource_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("blog");
        std::fs::create_dir_all(root.join("migrations")).unwrap();
        std::fs::create_dir_all(root.join("seeders")).unwrap();

        let host = PluginHost::new(Arc::new(StandaloneHost::new()));
        host.register_at(
            PluginDescriptor::new("blog", "1.0.0").with_resources(ResourceDeclarations {
                migrations: Some("migrations".to_string()),
                seeders: Some("seeders".to_string()),
                ..Default::default()
            }),
            root.clone(),
        )
        .await;
        host.boot_all().await;

        assert_eq!(host.plugin_root("blog").await, Some(root.clone()));
        assert_eq!(host.migration_paths().await.len(), 1);
        assert_eq!(
            host.seeder_paths().await,
            vec![root.join("seeders").to_string_lossy().into_owned()]
        );
        assert!(host.entity_paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_plugin_is_not_booted() {
        let host = PluginHost::new(Arc::new(StandaloneHost::new()));
        let log = CallLog::new();
        host.register(ScriptedPlugin::new("blog", &log).descriptor("1.0.0"))
            .await;

        assert!(host.disable("blog").await);
        assert!(!host.disable("missing").await);
        host.boot_all().await;

        assert!(log.calls(Phase::Boot).await.is_empty());
        assert_eq!(
            host.get("blog").await.unwrap().status,
            PluginStatus::Disabled
        );
    }
}
