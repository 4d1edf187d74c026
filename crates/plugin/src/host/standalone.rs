//! In-memory host used by the command-line runtime and by tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Host, Middleware, RouteRegistry, Scheduler, ServiceProvider, StandaloneScheduler};

/// Host application backed by in-memory collections
pub struct StandaloneHost {
    /// Config store keyed by config key
    config: RwLock<HashMap<String, Value>>,

    /// Registered service providers, in registration order
    providers: RwLock<Vec<Arc<dyn ServiceProvider>>>,

    /// Global middleware chain
    middleware: RwLock<Vec<Arc<dyn Middleware>>>,

    /// Optional scheduler service
    scheduler: Option<Arc<StandaloneScheduler>>,

    /// Route registry
    routes: RouteRegistry,
}

impl StandaloneHost {
    /// Create a host without a scheduler
    pub fn new() -> Self {
        Self {
            config: RwLock::new(HashMap::new()),
            providers: RwLock::new(Vec::new()),
            middleware: RwLock::new(Vec::new()),
            scheduler: None,
            routes: RouteRegistry::new(),
        }
    }

    /// Attach an in-memory scheduler
    pub fn with_scheduler(mut self) -> Self {
        self.scheduler = Some(Arc::new(StandaloneScheduler::new()));
        self
    }

    /// Seed the config store
    pub fn with_config(mut self, values: Map<String, Value>) -> Self {
        self.config = RwLock::new(values.into_iter().collect());
        self
    }

    /// Concrete scheduler, for triggering jobs
    pub fn standalone_scheduler(&self) -> Option<Arc<StandaloneScheduler>> {
        self.scheduler.clone()
    }

    /// Names of registered providers
    pub async fn provider_names(&self) -> Vec<String> {
        self.providers
            .read()
            .await
            .iter()
            .map(|provider| provider.name().to_string())
            .collect()
    }

    /// Names of the global middleware chain, in mount order
    pub async fn middleware_names(&self) -> Vec<String> {
        self.middleware
            .read()
            .await
            .iter()
            .map(|middleware| middleware.name().to_string())
            .collect()
    }
}

impl Default for StandaloneHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for StandaloneHost {
    async fn config(&self, key: &str) -> Option<Value> {
        self.config.read().await.get(key).cloned()
    }

    async fn set_config(&self, key: &str, value: Value) {
        self.config.write().await.insert(key.to_string(), value);
    }

    async fn register_provider(&self, provider: Arc<dyn ServiceProvider>) -> Result<()> {
        let name = provider.name().to_string();
        if self
            .providers
            .read()
            .await
            .iter()
            .any(|existing| existing.name() == name)
        {
            return Err(anyhow!("Service provider {} is already registered", name));
        }

        provider.register(self).await?;
        debug!("Registered service provider {}", name);
        self.providers.write().await.push(provider);
        Ok(())
    }

    async fn use_middleware(&self, middleware: Arc<dyn Middleware>) {
        self.middleware.write().await.push(middleware);
    }

    fn scheduler(&self) -> Option<Arc<dyn Scheduler>> {
        self.scheduler
            .as_ref()
            .map(|scheduler| Arc::clone(scheduler) as Arc<dyn Scheduler>)
    }

    fn routes(&self) -> &RouteRegistry {
        &self.routes
    }
}
