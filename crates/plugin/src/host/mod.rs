//! Host application collaborators
//!
//! The plugin runtime never owns the HTTP server, the service container or
//! the scheduler. It reaches them through the [`Host`] trait.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub mod command;
pub mod routes;
pub mod scheduler;
pub mod standalone;

pub use command::*;
pub use routes::*;
pub use scheduler::*;
pub use standalone::*;

/// Surface of the hosting application visible to plugins
#[async_trait]
pub trait Host: Send + Sync {
    /// Current value stored under a config key
    async fn config(&self, key: &str) -> Option<Value>;

    /// Replace the value stored under a config key
    async fn set_config(&self, key: &str, value: Value);

    /// Hand a service provider to the host container
    async fn register_provider(&self, provider: Arc<dyn ServiceProvider>) -> Result<()>;

    /// Append a handler to the global middleware chain
    async fn use_middleware(&self, middleware: Arc<dyn Middleware>);

    /// Scheduler service, if the host has one
    fn scheduler(&self) -> Option<Arc<dyn Scheduler>>;

    /// Route registry owned by the host
    fn routes(&self) -> &RouteRegistry;
}

/// Service provider registered with the host container
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Provider name, used for lookup and logging
    fn name(&self) -> &str;

    /// Bind services into the host
    async fn register(&self, _app: &dyn Host) -> Result<()> {
        Ok(())
    }
}

/// Opaque request middleware handle
///
/// Dispatching requests through middleware belongs to the host server.
pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;
}

/// Middleware known only by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedMiddleware(pub String);

impl NamedMiddleware {
    pub fn shared(name: impl Into<String>) -> Arc<dyn Middleware> {
        Arc::new(Self(name.into()))
    }
}

impl Middleware for NamedMiddleware {
    fn name(&self) -> &str {
        &self.0
    }
}
