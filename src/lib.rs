//! Plugin host library
//!
//! Registers plugin descriptors, resolves their dependency order, drives them
//! through boot, health checks and shutdown, and aggregates the resources
//! they contribute. Plugins are supplied by the application or discovered
//! from installed packages and a local plugins directory.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod publish;
pub mod registry;
pub mod resolver;
pub mod resources;
pub mod runtime;
pub mod utils;

pub use plugin_host_api as api;

pub use config::{DiscoveryConfig, HostConfig, PublishConfig};
pub use discovery::{DiscoveryEngine, DiscoveryReport, PluginCatalog};
pub use error::{HookPhase, PluginError, PluginResult};
pub use events::{EventBus, PluginEvent, PluginEventKind};
pub use orchestrator::LifecycleOrchestrator;
pub use publish::{PublishReport, Publisher};
pub use registry::{
    PluginMetrics, PluginRegistry, PluginSource, PluginStatus, PublishableResource, RegistryEntry,
};
pub use resolver::{satisfies, DependencyNode, DependencyResolver, Version};
pub use resources::ResourceAggregator;
pub use runtime::PluginHost;
