//! Lifecycle capability traits

use anyhow::Result;
use async_trait::async_trait;

use crate::host::Host;

/// Runs once while the plugin is being registered
#[async_trait]
pub trait Registrable: Send + Sync {
    async fn register(&self, app: &dyn Host) -> Result<()>;
}

/// Runs during the boot phase, after dependencies have booted
#[async_trait]
pub trait Bootable: Send + Sync {
    async fn boot(&self, app: &dyn Host) -> Result<()>;
}

/// Reports plugin health
///
/// An error is reported as unhealthy.
#[async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self, app: &dyn Host) -> Result<bool>;
}

/// Runs during host shutdown, in reverse boot order
#[async_trait]
pub trait Shutdownable: Send + Sync {
    async fn shutdown(&self, app: &dyn Host) -> Result<()>;
}
