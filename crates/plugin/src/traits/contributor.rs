//! Contribution capability traits

use anyhow::Result;
use async_trait::async_trait;

use crate::host::{CommandProgram, Host, Scheduler};

/// Adds routes to the host's route registry during boot
#[async_trait]
pub trait RouteContributor: Send + Sync {
    async fn routes(&self, app: &dyn Host) -> Result<()>;
}

/// Adds subcommands to the host command line
#[async_trait]
pub trait CommandContributor: Send + Sync {
    async fn commands(&self, program: &mut CommandProgram, app: &dyn Host) -> Result<()>;
}

/// Registers scheduled jobs; only called when the host has a scheduler
#[async_trait]
pub trait ScheduleAware: Send + Sync {
    async fn schedule(&self, scheduler: &dyn Scheduler, app: &dyn Host) -> Result<()>;
}
