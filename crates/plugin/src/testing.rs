//! Test doubles for exercising plugin lifecycles
//!
//! [`ScriptedPlugin`] implements every capability, records each call into a
//! shared [`CallLog`] and can be told to fail in chosen phases.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clap::Command;
use futures::FutureExt;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::descriptor::PluginDescriptor;
use crate::host::{CommandProgram, Host, ScheduledJob, Scheduler};
use crate::traits::*;

/// Lifecycle phase a scripted plugin can be told to fail in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Register,
    Boot,
    Routes,
    Commands,
    Schedule,
    HealthCheck,
    Shutdown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Register => "register",
            Phase::Boot => "boot",
            Phase::Routes => "routes",
            Phase::Commands => "commands",
            Phase::Schedule => "schedule",
            Phase::HealthCheck => "health",
            Phase::Shutdown => "shutdown",
        };
        f.write_str(label)
    }
}

/// Ordered record of hook invocations, shared between plugins
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(Phase, String)>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, phase: Phase, plugin: &str) {
        self.calls.lock().await.push((phase, plugin.to_string()));
    }

    /// Plugin names that ran `phase`, in call order
    pub async fn calls(&self, phase: Phase) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(recorded, _)| *recorded == phase)
            .map(|(_, plugin)| plugin.clone())
            .collect()
    }

    /// Every call rendered as `phase:plugin`
    pub async fn all(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|(phase, plugin)| format!("{}:{}", phase, plugin))
            .collect()
    }
}

/// Plugin whose behaviour is scripted by the test
#[derive(Debug, Clone)]
pub struct ScriptedPlugin {
    name: String,
    log: CallLog,
    failures: HashSet<Phase>,
    healthy: bool,
    routes: Vec<(String, String)>,
    jobs: Vec<String>,
    command: Option<String>,
}

impl ScriptedPlugin {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            failures: HashSet::new(),
            healthy: true,
            routes: Vec::new(),
            jobs: Vec::new(),
            command: None,
        }
    }

    /// Make the hook for `phase` return an error
    pub fn failing(mut self, phase: Phase) -> Self {
        self.failures.insert(phase);
        self
    }

    /// Report `false` from the health check
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Register a route from the routes hook
    pub fn with_route(mut self, method: &str, path: &str) -> Self {
        self.routes.push((method.to_string(), path.to_string()));
        self
    }

    /// Schedule a job from the schedule hook
    pub fn with_job(mut self, name: &str) -> Self {
        self.jobs.push(name.to_string());
        self
    }

    /// Contribute a subcommand from the commands hook
    pub fn with_command(mut self, name: &str) -> Self {
        self.command = Some(name.to_string());
        self
    }

    /// Descriptor carrying this plugin as its hooks
    pub fn descriptor(self, version: &str) -> PluginDescriptor {
        let name = self.name.clone();
        PluginDescriptor::new(name, version).with_hooks(Arc::new(self))
    }

    async fn enter(&self, phase: Phase) -> Result<()> {
        self.log.record(phase, &self.name).await;
        if self.failures.contains(&phase) {
            return Err(anyhow!("{} exploded in {}", self.name, phase));
        }
        Ok(())
    }
}

impl PluginHooks for ScriptedPlugin {
    fn as_registrable(&self) -> Option<&dyn Registrable> {
        Some(self)
    }

    fn as_bootable(&self) -> Option<&dyn Bootable> {
        Some(self)
    }

    fn as_route_contributor(&self) -> Option<&dyn RouteContributor> {
        Some(self)
    }

    fn as_command_contributor(&self) -> Option<&dyn CommandContributor> {
        Some(self)
    }

    fn as_schedule_aware(&self) -> Option<&dyn ScheduleAware> {
        Some(self)
    }

    fn as_health_checkable(&self) -> Option<&dyn HealthCheckable> {
        Some(self)
    }

    fn as_shutdownable(&self) -> Option<&dyn Shutdownable> {
        Some(self)
    }
}

#[async_trait]
impl Registrable for ScriptedPlugin {
    async fn register(&self, _app: &dyn Host) -> Result<()> {
        self.enter(Phase::Register).await
    }
}

#[async_trait]
impl Bootable for ScriptedPlugin {
    async fn boot(&self, _app: &dyn Host) -> Result<()> {
        self.enter(Phase::Boot).await
    }
}

#[async_trait]
impl RouteContributor for ScriptedPlugin {
    async fn routes(&self, app: &dyn Host) -> Result<()> {
        self.enter(Phase::Routes).await?;
        for (method, path) in &self.routes {
            app.routes().add(method, path, &self.name).await;
        }
        Ok(())
    }
}

#[async_trait]
impl CommandContributor for ScriptedPlugin {
    async fn commands(&self, program: &mut CommandProgram, _app: &dyn Host) -> Result<()> {
        self.enter(Phase::Commands).await?;
        if let Some(command) = &self.command {
            program.add_command(Command::new(command.clone()), |_| {
                async { Ok::<(), anyhow::Error>(()) }.boxed()
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleAware for ScriptedPlugin {
    async fn schedule(&self, scheduler: &dyn Scheduler, _app: &dyn Host) -> Result<()> {
        self.enter(Phase::Schedule).await?;
        for job in &self.jobs {
            scheduler
                .add_job(ScheduledJob::new(job.clone(), "* * * * *", || {
                    async { Ok::<(), anyhow::Error>(()) }.boxed()
                }))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl HealthCheckable for ScriptedPlugin {
    async fn health_check(&self, _app: &dyn Host) -> Result<bool> {
        self.enter(Phase::HealthCheck).await?;
        Ok(self.healthy)
    }
}

#[async_trait]
impl Shutdownable for ScriptedPlugin {
    async fn shutdown(&self, _app: &dyn Host) -> Result<()> {
        self.enter(Phase::Shutdown).await
    }
}
