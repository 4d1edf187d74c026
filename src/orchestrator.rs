//! Lifecycle orchestration: boot, command registration, health checks and shutdown

use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use plugin_host_api::{CommandProgram, Host, PluginDescriptor};

use crate::error::{HookPhase, PluginError, PluginResult};
use crate::events::PluginEventKind;
use crate::registry::{PluginRegistry, PluginStatus};
use crate::resolver::{satisfies, DependencyResolver};
use crate::resources::ResourceAggregator;

/// Drives registered plugins through boot, health checks and shutdown
///
/// Plugins are booted one at a time in dependency order. A failing plugin is
/// marked `failed` and the loop moves on.
pub struct LifecycleOrchestrator {
    registry: Arc<PluginRegistry>,
    resources: Arc<ResourceAggregator>,
}

impl LifecycleOrchestrator {
    pub fn new(registry: Arc<PluginRegistry>, resources: Arc<ResourceAggregator>) -> Self {
        Self {
            registry,
            resources,
        }
    }

    fn host(&self) -> &dyn Host {
        self.registry.host().as_ref()
    }

    /// Boot order over every registered name
    pub async fn resolve_order(&self) -> Vec<String> {
        DependencyResolver::new(self.registry.dependency_graph().await).boot_order()
    }

    /// Boot every plugin whose status is `registered`
    pub async fn boot_all(&self) {
        let _guard = self.registry.lock_lifecycle().await;
        let order = self.resolve_order().await;
        info!("Booting plugins in order: {:?}", order);

        for name in order {
            let Some(entry) = self.registry.get(&name).await else {
                debug!("Plugin {} not found, skipping boot", name);
                continue;
            };

            if entry.status != PluginStatus::Registered {
                debug!("Skipping boot of {} with status {}", name, entry.status);
                continue;
            }

            let started = Instant::now();
            match self.boot_plugin(&entry.descriptor).await {
                Ok(()) => {
                    let boot_time = started.elapsed();
                    self.registry.mark_booted(&name, boot_time).await;
                    info!("Booted plugin {} in {:?}", name, boot_time);
                    self.registry
                        .events()
                        .emit(
                            PluginEventKind::Booted,
                            &name,
                            Some(json!({ "boot_time_ms": boot_time.as_millis() as u64 })),
                        )
                        .await;
                }
                Err(err) => {
                    self.registry.increment_errors(&name).await;
                    self.registry
                        .fail(&name, PluginError::Boot(err.to_string()))
                        .await;
                }
            }
        }

        for collision in self.host().routes().take_collisions().await {
            warn!(
                "Route collision: {} {} from {} ignored, already registered by {}",
                collision.method, collision.path, collision.rejected_owner, collision.existing_owner
            );
        }
    }

    async fn boot_plugin(&self, descriptor: &PluginDescriptor) -> anyhow::Result<()> {
        self.check_dependencies(descriptor).await?;

        if let Some(declarations) = &descriptor.resources {
            if let Some(root) = self.registry.plugin_root(&descriptor.name).await {
                self.resources
                    .register_plugin_resources(&descriptor.name, &root, declarations)
                    .await;
            }
        }

        let Some(hooks) = descriptor.hooks.as_ref() else {
            return Ok(());
        };

        if let Some(bootable) = hooks.as_bootable() {
            bootable.boot(self.host()).await?;
        }

        if let Some(contributor) = hooks.as_route_contributor() {
            contributor.routes(self.host()).await?;
        }

        if let Some(aware) = hooks.as_schedule_aware() {
            match self.host().scheduler() {
                Some(scheduler) => aware.schedule(scheduler.as_ref(), self.host()).await?,
                None => debug!(
                    "No scheduler available, skipping schedule hook of {}",
                    descriptor.name
                ),
            }
        }

        Ok(())
    }

    async fn check_dependencies(&self, descriptor: &PluginDescriptor) -> PluginResult<()> {
        for dependency in &descriptor.dependencies {
            let Some(target) = self.registry.get(&dependency.name).await else {
                if dependency.required {
                    return Err(PluginError::MissingDependency(dependency.name.clone()));
                }
                debug!(
                    "Optional dependency {} of {} is not registered",
                    dependency.name, descriptor.name
                );
                continue;
            };

            if target.status == PluginStatus::Failed && dependency.required {
                return Err(PluginError::DependencyFailed(dependency.name.clone()));
            }

            if let Some(constraint) = &dependency.version_constraint {
                let actual = &target.descriptor.version;
                if !satisfies(actual, constraint) {
                    let mismatch = PluginError::VersionMismatch {
                        name: dependency.name.clone(),
                        actual: actual.clone(),
                        constraint: constraint.clone(),
                    };
                    if dependency.required {
                        return Err(mismatch);
                    }
                    warn!("{} (optional dependency of {})", mismatch, descriptor.name);
                }
            }
        }

        Ok(())
    }

    /// Let every non-failed, non-disabled plugin add its commands
    pub async fn register_commands(&self, program: &mut CommandProgram) {
        for entry in self.registry.all().await {
            if matches!(entry.status, PluginStatus::Failed | PluginStatus::Disabled) {
                continue;
            }

            let Some(contributor) = entry
                .descriptor
                .hooks
                .as_ref()
                .and_then(|hooks| hooks.as_command_contributor())
            else {
                continue;
            };

            if let Err(e) = contributor.commands(program, self.host()).await {
                warn!(
                    "Plugin {}: {}",
                    entry.name(),
                    PluginError::hook(HookPhase::Commands, &e)
                );
            }
        }
    }

    /// Evaluate the health of every booted plugin
    ///
    /// A plugin without a health check is healthy; a failing check is not.
    pub async fn health_check(&self) -> BTreeMap<String, bool> {
        let mut results = BTreeMap::new();

        for entry in self.registry.booted().await {
            let healthy = match entry
                .descriptor
                .hooks
                .as_ref()
                .and_then(|hooks| hooks.as_health_checkable())
            {
                Some(checkable) => match checkable.health_check(self.host()).await {
                    Ok(healthy) => healthy,
                    Err(e) => {
                        warn!(
                            "Plugin {}: {}",
                            entry.name(),
                            PluginError::hook(HookPhase::HealthCheck, &e)
                        );
                        false
                    }
                },
                None => true,
            };

            self.registry
                .events()
                .emit(
                    PluginEventKind::HealthCheck,
                    entry.name(),
                    Some(json!({ "healthy": healthy })),
                )
                .await;
            results.insert(entry.name().to_string(), healthy);
        }

        results
    }

    /// Shut down booted plugins in reverse boot order
    pub async fn shutdown(&self) {
        let _guard = self.registry.lock_lifecycle().await;
        let mut order = self.resolve_order().await;
        order.reverse();

        for name in order {
            let Some(entry) = self.registry.get(&name).await else {
                continue;
            };
            if entry.status != PluginStatus::Booted {
                continue;
            }

            if let Some(shutdownable) = entry
                .descriptor
                .hooks
                .as_ref()
                .and_then(|hooks| hooks.as_shutdownable())
            {
                if let Err(e) = shutdownable.shutdown(self.host()).await {
                    warn!(
                        "Plugin {}: {}",
                        name,
                        PluginError::hook(HookPhase::Shutdown, &e)
                    );
                    continue;
                }
            }

            info!("Shut down plugin {}", name);
            self.registry
                .events()
                .emit(PluginEventKind::Shutdown, &name, None)
                .await;
        }
    }
}
