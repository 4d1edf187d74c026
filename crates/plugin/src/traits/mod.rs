//! Plugin capability traits
//!
//! A plugin opts into a lifecycle phase by implementing the matching
//! capability trait and exposing it through [`PluginHooks`]. The lifecycle
//! orchestrator only calls a phase when the accessor returns `Some`.

pub mod contributor;
pub mod lifecycle;

pub use contributor::*;
pub use lifecycle::*;

/// Capability accessors for a plugin's hook implementation
///
/// Every accessor defaults to `None`; implementors override the ones they
/// support with `Some(self)`.
pub trait PluginHooks: Send + Sync {
    fn as_registrable(&self) -> Option<&dyn Registrable> {
        None
    }

    fn as_bootable(&self) -> Option<&dyn Bootable> {
        None
    }

    fn as_route_contributor(&self) -> Option<&dyn RouteContributor> {
        None
    }

    fn as_command_contributor(&self) -> Option<&dyn CommandContributor> {
        None
    }

    fn as_schedule_aware(&self) -> Option<&dyn ScheduleAware> {
        None
    }

    fn as_health_checkable(&self) -> Option<&dyn HealthCheckable> {
        None
    }

    fn as_shutdownable(&self) -> Option<&dyn Shutdownable> {
        None
    }
}

#[cfg(test)]
mod tests;
