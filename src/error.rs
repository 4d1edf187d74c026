//! Plugin runtime error types

use std::fmt;
use std::path::PathBuf;

/// Lifecycle phase a hook belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Register,
    Boot,
    Routes,
    Commands,
    Schedule,
    HealthCheck,
    Shutdown,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HookPhase::Register => "Register",
            HookPhase::Boot => "Boot",
            HookPhase::Routes => "Routes",
            HookPhase::Commands => "Commands",
            HookPhase::Schedule => "Schedule",
            HookPhase::HealthCheck => "Health check",
            HookPhase::Shutdown => "Shutdown",
        };
        f.write_str(label)
    }
}

/// Failures recorded against a plugin.
///
/// None of these escape `register`, `boot_all` or `shutdown`; they become the
/// `error` of the registry entry and the payload of a `plugin:failed` event.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("Invalid plugin descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Config validation failed: {0}")]
    ConfigValidation(String),

    #[error("Provider registration failed: {0}")]
    Provider(String),

    #[error("{phase} hook failed: {message}")]
    Hook { phase: HookPhase, message: String },

    #[error("Missing required dependency: {0}")]
    MissingDependency(String),

    #[error("Dependency \"{0}\" is in failed state")]
    DependencyFailed(String),

    #[error("Dependency \"{name}\" version {actual} does not satisfy {constraint}")]
    VersionMismatch {
        name: String,
        actual: String,
        constraint: String,
    },

    #[error("Boot failed: {0}")]
    Boot(String),

    #[error("Failed to load plugin candidate {path:?}: {message}")]
    Discovery { path: PathBuf, message: String },
}

impl PluginError {
    pub fn hook(phase: HookPhase, error: &anyhow::Error) -> Self {
        PluginError::Hook {
            phase,
            message: error.to_string(),
        }
    }
}

/// Result type for plugin runtime operations
pub type PluginResult<T> = Result<T, PluginError>;
