//! Append-only lifecycle event ledger with typed subscriptions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Lifecycle event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginEventKind {
    #[serde(rename = "plugin:registered")]
    Registered,

    #[serde(rename = "plugin:booted")]
    Booted,

    #[serde(rename = "plugin:failed")]
    Failed,

    #[serde(rename = "plugin:shutdown")]
    Shutdown,

    #[serde(rename = "plugin:health-check")]
    HealthCheck,
}

impl PluginEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginEventKind::Registered => "plugin:registered",
            PluginEventKind::Booted => "plugin:booted",
            PluginEventKind::Failed => "plugin:failed",
            PluginEventKind::Shutdown => "plugin:shutdown",
            PluginEventKind::HealthCheck => "plugin:health-check",
        }
    }
}

impl fmt::Display for PluginEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded lifecycle transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEvent {
    #[serde(rename = "type")]
    pub kind: PluginEventKind,

    pub plugin_name: String,

    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Event subscriber. Errors are logged and never reach the emitter.
pub type EventListener = Arc<dyn Fn(&PluginEvent) -> anyhow::Result<()> + Send + Sync>;

/// Event bus and ledger
///
/// Delivery is synchronous and in subscription order. Every event is
/// appended to the ledger before listeners run.
#[derive(Default)]
pub struct EventBus {
    ledger: RwLock<Vec<PluginEvent>>,
    listeners: RwLock<HashMap<PluginEventKind, Vec<EventListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event type
    pub async fn on<F>(&self, kind: PluginEventKind, listener: F)
    where
        F: Fn(&PluginEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .await
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Record an event and deliver it to subscribers
    pub async fn emit(&self, kind: PluginEventKind, plugin_name: &str, data: Option<Value>) {
        let event = PluginEvent {
            kind,
            plugin_name: plugin_name.to_string(),
            timestamp: Utc::now(),
            data,
        };
        debug!("{} {}", event.kind, event.plugin_name);

        self.ledger.write().await.push(event.clone());

        // Snapshot so a listener may subscribe without deadlocking
        let listeners = self
            .listeners
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Listener for {} failed on {}: {}", kind, plugin_name, e);
                }
                Err(_) => {
                    warn!("Listener for {} panicked on {}", kind, plugin_name);
                }
            }
        }
    }

    /// Every event recorded so far, oldest first
    pub async fn log(&self) -> Vec<PluginEvent> {
        self.ledger.read().await.clone()
    }

    /// Events of one type
    pub async fn events_of(&self, kind: PluginEventKind) -> Vec<PluginEvent> {
        self.ledger
            .read()
            .await
            .iter()
            .filter(|event| event.kind == kind)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_emit_appends_to_ledger() {
        let bus = EventBus::new();
        bus.emit(PluginEventKind::Registered, "blog", None).await;
        bus.emit(PluginEventKind::Failed, "news", Some(json!({ "error": "boom" })))
            .await;

        let log = bus.log().await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, PluginEventKind::Registered);
        assert_eq!(log[1].plugin_name, "news");
        assert!(log[0].timestamp <= log[1].timestamp);
        assert_eq!(bus.events_of(PluginEventKind::Failed).await.len(), 1);
    }

    #[tokio::test]
    async fn test_listeners_only_receive_their_type() {
        let bus = EventBus::new();
        let booted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&booted);
        bus.on(PluginEventKind::Booted, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

        bus.emit(PluginEventKind::Registered, "blog", None).await;
        bus.emit(PluginEventKind::Booted, "blog", None).await;

        assert_eq!(booted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listener_failures_are_isolated() {
        let bus = EventBus::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        bus.on(PluginEventKind::Booted, |_| Err(anyhow::anyhow!("listener broke")))
            .await;
        bus.on(PluginEventKind::Booted, |_| panic!("listener panicked"))
            .await;
        let counter = Arc::clone(&delivered);
        bus.on(PluginEventKind::Booted, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

        bus.emit(PluginEventKind::Booted, "blog", None).await;

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert_eq!(bus.log().await.len(), 1);
    }

    #[test]
    fn test_event_kind_serialization() {
        let value = serde_json::to_value(PluginEventKind::HealthCheck).unwrap();
        assert_eq!(value, json!("plugin:health-check"));
    }
}
