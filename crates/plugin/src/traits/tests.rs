//! Capability trait tests

use super::*;
use crate::host::StandaloneHost;
use crate::testing::{CallLog, Phase, ScriptedPlugin};
use anyhow::Result;
use async_trait::async_trait;

struct BootOnly;

impl PluginHooks for BootOnly {
    fn as_bootable(&self) -> Option<&dyn Bootable> {
        Some(self)
    }
}

#[async_trait]
impl Bootable for BootOnly {
    async fn boot(&self, _app: &dyn crate::host::Host) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_capabilities_default_to_absent() {
    let hooks = BootOnly;

    assert!(hooks.as_bootable().is_some());
    assert!(hooks.as_registrable().is_none());
    assert!(hooks.as_route_contributor().is_none());
    assert!(hooks.as_command_contributor().is_none());
    assert!(hooks.as_schedule_aware().is_none());
    assert!(hooks.as_health_checkable().is_none());
    assert!(hooks.as_shutdownable().is_none());
}

#[tokio::test]
async fn test_scripted_plugin_records_and_fails() {
    let log = CallLog::new();
    let plugin = ScriptedPlugin::new("blog", &log).failing(Phase::Boot);
    let host = StandaloneHost::new();

    let registrable = plugin.as_registrable().unwrap();
    registrable.register(&host).await.unwrap();

    let bootable = plugin.as_bootable().unwrap();
    let err = bootable.boot(&host).await.unwrap_err();
    assert!(err.to_string().contains("exploded"));

    assert_eq!(log.all().await, vec!["register:blog", "boot:blog"]);
}
