//! Plugin host CLI binary

use anyhow::Result;

use plugin_host::cli::CliApp;
use plugin_host::discovery::PluginCatalog;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plugin_host=info".into()),
        )
        .init();

    CliApp::run(PluginCatalog::new()).await
}
