//! Boot command implementation

use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::info;

use crate::cli::CliContext;

pub fn command() -> Command {
    Command::new("boot").about("Boot every plugin, check health and shut down again")
}

pub async fn run(ctx: &CliContext, _matches: &ArgMatches) -> Result<()> {
    info!("Running a full plugin lifecycle");

    ctx.host.boot_all().await;
    let health = ctx.host.health_check().await;
    ctx.host.shutdown().await;

    let booted = ctx.host.booted().await;
    let failed = ctx.host.failed().await;

    println!("Plugin lifecycle summary:");
    println!("  Registered: {}", ctx.host.count().await);
    println!("  Booted: {}", booted.len());
    println!("  Failed: {}", failed.len());
    println!(
        "  Healthy: {}/{}",
        health.values().filter(|healthy| **healthy).count(),
        health.len()
    );

    for entry in &failed {
        println!(
            "  - {}: {}",
            entry.name(),
            entry.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}
