//! List command implementation

use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::info;

use crate::cli::CliContext;

pub fn command() -> Command {
    Command::new("list")
        .about("Boot plugins, show their status and shut them down")
        .arg(
            clap::Arg::new("metrics")
                .short('m')
                .long("metrics")
                .help("Show register and boot timings")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(ctx: &CliContext, matches: &ArgMatches) -> Result<()> {
    info!("Listing plugins");
    let show_metrics = matches.get_flag("metrics");

    let entries = ctx.host.all().await;

    if entries.is_empty() {
        println!("No plugins registered");
        return Ok(());
    }

    println!("{:<24} {:<10} {:<10} {:<14}", "NAME", "VERSION", "STATUS", "SOURCE");
    for entry in &entries {
        println!(
            "{:<24} {:<10} {:<10} {:<14}",
            entry.name(),
            entry.descriptor.version,
            entry.status,
            entry.source
        );

        if let Some(error) = &entry.error {
            println!("  error: {}", error);
        }

        if show_metrics {
            if let Some(metrics) = ctx.host.metrics(entry.name()).await {
                println!(
                    "  register: {}  boot: {}  errors: {}",
                    crate::utils::format_duration(metrics.register_time),
                    crate::utils::format_duration(metrics.boot_time),
                    metrics.error_count
                );
            }
        }
    }

    Ok(())
}
