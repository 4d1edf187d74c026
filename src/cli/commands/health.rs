//! Health command implementation

use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};

use crate::cli::CliContext;

pub fn command() -> Command {
    Command::new("health")
        .about("Boot plugins, run their health checks and shut them down")
        .arg(
            clap::Arg::new("strict")
                .long("strict")
                .help("Exit with an error when any plugin is unhealthy")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(ctx: &CliContext, matches: &ArgMatches) -> Result<()> {
    let results = ctx.host.health_check().await;

    if results.is_empty() {
        println!("No booted plugins");
        return Ok(());
    }

    for (name, healthy) in &results {
        println!("{:<24} {}", name, if *healthy { "healthy" } else { "unhealthy" });
    }

    let unhealthy = results.values().filter(|healthy| !**healthy).count();
    if matches.get_flag("strict") && unhealthy > 0 {
        return Err(anyhow!("{} plugin(s) reported unhealthy", unhealthy));
    }

    Ok(())
}
