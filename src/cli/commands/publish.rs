//! Publish command implementation

use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::info;

use crate::cli::CliContext;

pub fn command() -> Command {
    Command::new("publish")
        .about("Copy publishable plugin resources into the application")
        .arg(
            clap::Arg::new("tag")
                .short('t')
                .long("tag")
                .help("Only publish resources with this tag")
                .value_name("TAG"),
        )
        .arg(
            clap::Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite files that already exist")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(ctx: &CliContext, matches: &ArgMatches) -> Result<()> {
    let tag = matches.get_one::<String>("tag").map(String::as_str);
    let force = matches.get_flag("force");
    info!("Publishing plugin resources (tag: {:?}, force: {})", tag, force);

    let publisher = ctx
        .host
        .publisher(ctx.config.publish.base_directory.clone());
    let report = publisher.publish(tag, force).await?;

    for path in &report.copied {
        println!("  copied  {}", path.display());
    }
    for path in &report.skipped {
        println!("  skipped {}", path.display());
    }
    for path in &report.failed {
        println!("  failed  {}", path.display());
    }
    println!(
        "Published {} file(s), skipped {}, failed {}",
        report.copied.len(),
        report.skipped.len(),
        report.failed.len()
    );

    Ok(())
}
