//! Events command implementation

use anyhow::Result;
use clap::{ArgMatches, Command};

use crate::cli::CliContext;
use crate::events::PluginEvent;

pub fn command() -> Command {
    Command::new("events")
        .about("Boot plugins, print the lifecycle event log and shut them down")
        .arg(
            clap::Arg::new("json")
                .long("json")
                .help("Print one JSON object per event")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(ctx: &CliContext, matches: &ArgMatches) -> Result<()> {
    let events = ctx.host.event_log().await;

    for event in &events {
        if matches.get_flag("json") {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{}", render(event));
        }
    }

    Ok(())
}

fn render(event: &PluginEvent) -> String {
    let mut line = format!(
        "{} {:<22} {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        event.kind,
        event.plugin_name
    );
    if let Some(data) = &event.data {
        line.push(' ');
        line.push_str(&data.to_string());
    }
    line
}
