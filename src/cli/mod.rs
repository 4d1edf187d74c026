//! CLI command implementations

use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use tracing::{info, warn};

use plugin_host_api::CommandProgram;

use crate::config::HostConfig;
use crate::discovery::PluginCatalog;
use crate::runtime::PluginHost;

pub mod commands;

/// Built-in subcommand names; plugins cannot take these
pub const BUILTIN_COMMANDS: [&str; 5] = ["list", "boot", "health", "events", "publish"];

/// What every subcommand runs against
pub struct CliContext {
    pub config: HostConfig,
    pub host: PluginHost,
}

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Create the CLI application without plugin commands
    pub fn app() -> Command {
        Command::new("plugin-host")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Discover, boot and manage application plugins")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .global(true)
                    .help("Configuration file path")
                    .value_name("FILE"),
            )
            .subcommand(commands::list::command())
            .subcommand(commands::boot::command())
            .subcommand(commands::health::command())
            .subcommand(commands::events::command())
            .subcommand(commands::publish::command())
    }

    /// Run against the process arguments
    pub async fn run(catalog: PluginCatalog) -> Result<()> {
        Self::run_from(std::env::args_os(), catalog).await
    }

    /// Load config, discover plugins, let them contribute commands, then
    /// parse `args` and dispatch
    pub async fn run_from<I, T>(args: I, catalog: PluginCatalog) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

        let config = HostConfig::load(Self::config_path(&args).as_deref())?;
        let host = PluginHost::from_config(&config);

        let report = host.discover(&config.discovery, catalog).await;
        info!(
            "Discovery registered {} plugin(s), {} failure(s)",
            report.registered.len(),
            report.failures.len()
        );

        let mut program = CommandProgram::new(Self::app());
        host.register_commands(&mut program).await;
        let (command, handlers) = program.into_parts();

        let matches = command.get_matches_from(args);
        let ctx = CliContext { config, host };

        match matches.subcommand() {
            Some(("list", sub_matches)) => {
                Self::with_plugins_booted(&ctx, commands::list::run(&ctx, sub_matches)).await
            }
            Some(("boot", sub_matches)) => commands::boot::run(&ctx, sub_matches).await,
            Some(("health", sub_matches)) => {
                Self::with_plugins_booted(&ctx, commands::health::run(&ctx, sub_matches)).await
            }
            Some(("events", sub_matches)) => {
                Self::with_plugins_booted(&ctx, commands::events::run(&ctx, sub_matches)).await
            }
            Some(("publish", sub_matches)) => commands::publish::run(&ctx, sub_matches).await,
            Some((name, sub_matches)) => match handlers.get(name) {
                Some(handler) => {
                    Self::with_plugins_booted(&ctx, handler(sub_matches.clone())).await
                }
                None => {
                    warn!("No handler for command {}", name);
                    Ok(())
                }
            },
            None => {
                // No subcommand provided, show help
                let _ = Self::app().print_help();
                Ok(())
            }
        }
    }

    /// Run `command` between `boot_all` and `shutdown`
    ///
    /// Plugins are shut down even when the command fails.
    async fn with_plugins_booted<F>(ctx: &CliContext, command: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        ctx.host.boot_all().await;
        let result = command.await;
        ctx.host.shutdown().await;
        result
    }

    /// `--config` is needed before plugin commands exist, so unknown
    /// subcommands are accepted here
    fn config_path(args: &[OsString]) -> Option<PathBuf> {
        Self::app()
            .allow_external_subcommands(true)
            .ignore_errors(true)
            .try_get_matches_from(args)
            .ok()
            .and_then(|matches: ArgMatches| matches.get_one::<String>("config").cloned())
            .map(PathBuf::from)
    }
}
