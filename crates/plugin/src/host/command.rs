//! Command-line program handed to command contributors

use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// Handler invoked when a contributed subcommand is selected
pub type CommandHandler = Arc<dyn Fn(ArgMatches) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Root command plus the handlers plugins attached to it
pub struct CommandProgram {
    root: Command,
    handlers: HashMap<String, CommandHandler>,
}

impl CommandProgram {
    pub fn new(root: Command) -> Self {
        Self {
            root,
            handlers: HashMap::new(),
        }
    }

    /// Attach a subcommand. Fails when the name is already taken.
    pub fn add_command<F>(&mut self, command: Command, handler: F) -> Result<()>
    where
        F: Fn(ArgMatches) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        let name = command.get_name().to_string();
        if self.root.find_subcommand(&name).is_some() {
            return Err(anyhow!("Command {} is already registered", name));
        }

        self.root = std::mem::take(&mut self.root).subcommand(command);
        self.handlers.insert(name, Arc::new(handler));
        Ok(())
    }

    pub fn command(&self) -> &Command {
        &self.root
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.handlers.get(name).cloned()
    }

    /// Names of contributed subcommands, sorted
    pub fn contributed(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn into_parts(self) -> (Command, HashMap<String, CommandHandler>) {
        (self.root, self.handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn test_add_command_rejects_duplicates() {
        let mut program = CommandProgram::new(Command::new("host").subcommand(Command::new("list")));

        program
            .add_command(Command::new("blog:sync"), |_| async { Ok::<(), anyhow::Error>(()) }.boxed())
            .unwrap();
        assert!(program
            .add_command(Command::new("list"), |_| async { Ok::<(), anyhow::Error>(()) }.boxed())
            .is_err());

        assert_eq!(program.contributed(), vec!["blog:sync".to_string()]);
        assert!(program.command().find_subcommand("blog:sync").is_some());
        assert!(program.handler("list").is_none());
    }

    #[tokio::test]
    async fn test_handler_receives_matches() {
        let mut program = CommandProgram::new(Command::new("host"));
        program
            .add_command(
                Command::new("greet").arg(clap::arg!(<NAME> "Who to greet")),
                |matches| {
                    async move {
                        let name = matches
                            .get_one::<String>("NAME")
                            .ok_or_else(|| anyhow!("missing name"))?;
                        assert_eq!(name, "world");
                        Ok::<(), anyhow::Error>(())
                    }
                    .boxed()
                },
            )
            .unwrap();

        let matches = program
            .command()
            .clone()
            .try_get_matches_from(["host", "greet", "world"])
            .unwrap();
        let (name, sub_matches) = matches.subcommand().unwrap();
        let handler = program.handler(name).unwrap();
        handler(sub_matches.clone()).await.unwrap();
    }
}
