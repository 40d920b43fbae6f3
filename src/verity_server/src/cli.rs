use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "verity-server")]
#[command(about = "Verity authentication service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Apply pending migrations, then serve the HTTP API
    Serve,

    /// Manage the PostgreSQL schema
    Migrate {
        #[command(subcommand)]
        action: MigrateCommand,
    },
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum MigrateCommand {
    /// Apply every pending migration
    Up,
    /// List migrations and whether each one is applied
    Status,
}

impl Cli {
    pub fn command_or_default(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}
