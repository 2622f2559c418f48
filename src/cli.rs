use clap::{Parser, Subcommand};
use invite_models::Config;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "invite-bot-server")]
#[command(about = "Telegram invite tracking and broadcast bot")]
pub struct Cli {
    /// Config file; `configs/default.toml` is used when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Poll Telegram and serve the admin panel (default)
    Run,
    /// Apply the database schema and exit
    Migrate,
    /// Print target chat statistics as JSON
    Stats,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }

    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Config::locate)
    }
}
