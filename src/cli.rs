use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Browse and edit a game catalog published as folders
#[derive(Parser)]
#[command(name = "gameshelf")]
#[command(about = "Discover catalog entries and manage their metadata", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Content root, overriding the config
    #[arg(short, long, global = true)]
    pub root: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run discovery and print the identifiers found
    Discover,
    /// Load every entry and print its card
    List {
        /// Print JSON instead of text cards
        #[arg(long)]
        json: bool,
    },
    /// Metadata editor
    Admin(AdminArgs),
}

#[derive(Args)]
pub struct AdminArgs {
    /// Local file to persist the list to; editing is disabled without it
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: AdminCommands,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Show the working list and its counters
    List,
    /// Add a game, or replace the one with the same id
    Save(SaveArgs),
    /// Remove a game by id
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Publish the working list to a GitHub repository
    Publish(PublishArgs),
}

#[derive(Args)]
pub struct SaveArgs {
    /// Existing id to update; a new id is generated when omitted
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub version: Option<String>,
    #[arg(long)]
    pub download_url: Option<String>,
    #[arg(long)]
    pub size: Option<String>,
    #[arg(long)]
    pub coming_soon: Option<bool>,
}

#[derive(Args)]
pub struct PublishArgs {
    #[arg(long)]
    pub owner: String,
    #[arg(long)]
    pub repo: String,
    #[arg(long, default_value = "data/games.json")]
    pub path: String,
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,
    #[arg(short, long, default_value = "")]
    pub message: String,
}
