//! Command-line interface for Organizer
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: Build declared bundles and print their URLs
//! - `embed`: Print bundle content for inline embedding
//! - `include`: Print the tag referencing a bundle
//! - `clear`: Drop every cached bundle
//! - `init`: Project scaffolding

mod build;
mod embed;
mod init;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::Config;
use crate::organizer::Organizer;

pub use build::BuildCommand;
pub use embed::{EmbedCommand, IncludeCommand};
pub use init::InitCommand;

/// Organizer - Bundle, minify and cache stylesheets and scripts
#[derive(Parser, Debug)]
#[command(name = "organizer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to organizer.toml config file
    #[arg(short, long, global = true, default_value = "organizer.toml", env = "ORGANIZER_CONFIG")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build declared bundles and print their URLs
    Build(BuildCommand),

    /// Print the content of a declared bundle
    Embed(EmbedCommand),

    /// Print the markup tag referencing a declared bundle
    Include(IncludeCommand),

    /// Remove every cached bundle
    Clear,

    /// Initialize a new project
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Build(cmd) => {
                print_banner();
                cmd.execute(&self.config)
            }
            Commands::Embed(cmd) => cmd.execute(&self.config),
            Commands::Include(cmd) => cmd.execute(&self.config),
            Commands::Clear => clear(&self.config),
            Commands::Init(cmd) => {
                print_banner();
                cmd.execute()
            }
        }
    }
}

/// Load the configuration and create the organizer around it
pub(crate) fn load_organizer(config_path: &str) -> Result<Organizer> {
    tracing::info!("Loading configuration from {}", config_path);
    let config = Config::load(config_path)?;
    Ok(Organizer::new(config))
}

fn clear(config_path: &str) -> Result<()> {
    let organizer = load_organizer(config_path)?;
    organizer.cache().clear()?;

    eprintln!("{} Cache cleared", "✓".green().bold());
    Ok(())
}

/// Print the Organizer banner
fn print_banner() {
    eprintln!(
        "\n{} {}\n",
        "Organizer".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
