//! Embed and include command implementations

use anyhow::{Context, Result};
use clap::Args;

/// Print the content of a declared bundle
#[derive(Args, Debug)]
pub struct EmbedCommand {
    /// Bundle name
    pub name: String,

    /// Wrap the content in a style or script element
    #[arg(short, long)]
    pub wrap: bool,
}

impl EmbedCommand {
    pub fn execute(&self, config_path: &str) -> Result<()> {
        let organizer = super::load_organizer(config_path)?;
        let mut bundler = organizer.declared(&self.name)?;

        let output = if self.wrap {
            bundler.embed_tag()
        } else {
            bundler.embed_here()
        }
        .with_context(|| format!("Failed to embed bundle '{}'", self.name))?;

        println!("{}", output);
        Ok(())
    }
}

/// Print the markup tag referencing a declared bundle
#[derive(Args, Debug)]
pub struct IncludeCommand {
    /// Bundle name
    pub name: String,
}

impl IncludeCommand {
    pub fn execute(&self, config_path: &str) -> Result<()> {
        let organizer = super::load_organizer(config_path)?;
        let mut bundler = organizer.declared(&self.name)?;

        let tag = bundler
            .include_here()
            .with_context(|| format!("Failed to build bundle '{}'", self.name))?;

        println!("{}", tag);
        Ok(())
    }
}
