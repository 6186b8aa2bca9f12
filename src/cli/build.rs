//! Build command implementation

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::bundler::BundleState;
use crate::utils::{format_duration, format_size};

/// Build declared bundles
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Only build the named bundle(s)
    #[arg(long = "only", value_name = "NAME")]
    pub only: Vec<String>,

    /// Write a JSON manifest mapping bundle names to URLs
    #[arg(short, long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,
}

impl BuildCommand {
    pub fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();
        let organizer = super::load_organizer(config_path)?;

        let bundlers = if self.only.is_empty() {
            organizer.declared_all()?
        } else {
            self.only
                .iter()
                .map(|name| organizer.declared(name))
                .collect::<Result<Vec<_>, _>>()?
        };

        if bundlers.is_empty() {
            eprintln!("{} No bundles declared in {}", "!".yellow().bold(), config_path);
            return Ok(());
        }

        let mut manifest = BTreeMap::new();

        for mut bundler in bundlers {
            let url = bundler
                .build()
                .with_context(|| format!("Failed to build bundle '{}'", bundler.name()))?;

            let status = match bundler.state() {
                BundleState::Cached => "cached".dimmed(),
                _ => "built".green(),
            };
            let size = organizer
                .cache()
                .get(bundler.cache_key().as_str())?
                .map(|content| format_size(content.len()))
                .unwrap_or_default();

            eprintln!(
                "  {} {} {} {} {}",
                "•".dimmed(),
                bundler.name().cyan(),
                status,
                size.dimmed(),
                format!("({})", bundler.kind()).dimmed()
            );
            println!("{}", url);

            manifest.insert(bundler.name().to_string(), url);
        }

        if let Some(path) = &self.manifest {
            let manifest_json = serde_json::to_string_pretty(&manifest)?;
            fs::write(path, manifest_json)
                .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
            info!("Wrote manifest to {}", path.display());
        }

        eprintln!(
            "\n{} Processed {} bundle(s) in {}\n",
            "✓".green().bold(),
            manifest.len(),
            format_duration(start.elapsed())
        );

        Ok(())
    }
}
