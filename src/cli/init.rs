//! Project initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// Initialize a new project
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Project directory
    #[arg(default_value = ".")]
    pub dir: String,

    /// URL the host application serves bundles from
    #[arg(long, default_value = "/organizer")]
    pub server_url: String,

    /// Overwrite an existing organizer.toml
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn execute(&self) -> Result<()> {
        let project_dir = Path::new(&self.dir);
        let config_path = project_dir.join("organizer.toml");

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            );
        }

        eprintln!("{} Initializing organizer project...\n", "→".blue());

        fs::create_dir_all(project_dir.join("assets/css"))
            .context("Failed to create assets/css")?;
        fs::create_dir_all(project_dir.join("assets/js"))
            .context("Failed to create assets/js")?;

        fs::write(&config_path, self.generate_config())
            .context("Failed to write organizer.toml")?;
        eprintln!("  {} Created {}", "✓".green(), "organizer.toml".cyan());

        write_if_missing(
            &project_dir.join("assets/css/main.css"),
            "/* Global styles */\nbody {\n  margin: 0;\n  font-family: system-ui, sans-serif;\n}\n",
        )?;
        write_if_missing(
            &project_dir.join("assets/js/main.js"),
            "// Application entry\ndocument.addEventListener('DOMContentLoaded', function () {\n  document.body.classList.add('ready');\n});\n",
        )?;

        eprintln!(
            "\n{} Project initialized successfully!\n",
            "✓".green().bold()
        );
        eprintln!("  Next steps:");
        eprintln!("    {} organizer build", "→".dimmed());
        eprintln!();

        Ok(())
    }

    fn generate_config(&self) -> String {
        format!(
r#"# Organizer configuration

server_url = {server_url}
signature = true

[cache]
backend = "file"
dir = ".organizer/cache"
expiry = 0

[style]
base_path = "assets/css/"
cache = true
minify = true
parameter = "file"

[script]
base_path = "assets/js/"
cache = true
minify = true
parameter = "file"

[[bundle]]
name = "site"
kind = "style"
version = "1.0"
files = ["main.css"]

[[bundle]]
name = "app"
kind = "script"
version = "1.0"
files = ["main.js"]
"#,
            server_url = toml::Value::String(self.server_url.clone()),
        )
    }
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("  {} Created {}", "✓".green(), path.display().to_string().cyan());
    Ok(())
}
