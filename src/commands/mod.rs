// Commands module - handles CLI command execution

use anyhow::{Context, Result};
use std::path::Path;

pub mod run;

pub use run::{apply_cli_overrides, run_replay};

use crate::config::{self, Settings};

/// Handle shell completion
pub fn handle_completion(shell_type: &str) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{Shell, generate};

    let shell = match shell_type.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "powershell" => Shell::PowerShell,
        _ => {
            anyhow::bail!(
                "Unsupported shell: {}. Supported: bash, zsh, fish, powershell",
                shell_type
            );
        }
    };

    let mut cmd = crate::cli::Cli::command();
    let name = cmd.get_name().to_string();
    let mut stdout = std::io::stdout();

    generate(shell, &mut cmd, name, &mut stdout);

    Ok(())
}

const PRECEDENCE: &str = "\nConfiguration precedence:
  1. Command-line arguments (highest)
  2. Environment variables
  3. Env file (--rich-env-file, or ./.env)
  4. Configuration file
  5. Built-in defaults (lowest)";

/// Print the effective settings as TOML
pub fn handle_show_config(settings: &Settings) {
    match Settings::discover() {
        Some(path) => println!("# Configuration file: {}", path.display()),
        None => println!("# No configuration file loaded"),
    }
    println!("{}", settings.to_toml());
    println!("{}", PRECEDENCE);
}

/// Write a default configuration file
pub fn handle_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
    }
    std::fs::write(path, Settings::default().to_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration file created: {}", path.display());
    println!("\nYou can now edit the file to customize your settings.");
    println!(
        "Place it in the project directory or your home directory as {}.",
        config::CONFIG_FILE_NAME
    );
    println!("{}", PRECEDENCE);
    Ok(())
}
