//! Configuration view and validation commands: `studio config`.

use anyhow::Result;

use studio::config::{Config, StudioToml, default_config_path};

use crate::{Cli, ConfigCommands};

pub fn cmd_config(cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Studio Configuration");
            println!("====================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                StudioToml::load(&config_path)?
            } else {
                println!("No studio.toml found at {}", config_path.display());
                println!("Using default configuration.");
                StudioToml::default()
            };
            println!();

            println!("[api]");
            println!("  base_url = \"{}\"", toml.api.base_url);
            println!("  timeout_secs = {}", toml.api.timeout_secs);
            println!();
            println!("[session]");
            match &toml.session.file {
                Some(file) => println!("  file = \"{}\"", file.display()),
                None => println!("  file = (default)"),
            }
            println!();
            println!("[board]");
            println!(
                "  refetch_after_transition = {}",
                toml.board.refetch_after_transition
            );
            println!();
            println!("[notifications]");
            println!(
                "  poll_interval_secs = {}",
                toml.notifications.poll_interval_secs
            );
            println!();

            // Effective values (including env/CLI overrides)
            let config = Config::from_toml(config_path.clone(), toml, cli.api_url.clone())?;
            println!("Effective values (with env/CLI overrides):");
            println!("  api_url = \"{}\"", config.api_url);
            println!("  timeout = {}s", config.timeout.as_secs());
            println!("  session_file = \"{}\"", config.session_file.display());
            println!();

            if !config_path.exists() {
                println!("Run 'studio config init' to create a studio.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No studio.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = StudioToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("studio.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            StudioToml::default().save(&config_path)?;

            println!("Created studio.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [api] base_url, timeout_secs");
            println!("  - [board] refetch_after_transition");
            println!("  - [notifications] poll_interval_secs");
            println!();
        }
    }

    Ok(())
}
