use colored::Colorize;

use super::load_config;
use crate::cli::{Cli, ConfigCommands};
use crate::config::Config;
use crate::error::Result;

pub async fn run(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(cli),
        ConfigCommands::Path => path(cli),
    }
}

fn show(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", config.to_toml()?);
    }

    Ok(())
}

fn path(cli: &Cli) -> Result<()> {
    let path = cli.config.clone().or_else(Config::default_path);

    match path {
        Some(path) => {
            let exists = path.exists();
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "path": path.display().to_string(), "exists": exists })
                );
            } else if exists {
                println!("{}", path.display());
            } else {
                println!("{} {}", path.display(), "(not created)".dimmed());
            }
        }
        None => {
            if cli.json {
                println!("{}", serde_json::json!({ "path": null, "exists": false }));
            } else {
                println!("{} No config directory on this platform", "!".yellow());
            }
        }
    }

    Ok(())
}
