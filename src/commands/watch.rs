use colored::Colorize;

use super::{load_config, open_page};
use crate::cli::Cli;
use crate::error::Result;
use crate::prompt::PagePrompter;
use crate::sweep::PageWatcher;

pub async fn run(cli: &Cli, target: Option<&str>) -> Result<()> {
    let config = load_config(cli)?;
    let (_session, page) = open_page(&config, target).await?;
    let url = page.inner().url().await?.unwrap_or_default();

    let signals = page.signals().await?;
    let prompter = PagePrompter::new(page.clone());
    let watcher = PageWatcher::new(&page, &prompter, &config);

    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "watching": url, "control": config.control.id })
        );
    } else {
        println!("{} Watching {}", "✓".green(), url.cyan());
        println!(
            "  Click {} on the page to delete branches. Press Ctrl+C to stop.",
            format!("\"{}\"", config.control.label).bold()
        );
    }

    tokio::select! {
        result = watcher.watch(signals) => {
            result?;
            tracing::info!("page closed");
            if !cli.json {
                println!("{} Page closed", "!".yellow());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            if !cli.json {
                println!("\n{} Stopped", "✓".green());
            }
        }
    }

    Ok(())
}
