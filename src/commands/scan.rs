use colored::Colorize;

use super::{load_config, open_page};
use crate::cli::Cli;
use crate::error::Result;
use crate::sweep::scan_rows;

pub async fn run(cli: &Cli, target: Option<&str>) -> Result<()> {
    let config = load_config(cli)?;
    let (_session, page) = open_page(&config, target).await?;

    let rows = scan_rows(&page, &config.sweep).await?;
    let deletable = rows.iter().filter(|r| r.trigger.is_some()).count();

    if cli.json {
        let entries: Vec<_> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "name": row.name,
                    "deletable": row.trigger.is_some(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "rows": entries,
                "deletable": deletable,
                "protected": rows.len() - deletable,
            }))?
        );
        return Ok(());
    }

    if rows.is_empty() {
        println!("{} No branch rows found", "!".yellow());
        return Ok(());
    }

    println!(
        "{} {} of {} branches would be deleted\n",
        "✓".green(),
        deletable,
        rows.len()
    );
    for row in &rows {
        if row.trigger.is_some() {
            println!("  {} {}", "•".red(), row.name);
        } else {
            println!("  {} {} {}", "○".dimmed(), row.name, "(protected)".dimmed());
        }
    }

    Ok(())
}
