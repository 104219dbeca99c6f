use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use super::{load_config, open_page};
use crate::cli::Cli;
use crate::error::Result;
use crate::prompt::{AssumeYes, Prompter, TerminalPrompter};
use crate::sweep::{Activation, ActivationFlow, JobRow, Outcome, OutcomeTally, RunObserver};

pub async fn run(cli: &Cli, target: Option<&str>, yes: bool) -> Result<()> {
    let config = load_config(cli)?;
    let (_session, page) = open_page(&config, target).await?;

    let prompter: Box<dyn Prompter> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompter)
    };
    let progress = ProgressObserver::new(cli.json);

    let activation = ActivationFlow::new(&page, prompter.as_ref(), &config.sweep)
        .with_observer(&progress)
        .activate()
        .await?;
    progress.finish();

    match activation {
        Activation::NothingToDo => {
            if cli.json {
                println!("{}", serde_json::to_string(&OutcomeTally::default())?);
            }
        }
        Activation::Declined => {
            if cli.json {
                println!("{}", serde_json::json!({ "declined": true }));
            } else {
                println!("{} Cancelled, nothing was deleted", "!".yellow());
            }
        }
        Activation::Completed(tally) => {
            if cli.json {
                println!("{}", serde_json::to_string(&tally)?);
            } else if tally.errors > 0 {
                println!("{} {}", "!".yellow(), tally);
            } else {
                println!("{} {}", "✓".green(), tally);
            }
        }
    }

    Ok(())
}

/// Progress bar over the rows of a run. Hidden in JSON mode.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template("  {bar:30.cyan/dim} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━╸ ");
            bar.set_style(style);
            bar
        };
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl RunObserver for ProgressObserver {
    fn run_started(&self, rows: usize) {
        self.bar.set_length(rows as u64);
    }

    fn row_started(&self, _index: usize, row: &JobRow) {
        self.bar.set_message(row.name.clone());
    }

    fn row_finished(&self, _index: usize, row: &JobRow, outcome: &Outcome) {
        match outcome {
            Outcome::Deleted => {}
            Outcome::Failed(reason) => self
                .bar
                .println(format!("  {} {}: {}", "✗".red(), row.name, reason.dimmed())),
            Outcome::Skipped => self
                .bar
                .println(format!("  {} {} (gone before its turn)", "○".dimmed(), row.name)),
        }
        self.bar.inc(1);
    }
}
