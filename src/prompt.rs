//! User-facing prompts: the confirmation gate and the notices around a run.

use async_trait::async_trait;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

use crate::error::{Result, SweepError};
use crate::page::CdpPage;
use crate::sweep::OutcomeTally;

/// Blocking notice/confirmation surface.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;

    /// `true` only on an explicit yes.
    async fn confirm(&self, message: &str) -> Result<bool>;
}

pub fn nothing_to_do_message() -> String {
    "No deletable branches found.".to_string()
}

pub fn confirm_message(count: usize) -> String {
    let noun = if count == 1 { "branch" } else { "branches" };
    format!("Delete {} {}? This cannot be undone.", count, noun)
}

pub fn summary_message(tally: &OutcomeTally) -> String {
    format!(
        "Finished: {} deleted, {} errors, {} skipped. The page will now reload.",
        tally.deleted, tally.errors, tally.skipped
    )
}

/// Native `alert`/`confirm` dialogs inside the browser tab.
pub struct PagePrompter {
    page: CdpPage,
}

impl PagePrompter {
    pub fn new(page: CdpPage) -> Self {
        Self { page }
    }
}

#[async_trait]
impl Prompter for PagePrompter {
    async fn notify(&self, message: &str) -> Result<()> {
        self.page.alert(message).await
    }

    async fn confirm(&self, message: &str) -> Result<bool> {
        self.page.confirm(message).await
    }
}

/// Non-interactive prompter (`--yes`): every gate passes, notices go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

#[async_trait]
impl Prompter for AssumeYes {
    async fn notify(&self, message: &str) -> Result<()> {
        tracing::info!("{}", message);
        Ok(())
    }

    async fn confirm(&self, message: &str) -> Result<bool> {
        tracing::info!("{} (assumed yes)", message);
        Ok(true)
    }
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

/// Theme for terminal prompts, on stderr so `--json` stdout stays clean.
pub fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()).for_stderr(),
        success_prefix: style("  ◇ ".to_string()).for_stderr().green(),
        error_prefix: style("  ✗ ".to_string()).for_stderr().red(),
        ..ColorfulTheme::default()
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn notify(&self, message: &str) -> Result<()> {
        eprintln!("  {}", style(message).bold());
        Ok(())
    }

    async fn confirm(&self, message: &str) -> Result<bool> {
        let prompt = message.to_string();
        tokio::task::spawn_blocking(move || {
            Confirm::with_theme(&prompt_theme())
                .with_prompt(prompt)
                .default(false)
                .interact()
                .map_err(|e| SweepError::PromptFailed(e.to_string()))
        })
        .await
        .map_err(|e| SweepError::PromptFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_states_count_and_irreversibility() {
        let message = confirm_message(3);
        assert!(message.contains("3 branches"));
        assert!(message.contains("cannot be undone"));
        assert!(confirm_message(1).contains("1 branch?"));
    }

    #[test]
    fn summary_lists_all_counters() {
        let tally = OutcomeTally {
            deleted: 2,
            errors: 1,
            skipped: 4,
        };
        let message = summary_message(&tally);
        assert!(message.contains("2 deleted"));
        assert!(message.contains("1 errors"));
        assert!(message.contains("4 skipped"));
    }
}
