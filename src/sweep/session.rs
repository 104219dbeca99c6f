//! One activation of the control: scan, gate, run, report, reload.

use crate::config::SweepConfig;
use crate::error::Result;
use crate::page::HostPage;
use crate::prompt::{self, Prompter};

use super::orchestrator::{NoopObserver, Orchestrator, RunObserver};
use super::scanner::scan;
use super::tally::OutcomeTally;

/// How an activation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// No row had a delete trigger. No confirmation was asked.
    NothingToDo,
    /// The user said no. Nothing was touched and the page was not reloaded.
    Declined,
    /// The run finished. A failed reload afterwards is logged, not reported.
    Completed(OutcomeTally),
}

pub struct ActivationFlow<'a, P: HostPage + ?Sized> {
    page: &'a P,
    prompter: &'a dyn Prompter,
    config: &'a SweepConfig,
    observer: &'a dyn RunObserver,
}

impl<'a, P: HostPage + ?Sized> ActivationFlow<'a, P> {
    pub fn new(page: &'a P, prompter: &'a dyn Prompter, config: &'a SweepConfig) -> Self {
        Self {
            page,
            prompter,
            config,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RunObserver) -> Self {
        self.observer = observer;
        self
    }

    pub async fn activate(&self) -> Result<Activation> {
        let job = scan(self.page, self.config).await?;

        if job.is_empty() {
            tracing::info!("nothing to delete");
            self.prompter.notify(&prompt::nothing_to_do_message()).await?;
            return Ok(Activation::NothingToDo);
        }

        if !self.prompter.confirm(&prompt::confirm_message(job.len())).await? {
            tracing::info!(rows = job.len(), "deletion declined");
            return Ok(Activation::Declined);
        }

        let tally = Orchestrator::new(self.page, self.config)
            .run_with(&job, self.observer)
            .await;

        // The summary is best effort; the reload must happen regardless.
        if let Err(e) = self.prompter.notify(&prompt::summary_message(&tally)).await {
            tracing::warn!("failed to show summary: {}", e);
        }

        // The tally stands even when the reload does not happen.
        tracing::info!("reloading page");
        if let Err(e) = self.page.reload().await {
            tracing::warn!("page reload failed: {}", e);
        }
        Ok(Activation::Completed(tally))
    }
}
