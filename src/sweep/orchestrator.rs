//! Deletion orchestration
//!
//! Drives every row of a [`DeletionJob`] through the host page's delete flow,
//! strictly one row at a time:
//!
//! 1. liveness: a row no longer in the document is skipped, never touched
//! 2. trigger: note the dialogs already open, then click the row's delete control
//! 3. dialog lookup: after `dialog_render_delay`, look for a dialog that was not
//!    open before the click
//!    - none: the host deleted immediately
//!    - open: click the first confirm candidate; with no candidate, close the
//!      dialog (best effort) and count the row as failed
//! 4. settle: wait `delete_delay` before the next row (not after the last)
//!
//! Errors never escape a row. Whatever happens, each row bumps exactly one
//! counter, so the tally always sums to the job size.

use std::time::Duration;

use crate::config::SweepConfig;
use crate::error::Result;
use crate::page::{ElementHandle, HostPage};

use super::matcher::{find_close, find_confirm, find_new_dialog, open_dialogs};
use super::scanner::{DeletionJob, JobRow};
use super::tally::{Outcome, OutcomeTally};

/// Step-level hooks for progress reporting.
pub trait RunObserver: Send + Sync {
    fn run_started(&self, _rows: usize) {}
    fn row_started(&self, _index: usize, _row: &JobRow) {}
    fn row_finished(&self, _index: usize, _row: &JobRow, _outcome: &Outcome) {}
    fn settling(&self, _delay: Duration) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

pub struct Orchestrator<'a, P: HostPage + ?Sized> {
    page: &'a P,
    config: &'a SweepConfig,
}

impl<'a, P: HostPage + ?Sized> Orchestrator<'a, P> {
    pub fn new(page: &'a P, config: &'a SweepConfig) -> Self {
        Self { page, config }
    }

    pub async fn run(&self, job: &DeletionJob) -> OutcomeTally {
        self.run_with(job, &NoopObserver).await
    }

    pub async fn run_with(&self, job: &DeletionJob, observer: &dyn RunObserver) -> OutcomeTally {
        let mut tally = OutcomeTally::default();
        let total = job.len();

        tracing::info!(rows = total, "deletion run started");
        observer.run_started(total);

        for (index, row) in job.rows().iter().enumerate() {
            observer.row_started(index, row);

            let outcome = self.process_row(row).await;
            tally.record(&outcome);

            match &outcome {
                Outcome::Failed(reason) => tracing::warn!(
                    row = index + 1,
                    total,
                    branch = %row.name,
                    "delete failed: {}",
                    reason
                ),
                other => tracing::info!(
                    row = index + 1,
                    total,
                    branch = %row.name,
                    outcome = other.label(),
                    "row processed"
                ),
            }
            observer.row_finished(index, row, &outcome);

            if index + 1 < total {
                let delay = self.config.delete_delay();
                observer.settling(delay);
                tracing::debug!(?delay, "settling");
                tokio::time::sleep(delay).await;
            }
        }

        debug_assert_eq!(tally.total(), total);
        tracing::info!(
            deleted = tally.deleted,
            errors = tally.errors,
            skipped = tally.skipped,
            "deletion run finished"
        );
        tally
    }

    async fn process_row(&self, row: &JobRow) -> Outcome {
        match self.delete_row(row).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    async fn delete_row(&self, row: &JobRow) -> Result<Outcome> {
        if !self.page.is_attached(row.element).await? {
            tracing::debug!(branch = %row.name, "row detached before its turn");
            return Ok(Outcome::Skipped);
        }

        let before = open_dialogs(self.page, &self.config.dialog_selectors).await?;
        if !before.is_empty() {
            tracing::debug!(count = before.len(), "dialogs already open before trigger");
        }

        self.page.activate(row.trigger).await?;

        let render_delay = self.config.dialog_render_delay();
        if !render_delay.is_zero() {
            tokio::time::sleep(render_delay).await;
        }

        let Some(dialog) =
            find_new_dialog(self.page, &self.config.dialog_selectors, &before).await?
        else {
            return Ok(Outcome::Deleted);
        };
        tracing::debug!(%dialog, branch = %row.name, "confirmation dialog open");

        let confirmed = self.confirm(dialog).await;
        if !matches!(confirmed, Ok(Outcome::Deleted)) {
            self.dismiss(dialog).await;
        }
        confirmed
    }

    async fn confirm(&self, dialog: ElementHandle) -> Result<Outcome> {
        match find_confirm(self.page, dialog, &self.config.confirm_selectors).await? {
            Some(button) => {
                self.page.activate(button).await?;
                Ok(Outcome::Deleted)
            }
            None => Ok(Outcome::Failed(
                "no confirmation control found in dialog".to_string(),
            )),
        }
    }

    /// Close a dialog so it does not block the next trigger.
    async fn dismiss(&self, dialog: ElementHandle) {
        match find_close(self.page, dialog, &self.config.close_selectors).await {
            Ok(Some(close)) => {
                if let Err(e) = self.page.activate(close).await {
                    tracing::warn!(%dialog, "failed to close dialog: {}", e);
                }
            }
            Ok(None) => tracing::warn!(%dialog, "dialog has no close control"),
            Err(e) => tracing::warn!(%dialog, "close control lookup failed: {}", e),
        }
    }
}
