//! Page mutation watcher
//!
//! Keeps the control present for the life of the page. The host re-renders
//! freely (client-side navigation, partial updates, full reloads), so every
//! mutation batch triggers a fresh landmark lookup and an idempotent injection.
//! Control clicks are served in the same loop, one at a time.

use futures::{FutureExt, StreamExt};

use crate::config::Config;
use crate::error::Result;
use crate::page::{HostPage, PageSignal, SignalStream};
use crate::prompt::Prompter;

use super::injector::{ensure_injected, Injection};
use super::landmark::locate;
use super::session::{Activation, ActivationFlow};

pub struct PageWatcher<'a, P: HostPage + ?Sized> {
    page: &'a P,
    prompter: &'a dyn Prompter,
    config: &'a Config,
}

impl<'a, P: HostPage + ?Sized> PageWatcher<'a, P> {
    pub fn new(page: &'a P, prompter: &'a dyn Prompter, config: &'a Config) -> Self {
        Self {
            page,
            prompter,
            config,
        }
    }

    /// Serve `signals` until the stream ends.
    pub async fn watch(&self, signals: SignalStream) -> Result<()> {
        let mut signals = signals.fuse();
        self.refresh().await;

        while let Some(signal) = signals.next().await {
            match signal {
                PageSignal::Mutations => {
                    self.refresh().await;
                }
                PageSignal::Activated => {
                    self.serve_activation().await;
                    // Signals queued during the run describe a page that is gone.
                    let mut dropped = 0usize;
                    while let Some(Some(_)) = signals.next().now_or_never() {
                        dropped += 1;
                    }
                    tracing::debug!(dropped, "drained signals queued during the run");
                    self.refresh().await;
                }
            }
        }

        tracing::debug!("page signal stream ended");
        Ok(())
    }

    /// Locate the landmark and make sure the control is under it.
    ///
    /// `None` when the landmark is not rendered or the page refused the lookup;
    /// the next mutation batch retries.
    pub async fn refresh(&self) -> Option<Injection> {
        let anchor = match locate(self.page, &self.config.landmark).await {
            Ok(Some(anchor)) => anchor,
            Ok(None) => {
                tracing::debug!("landmark not found");
                return None;
            }
            Err(e) => {
                tracing::debug!("landmark lookup failed: {}", e);
                return None;
            }
        };

        match ensure_injected(self.page, anchor, &self.config.control.spec()).await {
            Ok(injection) => Some(injection),
            Err(e) => {
                tracing::warn!(%anchor, "control injection failed: {}", e);
                None
            }
        }
    }

    async fn serve_activation(&self) {
        tracing::info!("control activated");
        let flow = ActivationFlow::new(self.page, self.prompter, &self.config.sweep);
        match flow.activate().await {
            Ok(Activation::Completed(tally)) => tracing::info!(%tally, "run complete"),
            Ok(Activation::Declined) => tracing::info!("run declined"),
            Ok(Activation::NothingToDo) => {}
            Err(e) => tracing::warn!("activation failed: {}", e),
        }
    }
}
