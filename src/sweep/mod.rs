//! Bulk deletion over a [`HostPage`](crate::page::HostPage).

pub mod injector;
pub mod landmark;
pub mod matcher;
pub mod orchestrator;
pub mod scanner;
pub mod session;
pub mod tally;
pub mod watcher;

pub use injector::{ensure_injected, Injection};
pub use landmark::locate;
pub use matcher::Matcher;
pub use orchestrator::{NoopObserver, Orchestrator, RunObserver};
pub use scanner::{scan, scan_rows, DeletionJob, JobRow, RowRef};
pub use session::{Activation, ActivationFlow};
pub use tally::{Outcome, OutcomeTally};
pub use watcher::PageWatcher;
