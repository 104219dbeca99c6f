//! Row/trigger scanning: capture the job at activation time.

use serde::Serialize;

use crate::config::SweepConfig;
use crate::error::Result;
use crate::page::{ElementHandle, HostPage};

/// One listing row as seen at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRef {
    pub element: ElementHandle,
    pub name: String,
    /// Absent for rows without a delete affordance (default/protected branches).
    pub trigger: Option<ElementHandle>,
}

/// A row that can be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRow {
    pub element: ElementHandle,
    pub name: String,
    pub trigger: ElementHandle,
}

/// The ordered rows of one run. Fixed once captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionJob {
    rows: Vec<JobRow>,
}

impl DeletionJob {
    pub fn new(rows: Vec<JobRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[JobRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<RowRef> for DeletionJob {
    fn from_iter<I: IntoIterator<Item = RowRef>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .filter_map(|row| {
                    row.trigger.map(|trigger| JobRow {
                        element: row.element,
                        name: row.name,
                        trigger,
                    })
                })
                .collect(),
        )
    }
}

/// Every row currently matching the row selector, deletable or not.
pub async fn scan_rows<P: HostPage + ?Sized>(page: &P, config: &SweepConfig) -> Result<Vec<RowRef>> {
    let elements = page.query_all(None, &config.row_selector).await?;
    let mut rows = Vec::with_capacity(elements.len());

    for element in elements {
        let trigger = match page.query_first(Some(element), &config.trigger_selector).await {
            Ok(trigger) => trigger,
            Err(e) => {
                tracing::warn!(row = %element, "trigger lookup failed: {}", e);
                None
            }
        };
        let name = row_name(page, element, config).await;
        rows.push(RowRef {
            element,
            name,
            trigger,
        });
    }

    Ok(rows)
}

/// Capture the deletion job: rows with a delete trigger, in document order.
pub async fn scan<P: HostPage + ?Sized>(page: &P, config: &SweepConfig) -> Result<DeletionJob> {
    let rows = scan_rows(page, config).await?;
    let total = rows.len();
    let job: DeletionJob = rows.into_iter().collect();
    tracing::info!(
        rows = total,
        deletable = job.len(),
        "scanned branch listing"
    );
    Ok(job)
}

async fn row_name<P: HostPage + ?Sized>(
    page: &P,
    row: ElementHandle,
    config: &SweepConfig,
) -> String {
    match read_name(page, row, config).await {
        Ok(Some(name)) => name,
        Ok(None) => config.placeholder_name.clone(),
        Err(e) => {
            tracing::debug!(%row, "name lookup failed: {}", e);
            config.placeholder_name.clone()
        }
    }
}

async fn read_name<P: HostPage + ?Sized>(
    page: &P,
    row: ElementHandle,
    config: &SweepConfig,
) -> Result<Option<String>> {
    match page.query_first(Some(row), &config.name_selector).await? {
        Some(el) => page.read_text(el).await,
        None => Ok(None),
    }
}
