//! Host page port
//!
//! Everything the sweep does to a page goes through [`HostPage`]: a handful of
//! DOM-level capabilities (query, liveness, activate, read text, append one node,
//! reload). Element handles are opaque tokens; a handle captured earlier may refer
//! to an element the host has since removed, which is why liveness is a query and
//! never an assumption.
//!
//! Two implementations:
//! - `CdpPage`: a real browser tab over the Chrome DevTools Protocol
//! - `MemoryPage`: a scriptable in-memory document

pub mod cdp;
pub mod connect;
pub mod memory;
mod scripts;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use cdp::CdpPage;
pub use memory::MemoryPage;

/// Opaque reference to one element of the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "el:{}", self.0)
    }
}

/// The single control injected into the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSpec {
    /// Reserved document-unique identifier (the element's `id`).
    pub id: String,
    pub label: String,
}

/// Notifications pushed by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSignal {
    /// One batch of structural mutations was observed.
    Mutations,
    /// The user clicked the injected control.
    Activated,
}

pub type SignalStream = Pin<Box<dyn Stream<Item = PageSignal> + Send>>;

/// DOM-level capabilities consumed by the sweep.
#[async_trait]
pub trait HostPage: Send + Sync {
    /// All elements matching `selector`, in document order, below `scope`
    /// (or the whole document).
    async fn query_all(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> Result<Vec<ElementHandle>>;

    async fn query_first(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> Result<Option<ElementHandle>> {
        Ok(self.query_all(scope, selector).await?.into_iter().next())
    }

    /// Whether the element is still connected to the live document.
    async fn is_attached(&self, element: ElementHandle) -> Result<bool>;

    /// Equivalent of a user click.
    async fn activate(&self, element: ElementHandle) -> Result<()>;

    /// Trimmed text content; `None` when empty or unavailable.
    async fn read_text(&self, element: ElementHandle) -> Result<Option<String>>;

    async fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>>;

    /// Whether any attached element carries `id`.
    async fn has_element_id(&self, id: &str) -> Result<bool>;

    /// Append the control under `anchor`, wiring its click to [`PageSignal::Activated`].
    async fn append_control(&self, anchor: ElementHandle, control: &ControlSpec) -> Result<()>;

    /// Full reload of the document. Every handle is invalid afterwards.
    async fn reload(&self) -> Result<()>;
}
