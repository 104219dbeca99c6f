//! Idempotent control injection.

use crate::error::Result;
use crate::page::{ControlSpec, ElementHandle, HostPage};

/// What [`ensure_injected`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    Created,
    AlreadyPresent,
}

/// Attach the control under `anchor` unless an element with its id already
/// exists anywhere in the document.
pub async fn ensure_injected<P: HostPage + ?Sized>(
    page: &P,
    anchor: ElementHandle,
    control: &ControlSpec,
) -> Result<Injection> {
    if page.has_element_id(&control.id).await? {
        return Ok(Injection::AlreadyPresent);
    }

    page.append_control(anchor, control).await?;
    tracing::info!(id = %control.id, %anchor, "control injected");
    Ok(Injection::Created)
}
