//! Landmark lookup: where the control gets attached.

use crate::config::LandmarkConfig;
use crate::error::Result;
use crate::page::{ElementHandle, HostPage};

/// Find the anchor for the control.
///
/// Tries the structural selector first, then falls back to the parent of the
/// first heading whose trimmed text equals the configured label. `Ok(None)`
/// means the listing has not rendered (yet); it is not an error.
pub async fn locate<P: HostPage + ?Sized>(
    page: &P,
    config: &LandmarkConfig,
) -> Result<Option<ElementHandle>> {
    if !config.selector.trim().is_empty() {
        if let Some(anchor) = page.query_first(None, &config.selector).await? {
            tracing::debug!(%anchor, "landmark found by selector");
            return Ok(Some(anchor));
        }
    }

    let label = config.heading_text.trim();
    for heading in page.query_all(None, &config.heading_selector).await? {
        let text = page.read_text(heading).await?;
        if text.as_deref().map(str::trim) == Some(label) {
            let anchor = page.parent(heading).await?;
            if let Some(anchor) = anchor {
                tracing::debug!(%anchor, "landmark found by heading text");
            }
            return Ok(anchor);
        }
    }

    Ok(None)
}
