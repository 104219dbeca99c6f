//! Ordered element matchers and the confirmation-dialog lookups built on them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::page::{ElementHandle, HostPage};

/// One candidate shape for a control the host page may render.
///
/// `css` selects candidates; when `text` is set, a candidate only matches if its
/// trimmed text equals `text` (ASCII case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matcher {
    pub css: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Matcher {
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: None,
        }
    }

    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: Some(text.into()),
        }
    }

    /// Resolve this matcher within `scope` (or the whole document).
    pub async fn find<P: HostPage + ?Sized>(
        &self,
        page: &P,
        scope: Option<ElementHandle>,
    ) -> Result<Option<ElementHandle>> {
        let Some(wanted) = self.text.as_deref() else {
            return page.query_first(scope, &self.css).await;
        };

        for candidate in page.query_all(scope, &self.css).await? {
            let text = page.read_text(candidate).await?;
            if text_matches(text.as_deref(), wanted) {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} (text={:?})", self.css, text),
            None => f.write_str(&self.css),
        }
    }
}

fn text_matches(actual: Option<&str>, wanted: &str) -> bool {
    actual
        .map(str::trim)
        .is_some_and(|t| t.eq_ignore_ascii_case(wanted.trim()))
}

/// Try `matchers` in declared order and return the first element found.
pub async fn find_first<P: HostPage + ?Sized>(
    page: &P,
    scope: Option<ElementHandle>,
    matchers: &[Matcher],
) -> Result<Option<ElementHandle>> {
    for matcher in matchers {
        if let Some(found) = matcher.find(page, scope).await? {
            tracing::debug!(matcher = %matcher, "matcher hit");
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Every dialog currently matching one of `selectors`.
pub async fn open_dialogs<P: HostPage + ?Sized>(
    page: &P,
    selectors: &[String],
) -> Result<Vec<ElementHandle>> {
    let mut dialogs = Vec::new();
    for selector in selectors {
        for dialog in page.query_all(None, selector).await? {
            if !dialogs.contains(&dialog) {
                dialogs.push(dialog);
            }
        }
    }
    Ok(dialogs)
}

/// Locate a dialog that was not open in `before`.
///
/// `selectors` are tried in order; within one selector the newest match
/// (last in document order) wins. Dialogs left over from earlier rows are
/// never returned.
pub async fn find_new_dialog<P: HostPage + ?Sized>(
    page: &P,
    selectors: &[String],
    before: &[ElementHandle],
) -> Result<Option<ElementHandle>> {
    for selector in selectors {
        let fresh = page
            .query_all(None, selector)
            .await?
            .into_iter()
            .filter(|dialog| !before.contains(dialog))
            .last();
        if fresh.is_some() {
            return Ok(fresh);
        }
    }
    Ok(None)
}

/// Confirmation control inside an open dialog.
pub async fn find_confirm<P: HostPage + ?Sized>(
    page: &P,
    dialog: ElementHandle,
    candidates: &[Matcher],
) -> Result<Option<ElementHandle>> {
    find_first(page, Some(dialog), candidates).await
}

/// Close/cancel control inside an open dialog.
pub async fn find_close<P: HostPage + ?Sized>(
    page: &P,
    dialog: ElementHandle,
    candidates: &[Matcher],
) -> Result<Option<ElementHandle>> {
    find_first(page, Some(dialog), candidates).await
}
