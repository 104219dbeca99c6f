//! [`HostPage`] over a live browser tab (Chrome DevTools Protocol).

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EvaluateParams, EventBindingCalled};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::scripts::{self, PAYLOAD_ACTIVATE, PAYLOAD_MUTATIONS, SIGNAL_BINDING};
use super::{ControlSpec, ElementHandle, HostPage, PageSignal, SignalStream};
use crate::error::{Result, SweepError};

/// A browser tab driven through page-side scripts.
#[derive(Debug, Clone)]
pub struct CdpPage {
    page: Page,
}

#[derive(Deserialize)]
struct QueryReply {
    found: bool,
    ids: Vec<u64>,
}

#[derive(Deserialize)]
struct AttachedReply {
    attached: bool,
}

#[derive(Deserialize)]
struct StatusReply {
    status: String,
}

#[derive(Deserialize)]
struct TextReply {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ParentReply {
    id: Option<u64>,
}

#[derive(Deserialize)]
struct PresentReply {
    present: bool,
}

#[derive(Deserialize)]
struct ConfirmReply {
    accepted: bool,
}

impl CdpPage {
    /// Wrap a tab: register the signal binding and the mutation observer, both
    /// for the current document and every document loaded after it.
    pub async fn attach(page: Page) -> Result<Self> {
        page.execute(AddBindingParams::new(SIGNAL_BINDING)).await?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            scripts::mutation_observer(),
        ))
        .await?;

        let this = Self { page };
        let _: serde_json::Value = this.eval(scripts::mutation_observer()).await?;
        tracing::debug!("page instrumentation installed");
        Ok(this)
    }

    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// Stream of signals raised by the page (mutation batches, control clicks).
    pub async fn signals(&self) -> Result<SignalStream> {
        let events = self.page.event_listener::<EventBindingCalled>().await?;
        let stream = events.filter_map(|event| async move {
            if event.name != SIGNAL_BINDING {
                return None;
            }
            match event.payload.as_str() {
                PAYLOAD_MUTATIONS => Some(PageSignal::Mutations),
                PAYLOAD_ACTIVATE => Some(PageSignal::Activated),
                other => {
                    tracing::debug!(payload = other, "ignoring unknown page signal");
                    None
                }
            }
        });
        Ok(Box::pin(stream))
    }

    /// Blocking in-page `alert`.
    pub async fn alert(&self, message: &str) -> Result<()> {
        let _: serde_json::Value = self.eval(scripts::alert(message)).await?;
        Ok(())
    }

    /// Blocking in-page `confirm`.
    pub async fn confirm(&self, message: &str) -> Result<bool> {
        let reply: ConfirmReply = self.eval(scripts::confirm(message)).await?;
        Ok(reply.accepted)
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        let params = EvaluateParams::builder()
            .expression(script)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(SweepError::ScriptEvaluation)?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| SweepError::ScriptEvaluation(e.to_string()))?;

        result
            .into_value::<T>()
            .map_err(|e| SweepError::ScriptEvaluation(format!("Unexpected script result: {}", e)))
    }
}

#[async_trait]
impl HostPage for CdpPage {
    async fn query_all(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> Result<Vec<ElementHandle>> {
        let reply: QueryReply = self
            .eval(scripts::query_all(scope.map(ElementHandle::raw), selector))
            .await?;
        if !reply.found {
            return Err(SweepError::ElementNotFound(
                scope.map(|s| s.to_string()).unwrap_or_default(),
            ));
        }
        Ok(reply.ids.into_iter().map(ElementHandle::from_raw).collect())
    }

    async fn is_attached(&self, element: ElementHandle) -> Result<bool> {
        let reply: AttachedReply = self.eval(scripts::is_attached(element.raw())).await?;
        Ok(reply.attached)
    }

    async fn activate(&self, element: ElementHandle) -> Result<()> {
        let reply: StatusReply = self.eval(scripts::activate(element.raw())).await?;
        match reply.status.as_str() {
            "ok" => Ok(()),
            "detached" => Err(SweepError::ElementDetached(element.to_string())),
            _ => Err(SweepError::ElementNotFound(element.to_string())),
        }
    }

    async fn read_text(&self, element: ElementHandle) -> Result<Option<String>> {
        let reply: TextReply = self.eval(scripts::read_text(element.raw())).await?;
        Ok(reply.text.filter(|t| !t.is_empty()))
    }

    async fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>> {
        let reply: ParentReply = self.eval(scripts::parent(element.raw())).await?;
        Ok(reply.id.map(ElementHandle::from_raw))
    }

    async fn has_element_id(&self, id: &str) -> Result<bool> {
        let reply: PresentReply = self.eval(scripts::has_element_id(id)).await?;
        Ok(reply.present)
    }

    async fn append_control(&self, anchor: ElementHandle, control: &ControlSpec) -> Result<()> {
        let reply: StatusReply = self
            .eval(scripts::append_control(
                anchor.raw(),
                &control.id,
                &control.label,
            ))
            .await?;
        match reply.status.as_str() {
            "ok" | "exists" => Ok(()),
            _ => Err(SweepError::ElementDetached(anchor.to_string())),
        }
    }

    async fn reload(&self) -> Result<()> {
        self.page.reload().await?;
        Ok(())
    }
}
