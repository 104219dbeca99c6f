//! In-memory host page
//!
//! A small scriptable document tree implementing [`HostPage`]. Elements carry a
//! list of [`Effect`]s that run when they are activated, which is enough to play
//! the part of a host page in either deletion flow:
//! - immediate: the trigger detaches its own row
//! - confirm-dialog: the trigger opens a dialog whose confirm button detaches the row
//!
//! Selectors support the subset the sweep needs: comma-separated compound
//! selectors made of a tag, `#id` and `.class` parts (`button.danger`, `#x`, `h2`).

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{ControlSpec, ElementHandle, HostPage, PageSignal, SignalStream};
use crate::error::{Result, SweepError};

const ROOT: u64 = 0;

/// What happens when an element is activated.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Remove an element (and its subtree) from the document.
    Detach(ElementHandle),
    /// Render a confirmation dialog for `row`.
    OpenDialog { row: ElementHandle, shape: DialogShape },
    /// The activation raises an error; later effects do not run.
    Fail(String),
    /// Push a signal to subscribers.
    Emit(PageSignal),
}

/// Which controls a rendered dialog carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogShape {
    pub confirm: ConfirmButton,
    /// A `button.close` that dismisses the dialog.
    pub closable: bool,
}

impl Default for DialogShape {
    fn default() -> Self {
        Self {
            confirm: ConfirmButton::Working,
            closable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmButton {
    /// Removes the row and the dialog.
    Working,
    /// Present, but clicking it raises an error.
    Failing,
    Missing,
}

/// How the host page deletes a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFlow {
    Immediate,
    ConfirmDialog,
}

#[derive(Debug)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: Option<String>,
    parent: Option<u64>,
    children: Vec<u64>,
    effects: Vec<Effect>,
    injected: bool,
}

#[derive(Debug)]
struct Dom {
    nodes: Vec<Node>,
    activations: Vec<ElementHandle>,
    reloads: usize,
    reload_failure: Option<String>,
    signals: Option<mpsc::UnboundedSender<PageSignal>>,
}

/// Scriptable in-memory document.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    dom: Arc<Mutex<Dom>>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    pub fn new() -> Self {
        Self {
            dom: Arc::new(Mutex::new(Dom {
                nodes: vec![element("html", &[], None)],
                activations: Vec::new(),
                reloads: 0,
                reload_failure: None,
                signals: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Dom> {
        // A poisoned lock only means a test panicked mid-mutation.
        self.dom.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribe to page signals. Replaces any previous subscriber.
    pub fn signals(&self) -> SignalStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().signals = Some(tx);
        Box::pin(UnboundedReceiverStream::new(rx))
    }

    /// Drop the subscriber so its stream ends once drained.
    pub fn close_signals(&self) {
        self.lock().signals = None;
    }

    /// Append an element under `parent` (or the document root).
    pub fn add_element(
        &self,
        parent: Option<ElementHandle>,
        tag: &str,
        classes: &[&str],
        text: Option<&str>,
    ) -> ElementHandle {
        let mut dom = self.lock();
        let handle = dom.insert(
            parent.map_or(ROOT, ElementHandle::raw),
            element(tag, classes, text),
        );
        dom.emit(PageSignal::Mutations);
        handle
    }

    pub fn set_effects(&self, element: ElementHandle, effects: Vec<Effect>) {
        if let Some(node) = self.lock().nodes.get_mut(element.raw() as usize) {
            node.effects = effects;
        }
    }

    /// Remove an element the way a host re-render would.
    pub fn detach(&self, element: ElementHandle) {
        let mut dom = self.lock();
        dom.detach(element.raw());
        dom.emit(PageSignal::Mutations);
    }

    /// Simulate the user clicking an element, outside of the sweep.
    pub fn click(&self, element: ElementHandle) -> Result<()> {
        self.lock().activate(element.raw())
    }

    /// Every element activated so far, in order.
    pub fn activations(&self) -> Vec<ElementHandle> {
        self.lock().activations.clone()
    }

    /// Make every later reload fail with `reason`.
    pub fn fail_reloads(&self, reason: &str) {
        self.lock().reload_failure = Some(reason.to_string());
    }

    pub fn reload_count(&self) -> usize {
        self.lock().reloads
    }

    /// Attached elements carrying `id`.
    pub fn count_id(&self, id: &str) -> usize {
        let dom = self.lock();
        dom.descendants(ROOT)
            .into_iter()
            .filter(|&n| dom.nodes[n as usize].id.as_deref() == Some(id))
            .count()
    }

    pub fn is_connected(&self, element: ElementHandle) -> bool {
        self.lock().connected(element.raw())
    }

    /// Build a branch listing page: a header landmark and one row per branch.
    ///
    /// Rows listed in `protected` get no delete trigger.
    pub fn branch_listing(branches: &[&str], protected: &[&str], flow: HostFlow) -> (Self, Listing) {
        let page = Self::new();
        let header = page.add_element(None, "div", &["branches-header"], None);
        page.add_element(Some(header), "h2", &[], Some("Branches"));
        let list = page.add_element(None, "ul", &["branch-list"], None);

        let mut rows = Vec::new();
        for &name in branches {
            let row = page.add_element(Some(list), "li", &["branch-row"], None);
            page.add_element(Some(row), "a", &["branch-name"], Some(name));
            let trigger = if protected.contains(&name) {
                None
            } else {
                let trigger = page.add_element(Some(row), "button", &["delete"], Some("Delete"));
                let effect = match flow {
                    HostFlow::Immediate => Effect::Detach(row),
                    HostFlow::ConfirmDialog => Effect::OpenDialog {
                        row,
                        shape: DialogShape::default(),
                    },
                };
                page.set_effects(trigger, vec![effect]);
                Some(trigger)
            };
            rows.push(ListingRow {
                name: name.to_string(),
                row,
                trigger,
            });
        }

        (page, Listing { header, list, rows })
    }
}

/// Handles into a page built by [`MemoryPage::branch_listing`].
#[derive(Debug, Clone)]
pub struct Listing {
    pub header: ElementHandle,
    pub list: ElementHandle,
    pub rows: Vec<ListingRow>,
}

#[derive(Debug, Clone)]
pub struct ListingRow {
    pub name: String,
    pub row: ElementHandle,
    pub trigger: Option<ElementHandle>,
}

impl Dom {
    fn insert(&mut self, parent: u64, mut node: Node) -> ElementHandle {
        let id = self.nodes.len() as u64;
        node.parent = Some(parent);
        self.nodes.push(node);
        if let Some(p) = self.nodes.get_mut(parent as usize) {
            p.children.push(id);
        }
        ElementHandle::from_raw(id)
    }

    fn node(&self, id: u64) -> Result<&Node> {
        self.nodes
            .get(id as usize)
            .ok_or_else(|| SweepError::ElementNotFound(ElementHandle::from_raw(id).to_string()))
    }

    fn connected(&self, mut id: u64) -> bool {
        loop {
            if id == ROOT {
                return true;
            }
            match self.nodes.get(id as usize).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, id: u64) {
        if id == ROOT {
            return;
        }
        let parent = match self.nodes.get_mut(id as usize) {
            Some(node) => node.parent.take(),
            None => return,
        };
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(parent as usize) {
                p.children.retain(|&c| c != id);
            }
        }
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    fn descendants(&self, id: u64) -> Vec<u64> {
        let mut out = Vec::new();
        let mut stack: Vec<u64> = match self.nodes.get(id as usize) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(node) = self.nodes.get(next as usize) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn emit(&self, signal: PageSignal) {
        if let Some(tx) = &self.signals {
            let _ = tx.send(signal);
        }
    }

    fn activate(&mut self, id: u64) -> Result<()> {
        if !self.connected(id) {
            return Err(SweepError::ElementDetached(
                ElementHandle::from_raw(id).to_string(),
            ));
        }
        self.activations.push(ElementHandle::from_raw(id));

        let effects = self.node(id)?.effects.clone();
        for effect in effects {
            match effect {
                Effect::Detach(target) => {
                    self.detach(target.raw());
                    self.emit(PageSignal::Mutations);
                }
                Effect::OpenDialog { row, shape } => self.open_dialog(row, shape),
                Effect::Fail(reason) => return Err(SweepError::BrowserOperation(reason)),
                Effect::Emit(signal) => self.emit(signal),
            }
        }
        Ok(())
    }

    fn open_dialog(&mut self, row: ElementHandle, shape: DialogShape) {
        let dialog = self.insert(ROOT, element("div", &["dialog"], None));
        let confirm_effects = match shape.confirm {
            ConfirmButton::Working => Some(vec![Effect::Detach(row), Effect::Detach(dialog)]),
            ConfirmButton::Failing => Some(vec![Effect::Fail("delete request rejected".to_string())]),
            ConfirmButton::Missing => None,
        };
        if let Some(effects) = confirm_effects {
            let confirm = self.insert(dialog.raw(), element("button", &["danger"], Some("Delete")));
            self.nodes[confirm.raw() as usize].effects = effects;
        }
        if shape.closable {
            let close = self.insert(dialog.raw(), element("button", &["close"], Some("Cancel")));
            self.nodes[close.raw() as usize].effects = vec![Effect::Detach(dialog)];
        }
        self.emit(PageSignal::Mutations);
    }

    fn matches(&self, id: u64, selector: &str) -> bool {
        let Some(node) = self.nodes.get(id as usize) else {
            return false;
        };
        selector
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .any(|compound| compound_matches(node, compound))
    }
}

fn element(tag: &str, classes: &[&str], text: Option<&str>) -> Node {
    Node {
        tag: tag.to_string(),
        id: None,
        classes: classes.iter().map(|c| c.to_string()).collect(),
        text: text.map(str::to_string),
        parent: None,
        children: Vec::new(),
        effects: Vec::new(),
        injected: false,
    }
}

/// Match one compound selector such as `button.delete` or `#id.class`.
fn compound_matches(node: &Node, compound: &str) -> bool {
    let mut tag = String::new();
    let mut parts: Vec<(char, String)> = Vec::new();
    for c in compound.chars() {
        match c {
            '.' | '#' => parts.push((c, String::new())),
            _ => match parts.last_mut() {
                Some((_, part)) => part.push(c),
                None => tag.push(c),
            },
        }
    }

    if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&node.tag) {
        return false;
    }
    parts.iter().all(|(kind, value)| match kind {
        '.' => node.classes.iter().any(|c| c == value),
        _ => node.id.as_deref() == Some(value.as_str()),
    })
}

#[async_trait]
impl HostPage for MemoryPage {
    async fn query_all(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> Result<Vec<ElementHandle>> {
        let dom = self.lock();
        let root = scope.map_or(ROOT, ElementHandle::raw);
        dom.node(root)?;
        Ok(dom
            .descendants(root)
            .into_iter()
            .filter(|&n| dom.matches(n, selector))
            .map(ElementHandle::from_raw)
            .collect())
    }

    async fn is_attached(&self, element: ElementHandle) -> Result<bool> {
        Ok(self.lock().connected(element.raw()))
    }

    async fn activate(&self, element: ElementHandle) -> Result<()> {
        self.lock().activate(element.raw())
    }

    async fn read_text(&self, element: ElementHandle) -> Result<Option<String>> {
        let dom = self.lock();
        let node = dom.node(element.raw())?;
        Ok(node
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }

    async fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>> {
        let dom = self.lock();
        Ok(dom.node(element.raw())?.parent.map(ElementHandle::from_raw))
    }

    async fn has_element_id(&self, id: &str) -> Result<bool> {
        Ok(self.count_id(id) > 0)
    }

    async fn append_control(&self, anchor: ElementHandle, control: &ControlSpec) -> Result<()> {
        let mut dom = self.lock();
        dom.node(anchor.raw())?;
        let mut node = element("button", &[], Some(&control.label));
        node.id = Some(control.id.clone());
        node.effects = vec![Effect::Emit(PageSignal::Activated)];
        node.injected = true;
        dom.insert(anchor.raw(), node);
        dom.emit(PageSignal::Mutations);
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let mut dom = self.lock();
        if let Some(reason) = &dom.reload_failure {
            return Err(SweepError::BrowserOperation(reason.clone()));
        }
        dom.reloads += 1;
        let injected: Vec<u64> = dom
            .descendants(ROOT)
            .into_iter()
            .filter(|&n| dom.nodes[n as usize].injected)
            .collect();
        for id in injected {
            dom.detach(id);
        }
        dom.emit(PageSignal::Mutations);
        Ok(())
    }
}
