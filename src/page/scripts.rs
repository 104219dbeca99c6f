//! Page-side scripts evaluated by `CdpPage`.
//!
//! Elements are tracked in `window.__branchsweep`: a registry that hands out a
//! stable integer per element (the Rust-side `ElementHandle`). It only holds
//! weak references, so elements the host drops can be collected; their ids
//! then resolve to nothing. Every script
//! returns a JSON object so that `null` results survive the CDP round-trip.

/// Runtime binding the page calls to push signals back to us.
pub const SIGNAL_BINDING: &str = "__branchsweepSignal";

pub const PAYLOAD_MUTATIONS: &str = "mutations";
pub const PAYLOAD_ACTIVATE: &str = "activate";

const PRELUDE: &str = r#"
  const r = (window.__branchsweep ??= { seq: 0, els: new Map(), ids: new WeakMap() });
  const track = (el) => {
    let id = r.ids.get(el);
    if (id === undefined) {
      id = ++r.seq;
      r.ids.set(el, id);
      r.els.set(id, new WeakRef(el));
    }
    return id;
  };
  const get = (id) => {
    const ref = r.els.get(id);
    const el = ref && ref.deref();
    if (ref && !el) r.els.delete(id);
    return el;
  };
"#;

fn js(value: &impl serde::Serialize) -> String {
    // Strings and integers always serialize.
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn wrap(body: &str) -> String {
    format!("(() => {{{}{}}})()", PRELUDE, body)
}

pub fn query_all(scope: Option<u64>, selector: &str) -> String {
    wrap(&format!(
        r#"
  const scope = {scope};
  const root = scope === null ? document : get(scope);
  if (!root) return {{ found: false, ids: [] }};
  return {{ found: true, ids: Array.from(root.querySelectorAll({selector})).map(track) }};
"#,
        scope = js(&scope),
        selector = js(&selector),
    ))
}

pub fn is_attached(id: u64) -> String {
    wrap(&format!(
        r#"
  const el = get({id});
  return {{ attached: !!el && el.isConnected }};
"#
    ))
}

pub fn activate(id: u64) -> String {
    wrap(&format!(
        r#"
  const el = get({id});
  if (!el) return {{ status: "missing" }};
  if (!el.isConnected) return {{ status: "detached" }};
  el.click();
  return {{ status: "ok" }};
"#
    ))
}

pub fn read_text(id: u64) -> String {
    wrap(&format!(
        r#"
  const el = get({id});
  return {{ text: el ? (el.textContent || "").trim() : null }};
"#
    ))
}

pub fn parent(id: u64) -> String {
    wrap(&format!(
        r#"
  const el = get({id});
  return {{ id: el && el.parentElement ? track(el.parentElement) : null }};
"#
    ))
}

pub fn has_element_id(id: &str) -> String {
    format!(
        "(() => ({{ present: document.getElementById({}) !== null }}))()",
        js(&id)
    )
}

pub fn append_control(anchor: u64, control_id: &str, label: &str) -> String {
    wrap(&format!(
        r#"
  if (document.getElementById({control_id}) !== null) return {{ status: "exists" }};
  const anchor = get({anchor});
  if (!anchor || !anchor.isConnected) return {{ status: "detached" }};
  const button = document.createElement("button");
  button.id = {control_id};
  button.type = "button";
  button.className = "btn btn-sm btn-danger";
  button.style.marginLeft = "8px";
  button.textContent = {label};
  button.addEventListener("click", (event) => {{
    event.preventDefault();
    const notify = window[{binding}];
    if (typeof notify === "function") notify({payload});
  }});
  anchor.appendChild(button);
  return {{ status: "ok" }};
"#,
        control_id = js(&control_id),
        label = js(&label),
        binding = js(&SIGNAL_BINDING),
        payload = js(&PAYLOAD_ACTIVATE),
    ))
}

/// Installs one `MutationObserver` per document; each batch containing added
/// nodes becomes one `mutations` signal. Also fires once on install so the
/// first render is seen.
pub fn mutation_observer() -> String {
    format!(
        r#"(() => {{
  if (window.__branchsweepObserver) return {{ installed: false }};
  const notify = () => {{
    const f = window[{binding}];
    if (typeof f === "function") f({payload});
  }};
  const start = () => {{
    const observer = new MutationObserver((records) => {{
      if (records.some((m) => m.addedNodes.length > 0)) notify();
    }});
    observer.observe(document.documentElement || document, {{ childList: true, subtree: true }});
    window.__branchsweepObserver = observer;
    notify();
  }};
  if (document.documentElement) start();
  else document.addEventListener("DOMContentLoaded", start, {{ once: true }});
  return {{ installed: true }};
}})()"#,
        binding = js(&SIGNAL_BINDING),
        payload = js(&PAYLOAD_MUTATIONS),
    )
}

pub fn alert(message: &str) -> String {
    format!("(() => {{ window.alert({}); return {{ ok: true }}; }})()", js(&message))
}

pub fn confirm(message: &str) -> String {
    format!(
        "(() => ({{ accepted: window.confirm({}) === true }}))()",
        js(&message)
    )
}
