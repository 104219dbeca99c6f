//! Browser connection: attach over CDP or launch, then pick the target tab.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::config::BrowserConfig;
use crate::error::{Result, SweepError};

/// A connected browser plus the task driving its CDP handler.
pub struct BrowserSession {
    pub browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Attach to `cdp` (port, host:port or ws:// URL) when given, otherwise launch a browser.
    pub async fn open(config: &BrowserConfig, cdp: Option<&str>) -> Result<Self> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);

        let (browser, mut handler) = match cdp {
            Some(endpoint) => {
                let ws_url = resolve_ws_url(endpoint).await?;
                tracing::info!(url = %ws_url, "connecting to browser");
                let handler_config = HandlerConfig {
                    request_timeout,
                    ..Default::default()
                };
                Browser::connect_with_config(ws_url.clone(), handler_config)
                    .await
                    .map_err(|e| {
                        SweepError::CdpConnectionFailed(format!("{}: {}", ws_url, e))
                    })?
            }
            None => {
                let mut builder = ChromeConfig::builder().request_timeout(request_timeout);
                if !config.headless {
                    builder = builder.with_head();
                }
                if let Some(path) = config.executable_path() {
                    builder = builder.chrome_executable(path);
                }
                let chrome_config = builder.build().map_err(SweepError::BrowserLaunch)?;

                tracing::info!(
                    headless = config.headless,
                    executable = ?config.executable,
                    "launching browser"
                );
                Browser::launch(chrome_config)
                    .await
                    .map_err(|e| SweepError::BrowserLaunch(e.to_string()))?
            }
        };

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Reuse an open tab already showing `url`, or open a new one.
    ///
    /// Without a url, the first open tab on a branch listing is used.
    pub async fn target_page(&mut self, url: Option<&str>) -> Result<Page> {
        if let Err(e) = self.browser.fetch_targets().await {
            tracing::debug!("fetch_targets failed: {}", e);
        }
        // Give the handler a moment to attach to the targets it just learned about.
        tokio::time::sleep(Duration::from_millis(200)).await;

        for page in self.browser.pages().await? {
            let Ok(Some(current)) = page.url().await else {
                continue;
            };
            let hit = match url {
                Some(url) => url_matches(&current, url),
                None => is_branch_listing(&current),
            };
            if hit {
                tracing::info!(url = %current, "reusing open tab");
                return Ok(page);
            }
        }

        let Some(url) = url else {
            return Err(SweepError::InvalidTarget(
                "no target given and no open tab shows a branch listing".to_string(),
            ));
        };

        tracing::info!(url, "opening new tab");
        let page = self.browser.new_page(url).await?;
        page.wait_for_navigation().await?;
        Ok(page)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// Where the browser's debugger lives, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DebugEndpoint {
    /// Browser websocket, used as is.
    WebSocket(String),
    /// HTTP debug server; the websocket is looked up at `/json/version`.
    Http(String),
}

impl DebugEndpoint {
    /// Accepts `ws://`/`wss://` URLs, `http://` debug server URLs, `host:port`
    /// or a bare port (on localhost).
    fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim().trim_end_matches('/');
        if raw.starts_with("ws://") || raw.starts_with("wss://") {
            return Ok(Self::WebSocket(raw.to_string()));
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(Self::Http(raw.to_string()));
        }
        if let Ok(port) = raw.parse::<u16>() {
            return Ok(Self::Http(format!("http://127.0.0.1:{}", port)));
        }
        match raw.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Self::Http(format!("http://{}", raw)))
            }
            _ => Err(SweepError::CdpConnectionFailed(format!(
                "unrecognized CDP endpoint {:?}; expected a port, host:port or ws:// URL",
                raw
            ))),
        }
    }
}

#[derive(Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: Option<String>,
}

/// Browser websocket URL for a `--cdp` value.
pub async fn resolve_ws_url(endpoint: &str) -> Result<String> {
    let base = match DebugEndpoint::parse(endpoint)? {
        DebugEndpoint::WebSocket(url) => return Ok(url),
        DebugEndpoint::Http(base) => base,
    };

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| SweepError::CdpConnectionFailed(e.to_string()))?;

    let version_url = format!("{}/json/version", base);
    tracing::debug!(url = %version_url, "looking up browser websocket");
    let info: VersionInfo = client
        .get(&version_url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| {
            SweepError::CdpConnectionFailed(format!(
                "{} is not reachable (browser started with --remote-debugging-port?): {}",
                base, e
            ))
        })?
        .json()
        .await
        .map_err(|e| SweepError::CdpConnectionFailed(format!("bad /json/version reply: {}", e)))?;

    info.web_socket_debugger_url.ok_or_else(|| {
        SweepError::CdpConnectionFailed(format!("{} reports no browser websocket", base))
    })
}

/// Turn user input into the URL of a branch listing page.
///
/// Accepts a full URL, a scheme-less host/path (https is assumed), or an
/// `owner/repo` shorthand (expanded to the GitHub branches page).
pub fn resolve_target_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(SweepError::InvalidTarget("empty input".to_string()));
    }

    if let Some(rest) = trimmed.strip_prefix("//") {
        return Ok(format!("https://{}", rest));
    }

    if trimmed.contains("://") {
        return Ok(trimmed.to_string());
    }

    if is_repo_shorthand(trimmed) {
        return Ok(format!("https://github.com/{}/branches", trimmed));
    }

    Ok(format!("https://{}", trimmed))
}

/// `owner/repo`: exactly two non-empty segments, no dots in the owner.
fn is_repo_shorthand(input: &str) -> bool {
    let mut parts = input.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) => {
            !owner.is_empty()
                && !repo.is_empty()
                && !owner.contains(['.', ':'])
                && owner
                    .chars()
                    .chain(repo.chars())
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }
        _ => false,
    }
}

/// Whether a tab showing `current` is the listing at `target` (query and
/// fragment ignored, trailing slash ignored).
fn url_matches(current: &str, target: &str) -> bool {
    fn base(url: &str) -> &str {
        let end = url.find(['?', '#']).unwrap_or(url.len());
        url[..end].trim_end_matches('/')
    }
    base(current) == base(target)
}

fn is_branch_listing(url: &str) -> bool {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = url[..end].trim_end_matches('/');
    path.ends_with("/branches") || path.contains("/branches/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_shorthand_expands_to_branches_page() {
        assert_eq!(
            resolve_target_url("rust-lang/cargo").unwrap(),
            "https://github.com/rust-lang/cargo/branches"
        );
    }

    #[test]
    fn full_url_kept() {
        assert_eq!(
            resolve_target_url("https://git.example.com/o/r/branches/yours").unwrap(),
            "https://git.example.com/o/r/branches/yours"
        );
    }

    #[test]
    fn host_without_scheme_gets_https() {
        assert_eq!(
            resolve_target_url("github.com/o/r/branches").unwrap(),
            "https://github.com/o/r/branches"
        );
        assert_eq!(
            resolve_target_url("localhost:3000/o/r/branches").unwrap(),
            "https://localhost:3000/o/r/branches"
        );
    }

    #[test]
    fn host_with_one_path_segment_is_not_shorthand() {
        assert_eq!(
            resolve_target_url("example.com/branches").unwrap(),
            "https://example.com/branches"
        );
    }

    #[test]
    fn protocol_relative_url() {
        assert_eq!(
            resolve_target_url("//github.com/o/r/branches").unwrap(),
            "https://github.com/o/r/branches"
        );
    }

    #[test]
    fn empty_target_is_rejected() {
        assert!(resolve_target_url("").is_err());
        assert!(resolve_target_url("   ").is_err());
    }

    #[test]
    fn url_match_ignores_query_and_trailing_slash() {
        assert!(url_matches(
            "https://github.com/o/r/branches/?page=2",
            "https://github.com/o/r/branches"
        ));
        assert!(!url_matches(
            "https://github.com/o/r/branches/stale",
            "https://github.com/o/r/branches"
        ));
    }

    #[test]
    fn branch_listing_urls() {
        assert!(is_branch_listing("https://github.com/o/r/branches"));
        assert!(is_branch_listing("https://github.com/o/r/branches/yours?page=1"));
        assert!(!is_branch_listing("https://github.com/o/r/pulls"));
    }

    #[test]
    fn endpoint_forms() {
        assert_eq!(
            DebugEndpoint::parse("ws://127.0.0.1:9333/devtools/browser/abc").unwrap(),
            DebugEndpoint::WebSocket("ws://127.0.0.1:9333/devtools/browser/abc".to_string())
        );
        assert_eq!(
            DebugEndpoint::parse("9222").unwrap(),
            DebugEndpoint::Http("http://127.0.0.1:9222".to_string())
        );
        assert_eq!(
            DebugEndpoint::parse("devbox:9222").unwrap(),
            DebugEndpoint::Http("http://devbox:9222".to_string())
        );
        assert_eq!(
            DebugEndpoint::parse("http://localhost:9222/").unwrap(),
            DebugEndpoint::Http("http://localhost:9222".to_string())
        );
    }

    #[test]
    fn garbage_endpoint_is_rejected() {
        assert!(DebugEndpoint::parse("not-an-endpoint").is_err());
        assert!(DebugEndpoint::parse(":9222").is_err());
    }

    #[tokio::test]
    async fn websocket_needs_no_lookup() {
        let url = resolve_ws_url("ws://127.0.0.1:9333/devtools/browser/abc")
            .await
            .unwrap();
        assert_eq!(url, "ws://127.0.0.1:9333/devtools/browser/abc");
    }
}
