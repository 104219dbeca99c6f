pub mod config;
pub mod run;
pub mod scan;
pub mod watch;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::page::connect::{resolve_target_url, BrowserSession};
use crate::page::CdpPage;

/// Effective configuration: file/env layers, then global flags on top.
pub(crate) fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(Some(path.as_path()))?,
        None => Config::load()?,
    };

    if cli.cdp.is_some() {
        config.browser.cdp = cli.cdp.clone();
    }
    if cli.headless {
        config.browser.headless = true;
    }

    Ok(config)
}

/// Connect (or launch), then instrument the branch page for `target`.
pub(crate) async fn open_page(
    config: &Config,
    target: Option<&str>,
) -> Result<(BrowserSession, CdpPage)> {
    let url = target.map(resolve_target_url).transpose()?;
    let mut session = BrowserSession::open(&config.browser, config.browser.cdp.as_deref()).await?;
    let page = session.target_page(url.as_deref()).await?;
    let page = CdpPage::attach(page).await?;
    Ok((session, page))
}
