//! Configuration
//!
//! Layered with figment: built-in defaults, then the TOML file, then
//! `BRANCHSWEEP_*` environment variables (nested keys separated by `__`, e.g.
//! `BRANCHSWEEP_SWEEP__DELETE_DELAY_MS=2000`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SweepError};
use crate::page::ControlSpec;
use crate::sweep::Matcher;

pub const ENV_PREFIX: &str = "BRANCHSWEEP_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sweep: SweepConfig,
    pub landmark: LandmarkConfig,
    pub control: ControlConfig,
    pub browser: BrowserConfig,
}

/// Host DOM contract and timing for a deletion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Settle time between rows.
    pub delete_delay_ms: u64,
    /// Wait between a trigger and probing for its dialog.
    pub dialog_render_delay_ms: u64,
    pub row_selector: String,
    pub trigger_selector: String,
    pub name_selector: String,
    /// Where an open confirmation dialog may be found, in priority order.
    pub dialog_selectors: Vec<String>,
    pub confirm_selectors: Vec<Matcher>,
    pub close_selectors: Vec<Matcher>,
    /// Reported name for rows whose name element is missing.
    pub placeholder_name: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            delete_delay_ms: 1000,
            dialog_render_delay_ms: 300,
            row_selector: "table tbody tr, li.Box-row".to_string(),
            trigger_selector:
                r#"button[aria-label^="Delete branch"], button.js-branch-destroy"#.to_string(),
            name_selector: r#"a[href*="/tree/"], a.branch-name"#.to_string(),
            dialog_selectors: vec![
                r#"[role="dialog"]"#.to_string(),
                "dialog[open]".to_string(),
            ],
            confirm_selectors: vec![
                Matcher::css(r#"button[data-variant="danger"]"#),
                Matcher::css_with_text("button", "Delete"),
                Matcher::css_with_text("button", "Delete branch"),
                Matcher::css(r#"button[type="submit"]"#),
            ],
            close_selectors: vec![
                Matcher::css(r#"button[aria-label="Close"]"#),
                Matcher::css_with_text("button", "Cancel"),
            ],
            placeholder_name: "(unknown)".to_string(),
        }
    }
}

impl SweepConfig {
    pub fn delete_delay(&self) -> Duration {
        Duration::from_millis(self.delete_delay_ms)
    }

    pub fn dialog_render_delay(&self) -> Duration {
        Duration::from_millis(self.dialog_render_delay_ms)
    }
}

/// Where the control is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    /// Structural match for the listing's header region.
    pub selector: String,
    /// Fallback: headings scanned for `heading_text`.
    pub heading_selector: String,
    pub heading_text: String,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            selector: r#"[data-testid="branches-header"], .Subhead"#.to_string(),
            heading_selector: "h1, h2, h3, h4, h5, h6".to_string(),
            heading_text: "Branches".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Reserved element id; at most one element with it exists at a time.
    pub id: String,
    pub label: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            id: "branchsweep-delete-all".to_string(),
            label: "Delete all branches".to_string(),
        }
    }
}

impl ControlConfig {
    pub fn spec(&self) -> ControlSpec {
        ControlSpec {
            id: self.id.clone(),
            label: self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Existing browser to attach to (port or ws:// URL). Launches one when unset.
    pub cdp: Option<String>,
    pub executable: Option<String>,
    pub headless: bool,
    /// Upper bound on one CDP call; in-page prompts hold a call open until answered.
    pub request_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            cdp: None,
            executable: None,
            headless: false,
            request_timeout_secs: 600,
        }
    }
}

impl BrowserConfig {
    /// Executable path with `~` and environment variables expanded.
    pub fn executable_path(&self) -> Option<PathBuf> {
        self.executable.as_deref().map(|raw| {
            let expanded = shellexpand::full(raw)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            PathBuf::from(expanded)
        })
    }
}

impl Config {
    /// Default config file location (`<config dir>/branchsweep/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("branchsweep").join("config.toml"))
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path().as_deref())
    }

    /// Load with `path` as the file layer; a missing file is skipped.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            tracing::debug!("config file: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sweep.row_selector.trim().is_empty() {
            return Err(SweepError::ConfigError(
                "sweep.row_selector must not be empty".to_string(),
            ));
        }
        if self.sweep.trigger_selector.trim().is_empty() {
            return Err(SweepError::ConfigError(
                "sweep.trigger_selector must not be empty".to_string(),
            ));
        }
        if self.sweep.confirm_selectors.is_empty() {
            return Err(SweepError::ConfigError(
                "sweep.confirm_selectors needs at least one matcher".to_string(),
            ));
        }
        if self.control.id.trim().is_empty() {
            return Err(SweepError::ConfigError(
                "control.id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
