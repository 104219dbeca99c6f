//! Error types for branchsweep

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] Box<figment::Error>),

    #[error("CDP connection failed: {0}")]
    CdpConnectionFailed(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("Browser operation failed: {0}")]
    BrowserOperation(String),

    #[error("Script evaluation failed: {0}")]
    ScriptEvaluation(String),

    #[error("Element is no longer attached to the document: {0}")]
    ElementDetached(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Prompt failed: {0}")]
    PromptFailed(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl From<figment::Error> for SweepError {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<chromiumoxide::error::CdpError> for SweepError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::BrowserOperation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
