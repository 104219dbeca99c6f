pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod page;
pub mod prompt;
pub mod sweep;

pub use config::Config;
pub use error::{Result, SweepError};
