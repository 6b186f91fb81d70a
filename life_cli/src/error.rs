//! CLI errors and their exit codes.

use thiserror::Error;

use life_core::{ConfigError, ControllerError};
use world_rules::ContentError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("content error: {0}")]
    Content(#[from] ContentError),

    #[error("{0}")]
    Controller(#[from] ControllerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// 2 for usage and configuration problems, 1 for failures while running.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) | CliError::Config(_) | CliError::Content(_) => 2,
            CliError::Controller(_) | CliError::Io(_) => 1,
        }
    }
}
