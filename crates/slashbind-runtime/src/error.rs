//! Runtime error types.

use thiserror::Error;

use slashbind_core::{ApiError, RegistryError};
use slashbind_framework::CommandError;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A converter, provider or result handler registration failed.
    #[error("Registration error: {0}")]
    Registry(#[from] RegistryError),

    /// A command failed its registration checks.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// A command with the same name is already registered.
    #[error("Command already registered: {0}")]
    DuplicateCommand(String),

    /// No command is registered under the invoked name.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The responder failed to deliver an effect.
    #[error("Responder error: {0}")]
    Respond(#[from] ApiError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
