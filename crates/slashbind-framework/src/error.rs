//! Error types for the slashbind framework.

use std::time::Duration;

use slashbind_core::{InvalidArguments, Mismatch, MissingPermissions, NotVisible, ResultError};
use thiserror::Error;

/// Defects found while registering a command.
///
/// These are raised once at startup and never during dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The handler takes a different number of parameters than declared.
    #[error("command `{command}` declares {declared} parameters but its handler takes {actual}")]
    Arity {
        command: String,
        declared: usize,
        actual: usize,
    },

    /// A declared parameter type differs from the handler's parameter type.
    #[error(
        "command `{command}` declares `{parameter}` as {declared} but its handler expects {actual}"
    )]
    SignatureMismatch {
        command: String,
        parameter: String,
        declared: String,
        actual: String,
    },

    /// An option parameter has no registered converter.
    #[error("command `{command}`: no converter for `{parameter}` of type {target}")]
    NoConverter {
        command: String,
        parameter: String,
        target: String,
    },

    /// The handler's return type has no result handler.
    #[error("command `{command}`: unsupported return type {target}")]
    UnsupportedReturnType { command: String, target: String },
}

/// Failures of a single command dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The gate denied the invocation.
    #[error("{0}")]
    PermissionDenied(MissingPermissions),

    /// The command is not visible in the invocation's context.
    #[error("{0}")]
    NotVisible(NotVisible),

    /// One or more parameters failed to translate.
    #[error("{0}")]
    InvalidArguments(InvalidArguments),

    /// A translated value did not match the handler signature.
    #[error("handler signature mismatch: {0}")]
    Signature(#[from] Mismatch),

    /// The return value could not be turned into an effect.
    #[error(transparent)]
    Result(#[from] ResultError),

    /// The invocation was cancelled.
    #[error("invocation cancelled")]
    Cancelled,

    /// The invocation did not finish in time.
    #[error("invocation timed out after {0:?}")]
    Timeout(Duration),
}

impl DispatchError {
    /// Returns `true` for failures caused by the user rather than the bot.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_) | Self::NotVisible(_) | Self::InvalidArguments(_)
        )
    }
}

/// Result type for command registration.
pub type CommandResult<T> = Result<T, CommandError>;

/// Result type for command dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;
