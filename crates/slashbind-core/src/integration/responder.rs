//! Responder trait: the transport boundary that delivers effects.
//!
//! The engine never performs network calls. A `Responder` receives the final
//! [`PlatformEffect`] of an invocation and delivers it however the platform
//! requires (interaction callback, webhook, test recorder).

use async_trait::async_trait;
use thiserror::Error;

use crate::foundation::effect::PlatformEffect;
use crate::foundation::invocation::Invocation;

/// Result type for responder calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error type for responder calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The interaction can no longer be answered.
    #[error("interaction expired")]
    Expired,

    /// The platform rejected the response.
    #[error("API error ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Failed to serialize the response.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Delivers platform effects.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Delivers `effect` as the response to `invocation`.
    async fn respond(&self, invocation: &Invocation, effect: PlatformEffect) -> ApiResult<()>;
}
