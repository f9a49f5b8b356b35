//! Integration layer - External system interfaces.
//!
//! This module contains interfaces for integrating with external systems:
//! - Platform integrations supplying extractors and defaults
//! - Responders delivering effects over a transport

pub mod platform;
pub mod responder;

pub use platform::Platform;
pub use responder::{ApiError, ApiResult, Responder};
