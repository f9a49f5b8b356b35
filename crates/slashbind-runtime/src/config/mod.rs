//! Configuration module for the slashbind runtime.
//!
//! This module provides layered configuration loading (defaults, files,
//! environment) and validation for logging, dispatch, conversion, access and
//! reply message settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    AccessConfig, ConversionConfig, DispatchConfig, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, MessagesConfig, SlashbindConfig, SpanEventConfig,
};
pub use validation::validate_config;
