//! Slashbind Runtime - configuration, logging and the dispatch engine.
//!
//! This crate provides:
//! - Layered configuration loading (`SlashbindConfig`, `ConfigLoader`)
//! - Logging configuration (`LoggingBuilder`, `init_from_config`)
//! - The dispatch engine (`Engine`, `EngineBuilder`) which bounds every
//!   invocation by a timeout and its cancellation token and turns failures
//!   into replies
//!
//! ```ignore
//! use slashbind_runtime::{Engine, config::load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let platform = DiscordPlatform::builder(application_id).build();
//!     let mut engine = Engine::builder(config).platform(&platform)?.build()?;
//!     engine.register(CommandSpec::new("ping"), || async { "pong".to_string() })?;
//!
//!     engine.respond(invocation, &responder).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, DispatchConfig, LoggingConfig, MessagesConfig,
    Profile, SlashbindConfig, load_config, load_config_from_file,
};
pub use engine::{Engine, EngineBuilder};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
