//! # Slashbind
//!
//! Typed argument translation, context injection and access gating for
//! slash-command bots.
//!
//! ## Overview
//!
//! Slashbind sits between a chat platform's raw interaction payload and a
//! command handler's strongly-typed parameter list. Handlers are plain async
//! functions; their options are converted from the payload, their context
//! parameters are injected by type, permission and visibility rules are
//! enforced before anything runs, and return values become platform
//! effects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────────────────────────┐
//! │   Adapter   │────▶│   Engine    │────▶│ Command "ban"  (gate ─▶ invoke)      │──▶ Responder
//! │ (Discord)   │     │ (timeout,   │────▶│ Command "roll" (gate ─▶ invoke)      │──▶ Responder
//! └─────────────┘     │  cancel)    │     └──────────────────────────────────────┘
//!                     └─────────────┘
//! ```
//!
//! - **Adapters**: Platform payload models, option extraction and defaults
//! - **Engine**: Frozen registries, command table, timeout and cancellation
//! - **Commands**: Tower services (GateLayer + InvokeService)
//! - **Handlers**: User-defined async functions (Axum-style)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use slashbind::prelude::*;
//! use slashbind::discord::{DiscordPlatform, InteractionEvent, Member, User};
//!
//! async fn ban(target: Member, reason: Option<String>, moderator: User) -> String {
//!     format!("{} banned {}", moderator.display_name(), target.display_name())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     init_from_config(&config.logging);
//!
//!     let platform = DiscordPlatform::builder(application_id).build();
//!     let mut engine = Engine::builder(config).platform(&platform)?.build()?;
//!     engine.register(
//!         CommandSpec::new("ban")
//!             .option::<Member>("target")
//!             .option::<Option<String>>("reason")
//!             .context::<User>()
//!             .require(Permission::BanMembers),
//!         ban,
//!     )?;
//!
//!     engine.respond(InteractionEvent::parse(&body)?.into_invocation(), &responder).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `discord`: Enable the Discord adapter (default)
//! - `toml-config`: Read `slashbind.toml` (default)
//! - `yaml-config`: Read `slashbind.yaml`
//! - `json-log`: JSON log output

pub use slashbind_core as core;
#[cfg(feature = "discord")]
pub use slashbind_adapter_discord as discord;
pub use slashbind_framework as framework;
pub use slashbind_runtime as runtime;

/// Prelude module for convenient imports.
///
/// This module provides all commonly used types for building command
/// handlers:
///
/// ```rust,ignore
/// use slashbind::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use slashbind_runtime::logging::init_from_config;
    pub use slashbind_runtime::{Engine, SlashbindConfig, load_config};

    // Commands - declaration and grouping
    pub use slashbind_framework::{Command, CommandGroup, CommandSpec, Handler};

    // Handler values
    pub use slashbind_core::{
        Deferred, Embed, InteractionContext, Invocation, Permission, PermissionSet,
        PlatformEffect, Visibility,
    };

    // Core traits for custom implementations
    pub use slashbind_core::{Platform, RawValueExtractor, Responder, impl_typed};
}
