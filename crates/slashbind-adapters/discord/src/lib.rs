//! # Slashbind Adapter for Discord
//!
//! This crate connects slashbind to Discord application command
//! interactions.
//!
//! ## Overview
//!
//! The adapter handles:
//!
//! - Interaction payload parsing, including sub-command nesting and
//!   `data.resolved` entities
//! - Option extraction for the argument translator
//! - Default converters for primitives and Discord entities
//! - Default context providers (guild, channel, member, user, event, client)
//! - Interaction callback responses
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use slashbind_adapter_discord::{DiscordPlatform, InteractionCallback, InteractionEvent};
//! use slashbind_runtime::{Engine, load_config};
//!
//! let platform = DiscordPlatform::builder(application_id).build();
//! let mut engine = Engine::builder(load_config()?).platform(&platform)?.build()?;
//! engine.register(CommandSpec::new("ping"), || async { "pong".to_string() })?;
//!
//! let responder = InteractionCallback::new(platform.client().clone(), send);
//! let event = InteractionEvent::parse(&body)?;
//! engine.respond(event.into_invocation(), &responder).await?;
//! ```
//!
//! ## Converters
//!
//! | Type | Raw kind |
//! |------|----------|
//! | `String` | STRING |
//! | `i64`, `i32` | INTEGER |
//! | `bool` | BOOLEAN |
//! | `f64`, `f32` | NUMBER (`f32` also reads STRING) |
//! | [`User`], [`Member`] | USER |
//! | [`Role`] | ROLE |
//! | [`Mentionable`] | MENTIONABLE |
//! | [`Channel`], [`GuildChannel`] | CHANNEL |
//! | [`Attachment`] | ATTACHMENT |

pub mod config;
pub mod convert;
pub mod extractor;
pub mod model;
mod platform;
pub mod response;

pub use config::DiscordConfig;
pub use extractor::InteractionOptions;
pub use platform::{Client, DiscordPlatform, DiscordPlatformBuilder};
pub use response::{ApiRequest, InteractionCallback, InteractionResponse, MessageData, Method, SendFn};

// Re-export model types
pub use model::entity::{
    Attachment, Channel, ChannelType, Guild, GuildChannel, Member, Mentionable, MessageChannel,
    Role, User,
};
pub use model::interaction::{CommandData, CommandOption, InteractionEvent, ResolvedData};
