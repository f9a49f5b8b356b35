//! Data models for Discord application command interactions.
//!
//! This module contains the interaction payload and the entities commands
//! receive as arguments or context.

pub mod entity;
pub mod interaction;
pub mod types;

pub use entity::{
    Attachment, Channel, ChannelType, Guild, GuildChannel, Member, Mentionable, MessageChannel,
    Role, User,
};
pub use interaction::{CommandData, CommandOption, InteractionEvent, ResolvedData};
