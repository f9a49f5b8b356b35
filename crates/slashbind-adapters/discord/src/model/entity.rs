//! Discord entities that commands receive as arguments or context.
//!
//! Entities deserialize from the shapes Discord sends in interaction
//! payloads, including the partial objects found in `data.resolved`.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use slashbind_core::{ConvertError, PermissionSet};

use crate::model::types::{snowflake, snowflake_list, snowflake_opt};

// =============================================================================
// Users and Members
// =============================================================================

/// A Discord user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(with = "snowflake")]
    pub id: u64,
    pub username: String,
    /// Display name chosen by the user.
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
    /// Avatar hash.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Returns the global name, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    /// Returns the mention markup.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A user's membership in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Absent on members inside `data.resolved`; the extractor fills it in.
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default, with = "snowflake_list")]
    pub roles: Vec<u64>,
    #[serde(default)]
    pub joined_at: Option<String>,
    /// Total permissions of the member in the channel, including overwrites.
    #[serde(default)]
    pub permissions: Option<PermissionSet>,
}

impl Member {
    /// Returns the nickname, falling back to the user's display name.
    pub fn display_name(&self) -> &str {
        match (&self.nick, &self.user) {
            (Some(nick), _) => nick,
            (None, Some(user)) => user.display_name(),
            (None, None) => "",
        }
    }

    /// Returns `true` if the member has the role `id`.
    pub fn has_role(&self, id: u64) -> bool {
        self.roles.contains(&id)
    }
}

// =============================================================================
// Roles
// =============================================================================

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(with = "snowflake")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub permissions: PermissionSet,
    #[serde(default)]
    pub mentionable: bool,
    #[serde(default)]
    pub managed: bool,
}

impl Role {
    /// Returns the mention markup.
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

/// A user or a role, as accepted by a MENTIONABLE option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mentionable {
    User(User),
    Role(Role),
}

impl Mentionable {
    /// Returns the id of the mentioned entity.
    pub fn id(&self) -> u64 {
        match self {
            Self::User(user) => user.id,
            Self::Role(role) => role.id,
        }
    }

    /// Returns the mention markup.
    pub fn mention(&self) -> String {
        match self {
            Self::User(user) => user.mention(),
            Self::Role(role) => role.mention(),
        }
    }
}

// =============================================================================
// Channels
// =============================================================================

/// The type of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelType {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildAnnouncement,
    AnnouncementThread,
    PublicThread,
    PrivateThread,
    GuildStageVoice,
    GuildDirectory,
    GuildForum,
    GuildMedia,
    Unknown(u8),
}

impl From<u8> for ChannelType {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildAnnouncement,
            10 => Self::AnnouncementThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            13 => Self::GuildStageVoice,
            14 => Self::GuildDirectory,
            15 => Self::GuildForum,
            16 => Self::GuildMedia,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(kind: ChannelType) -> Self {
        match kind {
            ChannelType::GuildText => 0,
            ChannelType::Dm => 1,
            ChannelType::GuildVoice => 2,
            ChannelType::GroupDm => 3,
            ChannelType::GuildCategory => 4,
            ChannelType::GuildAnnouncement => 5,
            ChannelType::AnnouncementThread => 10,
            ChannelType::PublicThread => 11,
            ChannelType::PrivateThread => 12,
            ChannelType::GuildStageVoice => 13,
            ChannelType::GuildDirectory => 14,
            ChannelType::GuildForum => 15,
            ChannelType::GuildMedia => 16,
            ChannelType::Unknown(code) => code,
        }
    }
}

impl ChannelType {
    /// Returns `true` for channels that belong to a guild.
    pub fn is_guild(self) -> bool {
        !matches!(self, Self::Dm | Self::GroupDm | Self::Unknown(_))
    }

    /// Returns `true` for threads.
    pub fn is_thread(self) -> bool {
        matches!(
            self,
            Self::AnnouncementThread | Self::PublicThread | Self::PrivateThread
        )
    }
}

/// A channel of any type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(with = "snowflake")]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "snowflake_opt")]
    pub guild_id: Option<u64>,
    #[serde(default, with = "snowflake_opt")]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub topic: Option<String>,
    /// Permissions of the invoking member in this channel.
    #[serde(default)]
    pub permissions: Option<PermissionSet>,
}

impl Channel {
    /// Returns the mention markup.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

/// A channel inside a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildChannel(Channel);

impl GuildChannel {
    /// Returns the underlying channel.
    pub fn into_inner(self) -> Channel {
        self.0
    }
}

impl TryFrom<Channel> for GuildChannel {
    type Error = ConvertError;

    fn try_from(channel: Channel) -> Result<Self, Self::Error> {
        if channel.kind.is_guild() {
            Ok(Self(channel))
        } else {
            Err(ConvertError::Unexpected {
                expected: "a guild channel",
                found: format!("{:?} channel", channel.kind),
            })
        }
    }
}

impl Deref for GuildChannel {
    type Target = Channel;

    fn deref(&self) -> &Channel {
        &self.0
    }
}

/// The channel an interaction was triggered in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageChannel(Channel);

impl MessageChannel {
    pub fn new(channel: Channel) -> Self {
        Self(channel)
    }

    /// Returns `true` if the channel is a direct message.
    pub fn is_direct(&self) -> bool {
        matches!(self.0.kind, ChannelType::Dm | ChannelType::GroupDm)
    }
}

impl Deref for MessageChannel {
    type Target = Channel;

    fn deref(&self) -> &Channel {
        &self.0
    }
}

// =============================================================================
// Attachments and Guilds
// =============================================================================

/// A file uploaded through an ATTACHMENT option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(with = "snowflake")]
    pub id: u64,
    pub filename: String,
    pub size: u64,
    pub url: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// The guild an interaction was triggered in.
///
/// Interactions carry a partial guild; `name` is only known when the bot
/// fetched it separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    #[serde(with = "snowflake")]
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Guild {
    /// A guild known only by id.
    pub fn partial(id: u64) -> Self {
        Self {
            id,
            name: None,
            locale: None,
            features: Vec::new(),
        }
    }
}

impl fmt::Display for Guild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "guild {}", self.id),
        }
    }
}

slashbind_core::impl_typed!(
    User,
    Member,
    Role,
    Mentionable,
    Channel,
    GuildChannel,
    MessageChannel,
    Attachment,
    Guild,
);
