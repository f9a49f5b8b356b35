//! Application command interactions.
//!
//! ```text
//! InteractionEvent { id, token, guild_id, channel, member | user, context }
//! └── CommandData { name, options, resolved }
//!     └── CommandOption { name, type, value | options }   ← sub-commands nest
//! ```
//!
//! # Parsing
//!
//! ```rust,ignore
//! let event = InteractionEvent::parse(&body)?;
//! assert_eq!(event.command_name(), "mod ban");
//! let invocation = event.into_invocation();
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use slashbind_core::{
    Identity, InteractionContext, Invocation, InvocationBuilder, OptionKind, PermissionSet,
};

use crate::model::entity::{Channel, Guild, Member, MessageChannel, User};
use crate::model::types::{snowflake, snowflake_opt};

/// Interaction type code of application commands.
pub const APPLICATION_COMMAND: u8 = 2;

/// Sender id used when an interaction names no invoking user.
pub const UNKNOWN_INVOKER: u64 = 0;

/// An application command interaction as received from Discord.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(with = "snowflake")]
    pub id: u64,
    #[serde(with = "snowflake")]
    pub application_id: u64,
    #[serde(rename = "type")]
    pub kind: u8,
    pub data: CommandData,
    /// Continuation token for responding to the interaction.
    pub token: String,
    #[serde(default, with = "snowflake_opt")]
    pub guild_id: Option<u64>,
    #[serde(default)]
    pub guild: Option<Guild>,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default, with = "snowflake_opt")]
    pub channel_id: Option<u64>,
    /// Sent for invocations inside a guild.
    #[serde(default)]
    pub member: Option<Member>,
    /// Sent for invocations outside a guild.
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub context: Option<InteractionContext>,
    /// Permissions of the bot in the channel.
    #[serde(default)]
    pub app_permissions: Option<PermissionSet>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// The command part of an interaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandData {
    #[serde(with = "snowflake")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub resolved: ResolvedData,
}

/// An option value, or a sub-command with its own options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub focused: bool,
}

/// Entities referenced by options, keyed by id.
///
/// Kept as raw JSON so the extractor can attach the exact objects to a raw
/// value; converters deserialize them on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedData {
    #[serde(default)]
    pub users: Map<String, Value>,
    #[serde(default)]
    pub members: Map<String, Value>,
    #[serde(default)]
    pub roles: Map<String, Value>,
    #[serde(default)]
    pub channels: Map<String, Value>,
    #[serde(default)]
    pub attachments: Map<String, Value>,
}

impl ResolvedData {
    /// Collects the entities that option `id` of `kind` refers to.
    ///
    /// The result is keyed by entity name (`user`, `member`, `role`,
    /// `channel`, `attachment`). Resolved members lack their user, so it is
    /// copied in from `users`.
    pub fn entities(&self, kind: OptionKind, id: &str) -> Option<Value> {
        let mut entities = Map::new();
        let mut insert = |name: &str, table: &Map<String, Value>| {
            if let Some(entity) = table.get(id) {
                entities.insert(name.to_string(), entity.clone());
            }
        };
        match kind {
            OptionKind::User => {
                insert("user", &self.users);
                insert("member", &self.members);
            }
            OptionKind::Mentionable => {
                insert("user", &self.users);
                insert("member", &self.members);
                insert("role", &self.roles);
            }
            OptionKind::Role => insert("role", &self.roles),
            OptionKind::Channel => insert("channel", &self.channels),
            OptionKind::Attachment => insert("attachment", &self.attachments),
            _ => return None,
        }

        if let (Some(Value::Object(member)), Some(user)) =
            (entities.get("member").cloned(), entities.get("user").cloned())
            && !member.contains_key("user")
        {
            let mut member = member;
            member.insert("user".to_string(), user);
            entities.insert("member".to_string(), Value::Object(member));
        }

        (!entities.is_empty()).then_some(Value::Object(entities))
    }
}

impl InteractionEvent {
    /// Parses an interaction payload.
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Returns `true` for application command interactions.
    pub fn is_command(&self) -> bool {
        self.kind == APPLICATION_COMMAND
    }

    /// Returns the invoking user, from the member in guilds.
    pub fn invoker(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|member| member.user.as_ref())
            .or(self.user.as_ref())
    }

    /// Returns where the interaction was triggered.
    ///
    /// Older payloads omit `context`; a guild id then means a guild and
    /// anything else is treated as the bot's direct messages.
    pub fn origin(&self) -> InteractionContext {
        match (self.context, self.guild_id) {
            (Some(context), _) => context,
            (None, Some(_)) => InteractionContext::Guild,
            (None, None) => InteractionContext::BotDm,
        }
    }

    /// Returns the permissions of the invoking member, empty outside guilds.
    pub fn granted(&self) -> PermissionSet {
        self.member
            .as_ref()
            .and_then(|member| member.permissions)
            .unwrap_or_default()
    }

    /// Returns the guild, partial if only its id was sent.
    pub fn guild(&self) -> Option<Guild> {
        self.guild
            .clone()
            .or_else(|| self.guild_id.map(Guild::partial))
    }

    /// Returns the full command name, including sub-command group and
    /// sub-command (`"mod ban"`).
    pub fn command_name(&self) -> String {
        let mut name = self.data.name.clone();
        let mut options = &self.data.options;
        while let Some(group) = options.iter().find(|option| option.kind.is_group()) {
            name.push(' ');
            name.push_str(&group.name);
            options = &group.options;
        }
        name
    }

    /// Returns the options of the innermost sub-command.
    pub fn leaf_options(&self) -> &[CommandOption] {
        let mut options = &self.data.options;
        while let Some(group) = options.iter().find(|option| option.kind.is_group()) {
            options = &group.options;
        }
        options
    }

    /// Returns the leaf option named `name`.
    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.leaf_options().iter().find(|option| option.name == name)
    }

    /// Starts an invocation builder carrying this event and its context
    /// values.
    pub fn invocation(self) -> InvocationBuilder {
        let sender = match self.invoker() {
            Some(user) => Identity::new(user.id, user.username.clone()),
            None => {
                warn!(
                    interaction = self.id,
                    command = %self.data.name,
                    "Interaction has no invoking user"
                );
                Identity::new(UNKNOWN_INVOKER, "unknown")
            }
        };

        let mut builder = Invocation::builder(self.command_name(), sender)
            .origin(self.origin())
            .granted(self.granted());
        if let Some(guild) = self.guild() {
            builder = builder.context(guild);
        }
        if let Some(channel) = self.channel.clone() {
            builder = builder.context(MessageChannel::new(channel));
        }
        if let Some(member) = self.member.clone() {
            builder = builder.context(member);
        }
        builder.context(self)
    }

    /// Builds the invocation for this event.
    pub fn into_invocation(self) -> Invocation {
        self.invocation().build()
    }
}

slashbind_core::impl_typed!(InteractionEvent);
