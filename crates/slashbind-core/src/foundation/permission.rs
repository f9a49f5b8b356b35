//! Permission flags, permission sets and per-command permission rules.
//!
//! Flags use the bit positions of the Discord permission bitfield, so a
//! member's `permissions` string parses directly into a [`PermissionSet`].

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

macro_rules! permissions {
    ($($variant:ident = $bit:literal => $name:literal),* $(,)?) => {
        /// A single permission flag.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Permission {
            $($variant,)*
        }

        impl Permission {
            /// Every known permission, in bit order.
            pub const ALL: &'static [Permission] = &[$(Permission::$variant,)*];

            /// Returns the bit position in the permission bitfield.
            pub const fn bit(self) -> u32 {
                match self {
                    $(Permission::$variant => $bit,)*
                }
            }

            /// Returns the canonical upper-case name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Permission::$variant => $name,)*
                }
            }
        }

        impl FromStr for Permission {
            type Err = UnknownPermission;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($name => Ok(Permission::$variant),)*
                    _ => Err(UnknownPermission(s.to_string())),
                }
            }
        }
    };
}

permissions! {
    CreateInstantInvite = 0 => "CREATE_INSTANT_INVITE",
    KickMembers = 1 => "KICK_MEMBERS",
    BanMembers = 2 => "BAN_MEMBERS",
    Administrator = 3 => "ADMINISTRATOR",
    ManageChannels = 4 => "MANAGE_CHANNELS",
    ManageGuild = 5 => "MANAGE_GUILD",
    AddReactions = 6 => "ADD_REACTIONS",
    ViewAuditLog = 7 => "VIEW_AUDIT_LOG",
    PrioritySpeaker = 8 => "PRIORITY_SPEAKER",
    Stream = 9 => "STREAM",
    ViewChannel = 10 => "VIEW_CHANNEL",
    SendMessages = 11 => "SEND_MESSAGES",
    SendTtsMessages = 12 => "SEND_TTS_MESSAGES",
    ManageMessages = 13 => "MANAGE_MESSAGES",
    EmbedLinks = 14 => "EMBED_LINKS",
    AttachFiles = 15 => "ATTACH_FILES",
    ReadMessageHistory = 16 => "READ_MESSAGE_HISTORY",
    MentionEveryone = 17 => "MENTION_EVERYONE",
    UseExternalEmojis = 18 => "USE_EXTERNAL_EMOJIS",
    ViewGuildInsights = 19 => "VIEW_GUILD_INSIGHTS",
    Connect = 20 => "CONNECT",
    Speak = 21 => "SPEAK",
    MuteMembers = 22 => "MUTE_MEMBERS",
    DeafenMembers = 23 => "DEAFEN_MEMBERS",
    MoveMembers = 24 => "MOVE_MEMBERS",
    UseVad = 25 => "USE_VAD",
    ChangeNickname = 26 => "CHANGE_NICKNAME",
    ManageNicknames = 27 => "MANAGE_NICKNAMES",
    ManageRoles = 28 => "MANAGE_ROLES",
    ManageWebhooks = 29 => "MANAGE_WEBHOOKS",
    ManageGuildExpressions = 30 => "MANAGE_GUILD_EXPRESSIONS",
    UseApplicationCommands = 31 => "USE_APPLICATION_COMMANDS",
    RequestToSpeak = 32 => "REQUEST_TO_SPEAK",
    ManageEvents = 33 => "MANAGE_EVENTS",
    ManageThreads = 34 => "MANAGE_THREADS",
    CreatePublicThreads = 35 => "CREATE_PUBLIC_THREADS",
    CreatePrivateThreads = 36 => "CREATE_PRIVATE_THREADS",
    UseExternalStickers = 37 => "USE_EXTERNAL_STICKERS",
    SendMessagesInThreads = 38 => "SEND_MESSAGES_IN_THREADS",
    UseEmbeddedActivities = 39 => "USE_EMBEDDED_ACTIVITIES",
    ModerateMembers = 40 => "MODERATE_MEMBERS",
}

/// A permission name that does not match any flag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission `{0}`")]
pub struct UnknownPermission(pub String);

impl Permission {
    /// Returns the flag as a bitmask.
    pub const fn mask(self) -> u64 {
        1 << self.bit()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Permission Sets
// ============================================================================

/// A set of permissions backed by the platform bitfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PermissionSet(u64);

impl PermissionSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Creates a set from raw bits. Unknown bits are kept.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns the set of every known permission.
    pub fn all() -> Self {
        Permission::ALL.iter().copied().collect()
    }

    /// Returns `true` if the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if `permission` is in the set.
    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission.mask() != 0
    }

    /// Returns `true` if every permission of `other` is in the set.
    pub const fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of both sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the permissions of `self` that are not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Adds a permission.
    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.mask();
    }

    /// Returns the permissions that are actually in effect.
    ///
    /// Administrator implies every permission.
    pub fn effective(self) -> Self {
        if self.contains(Permission::Administrator) {
            Self::all().union(self)
        } else {
            self
        }
    }

    /// Iterates over the known permissions in the set, in bit order.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(move |p| self.contains(*p))
    }

    /// Returns the names of the permissions in the set.
    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(Permission::name).collect()
    }
}

impl From<Permission> for PermissionSet {
    fn from(permission: Permission) -> Self {
        Self(permission.mask())
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}

impl BitOr for PermissionSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOr<Permission> for PermissionSet {
    type Output = Self;

    fn bitor(self, rhs: Permission) -> Self {
        self.union(rhs.into())
    }
}

impl BitOrAssign<Permission> for PermissionSet {
    fn bitor_assign(&mut self, rhs: Permission) {
        self.insert(rhs);
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}

/// The bitfield is serialized as a decimal string, as the platform sends it.
impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Bits(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text
                .parse()
                .map(Self)
                .map_err(|_| de::Error::custom(format!("invalid permission bitfield `{text}`"))),
            Repr::Bits(bits) => Ok(Self(bits)),
        }
    }
}

// ============================================================================
// Permission Rules
// ============================================================================

/// Permissions required at a handler or group scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionRule {
    required: PermissionSet,
}

impl PermissionRule {
    /// Creates a rule requiring `required`.
    pub fn new(required: PermissionSet) -> Self {
        Self { required }
    }

    /// Adds a required permission.
    pub fn require(mut self, permission: Permission) -> Self {
        self.required.insert(permission);
        self
    }

    /// Composes this rule with an enclosing scope. Nested scopes compose by union.
    pub fn nested_in(self, outer: &PermissionRule) -> Self {
        Self {
            required: self.required.union(outer.required),
        }
    }

    /// Returns the required permissions.
    pub fn required(&self) -> PermissionSet {
        self.required
    }

    /// Returns `true` if nothing is required.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

/// The permissions an invocation lacked. Delivered to a result handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPermissions {
    missing: PermissionSet,
}

impl MissingPermissions {
    /// Creates the failure value.
    pub fn new(missing: PermissionSet) -> Self {
        Self { missing }
    }

    /// Returns exactly the missing subset.
    pub fn missing(&self) -> PermissionSet {
        self.missing
    }
}

impl fmt::Display for MissingPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing permissions: {}", self.missing)
    }
}

crate::impl_typed!(MissingPermissions);
