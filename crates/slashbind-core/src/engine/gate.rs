//! The access gate: permission and visibility checks before translation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::foundation::invocation::{InteractionContext, Invocation};
use crate::foundation::permission::{MissingPermissions, PermissionRule};

/// How an application can be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum InstallType {
    /// Installed to a guild.
    GuildInstall,
    /// Installed to a user account.
    UserInstall,
}

/// An install type code outside the known range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown install type {0}")]
pub struct UnknownInstallType(pub u8);

impl TryFrom<u8> for InstallType {
    type Error = UnknownInstallType;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::GuildInstall),
            1 => Ok(Self::UserInstall),
            other => Err(UnknownInstallType(other)),
        }
    }
}

impl From<InstallType> for u8 {
    fn from(install: InstallType) -> Self {
        match install {
            InstallType::GuildInstall => 0,
            InstallType::UserInstall => 1,
        }
    }
}

/// Where a command may be used.
///
/// The install types are metadata for schema publication; only the
/// interaction contexts are enforced at dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    contexts: Vec<InteractionContext>,
    install_types: Vec<InstallType>,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            contexts: InteractionContext::ALL.to_vec(),
            install_types: vec![InstallType::GuildInstall],
        }
    }
}

impl Visibility {
    /// Restricts the command to the given contexts.
    pub fn new(contexts: impl IntoIterator<Item = InteractionContext>) -> Self {
        Self {
            contexts: contexts.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Restricts the command to guilds.
    pub fn guild_only() -> Self {
        Self::new([InteractionContext::Guild])
    }

    /// Sets the install types.
    pub fn with_install_types(mut self, types: impl IntoIterator<Item = InstallType>) -> Self {
        self.install_types = types.into_iter().collect();
        self
    }

    /// Returns `true` if the command may run in `context`.
    pub fn allows(&self, context: InteractionContext) -> bool {
        self.contexts.contains(&context)
    }

    /// Returns the allowed contexts.
    pub fn contexts(&self) -> &[InteractionContext] {
        &self.contexts
    }

    /// Returns the install types.
    pub fn install_types(&self) -> &[InstallType] {
        &self.install_types
    }
}

/// The command is not available in the invocation's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotVisible {
    context: InteractionContext,
}

impl NotVisible {
    /// Creates the failure value.
    pub fn new(context: InteractionContext) -> Self {
        Self { context }
    }

    /// Returns the rejected context.
    pub fn context(&self) -> InteractionContext {
        self.context
    }
}

impl fmt::Display for NotVisible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command is not available in {}", self.context)
    }
}

crate::impl_typed!(NotVisible);

/// How permission rules apply in direct messages, where the platform grants
/// no member permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectMessagePolicy {
    /// Rules apply as in guilds, so commands with requirements are denied.
    #[default]
    Deny,
    /// Rules are skipped in direct messages.
    Allow,
}

/// The gate decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The command may run.
    Allowed,
    /// Required permissions are missing.
    Denied(MissingPermissions),
    /// The command is not available in the invocation's context.
    NotVisible(NotVisible),
}

impl Access {
    /// Returns `true` for [`Access::Allowed`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Evaluates permission and visibility requirements.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate {
    direct_messages: DirectMessagePolicy,
}

impl AccessGate {
    /// Creates a gate with the given direct-message policy.
    pub fn new(direct_messages: DirectMessagePolicy) -> Self {
        Self { direct_messages }
    }

    /// Returns the direct-message policy.
    pub fn direct_messages(&self) -> DirectMessagePolicy {
        self.direct_messages
    }

    /// Decides whether `invocation` may run a command with `rule` and
    /// `visibility`.
    ///
    /// Visibility is checked first. A denial names exactly the missing subset
    /// of the required permissions; Administrator grants everything.
    pub fn authorize(
        &self,
        invocation: &Invocation,
        rule: &PermissionRule,
        visibility: &Visibility,
    ) -> Access {
        let origin = invocation.origin();
        if !visibility.allows(origin) {
            warn!(
                command = invocation.command(),
                context = %origin,
                "Command is not visible in this context"
            );
            return Access::NotVisible(NotVisible::new(origin));
        }

        if rule.is_empty() {
            return Access::Allowed;
        }
        if origin.is_direct() && self.direct_messages == DirectMessagePolicy::Allow {
            return Access::Allowed;
        }

        let missing = rule.required().difference(invocation.granted().effective());
        if missing.is_empty() {
            Access::Allowed
        } else {
            warn!(
                command = invocation.command(),
                user = invocation.sender().id(),
                missing = %missing,
                "Permission denied"
            );
            Access::Denied(MissingPermissions::new(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::invocation::Identity;
    use crate::foundation::permission::{Permission, PermissionSet};

    fn invocation(origin: InteractionContext, granted: PermissionSet) -> Invocation {
        Invocation::builder("test", Identity::new(1, "tester"))
            .origin(origin)
            .granted(granted)
            .build()
    }

    #[test]
    fn test_denied_with_missing_subset() {
        let rule = PermissionRule::default().require(Permission::ManageChannels);
        let invocation = invocation(
            InteractionContext::Guild,
            PermissionSet::from(Permission::SendMessages),
        );
        let access = AccessGate::default().authorize(&invocation, &rule, &Visibility::default());
        assert_eq!(
            access,
            Access::Denied(MissingPermissions::new(Permission::ManageChannels.into()))
        );
    }

    #[test]
    fn test_only_missing_permissions_are_reported() {
        let rule = PermissionRule::default()
            .require(Permission::SendMessages)
            .require(Permission::BanMembers)
            .require(Permission::KickMembers);
        let granted = PermissionSet::from(Permission::SendMessages) | Permission::KickMembers;
        let invocation = invocation(InteractionContext::Guild, granted);
        let Access::Denied(missing) =
            AccessGate::default().authorize(&invocation, &rule, &Visibility::default())
        else {
            panic!("expected denial");
        };
        assert_eq!(missing.missing(), PermissionSet::from(Permission::BanMembers));
    }

    #[test]
    fn test_administrator_is_allowed() {
        let rule = PermissionRule::default().require(Permission::BanMembers);
        let invocation = invocation(
            InteractionContext::Guild,
            PermissionSet::from(Permission::Administrator),
        );
        assert!(AccessGate::default()
            .authorize(&invocation, &rule, &Visibility::default())
            .is_allowed());
    }

    #[test]
    fn test_visibility_checked_first() {
        let rule = PermissionRule::default().require(Permission::BanMembers);
        let invocation = invocation(InteractionContext::BotDm, PermissionSet::EMPTY);
        let access = AccessGate::default().authorize(&invocation, &rule, &Visibility::guild_only());
        assert_eq!(
            access,
            Access::NotVisible(NotVisible::new(InteractionContext::BotDm))
        );
    }

    #[test]
    fn test_direct_message_policy() {
        let rule = PermissionRule::default().require(Permission::SendMessages);
        let invocation = invocation(InteractionContext::BotDm, PermissionSet::EMPTY);

        let deny = AccessGate::new(DirectMessagePolicy::Deny);
        assert!(!deny.authorize(&invocation, &rule, &Visibility::default()).is_allowed());

        let allow = AccessGate::new(DirectMessagePolicy::Allow);
        assert!(allow.authorize(&invocation, &rule, &Visibility::default()).is_allowed());
    }

    #[test]
    fn test_empty_rule_is_allowed() {
        let invocation = invocation(InteractionContext::PrivateChannel, PermissionSet::EMPTY);
        assert!(AccessGate::default()
            .authorize(&invocation, &PermissionRule::default(), &Visibility::default())
            .is_allowed());
    }
}
