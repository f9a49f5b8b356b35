//! The per-dispatch invocation value.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::foundation::permission::PermissionSet;

/// Where an interaction was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum InteractionContext {
    /// Inside a guild.
    Guild,
    /// In the direct message channel with the bot.
    BotDm,
    /// In a group DM or a DM between other users.
    PrivateChannel,
}

/// An interaction context code outside the known range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown interaction context {0}")]
pub struct UnknownInteractionContext(pub u8);

impl InteractionContext {
    /// Every context, in code order.
    pub const ALL: [InteractionContext; 3] = [Self::Guild, Self::BotDm, Self::PrivateChannel];

    /// Returns the wire code.
    pub fn code(self) -> u8 {
        match self {
            Self::Guild => 0,
            Self::BotDm => 1,
            Self::PrivateChannel => 2,
        }
    }

    /// Returns `true` for direct-message contexts.
    pub fn is_direct(self) -> bool {
        !matches!(self, Self::Guild)
    }
}

impl TryFrom<u8> for InteractionContext {
    type Error = UnknownInteractionContext;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Guild),
            1 => Ok(Self::BotDm),
            2 => Ok(Self::PrivateChannel),
            other => Err(UnknownInteractionContext(other)),
        }
    }
}

impl From<InteractionContext> for u8 {
    fn from(context: InteractionContext) -> Self {
        context.code()
    }
}

impl fmt::Display for InteractionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Guild => "GUILD",
            Self::BotDm => "BOT_DM",
            Self::PrivateChannel => "PRIVATE_CHANNEL",
        })
    }
}

/// The acting identity of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    id: u64,
    name: String,
}

impl Identity {
    /// Creates an identity.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns the platform id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Context Store
// ============================================================================

/// A type-indexed store of ambient values for one invocation.
///
/// Holds at most one value per type. Values are shared, so lookups clone
/// cheaply or borrow.
#[derive(Clone, Default)]
pub struct ContextStore {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ContextStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Returns a reference to the stored value of type `T`.
    pub fn get_ref<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns a clone of the stored value of type `T`.
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.get_ref::<T>().cloned()
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStore")
            .field("len", &self.values.len())
            .finish()
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// An immutable value describing one command execution.
///
/// Built by the driver for a single dispatch; shared with handlers and
/// converters by reference.
#[derive(Debug, Clone)]
pub struct Invocation {
    command: String,
    sender: Identity,
    origin: InteractionContext,
    granted: PermissionSet,
    context: ContextStore,
    token: CancellationToken,
}

impl Invocation {
    /// Starts building an invocation of `command` by `sender`.
    pub fn builder(command: impl Into<String>, sender: Identity) -> InvocationBuilder {
        InvocationBuilder {
            command: command.into(),
            sender,
            origin: InteractionContext::Guild,
            granted: PermissionSet::EMPTY,
            context: ContextStore::new(),
            token: None,
        }
    }

    /// Returns the invoked command name.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the acting identity.
    pub fn sender(&self) -> &Identity {
        &self.sender
    }

    /// Returns the interaction context.
    pub fn origin(&self) -> InteractionContext {
        self.origin
    }

    /// Returns the permissions granted to the sender.
    pub fn granted(&self) -> PermissionSet {
        self.granted
    }

    /// Returns the typed context store.
    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    /// Returns the cancellation token of this invocation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns `true` once the invocation has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Builder for [`Invocation`].
#[derive(Debug)]
pub struct InvocationBuilder {
    command: String,
    sender: Identity,
    origin: InteractionContext,
    granted: PermissionSet,
    context: ContextStore,
    token: Option<CancellationToken>,
}

impl InvocationBuilder {
    /// Sets the interaction context. Defaults to [`InteractionContext::Guild`].
    pub fn origin(mut self, origin: InteractionContext) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the granted permissions. Defaults to none.
    pub fn granted(mut self, granted: PermissionSet) -> Self {
        self.granted = granted;
        self
    }

    /// Adds a context value.
    pub fn context<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.context.insert(value);
        self
    }

    /// Uses an existing cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Builds the invocation.
    pub fn build(self) -> Invocation {
        Invocation {
            command: self.command,
            sender: self.sender,
            origin: self.origin,
            granted: self.granted,
            context: self.context,
            token: self.token.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Channel(u64);

    #[test]
    fn test_context_store_by_type() {
        let mut store = ContextStore::new();
        store.insert(Channel(7));
        store.insert(42u32);

        assert_eq!(store.get::<Channel>(), Some(Channel(7)));
        assert_eq!(store.get_ref::<u32>(), Some(&42));
        assert!(!store.contains::<String>());

        store.insert(Channel(8));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get::<Channel>(), Some(Channel(8)));
    }

    #[test]
    fn test_builder_defaults() {
        let invocation = Invocation::builder("ping", Identity::new(1, "alice")).build();
        assert_eq!(invocation.command(), "ping");
        assert_eq!(invocation.origin(), InteractionContext::Guild);
        assert!(invocation.granted().is_empty());
        assert!(!invocation.is_cancelled());
    }

    #[test]
    fn test_shared_token() {
        let token = CancellationToken::new();
        let invocation = Invocation::builder("ping", Identity::new(1, "alice"))
            .cancellation(token.clone())
            .build();
        token.cancel();
        assert!(invocation.is_cancelled());
    }

    #[test]
    fn test_context_codes() {
        for context in InteractionContext::ALL {
            assert_eq!(InteractionContext::try_from(context.code()), Ok(context));
        }
        assert!(InteractionContext::BotDm.is_direct());
        assert!(!InteractionContext::Guild.is_direct());
    }
}
