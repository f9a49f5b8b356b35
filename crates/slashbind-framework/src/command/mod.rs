//! Command metadata.
//!
//! A [`CommandSpec`] declares what a command needs before it runs: its
//! ordered parameters (options and context values), the permissions the
//! invoking member must hold, and where the command is visible. Commands can
//! be nested in a [`CommandGroup`], whose requirements they inherit.
//!
//! # Example
//!
//! ```rust,ignore
//! let moderation = CommandGroup::new("mod").require(Permission::ModerateMembers);
//!
//! let ban = CommandSpec::new("ban")
//!     .description("Ban a member")
//!     .option::<User>("target")
//!     .option::<Option<String>>("reason")
//!     .context::<Guild>()
//!     .require(Permission::BanMembers)
//!     .within(&moderation);
//!
//! assert_eq!(ban.name(), "mod ban");
//! ```

pub mod layer;

use std::fmt;
use std::sync::Arc;

use tower::util::BoxCloneSyncService;
use tower::{Service, ServiceExt};

use slashbind_core::{
    DeclaredParameter, InteractionContext, Invocation, Permission, PermissionRule,
    PlatformEffect, Typed, Visibility,
};

use crate::error::{DispatchError, DispatchResult};

pub use layer::{GateLayer, GateService};

/// The boxed service stack behind a [`Command`].
pub type BoxCommandService = BoxCloneSyncService<Arc<Invocation>, PlatformEffect, DispatchError>;

/// Declared metadata of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    name: String,
    description: String,
    parameters: Vec<DeclaredParameter>,
    permissions: PermissionRule,
    visibility: Visibility,
}

impl CommandSpec {
    /// Creates a command without parameters or requirements, visible
    /// everywhere.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            permissions: PermissionRule::default(),
            visibility: Visibility::default(),
        }
    }

    /// Sets the description shown to users.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends an option parameter of type `T`.
    pub fn option<T: Typed>(self, name: impl Into<String>) -> Self {
        self.parameter(DeclaredParameter::option_of::<T>(name))
    }

    /// Appends a context parameter of type `T`.
    pub fn context<T: Typed>(self) -> Self {
        self.parameter(DeclaredParameter::context_of::<T>())
    }

    /// Appends a parameter.
    pub fn parameter(mut self, parameter: DeclaredParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Requires `permission` from the invoking member.
    pub fn require(mut self, permission: Permission) -> Self {
        self.permissions = self.permissions.require(permission);
        self
    }

    /// Replaces the permission rule.
    pub fn permissions(mut self, rule: PermissionRule) -> Self {
        self.permissions = rule;
        self
    }

    /// Sets where the command is visible.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Restricts the command to the given interaction contexts.
    pub fn visible_in(self, contexts: impl IntoIterator<Item = InteractionContext>) -> Self {
        let install_types = self.visibility.install_types().to_vec();
        self.visibility(Visibility::new(contexts).with_install_types(install_types))
    }

    /// Nests the command in `group`.
    ///
    /// The name is prefixed with the group's name and the group's required
    /// permissions are added to the command's own.
    pub fn within(mut self, group: &CommandGroup) -> Self {
        self.name = format!("{} {}", group.name, self.name);
        self.permissions = self.permissions.nested_in(&group.permissions);
        self
    }

    /// Returns the full command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    pub fn description_text(&self) -> &str {
        &self.description
    }

    /// Returns the declared parameters in order.
    pub fn parameters(&self) -> &[DeclaredParameter] {
        &self.parameters
    }

    /// Returns the permission rule.
    pub fn permission_rule(&self) -> &PermissionRule {
        &self.permissions
    }

    /// Returns the visibility.
    pub fn visibility_rule(&self) -> &Visibility {
        &self.visibility
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name)?;
        for parameter in &self.parameters {
            write!(f, " {parameter}")?;
        }
        Ok(())
    }
}

/// A registered command: its metadata and its dispatch service.
///
/// Produced by [`Dispatcher::command`](crate::Dispatcher::command).
#[derive(Clone)]
pub struct Command {
    spec: Arc<CommandSpec>,
    service: BoxCommandService,
}

impl Command {
    pub(crate) fn new<S>(spec: Arc<CommandSpec>, service: S) -> Self
    where
        S: Service<Arc<Invocation>, Response = PlatformEffect, Error = DispatchError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        Self {
            spec,
            service: BoxCloneSyncService::new(service),
        }
    }

    /// Returns the command metadata.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Returns the full command name.
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Returns a handle to the service stack, for wrapping in further layers.
    pub fn service(&self) -> BoxCommandService {
        self.service.clone()
    }

    /// Runs the command for `invocation`.
    pub async fn execute(&self, invocation: Arc<Invocation>) -> DispatchResult<PlatformEffect> {
        self.service.clone().oneshot(invocation).await
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// A group of sub-commands sharing a name prefix and permission requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandGroup {
    name: String,
    permissions: PermissionRule,
}

impl CommandGroup {
    /// Creates a group without requirements.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: PermissionRule::default(),
        }
    }

    /// Requires `permission` for every command in the group.
    pub fn require(mut self, permission: Permission) -> Self {
        self.permissions = self.permissions.require(permission);
        self
    }

    /// Nests this group in `outer`.
    pub fn within(mut self, outer: &CommandGroup) -> Self {
        self.name = format!("{} {}", outer.name, self.name);
        self.permissions = self.permissions.nested_in(&outer.permissions);
        self
    }

    /// Returns the group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the group's permission rule.
    pub fn permission_rule(&self) -> &PermissionRule {
        &self.permissions
    }
}
