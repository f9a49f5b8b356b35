//! Foundation layer - Core value types.
//!
//! This module contains the types every other layer speaks:
//! - Type descriptors and type-erased values
//! - Raw option values and the extractor boundary
//! - Permissions, invocations and platform effects

pub mod deferred;
pub mod descriptor;
pub mod effect;
pub mod invocation;
pub mod numeric;
pub mod parameter;
pub mod permission;
pub mod raw;

pub use deferred::Deferred;
pub use descriptor::{FromResolved, IntoResolved, Resolved, TypeDescriptor, TypeKey, Typed};
pub use effect::{DeferredEffect, Embed, EmbedField, PlatformEffect, ReplyBody};
pub use invocation::{
    ContextStore, Identity, InteractionContext, Invocation, InvocationBuilder,
    UnknownInteractionContext,
};
pub use numeric::Narrowing;
pub use parameter::{DeclaredParameter, ParameterSource};
pub use permission::{
    MissingPermissions, Permission, PermissionRule, PermissionSet, UnknownPermission,
};
pub use raw::{
    Extraction, OptionKind, OptionMap, RawValue, RawValueExtractor, StoredOptions,
    UnknownOptionKind,
};
