//! # Slashbind Core
//!
//! The typed-argument translation and context-resolution engine.
//!
//! This crate sits between a chat platform's raw interaction payload and a
//! command handler's strongly-typed parameter list. It maps target types to
//! raw value converters, resolves ambient context values by type, gates
//! dispatch on permissions and visibility, and turns return values into
//! platform effects.
//!
//! ## Architecture Layers
//!
//! Slashbind Core is organized into three architectural layers:
//!
//! ### Foundation Layer
//!
//! Core value types:
//! - **Type Descriptors**: Explicit registry keys and erased values ([`TypeDescriptor`], [`Resolved`])
//! - **Raw Values**: Untyped option values and the extractor boundary ([`RawValue`], [`RawValueExtractor`])
//! - **Invocations**: Per-dispatch state ([`Invocation`], [`ContextStore`])
//! - **Permissions**: Flags, sets and rules ([`Permission`], [`PermissionSet`], [`PermissionRule`])
//! - **Effects**: What the platform should do ([`PlatformEffect`], [`Embed`])
//!
//! ### Engine Layer
//!
//! The dispatch stages over frozen registries:
//! - **Type Conversion Registry**: Primary, overlay and wrapper entries ([`TypeRegistry`])
//! - **Argument Translator**: Per-parameter translation ([`ArgumentTranslator`])
//! - **Context Resolver**: Type-indexed providers ([`ContextResolver`])
//! - **Access Gate**: Permission and visibility checks ([`AccessGate`])
//! - **Result Dispatcher**: Return values to effects ([`ResultDispatcher`])
//!
//! ### Integration Layer
//!
//! External system interfaces:
//! - **Platform**: Extractor and defaults of a chat platform ([`Platform`])
//! - **Responder**: Transport boundary receiving effects ([`Responder`])
//!
//! ## Dispatch Flow
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌────────────┐   ┌─────────┐   ┌────────────┐
//! │ Invocation │──▶│ Access Gate │──▶│ Translator │──▶│ Handler │──▶│  Result    │
//! └────────────┘   └─────────────┘   │ + Context  │   └─────────┘   │ Dispatcher │
//!                                    └────────────┘                 └────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use slashbind_core::prelude::*;
//!
//! let mut types = TypeRegistryBuilder::standard();
//! types.register::<i32, _>(OptionKind::Integer, |raw| {
//!     Narrowing::Reject.narrow_i32(raw.as_long()?)
//! })?;
//! let translator = ArgumentTranslator::new(types.build(), Arc::new(StoredOptions));
//!
//! let invocation = Invocation::builder("roll", Identity::new(1, "ada"))
//!     .context(OptionMap::new().with("sides", OptionKind::Integer, 20.into()))
//!     .build();
//!
//! let sides = translator.translate(&DeclaredParameter::option_of::<i32>("sides"), &invocation)?;
//! assert_eq!(i32::from_resolved(sides)?, 20);
//! ```

// Architectural layers
pub mod engine;
pub mod error;
pub mod foundation;
pub mod integration;

// Re-export foundation types
pub use foundation::{
    ContextStore, DeclaredParameter, Deferred, DeferredEffect, Embed, EmbedField, Extraction,
    FromResolved, Identity, InteractionContext, IntoResolved, Invocation, InvocationBuilder,
    MissingPermissions, Narrowing, OptionKind, OptionMap, ParameterSource, Permission,
    PermissionRule, PermissionSet, PlatformEffect, RawValue, RawValueExtractor, ReplyBody,
    Resolved, StoredOptions, TypeDescriptor, TypeKey, Typed,
};

// Re-export engine types
pub use engine::{
    Access, AccessGate, ArgumentTranslator, ContextRegistryBuilder, ContextResolver,
    ConverterEntry, DirectMessagePolicy, InstallType, InvalidArguments, NotVisible,
    ResultDispatcher, ResultDispatcherBuilder, TypeRegistry, TypeRegistryBuilder, Visibility,
    WrapperEntry,
};

// Re-export error types
pub use error::{
    Absence, ContextError, ContextResult, ConvertError, ConvertResult, DeferredError,
    FailureReason, Mismatch, NotPresent, RegistryError, RegistryResult, ResultError,
    ResultResult, TranslationError, TranslationResult,
};

// Re-export integration types
pub use integration::{ApiError, ApiResult, Platform, Responder};

/// Re-exported so responders can be implemented without a direct dependency.
pub use async_trait::async_trait;

/// Prelude for common imports.
pub mod prelude {
    pub use super::engine::*;
    pub use super::error::{
        ConvertError, ConvertResult, NotPresent, RegistryError, RegistryResult,
        TranslationError,
    };
    pub use super::foundation::*;
    pub use super::integration::{Platform, Responder};
}
