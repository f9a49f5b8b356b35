//! Unified error types for the slashbind core engine.
//!
//! Every failure the engine can report lives here, grouped by the stage that
//! produces it. Command-level errors (registration and dispatch) are defined
//! in `slashbind-framework`.

use thiserror::Error;

use crate::foundation::descriptor::TypeKey;
use crate::foundation::raw::OptionKind;

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors raised by a converter while coercing a raw option value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// The platform sent `null` where a value was required.
    #[error("value is null")]
    Null,

    /// The raw value has the wrong JSON shape for the requested accessor.
    #[error("expected {expected}, found {found}")]
    Unexpected {
        /// What the accessor expected.
        expected: &'static str,
        /// A short description of what was found.
        found: String,
    },

    /// A numeric value does not fit the target type.
    #[error("`{value}` is out of range for {target}")]
    OutOfRange {
        /// The offending value, rendered as text.
        value: String,
        /// The target type name.
        target: &'static str,
    },

    /// A textual value could not be parsed.
    #[error("cannot parse `{value}` as {target}")]
    Parse {
        /// The offending text.
        value: String,
        /// The target type name.
        target: &'static str,
    },

    /// The option references an entity that the payload did not resolve.
    #[error("option does not carry a resolved {0}")]
    Unresolved(&'static str),

    /// A resolved entity could not be deserialized.
    #[error("malformed {entity}: {reason}")]
    Entity {
        /// Entity name (`user`, `role`, ...).
        entity: &'static str,
        /// Deserialization failure.
        reason: String,
    },
}

impl ConvertError {
    /// Creates an [`ConvertError::Unexpected`] describing a JSON value.
    pub fn unexpected(expected: &'static str, found: &serde_json::Value) -> Self {
        let found = match found {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        };
        Self::Unexpected {
            expected,
            found: found.to_string(),
        }
    }
}

// =============================================================================
// Translation Errors
// =============================================================================

/// Why a parameter failed to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The option (or context value) is missing.
    NotPresent,
    /// The raw value could not be coerced into the target type.
    TypeMismatch,
    /// No converter path exists for the target type.
    NoConverter,
}

/// A per-parameter translation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// The option or context value is missing at dispatch time.
    #[error("`{parameter}` is not present")]
    NotPresent {
        /// Declared parameter name.
        parameter: String,
    },

    /// The platform returned a value the converter could not coerce.
    #[error("`{parameter}` is not a valid {expected}: {reason}")]
    TypeMismatch {
        /// Declared parameter name.
        parameter: String,
        /// Display name of the target type.
        expected: String,
        /// Converter failure message.
        reason: String,
    },

    /// The declared type has no registered converter.
    #[error("no converter registered for `{parameter}` of type {target}")]
    NoConverter {
        /// Declared parameter name.
        parameter: String,
        /// Display name of the target type.
        target: String,
    },
}

impl TranslationError {
    /// Returns the name of the parameter that failed.
    pub fn parameter(&self) -> &str {
        match self {
            Self::NotPresent { parameter }
            | Self::TypeMismatch { parameter, .. }
            | Self::NoConverter { parameter, .. } => parameter,
        }
    }

    /// Returns the failure category.
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::NotPresent { .. } => FailureReason::NotPresent,
            Self::TypeMismatch { .. } => FailureReason::TypeMismatch,
            Self::NoConverter { .. } => FailureReason::NoConverter,
        }
    }
}

/// A context value requested by type is not available for this invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{type_name} is not present")]
pub struct NotPresent {
    type_name: String,
}

impl NotPresent {
    /// Creates the error for type `T`, using its simple name.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::named(TypeKey::of::<T>().simple_name())
    }

    /// Creates the error for an arbitrary type name.
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }

    /// Returns the name of the missing type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Marks failures that model "the value is absent".
///
/// Wrappers with a default-on-absence policy recover from exactly these.
pub trait Absence {
    /// Returns `true` if the failure means the value is missing.
    fn is_absent(&self) -> bool;
}

impl Absence for TranslationError {
    fn is_absent(&self) -> bool {
        matches!(self, Self::NotPresent { .. })
    }
}

impl Absence for NotPresent {
    fn is_absent(&self) -> bool {
        true
    }
}

/// A type-erased value did not hold the expected type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a value of type {expected}")]
pub struct Mismatch {
    expected: &'static str,
}

impl Mismatch {
    /// Creates a mismatch for the expected type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            expected: TypeKey::of::<T>().simple_name(),
        }
    }

    /// Returns the simple name of the expected type.
    pub fn expected(&self) -> &'static str {
        self.expected
    }
}

/// Failures of a deferred value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeferredError {
    /// The owning invocation was cancelled before the value completed.
    #[error("deferred value was cancelled")]
    Cancelled,

    /// The completed value had an unexpected type.
    #[error(transparent)]
    Mismatch(#[from] Mismatch),

    /// The deferred computation failed.
    #[error("deferred value failed: {0}")]
    Failed(String),
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Registration-time configuration defects. These are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A primary converter already exists for the type, or the type already
    /// has an encoding for the same raw kind.
    #[error("{target} is already registered for {kind}")]
    DuplicateType {
        /// Display name of the target type.
        target: String,
        /// The conflicting raw kind.
        kind: OptionKind,
    },

    /// An overlay was registered for a type without a primary converter.
    #[error("cannot overlay {target}: no primary converter is registered")]
    MissingPrimary {
        /// Display name of the target type.
        target: String,
    },

    /// A wrapper rule already exists for the container.
    #[error("a wrapper for {wrapper} is already registered")]
    DuplicateWrapper {
        /// Simple name of the container type.
        wrapper: String,
    },

    /// A context provider already exists for the type.
    #[error("a context provider for {target} is already registered")]
    DuplicateProvider {
        /// Display name of the provided type.
        target: String,
    },

    /// A derived provider names a source type without a provider.
    #[error("cannot derive {target}: no context provider for {source_type}")]
    UnknownSource {
        /// Display name of the derived type.
        target: String,
        /// Display name of the missing source type.
        source_type: String,
    },

    /// A result handler already exists for the type.
    #[error("a result handler for {target} is already registered")]
    DuplicateResult {
        /// Display name of the return type.
        target: String,
    },
}

/// Errors raised while turning a handler's return value into a platform effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultError {
    /// No result handler covers the declared return type.
    #[error("no result handler registered for {target}")]
    Unsupported {
        /// Display name of the return type.
        target: String,
    },

    /// The returned value did not match its declared type.
    #[error(transparent)]
    Mismatch(#[from] Mismatch),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for converters.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for parameter translation.
pub type TranslationResult<T> = Result<T, TranslationError>;

/// Result type for context resolution.
pub type ContextResult<T> = Result<T, ContextError>;

/// Context resolution only ever fails because the value is absent.
pub type ContextError = NotPresent;

/// Result type for registration.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for result dispatch.
pub type ResultResult<T> = Result<T, ResultError>;
