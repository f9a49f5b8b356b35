//! Declared handler parameters.

use std::fmt;

use crate::foundation::descriptor::{TypeDescriptor, Typed};

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterSource {
    /// A named command option, translated from the payload.
    Option,
    /// An ambient context value, resolved by type.
    Context,
}

/// One entry of a handler's declared parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredParameter {
    name: String,
    target: TypeDescriptor,
    source: ParameterSource,
}

impl DeclaredParameter {
    /// Creates a parameter.
    pub fn new(name: impl Into<String>, target: TypeDescriptor, source: ParameterSource) -> Self {
        Self {
            name: name.into(),
            target,
            source,
        }
    }

    /// A command option named `name` of type `T`.
    pub fn option_of<T: Typed>(name: impl Into<String>) -> Self {
        Self::new(name, T::descriptor(), ParameterSource::Option)
    }

    /// A context parameter of type `T`, named after the type.
    pub fn context_of<T: Typed>() -> Self {
        let target = T::descriptor();
        Self::new(target.to_string(), target, ParameterSource::Context)
    }

    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the target type.
    pub fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    /// Returns the value source.
    pub fn source(&self) -> ParameterSource {
        self.source
    }

    /// Returns `true` for context parameters.
    pub fn is_context(&self) -> bool {
        self.source == ParameterSource::Context
    }
}

impl fmt::Display for DeclaredParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            ParameterSource::Option => write!(f, "{}: {}", self.name, self.target),
            ParameterSource::Context => write!(f, "@{}", self.target),
        }
    }
}
