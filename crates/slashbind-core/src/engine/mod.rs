//! Engine layer - Registries and the dispatch stages.
//!
//! This module contains the stages an invocation passes through:
//! - Access gate for permission and visibility checks
//! - Argument translator over the type conversion registry
//! - Context resolver for ambient values
//! - Result dispatcher turning return values into platform effects

pub mod context;
pub mod gate;
pub mod registry;
pub mod result;
pub mod translator;

pub use context::{ContextRegistryBuilder, ContextResolver, ProviderFn};
pub use gate::{
    Access, AccessGate, DirectMessagePolicy, InstallType, NotVisible, UnknownInstallType,
    Visibility,
};
pub use registry::{
    ConvertFn, ConverterEntry, EmptyFn, TypeRegistry, TypeRegistryBuilder, UnwrapFn, WrapFn,
    WrapperEntry,
};
pub use result::{ContainerFn, ResultDispatcher, ResultDispatcherBuilder, ResultHandlerFn};
pub use translator::{ArgumentTranslator, InvalidArguments};
