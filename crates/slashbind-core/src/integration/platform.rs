//! Platform trait: the bundle of defaults a chat platform installs.

use std::sync::Arc;

use crate::engine::context::ContextRegistryBuilder;
use crate::engine::registry::TypeRegistryBuilder;
use crate::engine::result::ResultDispatcherBuilder;
use crate::error::RegistryResult;
use crate::foundation::numeric::Narrowing;
use crate::foundation::raw::RawValueExtractor;

/// A chat platform integration.
///
/// A platform supplies the raw value extractor for its payloads and
/// registers its converters, context providers and result handlers during
/// startup.
///
/// # Example
///
/// ```rust,ignore
/// struct Console;
///
/// impl Platform for Console {
///     fn name(&self) -> &'static str {
///         "console"
///     }
///
///     fn extractor(&self) -> Arc<dyn RawValueExtractor> {
///         Arc::new(StoredOptions)
///     }
///
///     fn register_types(&self, types: &mut TypeRegistryBuilder, _: Narrowing) -> RegistryResult<()> {
///         types.register::<String, _>(OptionKind::String, RawValue::as_string)?;
///         Ok(())
///     }
///
///     fn register_contexts(&self, _: &mut ContextRegistryBuilder) -> RegistryResult<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Platform: Send + Sync + 'static {
    /// Returns the platform name.
    fn name(&self) -> &'static str;

    /// Returns the extractor reading options from this platform's payloads.
    fn extractor(&self) -> Arc<dyn RawValueExtractor>;

    /// Registers the platform's converters.
    fn register_types(
        &self,
        types: &mut TypeRegistryBuilder,
        narrowing: Narrowing,
    ) -> RegistryResult<()>;

    /// Registers the platform's context providers.
    fn register_contexts(&self, contexts: &mut ContextRegistryBuilder) -> RegistryResult<()>;

    /// Registers the platform's result handlers.
    fn register_results(&self, _results: &mut ResultDispatcherBuilder) -> RegistryResult<()> {
        Ok(())
    }
}
