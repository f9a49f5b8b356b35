//! Context resolution: ambient values injected into handlers by type.
//!
//! Providers are registered per exact type. A provider may read the
//! invocation's [`ContextStore`](crate::ContextStore), be bound to a fixed
//! value, or be derived from another provider.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut contexts = ContextRegistryBuilder::new();
//! contexts.provide_from_store::<InteractionEvent>()?;
//! contexts.derive::<InteractionEvent, User, _>(|event| Some(event.user().clone()))?;
//! let resolver = contexts.build(&registry);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::engine::registry::TypeRegistry;
use crate::error::{ContextResult, NotPresent, RegistryError, RegistryResult};
use crate::foundation::descriptor::{FromResolved, IntoResolved, Resolved, TypeDescriptor, Typed};
use crate::foundation::invocation::Invocation;

/// Resolves an erased context value for an invocation.
pub type ProviderFn = Arc<dyn Fn(&Invocation) -> ContextResult<Resolved> + Send + Sync>;

/// Collects context providers during startup.
#[derive(Default)]
pub struct ContextRegistryBuilder {
    providers: HashMap<TypeDescriptor, ProviderFn>,
}

impl ContextRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider for `T`.
    pub fn provide<T, F>(&mut self, provider: F) -> RegistryResult<&mut Self>
    where
        T: IntoResolved,
        F: Fn(&Invocation) -> ContextResult<T> + Send + Sync + 'static,
    {
        self.insert(
            T::descriptor(),
            Arc::new(move |invocation: &Invocation| {
                provider(invocation).map(IntoResolved::into_resolved)
            }),
        )
    }

    /// Registers a provider reading `T` from the invocation's context store.
    pub fn provide_from_store<T>(&mut self) -> RegistryResult<&mut Self>
    where
        T: IntoResolved + Clone + Sync,
    {
        self.provide::<T, _>(|invocation| {
            invocation
                .context()
                .get::<T>()
                .ok_or_else(NotPresent::of::<T>)
        })
    }

    /// Binds `T` to a fixed value shared by every invocation.
    pub fn bind<T>(&mut self, value: T) -> RegistryResult<&mut Self>
    where
        T: IntoResolved + Clone + Sync,
    {
        self.provide::<T, _>(move |_| Ok(value.clone()))
    }

    /// Registers a provider for `T` derived from the provider of `S`.
    ///
    /// Fails with [`RegistryError::UnknownSource`] if `S` has no provider yet.
    /// At dispatch time a missing source or a `None` from `derive` reports `T`
    /// as not present.
    pub fn derive<S, T, F>(&mut self, derive: F) -> RegistryResult<&mut Self>
    where
        S: FromResolved,
        T: IntoResolved,
        F: Fn(S) -> Option<T> + Send + Sync + 'static,
    {
        let Some(source) = self.providers.get(&S::descriptor()).cloned() else {
            return Err(RegistryError::UnknownSource {
                target: T::descriptor().to_string(),
                source_type: S::descriptor().to_string(),
            });
        };
        self.provide::<T, _>(move |invocation| {
            let missing = NotPresent::of::<T>;
            let source = source(invocation).map_err(|_| missing())?;
            let source = S::from_resolved(source).map_err(|_| missing())?;
            derive(source).ok_or_else(missing)
        })
    }

    /// Returns `true` if a provider for `desc` is registered.
    pub fn contains(&self, desc: &TypeDescriptor) -> bool {
        self.providers.contains_key(desc)
    }

    /// Freezes the providers. Wrapped context types use `registry`'s wrappers.
    pub fn build(self, registry: &TypeRegistry) -> ContextResolver {
        ContextResolver {
            providers: Arc::new(self.providers),
            registry: registry.clone(),
        }
    }

    fn insert(&mut self, target: TypeDescriptor, provider: ProviderFn) -> RegistryResult<&mut Self> {
        if self.providers.contains_key(&target) {
            return Err(RegistryError::DuplicateProvider {
                target: target.to_string(),
            });
        }
        debug!(target_type = %target, "Registered context provider");
        self.providers.insert(target, provider);
        Ok(self)
    }
}

/// The frozen provider table.
#[derive(Clone, Default)]
pub struct ContextResolver {
    providers: Arc<HashMap<TypeDescriptor, ProviderFn>>,
    registry: TypeRegistry,
}

impl ContextResolver {
    /// Resolves the context value described by `target`.
    ///
    /// Exact-type lookup only. Unregistered types are not present; wrappers
    /// such as `Option` follow the same rules as for options.
    pub fn resolve_context(
        &self,
        target: &TypeDescriptor,
        invocation: &Invocation,
    ) -> ContextResult<Resolved> {
        self.registry
            .resolve_with(target, invocation, &mut |leaf| self.provide(leaf, invocation))
    }

    /// Resolves a typed context value.
    pub fn resolve<T: FromResolved>(&self, invocation: &Invocation) -> ContextResult<T> {
        let value = self.resolve_context(&T::descriptor(), invocation)?;
        T::from_resolved(value).map_err(|_| NotPresent::of::<T>())
    }

    /// Returns `true` if `desc` (after unwrapping) has a provider.
    pub fn has_provider(&self, desc: &TypeDescriptor) -> bool {
        self.providers.contains_key(&self.registry.leaf(desc))
    }

    /// Returns the number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn provide(&self, leaf: &TypeDescriptor, invocation: &Invocation) -> ContextResult<Resolved> {
        match self.providers.get(leaf) {
            Some(provider) => provider(invocation),
            None => Err(NotPresent::named(leaf.simple_name())),
        }
    }
}

impl fmt::Debug for ContextResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextResolver")
            .field("providers", &self.providers.len())
            .finish()
    }
}
