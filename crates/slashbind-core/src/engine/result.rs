//! Result dispatch: handler return values to platform effects.
//!
//! Plain types map to effects through handlers keyed by exact type.
//! Containers (`Option`, `Deferred`, `Result`) are handled by container rules
//! that unwrap and dispatch their inner value recursively.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{DeferredError, RegistryError, RegistryResult, ResultError, ResultResult};
use crate::foundation::deferred::Deferred;
use crate::foundation::descriptor::{
    FromResolved, IntoResolved, Resolved, TypeDescriptor, TypeKey, Typed, downcast,
};
use crate::foundation::effect::{DeferredEffect, Embed, PlatformEffect};
use crate::foundation::invocation::Invocation;

/// Converts a plain return value into an effect.
pub type ResultHandlerFn =
    Arc<dyn Fn(Resolved, &Arc<Invocation>) -> ResultResult<PlatformEffect> + Send + Sync>;

/// Converts a container value, dispatching its inner value through the
/// dispatcher.
pub type ContainerFn = Arc<
    dyn Fn(Resolved, &TypeDescriptor, &Arc<Invocation>, &ResultDispatcher) -> ResultResult<PlatformEffect>
        + Send
        + Sync,
>;

/// Collects result handlers during startup.
#[derive(Default)]
pub struct ResultDispatcherBuilder {
    handlers: HashMap<TypeDescriptor, ResultHandlerFn>,
    containers: HashMap<TypeKey, ContainerFn>,
}

impl ResultDispatcherBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with the built-in handlers.
    ///
    /// `()` produces no effect, `String` a text reply, [`Embed`] an embed
    /// reply and [`PlatformEffect`] itself. `Option`, `Deferred` and `Result`
    /// are handled as containers.
    pub fn standard() -> Self {
        let mut builder = Self::new();
        builder.insert::<()>(Arc::new(|_: Resolved, _: &Arc<Invocation>| {
            Ok(PlatformEffect::None)
        }));
        builder.insert::<String>(Arc::new(|value: Resolved, _: &Arc<Invocation>| {
            Ok(PlatformEffect::text(String::from_resolved(value)?))
        }));
        builder.insert::<Embed>(Arc::new(|value: Resolved, _: &Arc<Invocation>| {
            Ok(PlatformEffect::embed(Embed::from_resolved(value)?))
        }));
        builder.insert::<PlatformEffect>(Arc::new(|value: Resolved, _: &Arc<Invocation>| {
            Ok(PlatformEffect::from_resolved(value)?)
        }));

        builder
            .containers
            .insert(TypeKey::of::<Option<Resolved>>(), Arc::new(dispatch_option));
        builder
            .containers
            .insert(TypeKey::of::<Deferred<Resolved>>(), Arc::new(dispatch_deferred));
        builder
            .containers
            .insert(TypeKey::of::<Result<Resolved, String>>(), Arc::new(dispatch_result));
        builder
    }

    /// Registers a handler for the return type `T`.
    pub fn on<T, F>(&mut self, handler: F) -> RegistryResult<&mut Self>
    where
        T: FromResolved,
        F: Fn(T, &Invocation) -> PlatformEffect + Send + Sync + 'static,
    {
        let target = T::descriptor();
        if self.handlers.contains_key(&target) {
            return Err(RegistryError::DuplicateResult {
                target: target.to_string(),
            });
        }
        debug!(target_type = %target, "Registered result handler");
        self.insert::<T>(Arc::new(move |value: Resolved, invocation: &Arc<Invocation>| {
            Ok(handler(T::from_resolved(value)?, invocation))
        }));
        Ok(self)
    }

    /// Registers a container rule for the erased container type.
    pub fn container<F>(&mut self, container: TypeKey, handler: F) -> RegistryResult<&mut Self>
    where
        F: Fn(Resolved, &TypeDescriptor, &Arc<Invocation>, &ResultDispatcher) -> ResultResult<PlatformEffect>
            + Send
            + Sync
            + 'static,
    {
        if self.containers.contains_key(&container) {
            return Err(RegistryError::DuplicateResult {
                target: container.simple_name().to_string(),
            });
        }
        debug!(container = container.simple_name(), "Registered result container");
        self.containers.insert(container, Arc::new(handler));
        Ok(self)
    }

    /// Freezes the handlers.
    pub fn build(self) -> ResultDispatcher {
        ResultDispatcher {
            handlers: Arc::new(self.handlers),
            containers: Arc::new(self.containers),
        }
    }

    fn insert<T: Typed>(&mut self, handler: ResultHandlerFn) {
        self.handlers.insert(T::descriptor(), handler);
    }
}

/// The frozen result handler table.
#[derive(Clone, Default)]
pub struct ResultDispatcher {
    handlers: Arc<HashMap<TypeDescriptor, ResultHandlerFn>>,
    containers: Arc<HashMap<TypeKey, ContainerFn>>,
}

impl ResultDispatcher {
    /// Returns `true` if values described by `desc` can be dispatched.
    pub fn supports(&self, desc: &TypeDescriptor) -> bool {
        if self.handlers.contains_key(desc) {
            return true;
        }
        match (self.containers.contains_key(&desc.key()), desc.first_param()) {
            (true, Some(inner)) => self.supports(inner),
            _ => false,
        }
    }

    /// Converts an erased return value into an effect.
    pub fn dispatch(
        &self,
        value: Resolved,
        desc: &TypeDescriptor,
        invocation: &Arc<Invocation>,
    ) -> ResultResult<PlatformEffect> {
        if let Some(handler) = self.handlers.get(desc) {
            return handler(value, invocation);
        }
        if let (Some(container), Some(inner)) =
            (self.containers.get(&desc.key()), desc.first_param())
        {
            return container(value, inner, invocation, self);
        }
        Err(ResultError::Unsupported {
            target: desc.to_string(),
        })
    }

    /// Converts a typed return value into an effect.
    pub fn dispatch_typed<T: IntoResolved>(
        &self,
        value: T,
        invocation: &Arc<Invocation>,
    ) -> ResultResult<PlatformEffect> {
        self.dispatch(value.into_resolved(), &T::descriptor(), invocation)
    }
}

impl fmt::Debug for ResultDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultDispatcher")
            .field("handlers", &self.handlers.len())
            .field("containers", &self.containers.len())
            .finish()
    }
}

fn dispatch_option(
    value: Resolved,
    inner: &TypeDescriptor,
    invocation: &Arc<Invocation>,
    dispatcher: &ResultDispatcher,
) -> ResultResult<PlatformEffect> {
    match downcast::<Option<Resolved>>(value)? {
        Some(value) => dispatcher.dispatch(value, inner, invocation),
        None => Ok(PlatformEffect::None),
    }
}

fn dispatch_deferred(
    value: Resolved,
    inner: &TypeDescriptor,
    invocation: &Arc<Invocation>,
    dispatcher: &ResultDispatcher,
) -> ResultResult<PlatformEffect> {
    let deferred = downcast::<Deferred<Resolved>>(value)?;
    let inner = inner.clone();
    let dispatcher = dispatcher.clone();
    let token = invocation.token().clone();
    let invocation = Arc::clone(invocation);

    let effect = deferred.with_cancellation(token).try_map(move |value| {
        dispatcher
            .dispatch(value, &inner, &invocation)
            .map_err(|e| DeferredError::Failed(e.to_string()))
    });
    Ok(PlatformEffect::Deferred(DeferredEffect::new(effect)))
}

fn dispatch_result(
    value: Resolved,
    inner: &TypeDescriptor,
    invocation: &Arc<Invocation>,
    dispatcher: &ResultDispatcher,
) -> ResultResult<PlatformEffect> {
    match downcast::<Result<Resolved, String>>(value)? {
        Ok(value) => dispatcher.dispatch(value, inner, invocation),
        Err(message) => {
            error!(
                command = invocation.command(),
                error = %message,
                "Command handler failed"
            );
            Ok(PlatformEffect::None)
        }
    }
}
