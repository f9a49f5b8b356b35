//! The innermost dispatch service.
//!
//! [`InvokeService<H, T>`] wraps a single handler and implements
//! `tower::Service<Arc<Invocation>>`: it assembles the handler's arguments
//! from options and context, calls the handler, and turns the return value
//! into a [`PlatformEffect`]. Gating is a separate [`Layer`](tower::Layer)
//! stacked on top.

use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use tower::Service;
use tracing::trace;

use slashbind_core::{Invocation, PlatformEffect, TypeDescriptor};

use super::traits::Handler;
use crate::command::CommandSpec;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

/// A tower [`Service`] that runs one command handler.
pub struct InvokeService<H, T> {
    handler: H,
    spec: Arc<CommandSpec>,
    output: TypeDescriptor,
    dispatcher: Dispatcher,
    _marker: PhantomData<fn() -> T>,
}

impl<H, T> InvokeService<H, T>
where
    H: Handler<T>,
{
    /// Creates the service for `handler` declared by `spec`.
    pub fn new(handler: H, spec: Arc<CommandSpec>, dispatcher: Dispatcher) -> Self {
        let output = handler.output_type();
        Self {
            handler,
            spec,
            output,
            dispatcher,
            _marker: PhantomData,
        }
    }
}

impl<H: Clone, T> Clone for InvokeService<H, T> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            spec: Arc::clone(&self.spec),
            output: self.output.clone(),
            dispatcher: self.dispatcher.clone(),
            _marker: PhantomData,
        }
    }
}

impl<H, T> Service<Arc<Invocation>> for InvokeService<H, T>
where
    H: Handler<T>,
    T: 'static,
{
    type Response = PlatformEffect;
    type Error = DispatchError;
    type Future = BoxFuture<'static, Result<PlatformEffect, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, invocation: Arc<Invocation>) -> Self::Future {
        let handler = self.handler.clone();
        let spec = Arc::clone(&self.spec);
        let output = self.output.clone();
        let dispatcher = self.dispatcher.clone();

        async move {
            let args = dispatcher.arguments(&spec, &invocation)?;
            trace!(command = spec.name(), args = args.len(), "Calling handler");

            let value = handler.call(args).await?;
            let effect = dispatcher.results().dispatch(value, &output, &invocation)?;
            trace!(command = spec.name(), effect = effect.kind(), "Handler finished");
            Ok(effect)
        }
        .boxed()
    }
}
