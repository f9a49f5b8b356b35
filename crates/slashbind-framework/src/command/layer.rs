use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use tower::{Layer, Service, ServiceBuilder};
use tower_layer::{Identity, Stack};

use slashbind_core::{Access, AccessGate, Invocation, PermissionRule, PlatformEffect, Visibility};

use super::CommandSpec;
use crate::error::DispatchError;

/// A tower [`Layer`] that checks a command's permissions and visibility
/// before calling the inner service.
#[derive(Debug, Clone)]
pub struct GateLayer {
    gate: AccessGate,
    rule: PermissionRule,
    visibility: Arc<Visibility>,
}

impl GateLayer {
    /// Creates a gate layer with explicit requirements.
    pub fn new(gate: AccessGate, rule: PermissionRule, visibility: Visibility) -> Self {
        Self {
            gate,
            rule,
            visibility: Arc::new(visibility),
        }
    }

    /// Creates a gate layer for the requirements declared by `spec`.
    pub fn for_command(gate: AccessGate, spec: &CommandSpec) -> Self {
        Self::new(
            gate,
            *spec.permission_rule(),
            spec.visibility_rule().clone(),
        )
    }

    /// Convert to a [`ServiceBuilder`] for stacking further layers.
    pub fn build(self) -> ServiceBuilder<Stack<GateLayer, Identity>> {
        ServiceBuilder::new().layer(self)
    }
}

impl<S> Layer<S> for GateLayer {
    type Service = GateService<S>;

    fn layer(&self, inner: S) -> GateService<S> {
        GateService {
            gate: self.gate,
            rule: self.rule,
            visibility: Arc::clone(&self.visibility),
            inner,
        }
    }
}

/// The [`Service`] produced by [`GateLayer`].
///
/// A denied invocation never reaches the inner service, so no option is
/// translated and no handler code runs.
#[derive(Debug, Clone)]
pub struct GateService<S> {
    gate: AccessGate,
    rule: PermissionRule,
    visibility: Arc<Visibility>,
    inner: S,
}

impl<S> Service<Arc<Invocation>> for GateService<S>
where
    S: Service<Arc<Invocation>, Response = PlatformEffect, Error = DispatchError>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = PlatformEffect;
    type Error = DispatchError;
    type Future = BoxFuture<'static, Result<PlatformEffect, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, invocation: Arc<Invocation>) -> Self::Future {
        let access = self
            .gate
            .authorize(&invocation, &self.rule, &self.visibility);
        let mut inner = self.inner.clone();

        async move {
            match access {
                Access::Allowed => inner.call(invocation).await,
                Access::Denied(missing) => Err(DispatchError::PermissionDenied(missing)),
                Access::NotVisible(rejected) => Err(DispatchError::NotVisible(rejected)),
            }
        }
        .boxed()
    }
}
