//! The dispatch driver.
//!
//! A [`Dispatcher`] holds the frozen engine stages: the argument translator,
//! the context resolver, the result dispatcher and the access gate. It turns
//! a [`CommandSpec`] and a handler into a [`Command`], checking at
//! registration time everything that can be checked without an invocation:
//!
//! 1. The handler takes exactly the declared parameters, in order
//! 2. Every option parameter has a converter path
//! 3. The return type has a result handler
//!
//! Each command is a tower stack of [`GateLayer`] over [`InvokeService`]:
//!
//! ```text
//! Invocation ─▶ GateLayer ─▶ InvokeService ─▶ PlatformEffect
//!                  │              │
//!                  │              ├─ translate options / resolve context
//!                  │              ├─ call handler
//!                  │              └─ dispatch result
//!                  └─ PermissionDenied | NotVisible
//! ```
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(translator, contexts, results);
//!
//! let roll = dispatcher.command(
//!     CommandSpec::new("roll").option::<Option<i32>>("sides"),
//!     roll_handler,
//! )?;
//! let effect = roll.execute(Arc::new(invocation)).await?;
//! ```

use std::sync::Arc;

use tower::ServiceBuilder;
use tower_layer::{Identity, Stack};
use tracing::{debug, warn};

use slashbind_core::{
    AccessGate, ArgumentTranslator, ContextResolver, InvalidArguments, Invocation,
    ParameterSource, Resolved, ResultDispatcher, TranslationError,
};

use crate::command::{Command, CommandSpec, GateLayer};
use crate::error::{CommandError, CommandResult, DispatchError, DispatchResult};
use crate::handler::{Handler, InvokeService};

/// Builds and drives commands over the frozen engine stages.
///
/// Cloning is cheap; every stage shares its tables.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    translator: ArgumentTranslator,
    contexts: ContextResolver,
    results: ResultDispatcher,
    gate: AccessGate,
    collect_all: bool,
}

impl Dispatcher {
    /// Creates a dispatcher with the default gate that collects every
    /// argument error.
    pub fn new(
        translator: ArgumentTranslator,
        contexts: ContextResolver,
        results: ResultDispatcher,
    ) -> Self {
        Self {
            translator,
            contexts,
            results,
            gate: AccessGate::default(),
            collect_all: true,
        }
    }

    /// Sets the access gate.
    pub fn with_gate(mut self, gate: AccessGate) -> Self {
        self.gate = gate;
        self
    }

    /// Collect every failing parameter (`true`) or stop at the first.
    pub fn collect_all(mut self, enabled: bool) -> Self {
        self.collect_all = enabled;
        self
    }

    /// Returns the argument translator.
    pub fn translator(&self) -> &ArgumentTranslator {
        &self.translator
    }

    /// Returns the context resolver.
    pub fn contexts(&self) -> &ContextResolver {
        &self.contexts
    }

    /// Returns the result dispatcher.
    pub fn results(&self) -> &ResultDispatcher {
        &self.results
    }

    /// Returns the access gate.
    pub fn gate(&self) -> AccessGate {
        self.gate
    }

    /// Returns the layers applied in front of every command's handler.
    pub fn layers(&self, spec: &CommandSpec) -> ServiceBuilder<Stack<GateLayer, Identity>> {
        GateLayer::for_command(self.gate, spec).build()
    }

    /// Registers `handler` as the implementation of `spec`.
    ///
    /// Fails fast on arity or type mismatches between the declaration and the
    /// handler, on option types without a converter and on unsupported
    /// return types.
    pub fn command<H, T>(&self, spec: CommandSpec, handler: H) -> CommandResult<Command>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.check(&spec, &handler)?;
        debug!(command = spec.name(), signature = %spec, "Registered command");

        let spec = Arc::new(spec);
        let service = self.layers(&spec).service(InvokeService::new(
            handler,
            Arc::clone(&spec),
            self.clone(),
        ));
        Ok(Command::new(spec, service))
    }

    /// Assembles the erased arguments of `spec` for `invocation`.
    ///
    /// Options go through the translator and context parameters through the
    /// context resolver. An unavailable context value is reported as the
    /// parameter not being present.
    pub fn arguments(
        &self,
        spec: &CommandSpec,
        invocation: &Invocation,
    ) -> DispatchResult<Vec<Resolved>> {
        let mut values = Vec::with_capacity(spec.parameters().len());
        let mut errors = Vec::new();

        for parameter in spec.parameters() {
            let outcome = match parameter.source() {
                ParameterSource::Option => self.translator.translate(parameter, invocation),
                ParameterSource::Context => self
                    .contexts
                    .resolve_context(parameter.target(), invocation)
                    .map_err(|e| {
                        debug!(parameter = parameter.name(), error = %e, "Context value unavailable");
                        TranslationError::NotPresent {
                            parameter: parameter.name().to_string(),
                        }
                    }),
            };

            match outcome {
                Ok(value) => values.push(value),
                Err(e) => {
                    errors.push(e);
                    if !self.collect_all {
                        break;
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(values)
        } else {
            Err(DispatchError::InvalidArguments(InvalidArguments::new(errors)))
        }
    }

    fn check<H, T>(&self, spec: &CommandSpec, handler: &H) -> CommandResult<()>
    where
        H: Handler<T>,
    {
        let command = spec.name();
        let actual = handler.parameter_types();
        if actual.len() != spec.parameters().len() {
            return Err(CommandError::Arity {
                command: command.to_string(),
                declared: spec.parameters().len(),
                actual: actual.len(),
            });
        }

        for (parameter, actual) in spec.parameters().iter().zip(&actual) {
            if parameter.target() != actual {
                return Err(CommandError::SignatureMismatch {
                    command: command.to_string(),
                    parameter: parameter.name().to_string(),
                    declared: parameter.target().to_string(),
                    actual: actual.to_string(),
                });
            }

            match parameter.source() {
                ParameterSource::Option => {
                    if !self.translator.registry().supports(parameter.target()) {
                        return Err(CommandError::NoConverter {
                            command: command.to_string(),
                            parameter: parameter.name().to_string(),
                            target: parameter.target().to_string(),
                        });
                    }
                }
                ParameterSource::Context => {
                    if !self.contexts.has_provider(parameter.target()) {
                        warn!(
                            command,
                            target_type = %parameter.target(),
                            "No context provider registered; the parameter will never be present"
                        );
                    }
                }
            }
        }

        let output = handler.output_type();
        if !self.results.supports(&output) {
            return Err(CommandError::UnsupportedReturnType {
                command: command.to_string(),
                target: output.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use slashbind_core::{
        ContextRegistryBuilder, Embed, Extraction, FailureReason, Identity as Sender,
        InteractionContext, Narrowing, OptionKind, OptionMap, Permission, PermissionSet,
        PlatformEffect, RawValue, RawValueExtractor, ResultDispatcherBuilder, StoredOptions,
        TypeRegistryBuilder,
    };

    #[derive(Debug, Clone, PartialEq)]
    struct Caller(String);

    slashbind_core::impl_typed!(Caller);

    /// Reads stored options and counts every lookup.
    #[derive(Default)]
    struct CountingExtractor {
        lookups: AtomicUsize,
    }

    impl RawValueExtractor for CountingExtractor {
        fn extract(&self, name: &str, kind: OptionKind, invocation: &Invocation) -> Extraction {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            StoredOptions.extract(name, kind, invocation)
        }
    }

    fn dispatcher(extractor: Arc<CountingExtractor>) -> Dispatcher {
        let mut types = TypeRegistryBuilder::standard();
        types
            .register::<i32, _>(OptionKind::Integer, |raw: &RawValue| {
                Narrowing::Reject.narrow_i32(raw.as_long()?)
            })
            .unwrap()
            .register::<String, _>(OptionKind::String, RawValue::as_string)
            .unwrap();
        let registry = types.build();

        let mut contexts = ContextRegistryBuilder::new();
        contexts.provide_from_store::<Caller>().unwrap();

        Dispatcher::new(
            ArgumentTranslator::new(registry.clone(), extractor),
            contexts.build(&registry),
            ResultDispatcherBuilder::standard().build(),
        )
    }

    fn invocation(options: OptionMap, granted: PermissionSet) -> Arc<Invocation> {
        Arc::new(
            Invocation::builder("roll", Sender::new(1, "ada"))
                .origin(InteractionContext::Guild)
                .granted(granted)
                .context(options)
                .context(Caller("ada".into()))
                .build(),
        )
    }

    async fn roll(sides: Option<i32>, caller: Caller) -> String {
        format!("{} rolled a d{}", caller.0, sides.unwrap_or(6))
    }

    fn roll_spec() -> CommandSpec {
        CommandSpec::new("roll")
            .option::<Option<i32>>("sides")
            .context::<Caller>()
    }

    #[tokio::test]
    async fn test_execute_happy_path() {
        let command = dispatcher(Arc::default()).command(roll_spec(), roll).unwrap();

        let options = OptionMap::new().with("sides", OptionKind::Integer, 20.into());
        let effect = command
            .execute(invocation(options, PermissionSet::EMPTY))
            .await
            .unwrap();
        assert_eq!(effect.as_text(), Some("ada rolled a d20"));

        let effect = command
            .execute(invocation(OptionMap::new(), PermissionSet::EMPTY))
            .await
            .unwrap();
        assert_eq!(effect.as_text(), Some("ada rolled a d6"));
    }

    #[tokio::test]
    async fn test_embed_return_becomes_embed_effect() {
        async fn info() -> Embed {
            Embed::new().title("Server info")
        }
        let command = dispatcher(Arc::default())
            .command(CommandSpec::new("info"), info)
            .unwrap();
        let effect = command
            .execute(invocation(OptionMap::new(), PermissionSet::EMPTY))
            .await
            .unwrap();
        assert_eq!(effect.kind(), "embed");
    }

    #[tokio::test]
    async fn test_gate_denial_skips_translation() {
        let extractor = Arc::new(CountingExtractor::default());
        let command = dispatcher(Arc::clone(&extractor))
            .command(roll_spec().require(Permission::ManageChannels), roll)
            .unwrap();

        let options = OptionMap::new().with("sides", OptionKind::Integer, 20.into());
        let result = command
            .execute(invocation(
                options,
                PermissionSet::from(Permission::SendMessages),
            ))
            .await;

        let Err(DispatchError::PermissionDenied(missing)) = result else {
            panic!("expected a permission denial");
        };
        assert_eq!(
            missing.missing(),
            PermissionSet::from(Permission::ManageChannels)
        );
        assert_eq!(extractor.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_errors_are_collected_per_parameter() {
        async fn pair(_count: i32, _label: String) {}
        let spec = CommandSpec::new("pair")
            .option::<i32>("count")
            .option::<String>("label");
        let options = OptionMap::new().with("count", OptionKind::String, "many".into());

        let collecting = dispatcher(Arc::default());
        let result = collecting
            .command(spec.clone(), pair)
            .unwrap()
            .execute(invocation(options.clone(), PermissionSet::EMPTY))
            .await;
        let Err(DispatchError::InvalidArguments(invalid)) = result else {
            panic!("expected invalid arguments");
        };
        let reasons: Vec<_> = invalid.errors().iter().map(TranslationError::reason).collect();
        assert_eq!(
            reasons,
            [FailureReason::TypeMismatch, FailureReason::NotPresent]
        );

        let fail_fast = dispatcher(Arc::default()).collect_all(false);
        let result = fail_fast
            .command(spec, pair)
            .unwrap()
            .execute(invocation(options, PermissionSet::EMPTY))
            .await;
        let Err(DispatchError::InvalidArguments(invalid)) = result else {
            panic!("expected invalid arguments");
        };
        assert_eq!(invalid.errors().len(), 1);
        assert_eq!(invalid.errors()[0].parameter(), "count");
    }

    #[tokio::test]
    async fn test_missing_context_is_not_present() {
        async fn whoami(caller: Caller) -> String {
            caller.0
        }
        let command = dispatcher(Arc::default())
            .command(CommandSpec::new("whoami").context::<Caller>(), whoami)
            .unwrap();
        let bare = Arc::new(Invocation::builder("whoami", Sender::new(1, "ada")).build());

        let Err(DispatchError::InvalidArguments(invalid)) = command.execute(bare).await else {
            panic!("expected invalid arguments");
        };
        assert_eq!(invalid.errors()[0].reason(), FailureReason::NotPresent);
        assert_eq!(invalid.errors()[0].parameter(), "Caller");
    }

    #[test]
    fn test_registration_checks() {
        let dispatcher = dispatcher(Arc::default());

        let err = dispatcher
            .command(CommandSpec::new("roll").option::<i32>("sides"), roll)
            .unwrap_err();
        assert!(matches!(err, CommandError::Arity { declared: 1, actual: 2, .. }));

        let err = dispatcher
            .command(
                CommandSpec::new("roll")
                    .option::<i32>("sides")
                    .context::<Caller>(),
                roll,
            )
            .unwrap_err();
        assert!(matches!(err, CommandError::SignatureMismatch { ref parameter, .. } if parameter == "sides"));

        async fn flag(_on: bool) {}
        let err = dispatcher
            .command(CommandSpec::new("flag").option::<bool>("on"), flag)
            .unwrap_err();
        assert!(matches!(err, CommandError::NoConverter { ref target, .. } if target == "bool"));

        async fn number() -> u64 {
            4
        }
        let err = dispatcher
            .command(CommandSpec::new("number"), number)
            .unwrap_err();
        assert!(matches!(err, CommandError::UnsupportedReturnType { .. }));
    }

    #[test]
    fn test_execute_blocking() {
        let dispatcher = dispatcher(Arc::default());
        let command = dispatcher.command(roll_spec(), roll).unwrap();
        let options = OptionMap::new().with("sides", OptionKind::Integer, 8.into());

        let effect = tokio_test::block_on(
            command.execute(invocation(options, PermissionSet::EMPTY)),
        )
        .unwrap();
        assert!(matches!(effect, PlatformEffect::Reply { ephemeral: false, .. }));
    }
}
