//! The dispatch engine.
//!
//! The [`Engine`] owns the frozen registries and the registered commands.
//! It runs every invocation inside a `dispatch` span, bounded by the
//! configured timeout and by the invocation's cancellation token, turns
//! user-facing failures into replies, and hands the resulting effect to a
//! [`Responder`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use slashbind_runtime::{Engine, config::load_config};
//!
//! let config = load_config()?;
//! let mut engine = Engine::builder(config).platform(&discord)?.build()?;
//!
//! engine.register(CommandSpec::new("ping"), || async { "pong".to_string() })?;
//! engine.respond(invocation, &responder).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};

use slashbind_core::{
    AccessGate, ArgumentTranslator, ContextRegistryBuilder, InvalidArguments, Invocation,
    MissingPermissions, NotVisible, Platform, PlatformEffect, RawValueExtractor, RegistryError,
    RegistryResult, Responder, ResultDispatcherBuilder, StoredOptions, TypeRegistryBuilder,
};
use slashbind_framework::{Command, CommandSpec, DispatchError, DispatchResult, Dispatcher, Handler};

use crate::config::{MessagesConfig, SlashbindConfig};
use crate::error::{RuntimeError, RuntimeResult};

/// Collects registrations during startup.
pub struct EngineBuilder {
    config: SlashbindConfig,
    types: TypeRegistryBuilder,
    contexts: ContextRegistryBuilder,
    results: ResultDispatcherBuilder,
    extractor: Option<Arc<dyn RawValueExtractor>>,
    platform: Option<&'static str>,
}

impl EngineBuilder {
    /// Creates a builder with the standard wrappers and result handlers.
    pub fn new(config: SlashbindConfig) -> Self {
        Self {
            config,
            types: TypeRegistryBuilder::standard(),
            contexts: ContextRegistryBuilder::new(),
            results: ResultDispatcherBuilder::standard(),
            extractor: None,
            platform: None,
        }
    }

    /// Installs a platform's extractor, converters, contexts and result
    /// handlers.
    pub fn platform<P: Platform>(mut self, platform: &P) -> RuntimeResult<Self> {
        platform.register_types(&mut self.types, self.config.conversion.narrowing)?;
        platform.register_contexts(&mut self.contexts)?;
        platform.register_results(&mut self.results)?;
        self.extractor = Some(platform.extractor());
        self.platform = Some(platform.name());
        info!(platform = platform.name(), "Installed platform");
        Ok(self)
    }

    /// Overrides the raw value extractor.
    pub fn extractor(mut self, extractor: Arc<dyn RawValueExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Returns the converter registrations.
    pub fn types(&mut self) -> &mut TypeRegistryBuilder {
        &mut self.types
    }

    /// Returns the context provider registrations.
    pub fn contexts(&mut self) -> &mut ContextRegistryBuilder {
        &mut self.contexts
    }

    /// Returns the result handler registrations.
    pub fn results(&mut self) -> &mut ResultDispatcherBuilder {
        &mut self.results
    }

    /// Freezes every registry.
    ///
    /// Failure replies are formatted from the configured message templates
    /// unless the platform registered its own handlers for them.
    pub fn build(mut self) -> RuntimeResult<Engine> {
        register_failure_replies(&mut self.results, &self.config.messages)?;

        let registry = self.types.build();
        let contexts = self.contexts.build(&registry);
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(StoredOptions));
        let dispatcher = Dispatcher::new(
            ArgumentTranslator::new(registry, extractor),
            contexts,
            self.results.build(),
        )
        .with_gate(AccessGate::new(self.config.access.direct_messages))
        .collect_all(self.config.dispatch.collect_all_errors);

        info!(
            platform = self.platform.unwrap_or("none"),
            converters = dispatcher.translator().registry().len(),
            contexts = dispatcher.contexts().len(),
            timeout_ms = self.config.dispatch.timeout_ms,
            "Engine ready"
        );

        Ok(Engine {
            dispatcher,
            timeout: self.config.dispatch.timeout(),
            deferred_timeout: self.config.dispatch.deferred_timeout(),
            commands: HashMap::new(),
        })
    }
}

fn register_failure_replies(
    results: &mut ResultDispatcherBuilder,
    messages: &MessagesConfig,
) -> RuntimeResult<()> {
    let ephemeral = messages.ephemeral;
    let reply = move |text: String| {
        let effect = PlatformEffect::text(text);
        if ephemeral { effect.ephemeral() } else { effect }
    };

    let templates = messages.clone();
    keep_existing(results.on::<MissingPermissions, _>(move |failure, _| {
        reply(templates.missing_permissions(&failure))
    }))?;
    let templates = messages.clone();
    keep_existing(results.on::<InvalidArguments, _>(move |failure, _| {
        reply(templates.invalid_arguments(&failure))
    }))?;
    let templates = messages.clone();
    keep_existing(results.on::<NotVisible, _>(move |failure, _| {
        reply(templates.not_visible(failure.context()))
    }))?;
    Ok(())
}

fn keep_existing<T>(registration: RegistryResult<T>) -> RuntimeResult<()> {
    match registration {
        Ok(_) => Ok(()),
        Err(RegistryError::DuplicateResult { target }) => {
            debug!(target_type = %target, "Keeping platform failure handler");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Runs registered commands.
pub struct Engine {
    dispatcher: Dispatcher,
    timeout: Duration,
    deferred_timeout: Duration,
    commands: HashMap<String, Command>,
}

impl Engine {
    /// Starts building an engine from `config`.
    pub fn builder(config: SlashbindConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Registers `handler` as the implementation of `spec`.
    ///
    /// Fails if the handler does not match its declaration or if the name is
    /// taken.
    pub fn register<H, T>(&mut self, spec: CommandSpec, handler: H) -> RuntimeResult<&Command>
    where
        H: Handler<T>,
        T: 'static,
    {
        if self.commands.contains_key(spec.name()) {
            return Err(RuntimeError::DuplicateCommand(spec.name().to_string()));
        }
        let command = self.dispatcher.command(spec, handler)?;
        let name = command.name().to_string();
        Ok(self.commands.entry(name).or_insert(command))
    }

    /// Returns the command registered as `name`.
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Returns every registered command.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Returns the dispatcher shared by all commands.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the invocation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `command`, bounded by the timeout and the invocation's
    /// cancellation token.
    ///
    /// On timeout the token is cancelled, which also cancels deferred values
    /// handed out during the invocation.
    pub async fn dispatch(
        &self,
        command: &Command,
        invocation: Arc<Invocation>,
    ) -> DispatchResult<PlatformEffect> {
        let token = invocation.token().clone();
        let span = info_span!(
            "dispatch",
            command = command.name(),
            user = invocation.sender().id(),
            origin = %invocation.origin()
        );

        async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(DispatchError::Cancelled),
                outcome = tokio::time::timeout(self.timeout, command.execute(invocation)) => {
                    match outcome {
                        Ok(result) => result,
                        Err(_) => {
                            token.cancel();
                            Err(DispatchError::Timeout(self.timeout))
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Returns the deadline of deferred responses.
    pub fn deferred_timeout(&self) -> Duration {
        self.deferred_timeout
    }

    /// Runs the command named by `invocation` and returns the effect to
    /// deliver. Dispatch failures become failure replies or no effect.
    ///
    /// A deferred effect must complete within the deferred timeout, counted
    /// from the start of the invocation. Past it the invocation is cancelled
    /// and the effect fails with [`DeferredError::Cancelled`].
    ///
    /// [`DeferredError::Cancelled`]: slashbind_core::DeferredError::Cancelled
    pub async fn execute(&self, invocation: Arc<Invocation>) -> RuntimeResult<PlatformEffect> {
        let deadline = Instant::now() + self.deferred_timeout;
        let command = self
            .commands
            .get(invocation.command())
            .ok_or_else(|| RuntimeError::UnknownCommand(invocation.command().to_string()))?;

        Ok(match self.dispatch(command, Arc::clone(&invocation)).await {
            Ok(PlatformEffect::Deferred(deferred)) => {
                let name = command.name().to_string();
                let limit = self.deferred_timeout;
                let expiry = async move {
                    tokio::time::sleep_until(deadline).await;
                    warn!(command = %name, timeout = ?limit, "Deferred response timed out");
                };
                PlatformEffect::Deferred(deferred.bounded(expiry, invocation.token().clone()))
            }
            Ok(effect) => effect,
            Err(e) => self.failure_effect(e, &invocation),
        })
    }

    /// Runs `invocation` and delivers its effect through `responder`.
    pub async fn respond<R>(&self, invocation: Invocation, responder: &R) -> RuntimeResult<()>
    where
        R: Responder + ?Sized,
    {
        let invocation = Arc::new(invocation);
        let effect = self.execute(Arc::clone(&invocation)).await?;
        if effect.is_none() {
            debug!(command = invocation.command(), "No effect to deliver");
        }
        responder.respond(&invocation, effect).await?;
        Ok(())
    }

    /// Converts a dispatch failure into the effect shown to the user.
    ///
    /// Permission, visibility and argument failures go through the result
    /// dispatcher; anything else is logged and produces no effect.
    pub fn failure_effect(&self, error: DispatchError, invocation: &Arc<Invocation>) -> PlatformEffect {
        let results = self.dispatcher.results();
        let formatted = match error {
            DispatchError::PermissionDenied(failure) => results.dispatch_typed(failure, invocation),
            DispatchError::NotVisible(failure) => results.dispatch_typed(failure, invocation),
            DispatchError::InvalidArguments(failure) => {
                debug!(command = invocation.command(), errors = %failure, "Invalid arguments");
                results.dispatch_typed(failure, invocation)
            }
            other => {
                error!(command = invocation.command(), error = %other, "Dispatch failed");
                return PlatformEffect::None;
            }
        };
        formatted.unwrap_or_else(|e| {
            error!(command = invocation.command(), error = %e, "Failed to format failure reply");
            PlatformEffect::None
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dispatcher", &self.dispatcher)
            .field("timeout", &self.timeout)
            .field("deferred_timeout", &self.deferred_timeout)
            .field("commands", &self.commands.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use slashbind_core::{
        ApiResult, Deferred, DeferredError, Identity, InteractionContext, Narrowing, OptionKind,
        OptionMap, Permission, PermissionRule, PermissionSet, RawValue, Visibility, async_trait,
    };
    use slashbind_framework::CommandError;
    use tokio_util::sync::CancellationToken;

    struct TestPlatform;

    impl Platform for TestPlatform {
        fn name(&self) -> &'static str {
            "test"
        }

        fn extractor(&self) -> Arc<dyn RawValueExtractor> {
            Arc::new(StoredOptions)
        }

        fn register_types(
            &self,
            types: &mut TypeRegistryBuilder,
            narrowing: Narrowing,
        ) -> RegistryResult<()> {
            types
                .register::<String, _>(OptionKind::String, RawValue::as_string)?
                .register::<i32, _>(OptionKind::Integer, move |raw: &RawValue| {
                    narrowing.narrow_i32(raw.as_long()?)
                })?;
            Ok(())
        }

        fn register_contexts(&self, _: &mut ContextRegistryBuilder) -> RegistryResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingResponder {
        effects: Mutex<Vec<PlatformEffect>>,
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn respond(&self, _: &Invocation, effect: PlatformEffect) -> ApiResult<()> {
            self.effects.lock().unwrap().push(effect);
            Ok(())
        }
    }

    async fn roll(sides: i32) -> String {
        format!("rolled a d{sides}")
    }

    async fn stall() -> String {
        tokio::time::sleep(Duration::from_secs(60)).await;
        "done".to_string()
    }

    fn engine(config: SlashbindConfig) -> Engine {
        let mut engine = Engine::builder(config)
            .platform(&TestPlatform)
            .unwrap()
            .build()
            .unwrap();
        engine
            .register(CommandSpec::new("roll").option::<i32>("sides"), roll)
            .unwrap();
        engine
            .register(
                CommandSpec::new("ban")
                    .option::<String>("reason")
                    .require(Permission::BanMembers)
                    .visibility(Visibility::guild_only()),
                |reason: String| async move { format!("banned: {reason}") },
            )
            .unwrap();
        engine.register(CommandSpec::new("stall"), stall).unwrap();
        engine
    }

    fn invocation(command: &str, options: OptionMap) -> Invocation {
        Invocation::builder(command, Identity::new(7, "ada"))
            .origin(InteractionContext::Guild)
            .context(options)
            .build()
    }

    #[tokio::test]
    async fn test_execute_replies() {
        let engine = engine(SlashbindConfig::default());
        let options = OptionMap::new().with("sides", OptionKind::Integer, 20.into());
        let effect = engine
            .execute(Arc::new(invocation("roll", options)))
            .await
            .unwrap();
        assert_eq!(effect.as_text(), Some("rolled a d20"));
        assert!(!effect.is_ephemeral());
    }

    #[tokio::test]
    async fn test_permission_denial_reply() {
        let engine = engine(SlashbindConfig::default());
        let options = OptionMap::new().with("reason", OptionKind::String, "spam".into());
        let effect = engine
            .execute(Arc::new(invocation("ban", options)))
            .await
            .unwrap();
        assert_eq!(
            effect.as_text(),
            Some("You are missing the following permissions: BAN_MEMBERS")
        );
        assert!(effect.is_ephemeral());
    }

    #[tokio::test]
    async fn test_not_visible_reply() {
        let engine = engine(SlashbindConfig::default());
        let invocation = Invocation::builder("ban", Identity::new(7, "ada"))
            .origin(InteractionContext::BotDm)
            .granted(PermissionSet::all())
            .build();
        let effect = engine.execute(Arc::new(invocation)).await.unwrap();
        assert_eq!(
            effect.as_text(),
            Some("This command is not available in direct messages.")
        );
    }

    #[tokio::test]
    async fn test_invalid_arguments_reply() {
        let mut config = SlashbindConfig::default();
        config.messages.ephemeral = false;
        let engine = engine(config);

        let effect = engine
            .execute(Arc::new(invocation("roll", OptionMap::new())))
            .await
            .unwrap();
        let text = effect.as_text().unwrap();
        assert!(text.starts_with("Invalid arguments: "), "{text}");
        assert!(text.contains("sides"), "{text}");
        assert!(!effect.is_ephemeral());
    }

    #[tokio::test]
    async fn test_narrowing_follows_config() {
        let options =
            || OptionMap::new().with("sides", OptionKind::Integer, 5_000_000_000i64.into());

        let rejecting = engine(SlashbindConfig::default());
        let effect = rejecting
            .execute(Arc::new(invocation("roll", options())))
            .await
            .unwrap();
        assert!(effect.as_text().unwrap().starts_with("Invalid arguments: "));

        let mut config = SlashbindConfig::default();
        config.conversion.narrowing = Narrowing::Saturate;
        let saturating = engine(config);
        let effect = saturating
            .execute(Arc::new(invocation("roll", options())))
            .await
            .unwrap();
        assert_eq!(effect.as_text(), Some("rolled a d2147483647"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cancels_invocation() {
        let engine = engine(SlashbindConfig::default());
        let invocation = Arc::new(invocation("stall", OptionMap::new()));
        let command = engine.command("stall").unwrap();

        let err = engine
            .dispatch(command, Arc::clone(&invocation))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Timeout(t) if t == Duration::from_millis(3000)));
        assert!(invocation.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_produces_no_effect() {
        let engine = engine(SlashbindConfig::default());
        let effect = engine
            .execute(Arc::new(invocation("stall", OptionMap::new())))
            .await
            .unwrap();
        assert!(effect.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_response_is_bounded() {
        let mut config = SlashbindConfig::default();
        config.dispatch.deferred_timeout_ms = 10_000;
        let mut engine = engine(config);
        engine
            .register(CommandSpec::new("later"), || async {
                Deferred::new(async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    "finally".to_string()
                })
            })
            .unwrap();

        let invocation = Arc::new(invocation("later", OptionMap::new()));
        let start = Instant::now();
        let effect = engine.execute(Arc::clone(&invocation)).await.unwrap();
        let PlatformEffect::Deferred(deferred) = effect else {
            panic!("expected a deferred effect");
        };
        assert!(!invocation.is_cancelled());

        let outcome = deferred.resolve().await;
        assert!(matches!(outcome, Err(DeferredError::Cancelled)));
        assert!(invocation.is_cancelled());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(10), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(3600), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_response_within_deadline() {
        let mut engine = engine(SlashbindConfig::default());
        engine
            .register(CommandSpec::new("soon"), || async {
                Deferred::new(async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done".to_string()
                })
            })
            .unwrap();

        let invocation = Arc::new(invocation("soon", OptionMap::new()));
        let effect = engine.execute(Arc::clone(&invocation)).await.unwrap();
        let PlatformEffect::Deferred(deferred) = effect else {
            panic!("expected a deferred effect");
        };
        let effect = deferred.resolve().await.unwrap();
        assert_eq!(effect.as_text(), Some("done"));
        assert!(!invocation.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_invocation() {
        let engine = engine(SlashbindConfig::default());
        let token = CancellationToken::new();
        token.cancel();
        let invocation = Invocation::builder("stall", Identity::new(7, "ada"))
            .cancellation(token)
            .build();

        let command = engine.command("stall").unwrap();
        let err = engine.dispatch(command, Arc::new(invocation)).await.unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let engine = engine(SlashbindConfig::default());
        let err = engine
            .execute(Arc::new(invocation("missing", OptionMap::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownCommand(name) if name == "missing"));
    }

    #[test]
    fn test_registration_errors() {
        let mut engine = engine(SlashbindConfig::default());

        let err = engine
            .register(CommandSpec::new("roll").option::<i32>("sides"), roll)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateCommand(name) if name == "roll"));

        let err = engine
            .register(CommandSpec::new("dice").option::<String>("sides"), roll)
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Command(CommandError::SignatureMismatch { .. })
        ));
        assert_eq!(engine.commands().count(), 3);
    }

    #[test]
    fn test_platform_failure_handler_is_kept() {
        struct Custom;

        impl Platform for Custom {
            fn name(&self) -> &'static str {
                "custom"
            }

            fn extractor(&self) -> Arc<dyn RawValueExtractor> {
                Arc::new(StoredOptions)
            }

            fn register_types(&self, _: &mut TypeRegistryBuilder, _: Narrowing) -> RegistryResult<()> {
                Ok(())
            }

            fn register_contexts(&self, _: &mut ContextRegistryBuilder) -> RegistryResult<()> {
                Ok(())
            }

            fn register_results(&self, results: &mut ResultDispatcherBuilder) -> RegistryResult<()> {
                results.on::<MissingPermissions, _>(|_, _| PlatformEffect::text("nope"))?;
                Ok(())
            }
        }

        let engine = Engine::builder(SlashbindConfig::default())
            .platform(&Custom)
            .unwrap()
            .build()
            .unwrap();
        let invocation = Arc::new(invocation("ban", OptionMap::new()));
        let effect = engine.failure_effect(
            DispatchError::PermissionDenied(MissingPermissions::new(
                PermissionRule::default().require(Permission::BanMembers).required(),
            )),
            &invocation,
        );
        assert_eq!(effect.as_text(), Some("nope"));
    }

    #[tokio::test]
    async fn test_respond_delivers_effect() {
        let engine = engine(SlashbindConfig::default());
        let responder = RecordingResponder::default();
        let options = OptionMap::new().with("sides", OptionKind::Integer, 4.into());

        engine
            .respond(invocation("roll", options), &responder)
            .await
            .unwrap();

        let effects = responder.effects.lock().unwrap();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].as_text(), Some("rolled a d4"));
    }
}
