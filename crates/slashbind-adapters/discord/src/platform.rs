//! The Discord platform.
//!
//! ```rust,ignore
//! use slashbind_adapter_discord::{Client, DiscordPlatform};
//!
//! let platform = DiscordPlatform::builder(application_id)
//!     .config(DiscordConfig::default())
//!     .build();
//! let engine = Engine::builder(config).platform(&platform)?.build()?;
//! ```

use std::sync::Arc;

use slashbind_core::{
    ContextRegistryBuilder, Narrowing, Platform, RawValueExtractor, RegistryResult,
    TypeRegistryBuilder,
};

use crate::config::DiscordConfig;
use crate::convert;
use crate::extractor::InteractionOptions;

/// Handle to the bot application, injectable into handlers as context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    application_id: u64,
    config: Arc<DiscordConfig>,
}

impl Client {
    /// Creates a client with the default configuration.
    pub fn new(application_id: u64) -> Self {
        Self::with_config(application_id, DiscordConfig::default())
    }

    /// Creates a client with `config`.
    pub fn with_config(application_id: u64, config: DiscordConfig) -> Self {
        Self {
            application_id,
            config: Arc::new(config),
        }
    }

    /// Returns the application id.
    pub fn application_id(&self) -> u64 {
        self.application_id
    }

    /// Returns the adapter configuration.
    pub fn config(&self) -> &DiscordConfig {
        &self.config
    }
}

slashbind_core::impl_typed!(Client);

/// The Discord platform: interaction option extractor, default converters
/// and context providers.
#[derive(Debug, Clone)]
pub struct DiscordPlatform {
    client: Client,
}

impl DiscordPlatform {
    /// Creates the platform for `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a platform builder.
    pub fn builder(application_id: u64) -> DiscordPlatformBuilder {
        DiscordPlatformBuilder {
            application_id,
            config: DiscordConfig::default(),
        }
    }

    /// Returns the client bound as context.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Platform for DiscordPlatform {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn extractor(&self) -> Arc<dyn RawValueExtractor> {
        Arc::new(InteractionOptions)
    }

    fn register_types(
        &self,
        types: &mut TypeRegistryBuilder,
        narrowing: Narrowing,
    ) -> RegistryResult<()> {
        convert::register_types(types, narrowing)
    }

    fn register_contexts(&self, contexts: &mut ContextRegistryBuilder) -> RegistryResult<()> {
        convert::register_contexts(contexts, self.client.clone())
    }
}

/// Builder for [`DiscordPlatform`].
#[derive(Debug, Clone)]
pub struct DiscordPlatformBuilder {
    application_id: u64,
    config: DiscordConfig,
}

impl DiscordPlatformBuilder {
    /// Sets the adapter configuration.
    pub fn config(mut self, config: DiscordConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the REST API root.
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.config.api_base = api_base.into();
        self
    }

    /// Builds the platform.
    pub fn build(self) -> DiscordPlatform {
        DiscordPlatform::new(Client::with_config(self.application_id, self.config))
    }
}
