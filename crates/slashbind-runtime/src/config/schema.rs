//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use slashbind_core::{DirectMessagePolicy, InteractionContext, InvalidArguments, MissingPermissions, Narrowing};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlashbindConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Dispatch driver settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Default converter settings.
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Access gate settings.
    #[serde(default)]
    pub access: AccessConfig,

    /// Reply templates for dispatch failures.
    #[serde(default)]
    pub messages: MessagesConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a [`tracing::Level`].
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Rotation of the log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level; `RUST_LOG` takes precedence when set.
    pub level: LogLevel,

    pub format: LogFormat,

    pub output: LogOutput,

    /// Log file, required for [`LogOutput::File`].
    pub file_path: Option<PathBuf>,

    pub rotation: LogRotation,

    /// Per-module levels, e.g. `slashbind_core = "trace"`.
    pub filters: HashMap<String, LogLevel>,

    pub span_events: SpanEventConfig,

    /// Include thread ids.
    pub thread_ids: bool,

    /// Include file names and line numbers.
    pub file_location: bool,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Time an invocation may take before it is cancelled, in milliseconds.
    pub timeout_ms: u64,

    /// Report every failing parameter instead of the first.
    pub collect_all_errors: bool,

    /// Time a deferred response may take to complete, in milliseconds,
    /// counted from the start of the invocation. Discord interaction tokens
    /// stay valid for 15 minutes.
    pub deferred_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            collect_all_errors: true,
            deferred_timeout_ms: 900_000,
        }
    }
}

impl DispatchConfig {
    /// Returns the invocation timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the deadline of deferred responses.
    pub fn deferred_timeout(&self) -> Duration {
        Duration::from_millis(self.deferred_timeout_ms)
    }
}

/// Converter configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// How out-of-range numbers are narrowed.
    pub narrowing: Narrowing,
}

/// Access gate configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Whether permission rules apply in direct messages.
    pub direct_messages: DirectMessagePolicy,
}

// =============================================================================
// Messages
// =============================================================================

/// Reply templates for failures shown to the invoking user.
///
/// `{permissions}`, `{errors}` and `{context}` are replaced with the failure
/// details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub missing_permissions: String,
    pub invalid_arguments: String,
    pub not_visible: String,
    /// Send failure replies to the invoking user only.
    pub ephemeral: bool,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            missing_permissions: "You are missing the following permissions: {permissions}"
                .to_string(),
            invalid_arguments: "Invalid arguments: {errors}".to_string(),
            not_visible: "This command is not available in {context}.".to_string(),
            ephemeral: true,
        }
    }
}

impl MessagesConfig {
    /// Renders the missing-permissions reply.
    pub fn missing_permissions(&self, failure: &MissingPermissions) -> String {
        self.missing_permissions
            .replace("{permissions}", &failure.missing().to_string())
    }

    /// Renders the invalid-arguments reply.
    pub fn invalid_arguments(&self, failure: &InvalidArguments) -> String {
        self.invalid_arguments
            .replace("{errors}", &failure.to_string())
    }

    /// Renders the not-visible reply.
    pub fn not_visible(&self, context: InteractionContext) -> String {
        let context = match context {
            InteractionContext::Guild => "servers",
            InteractionContext::BotDm => "direct messages",
            InteractionContext::PrivateChannel => "private channels",
        };
        self.not_visible.replace("{context}", context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slashbind_core::{Permission, PermissionSet, TranslationError};

    #[test]
    fn test_defaults() {
        let config = SlashbindConfig::default();
        assert_eq!(config.dispatch.timeout(), Duration::from_secs(3));
        assert!(config.dispatch.collect_all_errors);
        assert_eq!(config.conversion.narrowing, Narrowing::Reject);
        assert_eq!(config.access.direct_messages, DirectMessagePolicy::Deny);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_templates() {
        let messages = MessagesConfig::default();
        let missing = MissingPermissions::new(
            PermissionSet::from(Permission::BanMembers) | Permission::KickMembers,
        );
        assert_eq!(
            messages.missing_permissions(&missing),
            format!(
                "You are missing the following permissions: {}",
                missing.missing()
            )
        );

        let invalid = InvalidArguments::new(vec![TranslationError::NotPresent {
            parameter: "target".into(),
        }]);
        assert_eq!(
            messages.invalid_arguments(&invalid),
            "Invalid arguments: `target` is not present"
        );

        assert_eq!(
            messages.not_visible(InteractionContext::BotDm),
            "This command is not available in direct messages."
        );
    }
}
