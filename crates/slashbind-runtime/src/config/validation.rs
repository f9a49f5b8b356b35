//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    DispatchConfig, LogFormat, LogOutput, LoggingConfig, MessagesConfig, SlashbindConfig,
};

/// Validates the entire configuration.
pub fn validate_config(config: &SlashbindConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_dispatch_config(&config.dispatch)?;
    validate_messages_config(&config.messages)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigError::validation(
            "JSON log format requires the `json-log` feature",
        ));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter module name: {module:?}"
        )));
    }

    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Dispatch timeout must be greater than 0",
        ));
    }
    if dispatch.deferred_timeout_ms < dispatch.timeout_ms {
        return Err(ConfigError::validation(
            "Deferred timeout must not be shorter than the dispatch timeout",
        ));
    }
    Ok(())
}

fn validate_messages_config(messages: &MessagesConfig) -> ConfigResult<()> {
    let templates = [
        ("messages.missing_permissions", &messages.missing_permissions),
        ("messages.invalid_arguments", &messages.invalid_arguments),
        ("messages.not_visible", &messages.not_visible),
    ];
    for (field, template) in templates {
        if template.trim().is_empty() {
            return Err(ConfigError::missing_field(field));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&SlashbindConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = SlashbindConfig::default();
        config.dispatch.timeout_ms = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_deferred_timeout() {
        let mut config = SlashbindConfig::default();
        config.dispatch.deferred_timeout_ms = config.dispatch.timeout_ms - 1;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = SlashbindConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { ref field }) if field == "logging.file_path"
        ));

        config.logging.file_path = Some("logs/slashbind.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_template() {
        let mut config = SlashbindConfig::default();
        config.messages.not_visible = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }
}
