//! Configuration types for the Discord adapter.
//!
//! # Example Configuration
//!
//! ```toml
//! [discord]
//! api_base = "https://discord.com/api/v10"
//! suppress_mentions = true
//! ```

use serde::{Deserialize, Serialize};

/// Default REST API root.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Discord adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// REST API root used to build callback and webhook URLs.
    pub api_base: String,

    /// Whether replies are sent with mention parsing disabled.
    pub suppress_mentions: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            suppress_mentions: true,
        }
    }
}

impl DiscordConfig {
    /// Returns the URL answering interaction `id`.
    pub fn callback_url(&self, id: u64, token: &str) -> String {
        format!("{}/interactions/{id}/{token}/callback", self.base())
    }

    /// Returns the URL of the original response of an interaction.
    pub fn original_url(&self, application_id: u64, token: &str) -> String {
        format!(
            "{}/webhooks/{application_id}/{token}/messages/@original",
            self.base()
        )
    }

    fn base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: DiscordConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DiscordConfig::default());
        assert!(config.suppress_mentions);
    }

    #[test]
    fn test_urls() {
        let config = DiscordConfig {
            api_base: "http://localhost:8080/api/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.callback_url(1, "tok"),
            "http://localhost:8080/api/interactions/1/tok/callback"
        );
        assert_eq!(
            config.original_url(2, "tok"),
            "http://localhost:8080/api/webhooks/2/tok/messages/@original"
        );
    }
}
