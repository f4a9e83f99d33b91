use anyhow::{Context, Result};

use crate::llm_client::prompts::SALES_ANALYST_PERSONA;

const DEFAULT_DATABASE_URL: &str = "postgresql://postgres:postgres@db:5432/chatdb";
const DEFAULT_SCHEMA_PATH: &str = "data/static/schema.json";
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Application configuration loaded from environment variables.
///
/// Built once at startup and handed to the services that need it. The API key
/// is optional here: a missing key is logged at startup and surfaced as a
/// server error on the first chat request.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_api_url: String,
    pub chat: ChatConfig,
    pub schema_path: String,
    pub port: u16,
    pub rust_log: String,
}

/// Model and persona settings for the chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
    /// Instruction appended to narrative prompts to shape the reply's voice.
    pub persona: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            persona: SALES_ANALYST_PERSONA.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = ChatConfig::default();

        let temperature = match lookup("CHAT_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .with_context(|| format!("CHAT_TEMPERATURE must be a number, got '{raw}'"))?,
            None => defaults.temperature,
        };

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()),
            anthropic_api_url: lookup("ANTHROPIC_API_URL")
                .unwrap_or_else(|| crate::llm_client::ANTHROPIC_API_URL.to_string()),
            chat: ChatConfig {
                model: lookup("CHAT_MODEL").unwrap_or(defaults.model),
                temperature,
                persona: lookup("CHAT_PERSONA").unwrap_or(defaults.persona),
            },
            schema_path: lookup("SCHEMA_PATH").unwrap_or_else(|| DEFAULT_SCHEMA_PATH.to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.schema_path, DEFAULT_SCHEMA_PATH);
        assert_eq!(config.port, 8080);
        assert_eq!(config.chat.model, DEFAULT_MODEL);
        assert!(config.anthropic_api_key.is_none());
        assert_eq!(config.chat.persona, SALES_ANALYST_PERSONA);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/test"),
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("CHAT_MODEL", "claude-3-5-sonnet-20241022"),
            ("CHAT_TEMPERATURE", "0.2"),
            ("CHAT_PERSONA", "Answer briefly."),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "postgres://localhost/test");
        assert_eq!(config.anthropic_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.chat.model, "claude-3-5-sonnet-20241022");
        assert!((config.chat.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.chat.persona, "Answer briefly.");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = Config::from_lookup(lookup_from(&[("ANTHROPIC_API_KEY", "  ")])).unwrap();
        assert!(config.anthropic_api_key.is_none());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_temperature_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("CHAT_TEMPERATURE", "warm")]));
        assert!(result.is_err());
    }
}
