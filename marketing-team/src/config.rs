//! Team configuration.
//!
//! Read from a JSON file (default `config/config.json`). A missing file
//! means built-in defaults; a file that exists but does not parse is an
//! error. Values are validated when agents are built, not when loaded.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::agent::ModelAgent;
use crate::conversation::{BoundedConversation, DEFAULT_MAX_ROUNDS, DEFAULT_SENTINEL, Participant};
use crate::llm::{DEFAULT_MODEL, ModelProvider};
use crate::pipeline::TwoStagePipeline;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const CREATOR_TEMPERATURE: f32 = 0.7;
pub const REVIEWER_TEMPERATURE: f32 = 0.3;

/// Generation settings for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_model")]
    pub model: String,
    /// Unset means the role's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl AgentSettings {
    fn with_temperature(temperature: f32) -> Self {
        Self {
            model: default_model(),
            temperature: Some(temperature),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSettings {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

fn default_sentinel() -> String {
    DEFAULT_SENTINEL.to_string()
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            sentinel: default_sentinel(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    #[serde(default = "default_creator")]
    pub content_creator: AgentSettings,
    #[serde(default = "default_reviewer")]
    pub marketing_reviewer: AgentSettings,
    #[serde(default)]
    pub conversation: ConversationSettings,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_creator() -> AgentSettings {
    AgentSettings::with_temperature(CREATOR_TEMPERATURE)
}

fn default_reviewer() -> AgentSettings {
    AgentSettings::with_temperature(REVIEWER_TEMPERATURE)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            content_creator: default_creator(),
            marketing_reviewer: default_reviewer(),
            conversation: ConversationSettings::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TeamConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Use `model` for both roles.
    pub fn override_model(&mut self, model: &str) {
        self.content_creator.model = model.to_string();
        self.marketing_reviewer.model = model.to_string();
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn content_creator(&self, provider: Arc<dyn ModelProvider>) -> crate::Result<ModelAgent> {
        let s = &self.content_creator;
        let temperature = s.temperature.unwrap_or(CREATOR_TEMPERATURE);
        ModelAgent::content_creator(provider, &s.model, temperature, s.max_tokens)
    }

    pub fn marketing_reviewer(&self, provider: Arc<dyn ModelProvider>) -> crate::Result<ModelAgent> {
        let s = &self.marketing_reviewer;
        let temperature = s.temperature.unwrap_or(REVIEWER_TEMPERATURE);
        ModelAgent::marketing_reviewer(provider, &s.model, temperature, s.max_tokens)
    }

    pub fn pipeline(&self, provider: Arc<dyn ModelProvider>) -> crate::Result<TwoStagePipeline> {
        Ok(TwoStagePipeline::new(
            self.content_creator(provider.clone())?,
            self.marketing_reviewer(provider)?,
        ))
    }

    /// Conversation over `human`, creator and reviewer, in that order.
    pub fn conversation(
        &self,
        provider: Arc<dyn ModelProvider>,
        human: Participant,
    ) -> crate::Result<BoundedConversation> {
        let roster = vec![
            human,
            Participant::generator(self.content_creator(provider.clone())?),
            Participant::reviewer(self.marketing_reviewer(provider)?),
        ];
        BoundedConversation::new(roster, self.conversation.max_rounds)?
            .with_sentinel(self.conversation.sentinel.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::ScriptedProvider;

    fn provider() -> Arc<dyn ModelProvider> {
        Arc::new(ScriptedProvider::new(Vec::<String>::new()))
    }

    #[test]
    fn defaults_match_role_temperatures() {
        let config = TeamConfig::default();
        assert_eq!(config.content_creator.temperature, Some(0.7));
        assert_eq!(config.marketing_reviewer.temperature, Some(0.3));
        assert_eq!(config.content_creator.max_tokens, 2000);
        assert_eq!(config.conversation.max_rounds, 10);
        assert_eq!(config.conversation.sentinel, "TAAK VOLTOOID");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: TeamConfig = serde_json::from_str(
            r#"{"content_creator": {"temperature": 0.9}, "conversation": {"max_rounds": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.content_creator.temperature, Some(0.9));
        assert_eq!(config.content_creator.model, DEFAULT_MODEL);
        assert_eq!(config.marketing_reviewer.temperature, Some(0.3));
        assert_eq!(config.conversation.max_rounds, 4);
        assert_eq!(config.conversation.sentinel, DEFAULT_SENTINEL);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn omitted_temperature_uses_role_default() {
        let config: TeamConfig = serde_json::from_str(
            r#"{"content_creator": {"model": "x"}, "marketing_reviewer": {"max_tokens": 500}}"#,
        )
        .unwrap();
        assert_eq!(config.content_creator.temperature, None);
        assert_eq!(config.content_creator.model, "x");
        assert_eq!(config.marketing_reviewer.max_tokens, 500);

        let pipeline = config.pipeline(provider()).unwrap();
        assert_eq!(pipeline.generator().profile().temperature(), CREATOR_TEMPERATURE);
        assert_eq!(pipeline.reviewer().profile().temperature(), REVIEWER_TEMPERATURE);
        assert_eq!(pipeline.reviewer().profile().max_output_tokens(), 500);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = TeamConfig::load(Path::new("/nonexistent/marketing-team/config.json")).unwrap();
        assert_eq!(config, TeamConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("marketing-team-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = TeamConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_temperature_surfaces_when_building_agents() {
        let mut config = TeamConfig::default();
        config.marketing_reviewer.temperature = Some(1.4);
        assert!(matches!(config.pipeline(provider()), Err(Error::Configuration(_))));
    }

    #[test]
    fn override_model_applies_to_both_roles() {
        let mut config = TeamConfig::default();
        config.override_model("claude-test");
        let pipeline = config.pipeline(provider()).unwrap();
        assert_eq!(pipeline.generator().profile().model_id(), "claude-test");
        assert_eq!(pipeline.reviewer().profile().model_id(), "claude-test");
    }

    #[test]
    fn conversation_uses_configured_sentinel() {
        let mut config = TeamConfig::default();
        config.conversation.sentinel = "DONE".into();
        let conv = config
            .conversation(provider(), Participant::unattended_human())
            .unwrap();
        assert_eq!(conv.sentinel(), "DONE");
    }
}
