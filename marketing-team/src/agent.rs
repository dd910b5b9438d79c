//! Role-bound model agents.
//!
//! A [`ModelAgent`] pairs an immutable [`AgentProfile`] with a shared
//! [`ModelProvider`]. It carries no conversation memory: whatever history a
//! call needs must already be in the prompt.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::llm::{ModelProvider, ModelRequest};

pub const CONTENT_CREATOR_PREAMBLE: &str = r#"You are ContentCreator, an experienced marketing professional who writes persuasive, engaging marketing copy.

Your job is to produce original marketing content from brand and campaign information.
You are creative and strategic, and you know how to tailor content to different audiences and channels.
Always respect the brand identity and the campaign goals."#;

pub const MARKETING_REVIEWER_PREAMBLE: &str = r#"You are MarketingReviewer, a marketing expert who critiques and improves marketing content.

Your job is to review content critically and propose concrete improvements.
You have expertise in copywriting, branding, marketing strategy and audience analysis.
You judge content on effectiveness, brand values, tone of voice and conversion goals."#;

/// Fixed persona and generation parameters for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentProfile {
    role_name: String,
    system_preamble: String,
    model_id: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl AgentProfile {
    pub fn new(
        role_name: impl Into<String>,
        system_preamble: impl Into<String>,
        model_id: impl Into<String>,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<Self> {
        let profile = Self {
            role_name: role_name.into(),
            system_preamble: system_preamble.into(),
            model_id: model_id.into(),
            temperature,
            max_output_tokens,
        };
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<()> {
        if self.role_name.trim().is_empty() {
            return Err(Error::config("agent role name is empty"));
        }
        if self.model_id.trim().is_empty() {
            return Err(Error::config(format!(
                "agent '{}' has no model id",
                self.role_name
            )));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::config(format!(
                "agent '{}' temperature {} is outside [0, 1]",
                self.role_name, self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(Error::config(format!(
                "agent '{}' max_output_tokens must be greater than 0",
                self.role_name
            )));
        }
        Ok(())
    }

    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    pub fn system_preamble(&self) -> &str {
        &self.system_preamble
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }
}

/// One language-model role.
#[derive(Clone)]
pub struct ModelAgent {
    profile: AgentProfile,
    provider: Arc<dyn ModelProvider>,
}

impl std::fmt::Debug for ModelAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAgent")
            .field("profile", &self.profile)
            .field("provider", &self.provider.name())
            .finish()
    }
}

impl ModelAgent {
    pub fn new(profile: AgentProfile, provider: Arc<dyn ModelProvider>) -> Self {
        Self { profile, provider }
    }

    /// The copywriter role.
    pub fn content_creator(
        provider: Arc<dyn ModelProvider>,
        model_id: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<Self> {
        let profile = AgentProfile::new(
            "content_creator",
            CONTENT_CREATOR_PREAMBLE,
            model_id,
            temperature,
            max_output_tokens,
        )?;
        Ok(Self::new(profile, provider))
    }

    /// The critic role.
    pub fn marketing_reviewer(
        provider: Arc<dyn ModelProvider>,
        model_id: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<Self> {
        let profile = AgentProfile::new(
            "marketing_reviewer",
            MARKETING_REVIEWER_PREAMBLE,
            model_id,
            temperature,
            max_output_tokens,
        )?;
        Ok(Self::new(profile, provider))
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        self.profile.role_name()
    }

    /// Run one exchange and return the model's text verbatim.
    ///
    /// Not retried; an empty prompt, a failed call or a blank response are
    /// all [`Error::AgentInvocation`].
    pub async fn invoke(&self, prompt: &str) -> Result<String> {
        let name = self.name();
        if prompt.trim().is_empty() {
            return Err(Error::invocation(name, "prompt is empty"));
        }

        let request = ModelRequest {
            model: self.profile.model_id.clone(),
            system: self.profile.system_preamble.clone(),
            prompt: prompt.to_string(),
            temperature: self.profile.temperature,
            max_tokens: self.profile.max_output_tokens,
        };

        tracing::debug!(agent = %name, provider = self.provider.name(), chars = prompt.len(), "Invoking model");
        let text = self
            .provider
            .invoke(&request)
            .await
            .map_err(|e| Error::invocation(name, format!("{e:#}")))?;

        if text.trim().is_empty() {
            return Err(Error::invocation(name, "model returned an empty response"));
        }
        tracing::debug!(agent = %name, chars = text.len(), "Model responded");
        Ok(text)
    }
}
