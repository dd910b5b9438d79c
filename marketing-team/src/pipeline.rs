//! Two-stage pipeline: the creator writes, the reviewer critiques and
//! rewrites.
//!
//! Runs are all-or-nothing. A [`PipelineResult`] exists only when both model
//! calls succeeded; review strictly follows generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::ModelAgent;
use crate::error::Result;
use crate::review::{self, ReviewResult};

/// Channels offered by the original form. Any text is accepted.
pub const KNOWN_CAMPAIGN_TYPES: &[&str] = &[
    "Instagram Post",
    "Email Campaign",
    "LinkedIn Content",
    "Facebook Ad",
    "Twitter/X Post",
    "TikTok Script",
    "Blog Article",
    "Press Release",
];

/// Caller input for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub brand_info: String,
    pub campaign_type: String,
    pub target_audience: String,
    pub instruction: String,
}

impl ContentRequest {
    pub fn new(
        brand_info: impl Into<String>,
        campaign_type: impl Into<String>,
        target_audience: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            brand_info: brand_info.into(),
            campaign_type: campaign_type.into(),
            target_audience: target_audience.into(),
            instruction: instruction.into(),
        }
    }
}

/// Raw output of the generation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    pub text: String,
}

/// Terminal artifact of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub original_content: String,
    pub review_text: String,
    pub score: u8,
    pub improved_content: String,
    pub campaign_type: String,
    pub created_at: DateTime<Utc>,
    /// Why score or improved content fell back to defaults, if they did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

/// Prompt for the creator.
pub fn generation_prompt(request: &ContentRequest) -> String {
    let ContentRequest {
        brand_info,
        campaign_type,
        target_audience,
        instruction,
    } = request;
    format!(
        "Create {campaign_type} content for the following brand.\n\n\
         BRAND INFORMATION:\n{brand_info}\n\n\
         TARGET AUDIENCE:\n{target_audience}\n\n\
         REQUEST:\n{instruction}\n\n\
         Make sure the content matches the brand identity and the target audience.\n\
         Make it persuasive, engaging and suited to the specific channel ({campaign_type})."
    )
}

/// Prompt for the reviewer. The numbered sections are what
/// [`review::parse`] looks for.
pub fn review_prompt(content: &GeneratedContent, request: &ContentRequest) -> String {
    let ContentRequest {
        brand_info,
        campaign_type,
        target_audience,
        ..
    } = request;
    format!(
        "Review and improve the following {campaign_type} content.\n\n\
         CONTENT:\n{content}\n\n\
         BRAND INFORMATION:\n{brand_info}\n\n\
         TARGET AUDIENCE:\n{target_audience}\n\n\
         Give a structured review with these sections, each separated by a blank line:\n\
         1. Overall impression (scale 1-10), written as N/10\n\
         2. Strengths\n\
         3. Weaknesses\n\
         4. Improved version of the content (the heading alone, then the new content as the next paragraph)\n\
         5. Explanation of the changes\n\n\
         Make sure the improved content fits the brand identity and the target audience.",
        content = content.text,
    )
}

/// Creator followed by reviewer.
#[derive(Debug, Clone)]
pub struct TwoStagePipeline {
    generator: ModelAgent,
    reviewer: ModelAgent,
}

impl TwoStagePipeline {
    pub fn new(generator: ModelAgent, reviewer: ModelAgent) -> Self {
        Self {
            generator,
            reviewer,
        }
    }

    pub fn generator(&self) -> &ModelAgent {
        &self.generator
    }

    pub fn reviewer(&self) -> &ModelAgent {
        &self.reviewer
    }

    /// Flat entry point used by the CLI.
    pub async fn run_with(
        &self,
        instruction: &str,
        campaign_type: &str,
        brand_info: &str,
        target_audience: &str,
    ) -> Result<PipelineResult> {
        let request = ContentRequest::new(brand_info, campaign_type, target_audience, instruction);
        self.run(&request).await
    }

    pub async fn run(&self, request: &ContentRequest) -> Result<PipelineResult> {
        tracing::info!(campaign_type = %request.campaign_type, "Generating content");
        let generated = self.generate(request).await?;

        tracing::info!(chars = generated.text.len(), "Reviewing content");
        let review = self.review(&generated, request).await?;
        if let Some(problem) = &review.parse_error {
            tracing::warn!(problem = %problem, "Review parsed with fallbacks");
        }
        tracing::info!(score = review.score, "Pipeline complete");

        Ok(PipelineResult {
            original_content: generated.text,
            review_text: review.review_text,
            score: review.score,
            improved_content: review.improved_content,
            campaign_type: request.campaign_type.clone(),
            created_at: Utc::now(),
            parse_error: review.parse_error,
        })
    }

    async fn generate(&self, request: &ContentRequest) -> Result<GeneratedContent> {
        let text = self.generator.invoke(&generation_prompt(request)).await?;
        Ok(GeneratedContent { text })
    }

    async fn review(
        &self,
        content: &GeneratedContent,
        request: &ContentRequest,
    ) -> Result<ReviewResult> {
        let raw = self
            .reviewer
            .invoke(&review_prompt(content, request))
            .await
            .inspect_err(|e| {
                tracing::warn!(error = %e, discarded_chars = content.text.len(), "Review failed, discarding generated content");
            })?;
        Ok(review::parse(&raw))
    }
}
