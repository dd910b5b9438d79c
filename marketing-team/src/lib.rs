//! marketing-team: a content creator and a marketing reviewer working on
//! the same piece of copy.
//!
//! - Two-stage pipeline: generate once, review and rewrite once
//! - Bounded conversation: creator, reviewer and a human taking turns
//!   until a sentinel phrase or the round cap
//! - Tolerant parsing of free-text reviews into a score and rewrite

pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod review;
pub mod tools;

pub use agent::{AgentProfile, ModelAgent};
pub use conversation::{
    BoundedConversation, ConversationMessage, ConversationState, HumanInput, Participant,
    Speaker, TerminationReason, run_conversation,
};
pub use error::{Error, Result};
pub use llm::{LlmClient, ModelProvider, ModelRequest};
pub use pipeline::{ContentRequest, GeneratedContent, PipelineResult, TwoStagePipeline};
pub use review::ReviewResult;

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory providers for unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm::{ModelProvider, ModelRequest};

    /// Replays canned responses in order, then fails.
    pub struct ScriptedProvider {
        responses: Mutex<VecDeque<String>>,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedProvider {
        pub fn new<I, S>(responses: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<ModelRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn invoke(&self, request: &ModelRequest) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }
    }

    /// Answers every call with the same text.
    pub struct RepeatingProvider {
        reply: String,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl RepeatingProvider {
        pub fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.prompt.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ModelProvider for RepeatingProvider {
        fn name(&self) -> &str {
            "repeating"
        }

        async fn invoke(&self, request: &ModelRequest) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    /// Fails every call.
    pub struct FailingProvider {
        reason: String,
    }

    impl FailingProvider {
        pub fn new(reason: &str) -> Self {
            Self {
                reason: reason.to_string(),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn invoke(&self, _request: &ModelRequest) -> anyhow::Result<String> {
            anyhow::bail!("{}", self.reason)
        }
    }
}
