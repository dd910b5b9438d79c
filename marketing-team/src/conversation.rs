//! Bounded multi-party conversation.
//!
//! A fixed roster (human proxy, creator, reviewer) takes turns in rotation
//! for at most `max_rounds` rounds. The first message containing the
//! sentinel phrase ends the conversation on the spot. A failed agent turn
//! ends it too, but the log collected so far is kept.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::ModelAgent;
use crate::error::{Error, Result};

/// Completion marker agreed with the agents.
pub const DEFAULT_SENTINEL: &str = "TAAK VOLTOOID";
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Human,
    Generator,
    Reviewer,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Human => write!(f, "human"),
            Speaker::Generator => write!(f, "generator"),
            Speaker::Reviewer => write!(f, "reviewer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub speaker: Speaker,
    pub content: String,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    None,
    SentinelPhrase,
    MaxRounds,
    /// An agent turn failed; carries the error text.
    Errored(String),
}

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status<'a> {
    Running,
    Terminated(&'a TerminationReason),
}

/// Log and progress of one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<ConversationMessage>,
    round: u32,
    max_rounds: u32,
    terminated: bool,
    termination_reason: TerminationReason,
    /// Who was speaking when the conversation errored.
    failed_speaker: Option<Speaker>,
}

impl ConversationState {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            messages: Vec::new(),
            round: 0,
            max_rounds,
            terminated: false,
            termination_reason: TerminationReason::None,
            failed_speaker: None,
        }
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn termination_reason(&self) -> &TerminationReason {
        &self.termination_reason
    }

    pub fn failed_speaker(&self) -> Option<Speaker> {
        self.failed_speaker
    }

    pub fn status(&self) -> Status<'_> {
        if self.terminated {
            Status::Terminated(&self.termination_reason)
        } else {
            Status::Running
        }
    }

    /// Start the next round. False once the cap is reached.
    fn advance_round(&mut self) -> bool {
        if self.terminated || self.round >= self.max_rounds {
            return false;
        }
        self.round += 1;
        true
    }

    /// Append a message at the current round. Ignored once terminated.
    fn push(&mut self, speaker: Speaker, content: String) {
        if self.terminated {
            return;
        }
        self.messages.push(ConversationMessage {
            speaker,
            content,
            round: self.round,
        });
    }

    fn terminate(&mut self, reason: TerminationReason) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.termination_reason = reason;
    }

    fn last_contains(&self, sentinel: &str) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.content.contains(sentinel))
    }
}

/// Source of the human participant's messages.
#[async_trait]
pub trait HumanInput: Send + Sync {
    /// The human's next message, or `None` to pass the turn.
    async fn next_message(&self, log: &[ConversationMessage]) -> Option<String>;
}

/// A human who never speaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unattended;

#[async_trait]
impl HumanInput for Unattended {
    async fn next_message(&self, _log: &[ConversationMessage]) -> Option<String> {
        None
    }
}

/// One seat in the rotation.
#[derive(Clone)]
pub enum Participant {
    Human(Arc<dyn HumanInput>),
    Agent { speaker: Speaker, agent: ModelAgent },
}

impl Participant {
    pub fn unattended_human() -> Self {
        Participant::Human(Arc::new(Unattended))
    }

    pub fn generator(agent: ModelAgent) -> Self {
        Participant::Agent {
            speaker: Speaker::Generator,
            agent,
        }
    }

    pub fn reviewer(agent: ModelAgent) -> Self {
        Participant::Agent {
            speaker: Speaker::Reviewer,
            agent,
        }
    }

    pub fn speaker(&self) -> Speaker {
        match self {
            Participant::Human(_) => Speaker::Human,
            Participant::Agent { speaker, .. } => *speaker,
        }
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Participant::Human(_) => f.write_str("Human"),
            Participant::Agent { speaker, agent } => f
                .debug_struct("Agent")
                .field("speaker", speaker)
                .field("agent", &agent.name())
                .finish(),
        }
    }
}

/// Round-capped rotation over a roster.
#[derive(Debug, Clone)]
pub struct BoundedConversation {
    roster: Vec<Participant>,
    max_rounds: u32,
    sentinel: String,
}

impl BoundedConversation {
    pub fn new(roster: Vec<Participant>, max_rounds: u32) -> Result<Self> {
        if roster.is_empty() {
            return Err(Error::config("conversation roster is empty"));
        }
        if max_rounds == 0 {
            return Err(Error::config("max_rounds must be greater than 0"));
        }
        Ok(Self {
            roster,
            max_rounds,
            sentinel: DEFAULT_SENTINEL.to_string(),
        })
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Result<Self> {
        let sentinel = sentinel.into();
        if sentinel.is_empty() {
            return Err(Error::config("sentinel phrase is empty"));
        }
        self.sentinel = sentinel;
        Ok(self)
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Drive the conversation to a terminal state.
    ///
    /// `opening` is recorded as the human's round-0 message.
    pub async fn run(&self, opening: &str) -> ConversationState {
        let mut state = ConversationState::new(self.max_rounds);

        if !opening.trim().is_empty() {
            state.push(Speaker::Human, opening.to_string());
            if state.last_contains(&self.sentinel) {
                state.terminate(TerminationReason::SentinelPhrase);
                return state;
            }
        }

        while state.advance_round() {
            tracing::debug!(round = state.round(), "Conversation round");
            for participant in &self.roster {
                let speaker = participant.speaker();
                let content = match participant {
                    Participant::Human(input) => match input.next_message(state.messages()).await {
                        Some(text) if !text.trim().is_empty() => text,
                        _ => continue,
                    },
                    Participant::Agent { agent, .. } => {
                        let prompt = self.render_prompt(speaker, agent, &state);
                        match agent.invoke(&prompt).await {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::warn!(round = state.round(), speaker = %speaker, error = %e, "Conversation turn failed");
                                state.failed_speaker = Some(speaker);
                                state.terminate(TerminationReason::Errored(e.to_string()));
                                return state;
                            }
                        }
                    }
                };

                state.push(speaker, content);
                if state.last_contains(&self.sentinel) {
                    tracing::info!(round = state.round(), speaker = %speaker, "Sentinel phrase seen");
                    state.terminate(TerminationReason::SentinelPhrase);
                    return state;
                }
            }
        }

        tracing::info!(rounds = state.round(), "Conversation hit round cap");
        state.terminate(TerminationReason::MaxRounds);
        state
    }

    fn render_prompt(&self, speaker: Speaker, agent: &ModelAgent, state: &ConversationState) -> String {
        let mut prompt = String::from("Conversation so far:\n\n");
        if state.messages().is_empty() {
            prompt.push_str("(no messages yet)\n");
        }
        for msg in state.messages() {
            prompt.push_str(&format!("[{}] {}\n\n", msg.speaker, msg.content));
        }
        prompt.push_str(&format!(
            "You are the {speaker} ({role}). Write your next message. \
             When the content is final and approved, end your message with \"{sentinel}\".",
            role = agent.name(),
            sentinel = self.sentinel,
        ));
        prompt
    }
}

/// Entry point for orchestration layers.
pub async fn run_conversation(
    roster: Vec<Participant>,
    max_rounds: u32,
    opening: &str,
) -> Result<ConversationState> {
    Ok(BoundedConversation::new(roster, max_rounds)?.run(opening).await)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::agent::AgentProfile;
    use crate::llm::ModelProvider;
    use crate::testing::{FailingProvider, RepeatingProvider, ScriptedProvider};

    fn agent(role: &str, provider: Arc<dyn ModelProvider>) -> ModelAgent {
        ModelAgent::new(
            AgentProfile::new(role, "persona", "m", 0.5, 100).unwrap(),
            provider,
        )
    }

    fn roster(gen_provider: Arc<dyn ModelProvider>, rev_provider: Arc<dyn ModelProvider>) -> Vec<Participant> {
        vec![
            Participant::unattended_human(),
            Participant::generator(agent("content_creator", gen_provider)),
            Participant::reviewer(agent("marketing_reviewer", rev_provider)),
        ]
    }

    struct ScriptedHuman(Mutex<VecDeque<String>>);

    #[async_trait]
    impl HumanInput for ScriptedHuman {
        async fn next_message(&self, _log: &[ConversationMessage]) -> Option<String> {
            self.0.lock().unwrap().pop_front()
        }
    }

    #[tokio::test]
    async fn runs_exactly_max_rounds_without_sentinel() {
        let state = run_conversation(
            roster(
                Arc::new(RepeatingProvider::new("draft")),
                Arc::new(RepeatingProvider::new("needs work")),
            ),
            10,
            "Write an Instagram post",
        )
        .await
        .unwrap();

        assert_eq!(state.termination_reason(), &TerminationReason::MaxRounds);
        assert_eq!(state.round(), 10);
        assert!(state.is_terminated());
        // opening + 2 agent messages per round
        assert_eq!(state.messages().len(), 21);
        assert_eq!(state.messages().last().unwrap().round, 10);
        assert!(state.messages().windows(2).all(|w| w[0].round <= w[1].round));
    }

    #[tokio::test]
    async fn sentinel_stops_mid_round() {
        let generator = Arc::new(ScriptedProvider::new(["v1", "v2"]));
        let reviewer = Arc::new(ScriptedProvider::new([
            "tighten it",
            "Almost there. TAAK VOLTOOID",
        ]));
        let state = BoundedConversation::new(roster(generator.clone(), reviewer), 10)
            .unwrap()
            .run("Write a post")
            .await;

        assert_eq!(state.termination_reason(), &TerminationReason::SentinelPhrase);
        assert_eq!(state.round(), 2);
        let last = state.messages().last().unwrap();
        assert_eq!(last.speaker, Speaker::Reviewer);
        assert_eq!(last.round, 2);
        assert_eq!(state.messages().len(), 5);
        assert_eq!(generator.requests().len(), 2);
    }

    #[tokio::test]
    async fn sentinel_from_generator_skips_reviewer_turn() {
        let reviewer = Arc::new(ScriptedProvider::new(["never"]));
        let state = BoundedConversation::new(
            roster(Arc::new(ScriptedProvider::new(["Final copy. DONE"])), reviewer.clone()),
            5,
        )
        .unwrap()
        .with_sentinel("DONE")
        .unwrap()
        .run("go")
        .await;

        assert_eq!(state.termination_reason(), &TerminationReason::SentinelPhrase);
        assert_eq!(state.messages().last().unwrap().speaker, Speaker::Generator);
        assert!(reviewer.requests().is_empty());
    }

    #[tokio::test]
    async fn sentinel_match_is_case_sensitive() {
        let state = BoundedConversation::new(
            roster(
                Arc::new(RepeatingProvider::new("taak voltooid")),
                Arc::new(RepeatingProvider::new("ok")),
            ),
            2,
        )
        .unwrap()
        .run("go")
        .await;
        assert_eq!(state.termination_reason(), &TerminationReason::MaxRounds);
    }

    #[tokio::test]
    async fn agent_failure_keeps_partial_log() {
        let state = BoundedConversation::new(
            roster(
                Arc::new(ScriptedProvider::new(["first draft"])),
                Arc::new(FailingProvider::new("timeout")),
            ),
            10,
        )
        .unwrap()
        .run("go")
        .await;

        match state.termination_reason() {
            TerminationReason::Errored(msg) => assert!(msg.contains("timeout")),
            other => panic!("Expected Errored, got {other:?}"),
        }
        assert_eq!(state.failed_speaker(), Some(Speaker::Reviewer));
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].content, "first draft");
        assert!(matches!(state.status(), Status::Terminated(_)));
    }

    #[tokio::test]
    async fn human_messages_are_recorded_and_passes_skipped() {
        let human = Arc::new(ScriptedHuman(Mutex::new(VecDeque::from([
            "Make it punchier".to_string(),
        ]))));
        let generator = Arc::new(RepeatingProvider::new("draft"));
        let roster = vec![
            Participant::Human(human),
            Participant::generator(agent("content_creator", generator.clone())),
        ];
        let state = BoundedConversation::new(roster, 2).unwrap().run("").await;

        let speakers: Vec<Speaker> = state.messages().iter().map(|m| m.speaker).collect();
        assert_eq!(speakers, vec![Speaker::Human, Speaker::Generator, Speaker::Generator]);
        assert_eq!(state.messages()[0].round, 1);

        // The agent saw the human's note in its rendered context.
        let prompts = generator.prompts();
        assert!(prompts[0].contains("[human] Make it punchier"));
        assert!(prompts[1].contains("[generator] draft"));
    }

    #[tokio::test]
    async fn opening_with_sentinel_terminates_before_any_turn() {
        let generator = Arc::new(ScriptedProvider::new(["unused"]));
        let state = BoundedConversation::new(roster(generator.clone(), generator.clone()), 3)
            .unwrap()
            .run("Already TAAK VOLTOOID")
            .await;
        assert_eq!(state.termination_reason(), &TerminationReason::SentinelPhrase);
        assert_eq!(state.round(), 0);
        assert!(generator.requests().is_empty());
    }

    #[test]
    fn invalid_construction_is_a_configuration_error() {
        assert!(matches!(
            BoundedConversation::new(Vec::new(), 3),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            BoundedConversation::new(vec![Participant::unattended_human()], 0),
            Err(Error::Configuration(_))
        ));
        let conv = BoundedConversation::new(vec![Participant::unattended_human()], 1).unwrap();
        assert!(conv.with_sentinel("").is_err());
    }

    #[test]
    fn terminated_state_ignores_further_changes() {
        let mut state = ConversationState::new(3);
        state.push(Speaker::Human, "hi".into());
        state.terminate(TerminationReason::SentinelPhrase);
        state.push(Speaker::Generator, "late".into());
        state.terminate(TerminationReason::MaxRounds);
        assert!(!state.advance_round());
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.termination_reason(), &TerminationReason::SentinelPhrase);
    }
}
