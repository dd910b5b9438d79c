//! Terminal formatting for pipeline results and conversation transcripts.
//!
//! Everything here returns `String`s; the binary decides where they go.

use crate::conversation::{ConversationState, TerminationReason};
use crate::pipeline::PipelineResult;
use crate::tools::{GrammarReport, Keyword, Sentiment};

/// Default wrap width for terminal output.
pub const WRAP_WIDTH: usize = 100;

fn heading(title: &str) -> String {
    format!("── {title} ──")
}

/// Indented, wrapped body text.
fn body(text: &str, width: usize) -> String {
    wrap_lines(text, width)
        .into_iter()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a pipeline result as sections.
pub fn pipeline_result(result: &PipelineResult, width: usize) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "📣 {} | score {} | {}",
        result.campaign_type,
        score_label(result.score),
        result.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    out.push(heading("Original content"));
    out.push(body(&result.original_content, width));
    out.push(heading("Review"));
    out.push(body(&result.review_text, width));
    out.push(heading("Improved content"));
    if result.improved_content.is_empty() {
        out.push("  (none extracted)".to_string());
    } else {
        out.push(body(&result.improved_content, width));
    }
    if let Some(problem) = &result.parse_error {
        out.push(format!("⚠️  review parsed with fallbacks: {problem}"));
    }
    out.join("\n")
}

fn score_label(score: u8) -> String {
    if score == 0 {
        "unknown".to_string()
    } else {
        format!("{score}/10")
    }
}

/// Render a conversation log with its outcome.
pub fn transcript(state: &ConversationState, width: usize) -> String {
    let mut out = Vec::new();
    for msg in state.messages() {
        let prefix = format!("[r{} {}] ", msg.round, msg.speaker);
        let indent = " ".repeat(prefix.chars().count());
        for (i, line) in wrap_lines(&msg.content, width).into_iter().enumerate() {
            if i == 0 {
                out.push(format!("{prefix}{line}"));
            } else {
                out.push(format!("{indent}{line}"));
            }
        }
    }
    out.push(outcome(state));
    out.join("\n")
}

fn outcome(state: &ConversationState) -> String {
    let rounds = format!("{}/{} rounds", state.round(), state.max_rounds());
    match state.termination_reason() {
        TerminationReason::None => format!("… still running ({rounds})"),
        TerminationReason::SentinelPhrase => format!("✅ completed by sentinel phrase ({rounds})"),
        TerminationReason::MaxRounds => format!("⏹️  stopped at round cap ({rounds})"),
        TerminationReason::Errored(reason) => {
            let who = state
                .failed_speaker()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            format!("❌ {who} failed: {reason} ({rounds})")
        }
    }
}

/// Render the content-tool analysis of a piece of copy.
pub fn analysis(sentiment: &Sentiment, keywords: &[Keyword], grammar: &GrammarReport) -> String {
    let mut out = vec![heading("Analysis")];
    out.push(format!(
        "  sentiment: {:?} ({:+.2}, confidence {:.2})",
        sentiment.label, sentiment.score, sentiment.confidence
    ));
    if !keywords.is_empty() {
        let list: Vec<String> = keywords
            .iter()
            .map(|k| format!("{} ({:.2})", k.keyword, k.relevance))
            .collect();
        out.push(format!("  keywords: {}", list.join(", ")));
    }
    out.push(format!("  grammar: {}/10, {} issue(s)", grammar.score, grammar.errors));
    for issue in &grammar.suggestions {
        out.push(format!(
            "    {:?}: \"{}\" → \"{}\"",
            issue.kind, issue.original, issue.suggestion
        ));
    }
    out.join("\n")
}

/// Wrap text into lines of max_len, breaking on word boundaries.
pub fn wrap_lines(text: &str, max_len: usize) -> Vec<String> {
    let mut result = Vec::new();
    for line in text.lines() {
        if line.chars().count() <= max_len {
            result.push(line.to_string());
        } else {
            let mut current = String::new();
            for word in line.split_whitespace() {
                let len = current.chars().count();
                if len > 0 && len + word.chars().count() + 1 > max_len {
                    result.push(std::mem::take(&mut current));
                }
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
            if !current.is_empty() {
                result.push(current);
            }
        }
    }
    result
}
