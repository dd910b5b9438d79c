//! Structured review parsing.
//!
//! Reviewer output is free text. The parser splits it into blank-line
//! separated blocks, pulls a 0-10 score from the block that mentions the
//! rating scale and takes the block after the "improved version" heading as
//! the rewritten content. Every missing piece is reported in
//! [`ReviewResult::parse_error`]; parsing itself never fails.

use serde::{Deserialize, Serialize};

/// Phrases marking the block that carries the 1-10 rating.
const SCALE_MARKERS: &[&str] = &["scale", "out of 10", "schaal", "/10"];

/// Phrases marking the heading of the rewritten content.
const IMPROVED_MARKERS: &[&str] = &[
    "improved version",
    "improved content",
    "verbeterde versie",
    "verbeterde content",
];

/// Range notations stripped before looking for a bare score.
const RANGE_NOTATIONS: &[&str] = &["1-10", "1–10", "1 - 10", "1 to 10", "0-10"];

/// Phrases that name the scale rather than score on it.
const SCALE_PHRASES: &[&str] = &["out of 10", "/10"];

pub const MAX_SCORE: u8 = 10;

/// Parsed reviewer response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    /// 1-10 rating, 0 when unknown.
    pub score: u8,
    /// The full raw response.
    pub review_text: String,
    pub improved_content: String,
    /// Set when any field fell back to its default.
    pub parse_error: Option<String>,
}

impl ReviewResult {
    pub fn is_degraded(&self) -> bool {
        self.parse_error.is_some()
    }
}

/// Parse a raw reviewer response.
pub fn parse(raw: &str) -> ReviewResult {
    let blocks = split_blocks(raw);
    let mut problems = Vec::new();

    let score = match find_block(&blocks, SCALE_MARKERS) {
        Some(idx) => match extract_score(blocks[idx]) {
            Some(score) => score,
            None => {
                problems.push("scale section has no score in 0-10".to_string());
                0
            }
        },
        None => {
            problems.push("no 1-10 scale section found".to_string());
            0
        }
    };

    let improved_content = match find_block(&blocks, IMPROVED_MARKERS) {
        Some(idx) => match blocks.get(idx + 1) {
            Some(block) => block.to_string(),
            None => {
                problems.push("improved version heading is the last section".to_string());
                String::new()
            }
        },
        None => {
            problems.push("no improved version section found".to_string());
            String::new()
        }
    };

    let parse_error = if problems.is_empty() {
        None
    } else {
        tracing::debug!(problems = %problems.join("; "), "Review parsed with fallbacks");
        Some(problems.join("; "))
    };

    ReviewResult {
        score,
        review_text: raw.to_string(),
        improved_content,
        parse_error,
    }
}

/// Split on blank lines. Whitespace-only lines count as blank; empty
/// blocks are dropped.
fn split_blocks(raw: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in raw.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if content.trim().is_empty() {
            if let Some(s) = start.take() {
                blocks.push(&raw[s..end]);
            }
        } else {
            if start.is_none() {
                start = Some(offset);
            }
            end = offset + content.len();
        }
        offset += line.len();
    }
    if let Some(s) = start {
        blocks.push(&raw[s..end]);
    }
    blocks
}

fn find_block(blocks: &[&str], markers: &[&str]) -> Option<usize> {
    blocks.iter().position(|block| {
        let lower = block.to_lowercase();
        markers.iter().any(|m| lower.contains(m))
    })
}

/// Tried in order: an `N/10` token, then `N out of 10`, then the last
/// standalone number in range once the scale notation ("1-10",
/// "out of 10", "/10") is removed. Decimals are rounded; numbers above 10,
/// such as years, never count.
fn extract_score(block: &str) -> Option<u8> {
    let lower = block.to_lowercase();
    if let Some(score) = score_before(&lower, "/10") {
        return Some(score);
    }
    if let Some(score) = score_before(&lower, "out of 10") {
        return Some(score);
    }

    let mut stripped = lower;
    for notation in RANGE_NOTATIONS.iter().chain(SCALE_PHRASES) {
        stripped = stripped.replace(notation, " ");
    }
    number_runs(&stripped)
        .into_iter()
        .rev()
        .find_map(parse_score)
}

/// First in-range number written directly before `suffix`.
fn score_before(text: &str, suffix: &str) -> Option<u8> {
    let bytes = text.as_bytes();
    for (pos, _) in text.match_indices(suffix) {
        // "/100" is not a score out of ten
        if bytes.get(pos + suffix.len()).is_some_and(|b| b.is_ascii_digit()) {
            continue;
        }
        let head = text[..pos].trim_end();
        let start = head
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '.' | ','))
            .last()
            .map(|(i, _)| i);
        let Some(start) = start else {
            continue;
        };
        let token = head[start..].trim_start_matches(['.', ',']);
        if let Some(score) = parse_score(token) {
            return Some(score);
        }
    }
    None
}

/// "7", "7.5" or "7,5" rounded to a score, if within 0-10.
fn parse_score(token: &str) -> Option<u8> {
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let value: f32 = token.replace(',', ".").parse().ok()?;
    let rounded = value.round();
    if (0.0..=f32::from(MAX_SCORE)).contains(&rounded) {
        Some(rounded as u8)
    } else {
        None
    }
}

/// Digit runs, with a `.` or `,` kept only between two digits.
fn number_runs(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        let in_number = c.is_ascii_digit()
            || (matches!(c, '.' | ',')
                && start.is_some()
                && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit()));
        match (in_number, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(&text[s..i]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(&text[s..]);
    }
    runs
}
