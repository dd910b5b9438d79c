//! Content analysis helpers.
//!
//! Deterministic, local heuristics run over generated or improved copy:
//! lexicon sentiment, keyword frequency and a handful of mechanical
//! grammar checks. None of them call a model.

use std::collections::HashMap;

use serde::Serialize;

const POSITIVE: &[&str] = &[
    "amazing", "best", "better", "beautiful", "bright", "clean", "delight", "discover", "easy",
    "enjoy", "excellent", "exciting", "fresh", "fun", "good", "great", "happy", "innovative",
    "love", "new", "perfect", "proud", "save", "smart", "sustainable", "win", "wonderful",
    "duurzaam", "geweldig", "mooi", "nieuw", "ontdek", "slim", "blij",
];

const NEGATIVE: &[&str] = &[
    "angry", "awful", "bad", "boring", "broken", "difficult", "expensive", "fail", "hard",
    "hate", "poor", "problem", "risk", "sad", "slow", "terrible", "waste", "worse", "worst",
    "duur", "slecht", "moeilijk", "probleem", "saai",
];

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "your", "our", "are", "this", "that", "from", "have",
    "has", "was", "were", "will", "can", "all", "not", "but", "its", "it's", "into", "out",
    "more", "than", "then", "they", "them", "their", "what", "when", "who", "how", "just",
    "een", "het", "de", "van", "voor", "met", "die", "dat", "zijn", "onze", "jouw", "niet",
    "ook", "maar", "als", "nog",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentiment {
    /// In [-1, 1].
    pub score: f32,
    pub label: SentimentLabel,
    /// Share of words that carried sentiment, in [0, 1].
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub keyword: String,
    pub count: usize,
    /// Count relative to the most frequent keyword, in (0, 1].
    pub relevance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    RepeatedWord,
    DoubleSpace,
    LowercaseSentenceStart,
    MissingFinalPunctuation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarIssue {
    pub kind: IssueKind,
    pub original: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarReport {
    pub errors: usize,
    /// 10 minus the error count, floored at 0.
    pub score: u8,
    pub suggestions: Vec<GrammarIssue>,
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

pub fn analyze_sentiment(text: &str) -> Sentiment {
    let mut total = 0usize;
    let mut pos = 0usize;
    let mut neg = 0usize;
    for word in words(text) {
        total += 1;
        if POSITIVE.contains(&word.as_str()) {
            pos += 1;
        } else if NEGATIVE.contains(&word.as_str()) {
            neg += 1;
        }
    }

    let hits = pos + neg;
    let score = if hits == 0 {
        0.0
    } else {
        (pos as f32 - neg as f32) / hits as f32
    };
    let label = if score > 0.3 {
        SentimentLabel::Positive
    } else if score < -0.3 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    let confidence = if total == 0 {
        0.0
    } else {
        (hits as f32 / total as f32).min(1.0)
    };

    Sentiment {
        score,
        label,
        confidence,
    }
}

/// Most frequent non-stop-words, ties broken by first appearance.
pub fn keyword_extraction(text: &str, max_keywords: usize) -> Vec<Keyword> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (idx, word) in words(text).enumerate() {
        if word.chars().count() < 3 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        counts.entry(word).or_insert((0, idx)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(max_keywords);

    let top = ranked.first().map(|r| r.1).unwrap_or(1) as f32;
    ranked
        .into_iter()
        .map(|(keyword, count, _)| Keyword {
            keyword,
            count,
            relevance: count as f32 / top,
        })
        .collect()
}

pub fn grammar_check(text: &str) -> GrammarReport {
    let mut issues = Vec::new();

    let tokens: Vec<&str> = text.split_whitespace().collect();
    for pair in tokens.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.chars().any(char::is_alphabetic) && a.to_lowercase() == b.to_lowercase() {
            issues.push(GrammarIssue {
                kind: IssueKind::RepeatedWord,
                original: format!("{a} {b}"),
                suggestion: a.to_string(),
            });
        }
    }

    for line in text.lines() {
        if line.trim().contains("  ") {
            issues.push(GrammarIssue {
                kind: IssueKind::DoubleSpace,
                original: line.trim().to_string(),
                suggestion: line.split_whitespace().collect::<Vec<_>>().join(" "),
            });
        }
    }

    for sentence in sentence_starts(text) {
        let Some(first) = sentence.chars().next() else {
            continue;
        };
        if first.is_lowercase() {
            let mut fixed: String = first.to_uppercase().collect();
            fixed.push_str(&sentence[first.len_utf8()..]);
            let word_end = sentence.find(char::is_whitespace).unwrap_or(sentence.len());
            let fixed_end = fixed.find(char::is_whitespace).unwrap_or(fixed.len());
            issues.push(GrammarIssue {
                kind: IssueKind::LowercaseSentenceStart,
                original: sentence[..word_end].to_string(),
                suggestion: fixed[..fixed_end].to_string(),
            });
        }
    }

    let trimmed = text.trim_end();
    if trimmed.chars().last().is_some_and(char::is_alphanumeric) {
        let tail: String = trimmed
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_string();
        issues.push(GrammarIssue {
            kind: IssueKind::MissingFinalPunctuation,
            suggestion: format!("{tail}."),
            original: tail,
        });
    }

    let errors = issues.len();
    GrammarReport {
        errors,
        score: 10u8.saturating_sub(errors.min(10) as u8),
        suggestions: issues,
    }
}

/// Text following each `.`, `!` or `?` plus the very start, trimmed.
fn sentence_starts(text: &str) -> Vec<&str> {
    let mut starts = vec![text.trim_start()];
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let rest = &text[i + c.len_utf8()..];
            // "3.5" or "..." are not sentence breaks
            if rest.starts_with(|n: char| n.is_whitespace()) {
                starts.push(rest.trim_start());
            }
        }
    }
    starts.retain(|s| !s.is_empty());
    starts
}
