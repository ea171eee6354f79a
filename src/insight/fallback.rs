//! Deterministic phrase-frequency analysis
//!
//! The always-available second stage of the insight chain, and the only
//! engine ever used for report keywords. Counts multi-word phrase spans
//! across the corpus; no I/O, no randomness. Ties break by first-seen
//! order, so identical input yields identical output.

use std::collections::HashMap;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "than", "so", "very", "is",
    "am", "are", "was", "were", "be", "been", "being", "i", "im", "my", "me", "we",
    "our", "you", "your", "it", "its", "this", "that", "these", "those", "to", "of",
    "in", "on", "at", "for", "with", "from", "by", "as", "they", "them", "their",
    "he", "she", "his", "her", "have", "has", "had", "do", "does", "did", "not",
    "no", "can", "cant", "cannot", "will", "wont", "would", "should", "could",
    "when", "while", "what", "which", "who", "how", "why", "there", "here", "also",
    "just", "only", "even", "still", "too", "again", "after", "before", "because",
];

/// Candidates shorter than this (joined, without separators) are trivial
const MIN_PHRASE_CHARS: usize = 5;

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lowercases and strips everything but letters, digits and spaces, then
/// splits into tokens. Stopwords stay in place; they act as span breakers.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Emits the 2- and 3-token spans of one text that contain no stopword and
/// no near-trivial token.
fn candidate_spans(tokens: &[String]) -> Vec<String> {
    let usable: Vec<bool> = tokens
        .iter()
        .map(|t| !is_stopword(t) && t.len() >= 2)
        .collect();

    let mut spans = Vec::new();
    for width in [2usize, 3] {
        if tokens.len() < width {
            continue;
        }
        for start in 0..=(tokens.len() - width) {
            if !usable[start..start + width].iter().all(|u| *u) {
                continue;
            }
            let phrase = tokens[start..start + width].join(" ");
            if phrase.chars().filter(|c| c.is_alphanumeric()).count() >= MIN_PHRASE_CHARS {
                spans.push(phrase);
            }
        }
    }
    spans
}

/// Top-K phrases by descending frequency across all texts.
///
/// Single-word and near-trivial candidates are never produced; ties break
/// by first-seen order.
pub fn top_phrases<'a, I>(texts: I, k: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut next_seen = 0usize;

    for text in texts {
        let tokens = tokenize(text);
        for phrase in candidate_spans(&tokens) {
            let entry = counts.entry(phrase).or_insert_with(|| {
                let seen = next_seen;
                next_seen += 1;
                (0, seen)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(phrase, (count, seen))| (phrase, count, seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(k)
        .map(|(phrase, count, _)| (phrase, count))
        .collect()
}
