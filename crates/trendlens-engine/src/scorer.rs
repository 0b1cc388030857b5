//! General-purpose lexicon scorer for social posts and news excerpts.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::collaborators::SentimentScorer;
use crate::error::ScoreError;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid regex"));
static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[@#]\w+").expect("valid regex"));

/// Word weights.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("good", 0.3),
    ("great", 0.4),
    ("excellent", 0.5),
    ("amazing", 0.5),
    ("awesome", 0.5),
    ("love", 0.5),
    ("loved", 0.5),
    ("like", 0.2),
    ("best", 0.5),
    ("better", 0.3),
    ("happy", 0.4),
    ("excited", 0.4),
    ("exciting", 0.4),
    ("impressive", 0.4),
    ("innovative", 0.4),
    ("breakthrough", 0.5),
    ("success", 0.4),
    ("successful", 0.4),
    ("win", 0.4),
    ("wins", 0.4),
    ("growth", 0.3),
    ("growing", 0.3),
    ("gain", 0.3),
    ("gains", 0.3),
    ("surge", 0.3),
    ("rally", 0.3),
    ("bullish", 0.4),
    ("strong", 0.3),
    ("improve", 0.3),
    ("improved", 0.3),
    ("recommend", 0.4),
    ("useful", 0.3),
    ("helpful", 0.3),
    ("safe", 0.3),
    ("positive", 0.4),
    ("optimistic", 0.4),
    ("beautiful", 0.4),
    ("wonderful", 0.5),
    ("fantastic", 0.5),
    // Negative signals
    ("bad", -0.4),
    ("terrible", -0.6),
    ("awful", -0.6),
    ("horrible", -0.6),
    ("worst", -0.6),
    ("worse", -0.4),
    ("hate", -0.5),
    ("hated", -0.5),
    ("sad", -0.4),
    ("angry", -0.5),
    ("disappointing", -0.5),
    ("disappointed", -0.5),
    ("fail", -0.4),
    ("failed", -0.4),
    ("failure", -0.4),
    ("crash", -0.5),
    ("crashed", -0.5),
    ("decline", -0.3),
    ("drop", -0.3),
    ("loss", -0.4),
    ("losses", -0.4),
    ("bearish", -0.4),
    ("weak", -0.3),
    ("problem", -0.3),
    ("problems", -0.3),
    ("concern", -0.3),
    ("concerns", -0.3),
    ("risk", -0.2),
    ("risky", -0.3),
    ("dangerous", -0.6),
    ("harmful", -0.6),
    ("scam", -0.7),
    ("fraud", -0.7),
    ("lawsuit", -0.5),
    ("ban", -0.5),
    ("banned", -0.5),
    ("broken", -0.4),
    ("bug", -0.3),
    ("outage", -0.5),
    ("layoffs", -0.5),
    ("negative", -0.4),
    ("warning", -0.4),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "isn't", "wasn't", "aren't", "won't", "can't", "cannot", "don't",
    "doesn't", "didn't", "without",
];

/// Strip URLs, `@handles` and `#hashtags`, then collapse whitespace.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let without_urls = URL_RE.replace_all(text, "");
    let without_handles = HANDLE_RE.replace_all(&without_urls, "");
    without_handles
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Score a text string using the lexicon.
///
/// Splits cleaned text into lowercase words and sums matching weights. A
/// negator within the three preceding words flips a weight's sign. The
/// result is clamped to `[-1.0, 1.0]`; empty or unknown text scores `0.0`.
#[must_use]
pub fn lexicon_score(text: &str) -> f64 {
    let cleaned = clean_text(text);
    let words: Vec<String> = cleaned
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphabetic() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let mut score = 0.0_f64;
    for (i, word) in words.iter().enumerate() {
        let Some(&(_, weight)) = LEXICON.iter().find(|(lex, _)| lex == word) else {
            continue;
        };
        let negated = (1..=3).any(|k| i >= k && NEGATORS.contains(&words[i - k].as_str()));
        score += if negated { -weight } else { weight };
    }
    score.clamp(-1.0, 1.0)
}

/// [`SentimentScorer`] backed by [`lexicon_score`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

#[async_trait]
impl SentimentScorer for LexiconScorer {
    async fn score(&self, text: &str) -> Result<f64, ScoreError> {
        Ok(lexicon_score(text))
    }
}
