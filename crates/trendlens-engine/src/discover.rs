//! Heuristic trending-topic extraction.
//!
//! Candidates are hashtags and runs of capitalized words. This is a frequency
//! heuristic, not a topic model; callers only rely on [`discover_topics`].

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::scorer::clean_text;
use crate::types::{Mention, TopicCount};

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid regex"));
static CAPITALIZED_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z0-9'&-]*(?:[ \t]+[A-Z][A-Za-z0-9'&-]*)+").expect("valid regex")
});

const MIN_PHRASE_WORDS: usize = 2;
const MAX_PHRASE_WORDS: usize = 4;

const LEADING_STOPWORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "A", "An", "In", "On", "At", "To", "Of", "For",
    "And", "But", "Or", "It", "We", "I", "Our", "My", "RT",
];

const TECH_SEEDS: &[&str] = &[
    "AI",
    "ChatGPT",
    "Tesla",
    "Apple",
    "Google",
    "Microsoft",
    "OpenAI",
    "Blockchain",
];

const FINANCE_SEEDS: &[&str] = &[
    "Bitcoin",
    "Stock market",
    "Fed rates",
    "Inflation",
    "Tesla stock",
    "AI stocks",
];

const GENERAL_SEEDS: &[&str] = &[
    "Climate change",
    "Economy",
    "Politics",
    "Sports",
    "Entertainment",
    "Health",
    "Education",
];

/// Seed topics used to sample the social feed for `category`.
#[must_use]
pub fn seed_topics(category: &str) -> &'static [&'static str] {
    match category.trim().to_ascii_lowercase().as_str() {
        "tech" => TECH_SEEDS,
        "finance" => FINANCE_SEEDS,
        _ => GENERAL_SEEDS,
    }
}

/// OR-joined search query over the seed topics; multi-word seeds are quoted.
#[must_use]
pub fn seed_query(category: &str) -> String {
    let terms: Vec<String> = seed_topics(category)
        .iter()
        .map(|seed| {
            if seed.contains(' ') {
                format!("\"{seed}\"")
            } else {
                (*seed).to_string()
            }
        })
        .collect();
    format!("({})", terms.join(" OR "))
}

/// Candidate topics in one text, each at most once.
fn candidate_topics(text: &str) -> HashSet<String> {
    let mut topics: HashSet<String> = HASHTAG_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| format!("#{}", m.as_str().to_lowercase()))
        .collect();

    let cleaned = clean_text(text);
    for run in CAPITALIZED_RUN_RE.find_iter(&cleaned) {
        let words: Vec<&str> = run
            .as_str()
            .split_whitespace()
            .skip_while(|w| LEADING_STOPWORDS.contains(w))
            .collect();
        if (MIN_PHRASE_WORDS..=MAX_PHRASE_WORDS).contains(&words.len()) {
            topics.insert(words.join(" "));
        }
    }

    topics
}

/// Rank topics by the number of mentions that carry them.
///
/// Topics seen in fewer than `min_occurrences` mentions are dropped. Ties are
/// broken by topic text. At most `limit` entries are returned.
#[must_use]
pub fn discover_topics(mentions: &[Mention], min_occurrences: usize, limit: usize) -> Vec<TopicCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for mention in mentions {
        for topic in candidate_topics(&mention.text) {
            *counts.entry(topic).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<TopicCount> = counts
        .into_iter()
        .filter(|(_, n)| *n >= min_occurrences)
        .map(|(topic, mention_count)| TopicCount {
            topic,
            mention_count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.mention_count
            .cmp(&a.mention_count)
            .then_with(|| a.topic.cmp(&b.topic))
    });
    ranked.truncate(limit);
    ranked
}
