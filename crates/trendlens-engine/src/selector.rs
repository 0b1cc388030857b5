//! Keyword-to-domain routing for the web source.

const TECH_DOMAINS: &[&str] = &[
    "techcrunch.com",
    "theverge.com",
    "arstechnica.com",
    "wired.com",
    "venturebeat.com",
    "businessinsider.com/tech",
];

const NEWS_DOMAINS: &[&str] = &[
    "reuters.com",
    "bbc.com/news",
    "cnn.com",
    "npr.org",
    "apnews.com",
];

const DISCUSSION_DOMAINS: &[&str] = &[
    "news.ycombinator.com",
    "reddit.com/r/technology",
    "reddit.com/r/worldnews",
    "medium.com",
    "dev.to",
];

const FINANCE_DOMAINS: &[&str] = &[
    "bloomberg.com",
    "finance.yahoo.com",
    "marketwatch.com",
    "cnbc.com",
    "fool.com",
];

const CULTURE_DOMAINS: &[&str] = &[
    "buzzfeednews.com",
    "mashable.com",
    "gizmodo.com",
    "lifehacker.com",
];

const TECH_TERMS: &[&str] = &[
    "ai",
    "artificial intelligence",
    "machine learning",
    "crypto",
    "bitcoin",
    "blockchain",
    "startup",
    "tech",
    "software",
    "app",
    "saas",
    "api",
    "programming",
    "coding",
    "developer",
    "github",
    "open source",
];

const FINANCE_TERMS: &[&str] = &[
    "stock",
    "market",
    "trading",
    "investment",
    "economy",
    "inflation",
    "fed",
    "interest rate",
    "earnings",
    "ipo",
    "revenue",
    "profit",
];

const NEWS_TERMS: &[&str] = &[
    "politics",
    "election",
    "government",
    "policy",
    "law",
    "court",
    "climate",
    "health",
    "covid",
    "war",
    "international",
];

/// Deterministic, pure mapping from a keyword (or a category) to web domains.
#[derive(Debug, Clone, Copy)]
pub struct SourceSelector {
    max_sources: usize,
}

impl SourceSelector {
    #[must_use]
    pub fn new(max_sources: usize) -> Self {
        Self { max_sources }
    }

    #[must_use]
    pub fn max_sources(&self) -> usize {
        self.max_sources
    }

    /// Ranked domains for `keyword`. Tech wins over finance, finance over news.
    #[must_use]
    pub fn select(&self, keyword: &str) -> Vec<String> {
        let tokens = tokenize(keyword);
        let picks: Vec<&str> = if matches_any(&tokens, TECH_TERMS) {
            chain(&[(TECH_DOMAINS, usize::MAX), (DISCUSSION_DOMAINS, 2)])
        } else if matches_any(&tokens, FINANCE_TERMS) {
            chain(&[(FINANCE_DOMAINS, usize::MAX), (NEWS_DOMAINS, 3)])
        } else if matches_any(&tokens, NEWS_TERMS) {
            chain(&[(NEWS_DOMAINS, usize::MAX), (DISCUSSION_DOMAINS, 1)])
        } else {
            chain(&[
                (TECH_DOMAINS, 2),
                (NEWS_DOMAINS, 3),
                (DISCUSSION_DOMAINS, 2),
                (FINANCE_DOMAINS, 1),
            ])
        };
        self.bounded(picks)
    }

    /// Domains for a discovery category. `general` and unknown names mean `all`.
    #[must_use]
    pub fn for_category(&self, category: &str) -> Vec<String> {
        let picks = match category.trim().to_ascii_lowercase().as_str() {
            "tech" => chain(&[(TECH_DOMAINS, usize::MAX)]),
            "news" => chain(&[(NEWS_DOMAINS, usize::MAX)]),
            "discussion" => chain(&[(DISCUSSION_DOMAINS, usize::MAX)]),
            "finance" => chain(&[(FINANCE_DOMAINS, usize::MAX)]),
            "culture" => chain(&[(CULTURE_DOMAINS, usize::MAX)]),
            _ => chain(&[
                (TECH_DOMAINS, usize::MAX),
                (NEWS_DOMAINS, usize::MAX),
                (DISCUSSION_DOMAINS, usize::MAX),
                (FINANCE_DOMAINS, usize::MAX),
                (CULTURE_DOMAINS, usize::MAX),
            ]),
        };
        self.bounded(picks)
    }

    fn bounded(&self, picks: Vec<&str>) -> Vec<String> {
        picks
            .into_iter()
            .take(self.max_sources)
            .map(str::to_string)
            .collect()
    }
}

fn chain(parts: &[(&[&'static str], usize)]) -> Vec<&'static str> {
    parts
        .iter()
        .flat_map(|(domains, n)| domains.iter().take(*n).copied())
        .collect()
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when any term appears in `tokens` as a whole token or contiguous token run.
fn matches_any(tokens: &[String], terms: &[&str]) -> bool {
    terms.iter().any(|term| {
        let needle: Vec<&str> = term.split(' ').collect();
        tokens
            .windows(needle.len())
            .any(|w| w.iter().zip(&needle).all(|(t, n)| t == n))
    })
}
