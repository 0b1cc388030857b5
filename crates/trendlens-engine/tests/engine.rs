use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use trendlens_engine::{
    DegradeReason, EngineError, EngineSettings, LexiconScorer, Platform, RawSocialRecord,
    RawWebRecord, SocialSource, SourceError, TrendDirection, TrendEngine, WebSource, Window,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap()
}

fn hours_ago(h: i64) -> Option<DateTime<Utc>> {
    Some(now() - TimeDelta::hours(h))
}

#[derive(Default)]
struct FakeSocial {
    records: Vec<RawSocialRecord>,
    error: Option<SourceError>,
    slow_queries: Vec<String>,
    calls: AtomicU32,
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl SocialSource for FakeSocial {
    async fn search(
        &self,
        query: &str,
        window: &Window,
        max_results: usize,
    ) -> Result<Vec<RawSocialRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if self.slow_queries.iter().any(|q| q == query) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(self
            .records
            .iter()
            .filter(|r| in_half_open(window, r.created_at))
            .take(max_results)
            .cloned()
            .collect())
    }
}

/// Undated records match every window; dated ones match `[start, end)`.
fn in_half_open(window: &Window, ts: Option<DateTime<Utc>>) -> bool {
    ts.is_none_or(|t| t >= window.start && t < window.end)
}

/// Behaves like a real search API: matches inside the window, newest first,
/// truncated to the cap.
struct RecencyCappedSocial {
    posted_at: Vec<DateTime<Utc>>,
}

impl RecencyCappedSocial {
    /// `count` posts spread evenly between `from_hours_ago` and `to_hours_ago`.
    fn spread(mut self, count: usize, from_hours_ago: i64, to_hours_ago: i64) -> Self {
        let span = TimeDelta::hours(from_hours_ago - to_hours_ago);
        let step = span / i32::try_from(count).unwrap();
        let oldest = now() - TimeDelta::hours(from_hours_ago);
        self.posted_at
            .extend((0..count).map(|i| oldest + step * i32::try_from(i).unwrap()));
        self
    }
}

#[async_trait]
impl SocialSource for RecencyCappedSocial {
    async fn search(
        &self,
        query: &str,
        window: &Window,
        max_results: usize,
    ) -> Result<Vec<RawSocialRecord>, SourceError> {
        let mut matching: Vec<_> = self
            .posted_at
            .iter()
            .enumerate()
            .filter(|(_, t)| in_half_open(window, Some(**t)))
            .collect();
        matching.sort_by(|a, b| b.1.cmp(a.1));
        Ok(matching
            .into_iter()
            .take(max_results)
            .map(|(i, t)| tweet(&format!("p{i}"), &format!("{query} update"), Some(*t)))
            .collect())
    }
}

/// Every domain answers after `delay` with one excerpt; `hang` domains never answer.
#[derive(Default)]
struct PacedWeb {
    delay: Duration,
    hang: Vec<String>,
    calls: AtomicU32,
}

#[async_trait]
impl WebSource for PacedWeb {
    async fn fetch(
        &self,
        domains: &[String],
        keyword: &str,
        _max_sources: usize,
    ) -> Result<Vec<RawWebRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if domains.iter().any(|d| self.hang.contains(d)) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        tokio::time::sleep(self.delay).await;
        Ok(domains
            .iter()
            .map(|d| excerpt(d, d, &format!("{keyword} coverage")))
            .collect())
    }
}

#[derive(Default)]
struct FakeWeb {
    records: Vec<RawWebRecord>,
    error: Option<SourceError>,
    hang: bool,
    calls: AtomicU32,
    requests: Mutex<Vec<(Vec<String>, String)>>,
}

#[async_trait]
impl WebSource for FakeWeb {
    async fn fetch(
        &self,
        domains: &[String],
        keyword: &str,
        _max_sources: usize,
    ) -> Result<Vec<RawWebRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((domains.to_vec(), keyword.to_string()));
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(self.records.clone())
    }
}

fn tweet(id: &str, text: &str, created_at: Option<DateTime<Utc>>) -> RawSocialRecord {
    RawSocialRecord {
        id: id.to_string(),
        text: Some(text.to_string()),
        created_at,
        author: Some("someone".to_string()),
    }
}

fn excerpt(id: &str, domain: &str, text: &str) -> RawWebRecord {
    RawWebRecord {
        id: id.to_string(),
        text: Some(text.to_string()),
        source_domain: domain.to_string(),
        published_at: None,
        url: Some(format!("https://{domain}")),
    }
}

fn engine(social: Arc<FakeSocial>, web: Arc<FakeWeb>) -> TrendEngine {
    engine_with(social, web, EngineSettings::default())
}

fn engine_with(social: Arc<FakeSocial>, web: Arc<FakeWeb>, settings: EngineSettings) -> TrendEngine {
    TrendEngine::new(social, web, Arc::new(LexiconScorer), settings).with_clock(now)
}

#[tokio::test]
async fn empty_sources_yield_zero_metrics() {
    let social = Arc::new(FakeSocial::default());
    let web = Arc::new(FakeWeb::default());
    let m = engine(social, web).analyze_trend("quantum", None).await.unwrap();

    assert_eq!(m.total_mentions, 0);
    assert_eq!(m.trend_direction, TrendDirection::Stable);
    assert_eq!(m.mentions_on(Platform::Social), 0);
    assert_eq!(m.mentions_on(Platform::Web), 0);
    assert!(m.sentiment_overall.score.is_none());
    assert!(m.diagnostics.is_empty());
}

#[tokio::test]
async fn rate_limited_social_degrades_and_web_still_counts() {
    let social = Arc::new(FakeSocial {
        error: Some(SourceError::RateLimited {
            retry_after_secs: Some(60),
        }),
        ..FakeSocial::default()
    });
    let web = Arc::new(FakeWeb {
        records: (0..5)
            .map(|i| excerpt(&format!("w{i}"), "reuters.com", "markets rally on good news"))
            .collect(),
        ..FakeWeb::default()
    });
    let m = engine(social, web).analyze_trend("markets", Some("24h")).await.unwrap();

    assert_eq!(m.mentions_on(Platform::Social), 0);
    assert_eq!(m.mentions_on(Platform::Web), 5);
    assert_eq!(m.diagnostics.len(), 1);
    assert_eq!(m.diagnostics[0].platform, Platform::Social);
    assert_eq!(m.diagnostics[0].reason, DegradeReason::RateLimited);
}

#[tokio::test]
async fn blank_keyword_is_rejected_before_any_collaborator_call() {
    let social = Arc::new(FakeSocial::default());
    let web = Arc::new(FakeWeb::default());
    let engine = engine(social.clone(), web.clone());

    let err = engine.analyze_trend("", None).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
    assert!(matches!(
        engine.track_trend("   ", None).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.analyze_trend("rust", Some("fortnight")).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.sentiment_breakdown("rust", Some("rss")).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.get_trending_topics(None, Some(0)).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.get_trending_topics(None, Some(51)).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert_eq!(social.calls.load(Ordering::SeqCst), 0);
    assert_eq!(web.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn direction_comes_from_window_halves() {
    let mut records = Vec::new();
    for i in 0..10 {
        records.push(tweet(&format!("early{i}"), "rust release", hours_ago(20)));
    }
    for i in 0..15 {
        records.push(tweet(&format!("late{i}"), "rust release", hours_ago(2)));
    }
    records.push(tweet("undated", "rust release", None));
    let social = Arc::new(FakeSocial {
        records,
        ..FakeSocial::default()
    });
    let web = Arc::new(FakeWeb::default());
    let m = engine(social, web).analyze_trend("rust", Some("1d")).await.unwrap();

    assert_eq!(m.total_mentions, 26);
    assert_eq!(m.trend_counts.first_half, 10);
    assert_eq!(m.trend_counts.second_half, 15);
    assert_eq!(m.trend_counts.undated, 1);
    assert_eq!(m.trend_direction, TrendDirection::Rising);
    assert_eq!(m.timeframe.label(), "1d");
}

#[tokio::test]
async fn repeated_calls_within_ttl_hit_the_cache() {
    let social = Arc::new(FakeSocial {
        records: vec![tweet("1", "great launch", hours_ago(1))],
        ..FakeSocial::default()
    });
    let web = Arc::new(FakeWeb::default());
    let engine = engine(social.clone(), web.clone());

    let first = engine.analyze_trend("Rust", Some("24h")).await.unwrap();
    let social_calls = social.calls.load(Ordering::SeqCst);
    let web_calls = web.calls.load(Ordering::SeqCst);
    assert_eq!(social_calls, 2, "one search per window half");

    let second = engine.analyze_trend("  rust ", Some("1d")).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(social.calls.load(Ordering::SeqCst), social_calls);
    assert_eq!(web.calls.load(Ordering::SeqCst), web_calls);

    engine.clear_cache().await;
    engine.analyze_trend("rust", None).await.unwrap();
    assert_eq!(social.calls.load(Ordering::SeqCst), 2 * social_calls);
}

#[tokio::test(start_paused = true)]
async fn cache_expires_after_ttl() {
    let social = Arc::new(FakeSocial::default());
    let web = Arc::new(FakeWeb::default());
    let settings = EngineSettings {
        cache_ttl: Duration::from_secs(60),
        ..EngineSettings::default()
    };
    let engine = engine_with(social.clone(), web, settings);

    engine.analyze_trend("rust", None).await.unwrap();
    tokio::time::advance(Duration::from_secs(59)).await;
    engine.analyze_trend("rust", None).await.unwrap();
    assert_eq!(social.calls.load(Ordering::SeqCst), 2);

    tokio::time::advance(Duration::from_secs(2)).await;
    engine.analyze_trend("rust", None).await.unwrap();
    assert_eq!(social.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn hanging_source_times_out_without_blocking_the_other() {
    let social = Arc::new(FakeSocial {
        records: vec![tweet("1", "good stuff", hours_ago(1))],
        ..FakeSocial::default()
    });
    let web = Arc::new(FakeWeb {
        hang: true,
        ..FakeWeb::default()
    });
    let m = engine(social, web).analyze_trend("rust", None).await.unwrap();

    assert_eq!(m.mentions_on(Platform::Social), 1);
    assert_eq!(m.mentions_on(Platform::Web), 0);
    assert_eq!(m.diagnostics.len(), 1);
    assert_eq!(m.diagnostics[0].reason, DegradeReason::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn compare_preserves_order_and_isolates_failures() {
    let social = Arc::new(FakeSocial {
        records: vec![tweet("1", "nice", hours_ago(1))],
        slow_queries: vec!["stuck".to_string()],
        ..FakeSocial::default()
    });
    let web = Arc::new(FakeWeb::default());
    let settings = EngineSettings {
        source_timeout: Duration::from_secs(7200),
        keyword_timeout: Duration::from_secs(5),
        ..EngineSettings::default()
    };
    let engine = engine_with(social, web, settings);

    let keywords: Vec<String> = ["zeta", "stuck", "alpha"]
        .iter()
        .map(|k| (*k).to_string())
        .collect();
    let out = engine.compare_trends(&keywords, Some("24h")).await.unwrap();

    let order: Vec<&str> = out.iter().map(|c| c.keyword.as_str()).collect();
    assert_eq!(order, ["zeta", "stuck", "alpha"]);
    assert!(out[0].metrics.is_some());
    assert!(out[1].metrics.is_none() && out[1].error.is_some());
    assert!(out[2].metrics.is_some());
}

#[tokio::test]
async fn compare_validates_the_whole_list_up_front() {
    let social = Arc::new(FakeSocial::default());
    let web = Arc::new(FakeWeb::default());
    let engine = engine(social.clone(), web);

    let too_many: Vec<String> = (0..6).map(|i| format!("k{i}")).collect();
    assert!(matches!(
        engine.compare_trends(&too_many, None).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.compare_trends(&[], None).await,
        Err(EngineError::InvalidInput(_))
    ));
    let with_blank = vec!["rust".to_string(), " ".to_string()];
    assert!(matches!(
        engine.compare_trends(&with_blank, None).await,
        Err(EngineError::InvalidInput(_))
    ));
    let with_long = vec!["rust".to_string(), "k".repeat(257)];
    assert!(matches!(
        engine.compare_trends(&with_long, None).await,
        Err(EngineError::InvalidInput(m)) if m.contains("257 characters")
    ));
    assert_eq!(social.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn breakdown_restricts_to_selected_platform() {
    let social = Arc::new(FakeSocial {
        records: vec![tweet("1", "love it", hours_ago(1))],
        ..FakeSocial::default()
    });
    let web = Arc::new(FakeWeb {
        records: vec![excerpt("w", "npr.org", "a terrible outcome")],
        ..FakeWeb::default()
    });
    let engine = engine(social.clone(), web.clone());

    let m = engine
        .sentiment_breakdown("rust", Some("twitter"))
        .await
        .unwrap();
    assert_eq!(m.total_mentions, 1);
    assert!(m.mentions_by_platform.contains_key(&Platform::Social));
    assert!(!m.mentions_by_platform.contains_key(&Platform::Web));
    assert!(!m.sentiment_by_platform.contains_key(&Platform::Web));
    assert_eq!(web.calls.load(Ordering::SeqCst), 0);

    let both = engine.sentiment_breakdown("rust", None).await.unwrap();
    assert_eq!(both.total_mentions, 2);
    assert_eq!(both.timeframe.label(), "1d");
    let dist = both.sentiment_distribution.expect("scored");
    assert!((dist.positive + dist.negative + dist.neutral - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn track_trend_returns_summary_with_three_sources() {
    let web = Arc::new(FakeWeb {
        records: ["a.com", "b.com", "c.com", "d.com"]
            .iter()
            .enumerate()
            .map(|(i, d)| excerpt(&format!("w{i}"), d, "neutral words"))
            .collect(),
        ..FakeWeb::default()
    });
    let social = Arc::new(FakeSocial::default());
    let summary = engine(social, web).track_trend("rust", None).await.unwrap();

    assert_eq!(summary.total_mentions, 4);
    assert_eq!(summary.top_sources, ["a.com", "b.com", "c.com"]);
}

#[tokio::test]
async fn analysis_routes_keyword_to_topical_domains() {
    let social = Arc::new(FakeSocial::default());
    let web = Arc::new(FakeWeb::default());
    engine(social.clone(), web.clone())
        .analyze_trend("AI Regulation", None)
        .await
        .unwrap();

    let requests = web.requests.lock().unwrap();
    assert!(requests.iter().all(|(domains, keyword)| {
        domains.len() == 1 && keyword == "ai regulation"
    }));
    assert!(requests.iter().any(|(domains, _)| domains[0] == "techcrunch.com"));
    assert_eq!(social.queries.lock().unwrap()[0], "ai regulation");
}

#[tokio::test]
async fn trending_topics_sample_both_sources_and_rank() {
    let social = Arc::new(FakeSocial {
        records: vec![
            tweet("1", "Big news from Apple Vision today #AI", None),
            tweet("2", "More on Apple Vision #ai", None),
            tweet("3", "unrelated chatter", None),
        ],
        ..FakeSocial::default()
    });
    let web = Arc::new(FakeWeb {
        records: vec![excerpt("w", "techcrunch.com", "The Apple Vision headset sold out #ai")],
        ..FakeWeb::default()
    });
    let engine = engine(social.clone(), web.clone());

    let topics = engine.get_trending_topics(Some("tech"), Some(1)).await.unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].mention_count, 3);

    let all = engine.get_trending_topics(Some("tech"), None).await.unwrap();
    let names: Vec<&str> = all.iter().map(|t| t.topic.as_str()).collect();
    assert_eq!(names, ["#ai", "Apple Vision"]);
    // second call served from cache
    assert_eq!(social.calls.load(Ordering::SeqCst), 1);

    let query = social.queries.lock().unwrap()[0].clone();
    assert!(query.starts_with("(AI OR ChatGPT"));
    let requests = web.requests.lock().unwrap();
    assert!(requests.iter().any(|(domains, _)| domains[0] == "techcrunch.com"));
    assert!(requests.iter().all(|(_, keyword)| keyword.is_empty()));
}

fn capped_engine(social: RecencyCappedSocial) -> TrendEngine {
    TrendEngine::new(
        Arc::new(social),
        Arc::new(FakeWeb::default()),
        Arc::new(LexiconScorer),
        EngineSettings::default(),
    )
    .with_clock(now)
}

#[tokio::test]
async fn flat_volume_beyond_the_cap_is_stable() {
    let social = RecencyCappedSocial { posted_at: Vec::new() }.spread(400, 24, 0);
    let m = capped_engine(social).analyze_trend("rust", Some("24h")).await.unwrap();

    assert_eq!(m.trend_counts.first_half, 50);
    assert_eq!(m.trend_counts.second_half, 50);
    assert_eq!(m.total_mentions, 100);
    assert_eq!(m.trend_direction, TrendDirection::Stable);
}

#[tokio::test]
async fn rising_volume_beyond_the_cap_is_rising() {
    let social = RecencyCappedSocial { posted_at: Vec::new() }
        .spread(20, 23, 13)
        .spread(300, 11, 0);
    let m = capped_engine(social).analyze_trend("rust", Some("24h")).await.unwrap();

    assert_eq!(m.trend_counts.first_half, 20);
    assert_eq!(m.trend_counts.second_half, 50);
    assert_eq!(m.trend_direction, TrendDirection::Rising);
}

#[tokio::test]
async fn falling_volume_beyond_the_cap_is_falling() {
    let social = RecencyCappedSocial { posted_at: Vec::new() }
        .spread(300, 23, 13)
        .spread(20, 11, 0);
    let m = capped_engine(social).analyze_trend("rust", Some("24h")).await.unwrap();

    assert_eq!(m.trend_counts.first_half, 50);
    assert_eq!(m.trend_counts.second_half, 20);
    assert_eq!(m.trend_direction, TrendDirection::Falling);
}

#[tokio::test(start_paused = true)]
async fn slow_domains_each_get_their_own_timeout() {
    let web = Arc::new(PacedWeb {
        delay: Duration::from_secs(3),
        ..PacedWeb::default()
    });
    let engine = TrendEngine::new(
        Arc::new(FakeSocial::default()),
        web.clone(),
        Arc::new(LexiconScorer),
        EngineSettings::default(),
    )
    .with_clock(now);
    let m = engine.analyze_trend("ai regulation", None).await.unwrap();

    let calls = usize::try_from(web.calls.load(Ordering::SeqCst)).unwrap();
    assert!(calls > 1, "one call per selected domain");
    assert_eq!(m.mentions_on(Platform::Web), calls);
    assert!(m.diagnostics.is_empty());
}

#[tokio::test(start_paused = true)]
async fn hanging_domain_keeps_results_from_the_rest() {
    let web = Arc::new(PacedWeb {
        delay: Duration::from_secs(1),
        hang: vec!["techcrunch.com".to_string()],
        ..PacedWeb::default()
    });
    let engine = TrendEngine::new(
        Arc::new(FakeSocial::default()),
        web.clone(),
        Arc::new(LexiconScorer),
        EngineSettings::default(),
    )
    .with_clock(now);
    let m = engine.analyze_trend("ai regulation", None).await.unwrap();

    let calls = usize::try_from(web.calls.load(Ordering::SeqCst)).unwrap();
    assert_eq!(m.mentions_on(Platform::Web), calls - 1);
    assert!(!m.top_sources.iter().any(|s| s == "techcrunch.com"));
    assert!(m.diagnostics.is_empty(), "partial failure is not a degraded source");
}
