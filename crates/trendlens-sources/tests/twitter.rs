//! Integration tests for `TwitterClient` using wiremock HTTP mocks.

use chrono::Utc;
use trendlens_engine::{SocialSource, SourceError, Timeframe, Window};
use trendlens_sources::{ClientError, ClientSettings, TwitterClient};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> TwitterClient {
    let settings = ClientSettings {
        max_retries: 0,
        ..ClientSettings::default()
    };
    TwitterClient::with_base_url("test-token", &settings, base_url)
        .expect("client construction should not fail")
}

fn last_day() -> Window {
    Timeframe::ONE_DAY.window_ending_at(Utc::now())
}

#[tokio::test]
async fn search_parses_tweets_and_resolves_usernames() {
    let server = MockServer::start().await;
    let now = Utc::now().to_rfc3339();

    let body = serde_json::json!({
        "data": [
            { "id": "1", "text": "rust is lovely", "created_at": now, "author_id": "u1" },
            { "id": "2", "text": "rust again", "author_id": "u2" }
        ],
        "includes": { "users": [
            { "id": "u1", "username": "alice", "name": "Alice" },
            { "id": "u2", "username": "bob", "name": "Bob" }
        ]},
        "meta": { "result_count": 2 }
    });

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("query", "rust -is:retweet lang:en"))
        .and(query_param("max_results", "10"))
        .and(query_param("expansions", "author_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = client
        .search_recent("rust", &last_day(), 10)
        .await
        .expect("search should succeed");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "1");
    assert_eq!(records[0].author.as_deref(), Some("alice"));
    assert!(records[0].created_at.is_some());
    assert_eq!(records[1].author.as_deref(), Some("bob"));
    assert!(records[1].created_at.is_none());
}

#[tokio::test]
async fn search_follows_next_token_until_limit() {
    let server = MockServer::start().await;

    let page = |start: u32, next: Option<&str>| {
        let data: Vec<_> = (start..start + 10)
            .map(|i| serde_json::json!({ "id": i.to_string(), "text": format!("post {i}") }))
            .collect();
        let mut meta = serde_json::json!({ "result_count": 10 });
        if let Some(token) = next {
            meta["next_token"] = serde_json::json!(token);
        }
        serde_json::json!({ "data": data, "meta": meta })
    };

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(query_param("next_token", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(10, Some("page3"))))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, Some("page2"))))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = client
        .search_recent("rust", &last_day(), 15)
        .await
        .expect("search should succeed");

    assert_eq!(records.len(), 15, "second page is truncated to the limit");
    assert_eq!(records[0].id, "0");
    assert_eq!(records[14].id, "14");
}

#[tokio::test]
async fn window_outside_retention_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let old_end = Utc::now() - chrono::TimeDelta::days(30);
    let window = Timeframe::ONE_DAY.window_ending_at(old_end);
    let client = test_client(&server.uri());
    let records = client.search_recent("rust", &window, 10).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "42"))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .search_recent("rust", &last_day(), 10)
        .await
        .expect_err("429 should fail");
    assert!(matches!(
        err,
        ClientError::RateLimited {
            retry_after_secs: Some(42),
            ..
        }
    ));

    let via_trait = SocialSource::search(&client, "rust", &last_day(), 10)
        .await
        .expect_err("429 should fail");
    assert_eq!(
        via_trait,
        SourceError::RateLimited {
            retry_after_secs: Some(42)
        }
    );
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = SocialSource::search(&client, "rust", &last_day(), 10)
        .await
        .expect_err("401 should fail");
    assert!(matches!(err, SourceError::Auth(_)));
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .search_recent("rust", &last_day(), 10)
        .await
        .expect_err("bad body should fail");
    assert!(matches!(err, ClientError::Deserialize { .. }));
}
