//! Integration tests for `FirecrawlClient` using wiremock HTTP mocks.

use trendlens_engine::{SourceError, WebSource};
use trendlens_sources::{ClientError, ClientSettings, FirecrawlClient};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> FirecrawlClient {
    let settings = ClientSettings {
        max_retries: 0,
        ..ClientSettings::default()
    };
    FirecrawlClient::with_base_url("fc-key", &settings, base_url)
        .expect("client construction should not fail")
}

fn scraped(markdown: &str) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "data": {
            "markdown": markdown,
            "metadata": {
                "sourceURL": "https://techcrunch.com/",
                "publishedTime": "2025-06-01T10:00:00Z"
            }
        }
    })
}

fn domains(names: &[&str]) -> Vec<String> {
    names.iter().map(|d| (*d).to_string()).collect()
}

#[tokio::test]
async fn scrape_extracts_keyword_sentences() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(header("authorization", "Bearer fc-key"))
        .and(body_partial_json(serde_json::json!({
            "url": "https://techcrunch.com",
            "formats": ["markdown"],
            "onlyMainContent": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(scraped(
            "# Headlines\nStartups are betting big on Rust this year. \
             Weather was mild across the region today. \
             Rust tooling keeps improving for embedded teams",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = client
        .fetch_excerpts(&domains(&["techcrunch.com"]), "rust", 5)
        .await
        .expect("scrape should succeed");

    assert_eq!(records.len(), 2);
    assert!(records[0].text.as_deref().unwrap().contains("betting big on Rust"));
    assert_eq!(
        records[1].text.as_deref(),
        Some("Rust tooling keeps improving for embedded teams.")
    );
    assert_eq!(records[0].source_domain, "techcrunch.com");
    assert_eq!(records[0].url.as_deref(), Some("https://techcrunch.com/"));
    assert!(records[0].published_at.is_some());
    assert_ne!(records[0].id, records[1].id);
}

#[tokio::test]
async fn failing_domain_is_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "url": "https://wired.com" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "url": "https://theverge.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(scraped(
            "Developers keep choosing Rust for new services.",
        )))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = client
        .fetch_excerpts(&domains(&["wired.com", "theverge.com"]), "rust", 5)
        .await
        .expect("one healthy domain is enough");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_domain, "theverge.com");
}

#[tokio::test]
async fn all_domains_failing_returns_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_excerpts(&domains(&["a.com", "b.com"]), "rust", 5)
        .await
        .expect_err("every domain failed");
    assert!(matches!(
        err,
        ClientError::UnexpectedStatus { status: 503, .. }
    ));
}

#[tokio::test]
async fn unauthorized_aborts_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = WebSource::fetch(&client, &domains(&["a.com", "b.com", "c.com"]), "rust", 5)
        .await
        .expect_err("bad key should fail");
    assert!(matches!(err, SourceError::Auth(_)));
}

#[tokio::test]
async fn unsuccessful_body_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error": "blocked by robots.txt"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_excerpts(&domains(&["a.com"]), "rust", 5)
        .await
        .expect_err("unsuccessful scrape");
    assert!(matches!(err, ClientError::Api { message, .. } if message.contains("robots")));
}

#[tokio::test]
async fn respects_max_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scraped(
            "Nothing about the keyword appears in this page body.",
        )))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = client
        .fetch_excerpts(&domains(&["a.com", "b.com", "c.com"]), "rust", 2)
        .await
        .unwrap();
    assert!(records.is_empty());
}
