//! HTTP fetcher tests against a mock server
//!
//! These exercise the transport behaviors (status handling, redirects, the
//! body cap, timeouts) directly on `HttpFetcher`. The mock server binds a
//! loopback address, so fetches here bypass the normalizer on purpose.

use async_trait::async_trait;
use driftnet::config::FetchConfig;
use driftnet::crawler::{FetchErrorKind, Fetcher, HttpFetcher};
use driftnet::dns::{DnsBackend, DnsCache, DnsError};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Resolves every host to loopback; the mock server lives there anyway
struct LoopbackBackend;

#[async_trait]
impl DnsBackend for LoopbackBackend {
    async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>, DnsError> {
        Ok(vec![IpAddr::from([127, 0, 0, 1])])
    }
}

fn fetcher(config: &FetchConfig) -> HttpFetcher {
    let dns = Arc::new(DnsCache::new(
        Arc::new(LoopbackBackend),
        true,
        Duration::from_secs(30),
    ));
    HttpFetcher::new(config, 4, dns).expect("client build failed")
}

fn url_of(server: &MockServer, page_path: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), page_path)).unwrap()
}

#[tokio::test]
async fn test_fetch_success_returns_body_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><body><a href="/next">next</a></body></html>"#)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher(&FetchConfig::default());
    let page = fetcher
        .fetch(&url_of(&server, "/page"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.status, 200);
    assert!(page.content_type.starts_with("text/html"));
    assert!(page.body.contains("/next"));
}

#[tokio::test]
async fn test_non_2xx_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = fetcher(&FetchConfig::default());
    let err = fetcher
        .fetch(&url_of(&server, "/missing"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Http);
    assert!(err.message.contains("404"));
}

#[tokio::test]
async fn test_redirect_followed_to_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/end"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/end"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher(&FetchConfig::default());
    let page = fetcher
        .fetch(&url_of(&server, "/start"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.status, 200);
    assert!(page.final_url.path().ends_with("/end"));
}

#[tokio::test]
async fn test_redirect_cap_is_http_error() {
    let server = MockServer::start().await;
    // Self-redirect: the policy gives up after the configured hop count
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .mount(&server)
        .await;

    let config = FetchConfig {
        max_redirects: 3,
        ..FetchConfig::default()
    };
    let err = fetcher(&config)
        .fetch(&url_of(&server, "/loop"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Http);
}

#[tokio::test]
async fn test_oversized_body_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("x".repeat(64 * 1024))
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let config = FetchConfig {
        max_body_bytes: 4 * 1024,
        ..FetchConfig::default()
    };
    let err = fetcher(&config)
        .fetch(&url_of(&server, "/huge"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Http);
    assert!(err.message.contains("cap"));
}

#[tokio::test]
async fn test_timeout_is_net_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = FetchConfig {
        request_timeout_s: 1,
        ..FetchConfig::default()
    };
    let err = fetcher(&config)
        .fetch(&url_of(&server, "/slow"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Net);
}

#[tokio::test]
async fn test_cancellation_mid_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hang"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let fetcher = fetcher(&FetchConfig::default());
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });
    }

    let err = fetcher
        .fetch(&url_of(&server, "/hang"), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Cancelled);
}

#[tokio::test]
async fn test_missing_content_type_is_empty_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/untyped"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain"))
        .mount(&server)
        .await;

    let fetcher = fetcher(&FetchConfig::default());
    let page = fetcher
        .fetch(&url_of(&server, "/untyped"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.content_type, "");
    assert_eq!(page.body, "plain");
}
