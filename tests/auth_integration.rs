//! Integration tests for authentication and the throttled transport.
//!
//! Exercises the full flow through the public API against a wiremock
//! server: token discovery over the probe pages, login-redirect detection,
//! status classification, and the inter-request throttle.

use std::time::{Duration, Instant};

use reqwest::Method;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mp_scout::api::Endpoints;
use mp_scout::auth::{AuthError, AuthManager, CredentialSet};
use mp_scout::config::ValidationRule;
use mp_scout::transport::{ThrottledTransport, TransportError};

const VALID_COOKIE: &str = "wxuin=12345; mm_lang=zh_CN; wxsid=abcdef";

fn fast_manager(server: &MockServer) -> AuthManager {
    AuthManager::new(ValidationRule::default(), Endpoints::new(server.uri()))
        .with_delay_range(Duration::ZERO, Duration::from_millis(1))
}

fn fast_transport() -> ThrottledTransport {
    let mut transport =
        ThrottledTransport::new(&CredentialSet::parse(VALID_COOKIE), 15).expect("build transport");
    transport.set_delay_range(Duration::ZERO, Duration::from_millis(1));
    transport
}

#[tokio::test]
async fn test_token_discovered_from_first_probe_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/home"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><a href=\"/cgi-bin/appmsg?token=123456&lang=zh_CN\">articles</a></html>",
        ))
        .mount(&server)
        .await;

    let outcome = fast_manager(&server)
        .authenticate(VALID_COOKIE, None)
        .await
        .expect("token discovery should succeed");

    assert_eq!(outcome.token, "123456");
    assert!(outcome.credentials.contains("wxuin"));
}

#[tokio::test]
async fn test_probe_falls_through_to_later_pages() {
    let server = MockServer::start().await;
    // first probe errors, second has no token, third carries it
    Mock::given(method("GET"))
        .and(path("/cgi-bin/home"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/menu"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>menu</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("var url = \"home?token=777&x=1\";"),
        )
        .mount(&server)
        .await;

    let outcome = fast_manager(&server)
        .authenticate(VALID_COOKIE, None)
        .await
        .expect("later probe should still yield the token");

    assert_eq!(outcome.token, "777");
}

#[tokio::test]
async fn test_login_redirect_fails_fast_with_expired_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/home"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/cgi-bin/loginpage?url=home"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/loginpage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("please log in"))
        .mount(&server)
        .await;

    let err = fast_manager(&server)
        .authenticate(VALID_COOKIE, None)
        .await
        .expect_err("dead session must fail");

    assert!(matches!(err, AuthError::ExpiredSession));
    // fail-fast: the remaining probe pages were never requested
    let requests = server.received_requests().await.expect("request log");
    assert!(
        requests.iter().all(|r| r.url.path() != "/"),
        "no probe past the login redirect"
    );
}

#[tokio::test]
async fn test_exhausted_probes_report_pattern_used() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>no token here</html>"))
        .mount(&server)
        .await;

    let err = fast_manager(&server)
        .authenticate(VALID_COOKIE, None)
        .await
        .expect_err("no probe page matches");

    match err {
        AuthError::TokenNotFound { pattern } => assert_eq!(pattern, r"token=(\d+)"),
        other => panic!("expected TokenNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_token_pattern_drives_discovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/home"))
        .respond_with(ResponseTemplate::new(200).set_body_string("session_key=abc123;"))
        .mount(&server)
        .await;

    let rule = ValidationRule::new(
        vec!["wxuin".into()],
        vec!["wxsid".into()],
        r"session_key=(\w+)",
        15,
    )
    .expect("valid rule");
    let manager = AuthManager::new(rule, Endpoints::new(server.uri()))
        .with_delay_range(Duration::ZERO, Duration::from_millis(1));

    let outcome = manager
        .authenticate(VALID_COOKIE, None)
        .await
        .expect("custom pattern should match");
    assert_eq!(outcome.token, "abc123");
}

#[tokio::test]
async fn test_throttle_enforces_minimum_gap_between_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let mut transport = fast_transport();
    transport.set_delay_range(Duration::from_millis(250), Duration::from_millis(350));
    let url = format!("{}/ping", server.uri());

    let start = Instant::now();
    transport
        .execute(Method::GET, &url, &[])
        .await
        .expect("first call");
    transport
        .execute(Method::GET, &url, &[])
        .await
        .expect("second call");

    assert!(
        start.elapsed() >= Duration::from_millis(250),
        "second request must wait out the minimum delay, elapsed {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn test_status_classification() {
    let server = MockServer::start().await;
    for (route, status) in [
        ("/ok", 200),
        ("/gone", 404),
        ("/unauthorized", 401),
        ("/forbidden", 403),
        ("/throttled", 429),
        ("/broken", 500),
        ("/teapot", 418),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string("body"))
            .mount(&server)
            .await;
    }
    let transport = fast_transport();
    let url = |route: &str| format!("{}{route}", server.uri());

    // pass-through statuses come back as structured responses
    let ok = transport
        .execute(Method::GET, &url("/ok"), &[])
        .await
        .expect("200 passes through");
    assert_eq!(ok.status, 200);
    let gone = transport
        .execute(Method::GET, &url("/gone"), &[])
        .await
        .expect("404 passes through");
    assert_eq!(gone.status, 404);

    for (route, expect_status) in [("/unauthorized", 401), ("/forbidden", 403)] {
        match transport.execute(Method::GET, &url(route), &[]).await {
            Err(TransportError::Auth { status, .. }) => assert_eq!(status, expect_status),
            other => panic!("expected Auth error for {route}, got {other:?}"),
        }
    }
    assert!(matches!(
        transport.execute(Method::GET, &url("/throttled"), &[]).await,
        Err(TransportError::RateLimited { .. })
    ));
    assert!(matches!(
        transport.execute(Method::GET, &url("/broken"), &[]).await,
        Err(TransportError::Server { status: 500, .. })
    ));
    assert!(matches!(
        transport.execute(Method::GET, &url("/teapot"), &[]).await,
        Err(TransportError::Server { status: 418, .. })
    ));
}

#[tokio::test]
async fn test_connection_failure_is_a_network_error() {
    // nothing listens here
    let transport = fast_transport();
    let result = transport
        .execute(Method::GET, "http://127.0.0.1:1/unreachable", &[])
        .await;
    assert!(matches!(result, Err(TransportError::Network { .. })));
}

#[tokio::test]
async fn test_session_cookies_are_sent_with_requests() {
    let server = MockServer::start().await;
    // CredentialSet renders cookies in name order
    Mock::given(method("GET"))
        .and(path("/cgi-bin/home"))
        .and(wiremock::matchers::header(
            "Cookie",
            "mm_lang=zh_CN; wxsid=abcdef; wxuin=12345",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("token=42&"))
        .mount(&server)
        .await;

    let outcome = fast_manager(&server)
        .authenticate(VALID_COOKIE, None)
        .await
        .expect("cookie header must match for the mock to respond");
    assert_eq!(outcome.token, "42");
}
