//! Integration tests for the wire client and the discovery workflows.
//!
//! Drives [`MpClient`] and [`Scout`] against a wiremock server: fallback
//! chain order, in-body rate limiting, wire parameter encoding, pagination
//! with partial-result salvage, and the end-to-end article workflow with
//! link extraction.

use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mp_scout::api::{AccountType, ApiError, Endpoints, MpClient, paginate};
use mp_scout::auth::CredentialSet;
use mp_scout::config::ValidationRule;
use mp_scout::search::{CancelFlag, NullObserver, Scout, ScoutError};
use mp_scout::transport::ThrottledTransport;

const VALID_COOKIE: &str = "wxuin=12345; mm_lang=zh_CN; wxsid=abcdef";

fn fast_client(server: &MockServer, token: &str) -> MpClient {
    let mut transport =
        ThrottledTransport::new(&CredentialSet::parse(VALID_COOKIE), 15).expect("build transport");
    transport.set_delay_range(Duration::ZERO, Duration::from_millis(1));
    MpClient::new(transport, Endpoints::new(server.uri()), token.to_string())
}

fn accounts_body() -> String {
    r#"{
        "base_resp": {"ret": 0, "err_msg": "ok"},
        "list": [
            {"fakeid": "MzI1", "nickname": "Rust Weekly", "alias": "rust_weekly"},
            {"fakeid": "MzI2", "nickname": "Rust Daily", "alias": ""}
        ]
    }"#
    .to_string()
}

#[tokio::test]
async fn test_account_search_sends_wire_type_parameter() {
    let server = MockServer::start().await;
    // service accounts are wire type=2, not a symbolic name
    Mock::given(method("GET"))
        .and(path("/cgi-bin/searchbiz"))
        .and(query_param("action", "search_biz"))
        .and(query_param("type", "2"))
        .and(query_param("query", "bank"))
        .and(query_param("token", "t0k"))
        .and(query_param("lang", "zh_CN"))
        .and(query_param("f", "json"))
        .and(query_param("ajax", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(accounts_body()))
        .mount(&server)
        .await;

    let client = fast_client(&server, "t0k");
    let accounts = client
        .search_accounts("bank", AccountType::Service)
        .await
        .expect("search should succeed");
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].fakeid, "MzI1");
}

#[tokio::test]
async fn test_account_search_falls_back_to_second_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/searchbiz"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/searchbiz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(accounts_body()))
        .mount(&server)
        .await;

    let client = fast_client(&server, "t0k");
    let accounts = client
        .search_accounts("rust", AccountType::All)
        .await
        .expect("fallback endpoint should serve the result");
    assert_eq!(accounts[1].nickname, "Rust Daily");
}

#[tokio::test]
async fn test_account_search_surfaces_last_error_when_all_endpoints_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"base_resp": {"ret": -1, "err_msg": "invalid args"}}"#),
        )
        .mount(&server)
        .await;

    let client = fast_client(&server, "t0k");
    let err = client
        .search_accounts("rust", AccountType::All)
        .await
        .expect_err("both endpoints reject");
    match err {
        ApiError::AllEndpointsFailed { last } => {
            assert!(matches!(*last, ApiError::Api { ret: -1, .. }));
        }
        other => panic!("expected AllEndpointsFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_in_body_rate_limit_retries_then_falls_through() {
    let server = MockServer::start().await;
    // primary endpoint keeps reporting the in-body rate-limit code
    Mock::given(method("GET"))
        .and(path("/cgi-bin/searchbiz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"base_resp": {"ret": 200013, "err_msg": "freq control"}}"#),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/searchbiz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(accounts_body()))
        .mount(&server)
        .await;

    let client = fast_client(&server, "t0k");
    let accounts = client
        .search_accounts("rust", AccountType::All)
        .await
        .expect("fallback endpoint should serve after rate-limit retries");
    assert_eq!(accounts.len(), 2);
    // expectation on the mock checks the retry count: one retry, then move on
}

#[tokio::test]
async fn test_article_listing_decodes_page_and_has_more() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/appmsg"))
        .and(query_param("action", "list_ex"))
        .and(query_param("fakeid", "MzI1"))
        .and(query_param("type", "9"))
        .and(query_param("begin", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "base_resp": {"ret": 0},
                "app_msg_list": [
                    {"title": "Issue 42", "link": "https://mp.weixin.qq.com/s/a", "update_time": 1700000000}
                ],
                "has_more": 0
            }"#,
        ))
        .mount(&server)
        .await;

    let client = fast_client(&server, "t0k");
    // page 1 maps to begin=10
    let page = client.list_articles("MzI1", 1).await.expect("list page");
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].title, "Issue 42");
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_pagination_salvages_earlier_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/appmsg"))
        .and(query_param("begin", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"base_resp": {"ret": 0},
                "app_msg_list": [{"title": "A", "link": "https://x/a", "update_time": 1}],
                "has_more": 1}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/appmsg"))
        .and(query_param("begin", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"base_resp": {"ret": 0},
                "app_msg_list": [{"title": "B", "link": "https://x/b", "update_time": 2}],
                "has_more": 1}"#,
        ))
        .mount(&server)
        .await;
    // page 2 fails on every attempt
    Mock::given(method("GET"))
        .and(path("/cgi-bin/appmsg"))
        .and(query_param("begin", "20"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = fast_client(&server, "t0k");
    let articles = paginate::collect(
        |page| client.list_articles("MzI1", page),
        10,
        Duration::from_millis(10),
    )
    .await
    .expect("partial result, not an error");

    let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["A", "B"]);
}

#[tokio::test]
async fn test_miniprogram_search_maps_deep_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wxa-api/search/wxaapp"))
        .and(query_param("action", "search"))
        .and(query_param("keyword", "chess"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "base_resp": {"ret": 0},
                "app_list": [
                    {"nickname": "Chess Master", "appid": "wx111", "desc": "play chess", "username": "gh_chess"}
                ]
            }"#,
        ))
        .mount(&server)
        .await;

    let client = fast_client(&server, "t0k");
    let found = client
        .search_miniprograms("chess")
        .await
        .expect("mini-program search");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].deep_link, "weixin://dl/business/?t=gh_chess");
    assert_eq!(found[0].appid, "wx111");
}

/// End-to-end: authenticate, search, paginate, and extract links from the
/// article body, all against one mock host.
#[tokio::test]
async fn test_article_discovery_workflow_extracts_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/home"))
        .respond_with(ResponseTemplate::new(200).set_body_string("href=\"?token=42&lang=zh_CN\""))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/searchbiz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(accounts_body()))
        .mount(&server)
        .await;
    let article_url = format!("{}/s/issue-42", server.uri());
    Mock::given(method("GET"))
        .and(path("/cgi-bin/appmsg"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"base_resp": {{"ret": 0}},
                "app_msg_list": [{{"title": "Issue 42", "link": "{article_url}", "update_time": 1700000000}}],
                "has_more": 0}}"#,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s/issue-42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html>
                 <a href="https://mp.weixin.qq.com/mp/miniprogram?id=7">open</a>
                 <script>var u = "https://mp.weixin.qq.com/mp/miniprogram?id=7";</script>
               </html>"#,
        ))
        .mount(&server)
        .await;

    let mut scout = Scout::with_endpoints(ValidationRule::default(), Endpoints::new(server.uri()))
        .with_delay_range(Duration::ZERO, Duration::from_millis(1));
    let token = scout
        .authenticate(
            &mp_scout::auth::LiteralCookie(VALID_COOKIE.to_string()),
            None,
        )
        .await
        .expect("authentication")
        .to_string();
    assert_eq!(token, "42");

    let records = scout
        .discover_articles(
            "rust",
            AccountType::All,
            0,
            5,
            &NullObserver,
            &CancelFlag::new(),
        )
        .await
        .expect("workflow");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].account, "Rust Weekly");
    // attribute pass and script pass found the same URL: one link
    assert_eq!(records[0].links.len(), 1);
    assert!(
        records[0]
            .links
            .contains("https://mp.weixin.qq.com/mp/miniprogram?id=7")
    );
}

#[tokio::test]
async fn test_failed_article_fetch_degrades_to_empty_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/searchbiz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(accounts_body()))
        .mount(&server)
        .await;
    let article_url = format!("{}/s/broken", server.uri());
    Mock::given(method("GET"))
        .and(path("/cgi-bin/appmsg"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"base_resp": {{"ret": 0}},
                "app_msg_list": [{{"title": "Broken", "link": "{article_url}", "update_time": 1}}],
                "has_more": 0}}"#,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut scout = Scout::with_endpoints(ValidationRule::default(), Endpoints::new(server.uri()))
        .with_delay_range(Duration::ZERO, Duration::from_millis(1));
    scout
        .authenticate(
            &mp_scout::auth::LiteralCookie(VALID_COOKIE.to_string()),
            Some("42"),
        )
        .await
        .expect("manual token");

    let records = scout
        .discover_articles(
            "rust",
            AccountType::All,
            0,
            5,
            &NullObserver,
            &CancelFlag::new(),
        )
        .await
        .expect("enrichment failure is not fatal");

    assert_eq!(records.len(), 1);
    assert!(records[0].links.is_empty());
}

#[tokio::test]
async fn test_cancelled_workflow_returns_partial_accumulation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wxa-api/search/wxaapp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "base_resp": {"ret": 0},
                "app_list": [
                    {"nickname": "One", "appid": "wx1", "desc": "", "username": "gh_1"},
                    {"nickname": "Two", "appid": "wx2", "desc": "", "username": "gh_2"}
                ]
            }"#,
        ))
        .mount(&server)
        .await;

    let mut scout = Scout::with_endpoints(ValidationRule::default(), Endpoints::new(server.uri()))
        .with_delay_range(Duration::ZERO, Duration::from_millis(1));
    scout
        .authenticate(
            &mp_scout::auth::LiteralCookie(VALID_COOKIE.to_string()),
            Some("42"),
        )
        .await
        .expect("manual token");

    // pre-cancelled: the loop stops before accumulating anything
    let cancel = CancelFlag::new();
    cancel.cancel();
    let records = scout
        .discover_miniprograms("x", &NullObserver, &cancel)
        .await
        .expect("cancellation is not an error");
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_empty_search_is_success_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/searchbiz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"base_resp": {"ret": 0}, "list": []}"#),
        )
        .mount(&server)
        .await;

    let mut scout = Scout::with_endpoints(ValidationRule::default(), Endpoints::new(server.uri()))
        .with_delay_range(Duration::ZERO, Duration::from_millis(1));
    scout
        .authenticate(
            &mp_scout::auth::LiteralCookie(VALID_COOKIE.to_string()),
            Some("42"),
        )
        .await
        .expect("manual token");

    let records = scout
        .discover_articles(
            "nothing",
            AccountType::All,
            0,
            5,
            &NullObserver,
            &CancelFlag::new(),
        )
        .await
        .expect("zero results is a successful outcome");
    assert!(records.is_empty());

    // whereas an unauthenticated facade cannot search at all
    let bare = Scout::new(ValidationRule::default());
    assert!(matches!(
        bare.discover_miniprograms("x", &NullObserver, &CancelFlag::new())
            .await,
        Err(ScoutError::MissingToken)
    ));
}
