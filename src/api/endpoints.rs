//! Endpoint table for the platform web API.
//!
//! The exact paths, the probe-page order, and the login-redirect marker are
//! undocumented behaviors of a third-party service. They are kept here as
//! plain data (with an overridable base URL for tests) so an upstream change
//! is a one-line edit, while the retry/fallback shape stays in code.

/// Production host for all API calls.
pub const DEFAULT_BASE_URL: &str = "https://mp.weixin.qq.com";

/// Substring of a resolved URL that signals a login redirect (dead session).
pub const LOGIN_PAGE_MARKER: &str = "loginpage";

/// In-body `base_resp.ret` code for the service's own rate limiting on
/// search calls, distinct from HTTP 429.
pub const IN_BODY_RATE_LIMIT_CODE: i64 = 200_013;

/// Account-search paths, tried in order as a fallback chain.
const ACCOUNT_SEARCH_PATHS: [&str; 2] = ["/cgi-bin/searchbiz", "/api/searchbiz"];

/// Article listing path.
const ARTICLE_LIST_PATH: &str = "/cgi-bin/appmsg";

/// Mini-program search path.
const MINIPROGRAM_SEARCH_PATH: &str = "/wxa-api/search/wxaapp";

/// Authenticated pages probed, in order, for an embedded token.
const TOKEN_PROBE_PATHS: [&str; 3] = [
    "/cgi-bin/home",
    "/cgi-bin/menu?t=menu/list&token=&lang=zh_CN",
    "/",
];

/// Resolved endpoint URLs for one base host.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    /// Creates an endpoint table rooted at `base_url` (no trailing slash).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// The base host URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Account-search URLs in fallback order.
    #[must_use]
    pub fn account_search_urls(&self) -> Vec<String> {
        ACCOUNT_SEARCH_PATHS
            .iter()
            .map(|path| format!("{}{path}", self.base_url))
            .collect()
    }

    /// Article listing URL.
    #[must_use]
    pub fn article_list_url(&self) -> String {
        format!("{}{ARTICLE_LIST_PATH}", self.base_url)
    }

    /// Mini-program search URL.
    #[must_use]
    pub fn miniprogram_search_url(&self) -> String {
        format!("{}{MINIPROGRAM_SEARCH_PATH}", self.base_url)
    }

    /// Token probe page URLs in probe order.
    #[must_use]
    pub fn token_probe_urls(&self) -> Vec<String> {
        TOKEN_PROBE_PATHS
            .iter()
            .map(|path| {
                if *path == "/" {
                    format!("{}/", self.base_url)
                } else {
                    format!("{}{path}", self.base_url)
                }
            })
            .collect()
    }
}
