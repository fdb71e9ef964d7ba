//! Wire client for the platform web API.
//!
//! [`MpClient`] turns the three list/search endpoints into typed calls,
//! routing every request through the [`ThrottledTransport`]. It owns the
//! endpoint fallback chain for account search and the handling of the
//! service's in-body rate-limit code, which arrives with HTTP 200 and is
//! therefore invisible to the transport's status classification.

pub mod endpoints;
pub mod paginate;
pub mod types;

pub use endpoints::Endpoints;
pub use paginate::{Page, collect};
pub use types::{
    AccountRecord, AccountType, ArticleRecord, ArticleSummary, MiniProgramRecord,
};

use std::time::Duration;

use reqwest::Method;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::transport::{ApiResponse, ThrottledTransport, TransportError};
use endpoints::IN_BODY_RATE_LIMIT_CODE;
use types::{AccountSearchResponse, ArticleListResponse, MiniProgramSearchResponse};

/// Batch size for list calls; the service ignores larger values.
const PAGE_SIZE: u32 = 10;

/// Cooldown after the in-body rate-limit code before retrying an endpoint.
/// Deliberately longer than the normal inter-request delay.
const IN_BODY_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(5);

/// Errors from typed API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Underlying transport failure (network, auth, HTTP status).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response body was not the expected shape.
    #[error("unexpected response shape from {endpoint}: {source}")]
    Parse {
        /// The endpoint that produced the body.
        endpoint: String,
        /// The decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// The service reported an application-level error in `base_resp`.
    #[error("API error {ret}: {err_msg}")]
    Api {
        /// `base_resp.ret` value.
        ret: i64,
        /// `base_resp.err_msg` text.
        err_msg: String,
    },

    /// Every endpoint in the account-search fallback chain failed.
    #[error("all account-search endpoints failed, last: {last}")]
    AllEndpointsFailed {
        /// The failure from the final endpoint tried.
        #[source]
        last: Box<ApiError>,
    },
}

/// Typed client for the list/search endpoints.
///
/// Requires a validated authorization token; construct one after
/// authentication succeeds.
#[derive(Debug)]
pub struct MpClient {
    transport: ThrottledTransport,
    endpoints: Endpoints,
    token: String,
}

impl MpClient {
    /// Wraps a transport with a validated token.
    #[must_use]
    pub fn new(transport: ThrottledTransport, endpoints: Endpoints, token: String) -> Self {
        Self {
            transport,
            endpoints,
            token,
        }
    }

    /// The authorization token in use.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Access to the underlying transport (delay reconfiguration).
    pub fn transport_mut(&mut self) -> &mut ThrottledTransport {
        &mut self.transport
    }

    /// Searches accounts by keyword and type filter.
    ///
    /// Tries the endpoint fallback chain in order. Within one endpoint, the
    /// in-body rate-limit code earns a cooldown and a single retry before
    /// falling through to the next path. Endpoint failures are logged and
    /// the chain continues; only when every path has failed does the last
    /// error surface.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AllEndpointsFailed`] when no endpoint yields a
    /// decodable success response.
    #[instrument(level = "debug", skip(self))]
    pub async fn search_accounts(
        &self,
        keyword: &str,
        account_type: AccountType,
    ) -> Result<Vec<AccountRecord>, ApiError> {
        let mut last_error: Option<ApiError> = None;

        for url in self.endpoints.account_search_urls() {
            let mut rate_limit_retried = false;
            loop {
                match self.search_accounts_once(&url, keyword, account_type).await {
                    Ok(accounts) => {
                        debug!(endpoint = %url, hits = accounts.len(), "account search succeeded");
                        return Ok(accounts);
                    }
                    Err(ApiError::Api { ret, err_msg }) if ret == IN_BODY_RATE_LIMIT_CODE => {
                        if rate_limit_retried {
                            warn!(endpoint = %url, "in-body rate limit persists, trying next endpoint");
                            last_error = Some(ApiError::Api { ret, err_msg });
                            break;
                        }
                        info!(
                            endpoint = %url,
                            cooldown_secs = IN_BODY_RATE_LIMIT_COOLDOWN.as_secs(),
                            "in-body rate limit, cooling down before retry"
                        );
                        rate_limit_retried = true;
                        tokio::time::sleep(IN_BODY_RATE_LIMIT_COOLDOWN).await;
                    }
                    Err(err) => {
                        warn!(endpoint = %url, error = %err, "account search endpoint failed");
                        last_error = Some(err);
                        break;
                    }
                }
            }
        }

        Err(ApiError::AllEndpointsFailed {
            last: Box::new(last_error.unwrap_or(ApiError::Api {
                ret: -1,
                err_msg: "no endpoints configured".to_string(),
            })),
        })
    }

    async fn search_accounts_once(
        &self,
        url: &str,
        keyword: &str,
        account_type: AccountType,
    ) -> Result<Vec<AccountRecord>, ApiError> {
        let query = [
            ("action", "search_biz".to_string()),
            ("token", self.token.clone()),
            ("lang", "zh_CN".to_string()),
            ("f", "json".to_string()),
            ("ajax", "1".to_string()),
            ("query", keyword.to_string()),
            ("begin", "0".to_string()),
            ("count", PAGE_SIZE.to_string()),
            ("type", account_type.wire_value().to_string()),
        ];

        let response = self.transport.execute(Method::GET, url, &query).await?;
        let decoded: AccountSearchResponse = decode(url, &response)?;
        check_base_resp(decoded.base_resp.ret, decoded.base_resp.err_msg)?;
        Ok(decoded.list)
    }

    /// Fetches one page of an account's article listing.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, undecodable body, or a
    /// nonzero `base_resp.ret`.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_articles(
        &self,
        fakeid: &str,
        page: u32,
    ) -> Result<Page<ArticleSummary>, ApiError> {
        let url = self.endpoints.article_list_url();
        let query = [
            ("action", "list_ex".to_string()),
            ("begin", (page * PAGE_SIZE).to_string()),
            ("count", PAGE_SIZE.to_string()),
            ("fakeid", fakeid.to_string()),
            ("type", "9".to_string()),
            ("token", self.token.clone()),
            ("lang", "zh_CN".to_string()),
            ("f", "json".to_string()),
            ("ajax", "1".to_string()),
        ];

        let response = self.transport.execute(Method::GET, &url, &query).await?;
        let decoded: ArticleListResponse = decode(&url, &response)?;
        check_base_resp(decoded.base_resp.ret, decoded.base_resp.err_msg)?;
        Ok(Page::new(decoded.app_msg_list, decoded.has_more != 0))
    }

    /// Searches mini-programs by keyword.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, undecodable body, or a
    /// nonzero `base_resp.ret`.
    #[instrument(level = "debug", skip(self))]
    pub async fn search_miniprograms(
        &self,
        keyword: &str,
    ) -> Result<Vec<MiniProgramRecord>, ApiError> {
        let url = self.endpoints.miniprogram_search_url();
        let query = [
            ("action", "search".to_string()),
            ("token", self.token.clone()),
            ("lang", "zh_CN".to_string()),
            ("keyword", keyword.to_string()),
            ("page", "1".to_string()),
            ("num", PAGE_SIZE.to_string()),
        ];

        let response = self.transport.execute(Method::GET, &url, &query).await?;
        let decoded: MiniProgramSearchResponse = decode(&url, &response)?;
        check_base_resp(decoded.base_resp.ret, decoded.base_resp.err_msg)?;
        Ok(decoded.app_list.into_iter().map(Into::into).collect())
    }

    /// Fetches an arbitrary document body (article pages for enrichment).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] on any request failure.
    pub async fn fetch_document(&self, url: &str) -> Result<String, ApiError> {
        let response = self.transport.execute(Method::GET, url, &[]).await?;
        Ok(response.body)
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    response: &ApiResponse,
) -> Result<T, ApiError> {
    response.json().map_err(|source| ApiError::Parse {
        endpoint: endpoint.to_string(),
        source,
    })
}

fn check_base_resp(ret: i64, err_msg: String) -> Result<(), ApiError> {
    if ret == 0 {
        Ok(())
    } else {
        Err(ApiError::Api { ret, err_msg })
    }
}
