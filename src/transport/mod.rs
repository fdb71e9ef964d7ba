//! Throttled HTTP transport for the platform web API.
//!
//! Every request flows through [`ThrottledTransport::execute`], which
//! enforces a minimum randomized inter-request delay before dispatch and
//! classifies the raw status code into the [`TransportError`] taxonomy.
//! The delay is the only intentional blocking point in the whole core: the
//! remote service's abuse detection makes bursts counterproductive, so the
//! throttle is a policy knob (the CLI exposes it as "request delay"), not a
//! correctness requirement.
//!
//! The transport owns its session state exclusively. It is not shared across
//! concurrent discovery runs, and it never retries: retry policy belongs to
//! callers, which know whether a retry is semantically safe.

mod error;

pub use error::TransportError;

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE, REFERER};
use reqwest::{Client, ClientBuilder, Method};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::auth::CredentialSet;

/// Browser-like User-Agent; the API rejects obviously non-browser clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Referer expected by the platform endpoints.
const REFERER_VALUE: &str = "https://mp.weixin.qq.com/";

/// Default inter-request delay range in seconds.
const DEFAULT_DELAY_RANGE: (f64, f64) = (1.5, 2.5);

/// Statuses handed back to the caller as structured responses.
/// 404 passes through because list endpoints use it for "gone" entries.
const PASSTHROUGH_STATUSES: [u16; 2] = [200, 404];

/// A completed request: status, resolved URL after redirects, and body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code (200 or 404; everything else became an error).
    pub status: u16,
    /// The URL the response actually came from, after redirects. Login
    /// redirects are detected by inspecting this.
    pub final_url: String,
    /// Response body text.
    pub body: String,
}

impl ApiResponse {
    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the body is not the expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP transport honoring a minimum randomized inter-request delay.
///
/// Owned exclusively by one discovery session; the last-request clock is
/// updated unconditionally after every call (even failures), so back-to-back
/// errors still throttle.
#[derive(Debug)]
pub struct ThrottledTransport {
    client: Client,
    delay_range: (f64, f64),
    last_request: Mutex<Option<Instant>>,
}

impl ThrottledTransport {
    /// Builds a transport carrying the given session cookies.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] when client construction fails
    /// (e.g. no TLS backend available).
    pub fn new(
        credentials: &CredentialSet,
        timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(REFERER_VALUE));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9"),
        );
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if !credentials.is_empty() {
            let cookie_header = HeaderValue::from_str(&credentials.header_value())
                .map_err(|_| {
                    warn!("cookie values contain non-header-safe bytes");
                    TransportError::InvalidCookieHeader
                })?;
            headers.insert(COOKIE, cookie_header);
        }

        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(TransportError::Build)?;

        Ok(Self {
            client,
            delay_range: DEFAULT_DELAY_RANGE,
            last_request: Mutex::new(None),
        })
    }

    /// Sets the request delay from a whole-second knob.
    ///
    /// Mirrors the user-facing "request delay" setting: a knob of `d`
    /// randomizes between `d` and `d + 1` seconds.
    pub fn set_delay_secs(&mut self, secs: u64) {
        #[allow(clippy::cast_precision_loss)]
        let base = secs as f64;
        self.delay_range = (base, base + 1.0);
    }

    /// Sets an explicit delay range (used by tests and tight callers).
    pub fn set_delay_range(&mut self, min: Duration, max: Duration) {
        self.delay_range = (min.as_secs_f64(), max.as_secs_f64().max(min.as_secs_f64()));
    }

    /// Current delay range in seconds.
    #[must_use]
    pub fn delay_range(&self) -> (f64, f64) {
        self.delay_range
    }

    /// Issues one request, throttled and classified.
    ///
    /// Before dispatch, draws `delay ~ uniform(delay_range)` and sleeps for
    /// whatever portion of it has not already elapsed since the previous
    /// request. After dispatch the last-request clock is updated whether or
    /// not the call succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] per the status classification: 401/403 →
    /// `Auth`, 429 → `RateLimited`, transport faults → `Network`, anything
    /// outside {200, 404} → `Server`. 200 and 404 pass through.
    #[instrument(level = "debug", skip(self, query))]
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, TransportError> {
        // The guard is held across the request so one session's calls stay
        // strictly sequential: acquire, wait out the delay, dispatch, stamp.
        let mut last_request = self.last_request.lock().await;

        let delay = self.draw_delay();
        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < delay {
                let wait = delay - elapsed;
                debug!(wait_ms = wait.as_millis(), "throttling before request");
                tokio::time::sleep(wait).await;
            }
        }

        let mut request = self.client.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let result = request.send().await;

        // Unconditional: back-to-back failures must still throttle.
        *last_request = Some(Instant::now());
        drop(last_request);

        let response = result.map_err(|source| TransportError::network(url, source))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        match status {
            s if PASSTHROUGH_STATUSES.contains(&s) => {
                let body = response
                    .text()
                    .await
                    .map_err(|source| TransportError::network(url, source))?;
                debug!(status, final_url = %final_url, bytes = body.len(), "request complete");
                Ok(ApiResponse {
                    status,
                    final_url,
                    body,
                })
            }
            401 | 403 => Err(TransportError::Auth {
                url: url.to_string(),
                status,
            }),
            429 => Err(TransportError::RateLimited {
                url: url.to_string(),
            }),
            other => Err(TransportError::Server {
                url: url.to_string(),
                status: other,
            }),
        }
    }

    /// Draws a uniform random delay from the configured range.
    fn draw_delay(&self) -> Duration {
        let (min, max) = self.delay_range;
        if max <= min {
            return Duration::from_secs_f64(min.max(0.0));
        }
        let secs = rand::thread_rng().gen_range(min..=max);
        Duration::from_secs_f64(secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn transport() -> ThrottledTransport {
        ThrottledTransport::new(&CredentialSet::parse("wxuin=1; wxsid=a"), 15).unwrap()
    }

    #[test]
    fn test_set_delay_secs_maps_to_one_second_band() {
        let mut t = transport();
        t.set_delay_secs(3);
        assert_eq!(t.delay_range(), (3.0, 4.0));
    }

    #[test]
    fn test_set_delay_range_clamps_inverted_range() {
        let mut t = transport();
        t.set_delay_range(Duration::from_secs(2), Duration::from_secs(1));
        let (min, max) = t.delay_range();
        assert!(max >= min);
    }

    #[test]
    fn test_draw_delay_stays_within_range() {
        let mut t = transport();
        t.set_delay_range(Duration::from_millis(100), Duration::from_millis(200));
        for _ in 0..32 {
            let d = t.draw_delay();
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(200));
        }
    }

    #[test]
    fn test_transport_builds_without_cookies() {
        assert!(ThrottledTransport::new(&CredentialSet::default(), 15).is_ok());
    }
}
