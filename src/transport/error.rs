//! Error types for the transport layer.
//!
//! The transport classifies raw HTTP outcomes; it never retries. Whether a
//! retry is semantically safe is only known by callers (the paginator, the
//! auth probe), so the taxonomy here is what they key their policies off.

use thiserror::Error;

/// Errors produced while issuing a single HTTP request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Transport-level failure: DNS, TLS, connection reset, timeout.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// 401 (invalid session) or 403 (insufficient permission).
    #[error("authentication rejected for {url} (HTTP {status})")]
    Auth {
        /// The URL that was rejected.
        url: String,
        /// 401 or 403.
        status: u16,
    },

    /// HTTP 429: the service's abuse detection triggered.
    #[error("rate limited requesting {url}")]
    RateLimited {
        /// The URL that was throttled.
        url: String,
    },

    /// 5xx or any status outside the pass-through set.
    #[error("server error requesting {url} (HTTP {status})")]
    Server {
        /// The URL that failed.
        url: String,
        /// The raw status code.
        status: u16,
    },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// A session cookie value contains bytes not representable in a header.
    #[error("cookie values are not valid header text")]
    InvalidCookieHeader,
}

impl TransportError {
    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Whether a caller may reasonably retry after a backoff.
    ///
    /// Auth failures are excluded: they need fresh credentials, not time.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::RateLimited { .. } | Self::Server { .. }
        )
    }
}
