//! Credential validation and token discovery.
//!
//! The service has no dedicated auth endpoint: the authorization token is
//! embedded in the markup of ordinary authenticated pages. Authentication
//! therefore means (1) structurally validating the cookie set against the
//! active [`ValidationRule`] and (2) probing a fixed ordered list of pages
//! with the rule's token pattern until one yields a capture.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::endpoints::{Endpoints, LOGIN_PAGE_MARKER};
use crate::config::ValidationRule;
use crate::transport::{ThrottledTransport, TransportError};

use super::CredentialSet;

use reqwest::Method;
use url::Url;

/// Errors raised during authentication.
///
/// None of these are retryable without new input: a missing field needs a
/// different cookie string, an expired session needs a fresh login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more mandatory cookie fields are absent.
    #[error("missing core cookie fields: {}", fields.join(", "))]
    MissingCoreFields {
        /// The absent field names.
        fields: Vec<String>,
    },

    /// None of the session cookie fields are present.
    #[error("missing session cookie fields (need at least one of): {}", fields.join(", "))]
    MissingSessionFields {
        /// The acceptable field names, none of which were found.
        fields: Vec<String>,
    },

    /// A probe request resolved to the login page: the session is dead.
    #[error("session expired or invalid (redirected to login)")]
    ExpiredSession,

    /// No probe page matched the token pattern.
    #[error("no page matched token pattern '{pattern}'")]
    TokenNotFound {
        /// The pattern that found nothing.
        pattern: String,
    },

    /// Transport failure while constructing the probe client.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A successful authentication: the validated credentials, the discovered
/// (or manually supplied) token, and the transport carrying the session.
#[derive(Debug)]
pub struct AuthOutcome {
    /// The authorization token for subsequent API calls.
    pub token: String,
    /// The validated credential set.
    pub credentials: CredentialSet,
    /// Transport built around the credentials, ready for API use.
    pub transport: ThrottledTransport,
}

/// Validates cookie strings and discovers authorization tokens.
#[derive(Debug, Clone)]
pub struct AuthManager {
    rule: ValidationRule,
    endpoints: Endpoints,
    delay_range: Option<(Duration, Duration)>,
}

impl AuthManager {
    /// Creates a manager bound to one rule and one endpoint table.
    #[must_use]
    pub fn new(rule: ValidationRule, endpoints: Endpoints) -> Self {
        Self {
            rule,
            endpoints,
            delay_range: None,
        }
    }

    /// Overrides the throttle range of transports built by this manager
    /// (tight callers and tests; the default range applies otherwise).
    #[must_use]
    pub fn with_delay_range(mut self, min: Duration, max: Duration) -> Self {
        self.delay_range = Some((min, max));
        self
    }

    /// The active validation rule.
    #[must_use]
    pub fn rule(&self) -> &ValidationRule {
        &self.rule
    }

    /// Parses and structurally validates a raw cookie string.
    ///
    /// Two-tier rule: every `core_fields` entry must be present (all-of);
    /// at least one `session_fields` entry must be present (any-of). The
    /// split is what lets operators adapt to renamed or shuffled session
    /// cookies without a code change.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCoreFields`] or
    /// [`AuthError::MissingSessionFields`] naming the offending fields.
    pub fn validate(&self, raw_cookie: &str) -> Result<CredentialSet, AuthError> {
        let credentials = CredentialSet::parse(raw_cookie);

        let missing_core: Vec<String> = self
            .rule
            .core_fields()
            .iter()
            .filter(|field| !credentials.contains(field))
            .cloned()
            .collect();
        if !missing_core.is_empty() {
            return Err(AuthError::MissingCoreFields {
                fields: missing_core,
            });
        }

        let has_session = self
            .rule
            .session_fields()
            .iter()
            .any(|field| credentials.contains(field));
        if !has_session {
            return Err(AuthError::MissingSessionFields {
                fields: self.rule.session_fields().to_vec(),
            });
        }

        debug!(cookies = credentials.len(), "credential set validated");
        Ok(credentials)
    }

    /// Authenticates a raw cookie string, discovering a token if none is
    /// supplied.
    ///
    /// A manual token always wins: discovery is skipped entirely. Otherwise
    /// the probe pages are requested in order; a login redirect fails fast
    /// with [`AuthError::ExpiredSession`] (the session is dead, further
    /// probes are pointless), other per-page failures are logged and
    /// skipped, and the first capture of the token pattern wins.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] on validation failure, an expired session, or
    /// when no probe page yields a token.
    #[instrument(level = "debug", skip_all)]
    pub async fn authenticate(
        &self,
        raw_cookie: &str,
        manual_token: Option<&str>,
    ) -> Result<AuthOutcome, AuthError> {
        let credentials = self.validate(raw_cookie)?;
        let mut transport = ThrottledTransport::new(&credentials, self.rule.api_timeout_secs())?;
        if let Some((min, max)) = self.delay_range {
            transport.set_delay_range(min, max);
        }

        if let Some(token) = manual_token {
            info!("using manually supplied token");
            return Ok(AuthOutcome {
                token: token.to_string(),
                credentials,
                transport,
            });
        }

        let pattern = self.rule.compiled_token_pattern();

        for url in self.endpoints.token_probe_urls() {
            let response = match transport.execute(Method::GET, &url, &[]).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(probe = %url, error = %err, "token probe failed, trying next page");
                    continue;
                }
            };

            if resolved_to_login_page(&response.final_url) {
                return Err(AuthError::ExpiredSession);
            }

            if let Some(token) = pattern
                .captures(&response.body)
                .and_then(|caps| caps.get(1))
            {
                info!(probe = %url, "token discovered");
                return Ok(AuthOutcome {
                    token: token.as_str().to_string(),
                    credentials,
                    transport,
                });
            }
            debug!(probe = %url, "no token match on probe page");
        }

        Err(AuthError::TokenNotFound {
            pattern: self.rule.token_pattern().to_string(),
        })
    }
}

/// Whether a resolved request URL is the login page (a dead session is
/// redirected there). The marker is matched against the path, so query
/// values mentioning it do not false-positive.
fn resolved_to_login_page(final_url: &str) -> bool {
    Url::parse(final_url).is_ok_and(|url| url.path().contains(LOGIN_PAGE_MARKER))
}
