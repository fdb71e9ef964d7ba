//! The two user-facing discovery workflows.
//!
//! [`Scout`] composes authentication, the wire client, pagination, and link
//! extraction into account+article discovery and mini-program discovery.
//! It distinguishes "no results" (a successful empty outcome) from "cannot
//! search" (no validated token), and keeps one workflow's failure from
//! corrupting another's session state: every re-authentication builds a
//! fresh transport instead of mutating a shared one.

mod observer;

pub use observer::{CancelFlag, NullObserver, ProgressObserver};

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::{
    AccountType, ApiError, ArticleRecord, Endpoints, MiniProgramRecord, MpClient, paginate,
};
use crate::auth::{AuthError, AuthManager, CredentialError, CredentialSource};
use crate::config::ValidationRule;
use crate::extract::extract_links;

/// Cooldown before retrying a failed listing page. Longer than the normal
/// inter-request delay so transient rate limiting has time to clear.
const PAGE_RETRY_COOLDOWN: Duration = Duration::from_secs(3);

/// Errors surfaced by the discovery workflows.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// No validated token: authenticate before searching.
    #[error("no validated token; authenticate first")]
    MissingToken,

    /// The credential source produced nothing usable.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A primary API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Facade over the discovery workflows.
pub struct Scout {
    manager: AuthManager,
    endpoints: Endpoints,
    client: Option<MpClient>,
}

impl Scout {
    /// Creates a facade for the production host.
    #[must_use]
    pub fn new(rule: ValidationRule) -> Self {
        Self::with_endpoints(rule, Endpoints::default())
    }

    /// Creates a facade against a custom endpoint table (tests).
    #[must_use]
    pub fn with_endpoints(rule: ValidationRule, endpoints: Endpoints) -> Self {
        Self {
            manager: AuthManager::new(rule, endpoints.clone()),
            endpoints,
            client: None,
        }
    }

    /// Overrides the throttle range for sessions this facade creates.
    #[must_use]
    pub fn with_delay_range(mut self, min: Duration, max: Duration) -> Self {
        self.manager = self.manager.with_delay_range(min, max);
        self
    }

    /// Whether a validated token is available.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.client.is_some()
    }

    /// The current token, if authenticated.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.client.as_ref().map(MpClient::token)
    }

    /// Authenticates from a credential source, replacing any prior session.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError`] when the source yields nothing or
    /// authentication fails; an existing session survives a failed attempt.
    #[instrument(level = "debug", skip_all)]
    pub async fn authenticate(
        &mut self,
        source: &dyn CredentialSource,
        manual_token: Option<&str>,
    ) -> Result<&str, ScoutError> {
        let raw_cookie = source.raw_cookie()?;
        let outcome = self.manager.authenticate(&raw_cookie, manual_token).await?;
        info!("session authenticated");
        self.client = Some(MpClient::new(
            outcome.transport,
            self.endpoints.clone(),
            outcome.token,
        ));
        #[allow(clippy::unwrap_used)]
        Ok(self.client.as_ref().map(MpClient::token).unwrap())
    }

    /// Sets the request-delay knob in whole seconds.
    pub fn set_request_delay_secs(&mut self, secs: u64) {
        if let Some(client) = self.client.as_mut() {
            client.transport_mut().set_delay_secs(secs);
        }
    }

    /// Account discovery: search accounts, select one, paginate its article
    /// listing, and enrich each article with extracted links.
    ///
    /// An out-of-range `account_index` falls back to the first candidate.
    /// Zero matching accounts or zero articles is a successful empty
    /// outcome. Per-article extraction failures degrade to an empty link
    /// set. Cancellation stops between articles and returns what
    /// accumulated so far.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::MissingToken`] without a session, or
    /// [`ScoutError::Api`] when the search or the first listing page fails.
    #[instrument(level = "debug", skip(self, observer, cancel))]
    pub async fn discover_articles(
        &self,
        keyword: &str,
        account_type: AccountType,
        account_index: usize,
        max_pages: u32,
        observer: &dyn ProgressObserver,
        cancel: &CancelFlag,
    ) -> Result<Vec<ArticleRecord>, ScoutError> {
        let client = self.client.as_ref().ok_or(ScoutError::MissingToken)?;

        observer.on_status(&format!("searching accounts for \"{keyword}\""));
        let accounts = client.search_accounts(keyword, account_type).await?;
        if accounts.is_empty() {
            observer.on_status("no matching accounts");
            return Ok(Vec::new());
        }

        let index = if account_index < accounts.len() {
            account_index
        } else {
            0
        };
        let account = &accounts[index];
        observer.on_status(&format!("selected account: {}", account.nickname));
        info!(account = %account.nickname, fakeid = %account.fakeid, "account selected");

        observer.on_status(&format!("listing articles (up to {max_pages} pages)"));
        let articles = paginate::collect(
            |page| client.list_articles(&account.fakeid, page),
            max_pages,
            PAGE_RETRY_COOLDOWN,
        )
        .await?;
        if articles.is_empty() {
            observer.on_status("account has no retrievable articles");
            return Ok(Vec::new());
        }

        let total = articles.len();
        let mut records = Vec::with_capacity(total);

        for (i, article) in articles.into_iter().enumerate() {
            if cancel.is_cancelled() {
                observer.on_status("cancelled, returning partial results");
                break;
            }

            observer.on_status(&format!("processing article {}/{total}: {}", i + 1, article.title));

            // Enrichment only: a failed fetch costs the links, not the article.
            let links = match client.fetch_document(&article.link).await {
                Ok(body) => extract_links(&body),
                Err(err) => {
                    warn!(url = %article.link, error = %err, "link extraction fetch failed");
                    Default::default()
                }
            };
            debug!(url = %article.link, links = links.len(), "article processed");

            records.push(ArticleRecord {
                title: article.title,
                link: article.link,
                published_at: article.update_time,
                account: account.nickname.clone(),
                links,
            });
            observer.on_progress(percent(i + 1, total));
        }

        observer.on_status(&format!("processed {} articles", records.len()));
        Ok(records)
    }

    /// Mini-program discovery: search by keyword and map each entry to a
    /// record with a synthesized deep link.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::MissingToken`] without a session, or
    /// [`ScoutError::Api`] when the search call fails.
    #[instrument(level = "debug", skip(self, observer, cancel))]
    pub async fn discover_miniprograms(
        &self,
        keyword: &str,
        observer: &dyn ProgressObserver,
        cancel: &CancelFlag,
    ) -> Result<Vec<MiniProgramRecord>, ScoutError> {
        let client = self.client.as_ref().ok_or(ScoutError::MissingToken)?;

        observer.on_status(&format!("searching mini-programs for \"{keyword}\""));
        let found = client.search_miniprograms(keyword).await?;
        if found.is_empty() {
            observer.on_status("no matching mini-programs");
            return Ok(Vec::new());
        }

        let total = found.len();
        let mut records = Vec::with_capacity(total);
        for (i, record) in found.into_iter().enumerate() {
            if cancel.is_cancelled() {
                observer.on_status("cancelled, returning partial results");
                break;
            }
            observer.on_status(&format!("found {}/{total}: {}", i + 1, record.name));
            records.push(record);
            observer.on_progress(percent(i + 1, total));
        }

        observer.on_status(&format!("found {} mini-programs", records.len()));
        Ok(records)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}
