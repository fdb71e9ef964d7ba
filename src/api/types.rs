//! Wire and result types for the platform API.

use std::collections::BTreeSet;

use serde::Deserialize;

/// Account-type filter for account search.
///
/// The wire protocol encodes this as a bare integer in the `type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountType {
    /// All account kinds (`type=0`).
    #[default]
    All,
    /// Official accounts (`type=1`).
    Official,
    /// Service accounts (`type=2`).
    Service,
    /// Subscription accounts (`type=3`).
    Subscription,
}

impl AccountType {
    /// The integer the wire protocol expects.
    #[must_use]
    pub fn wire_value(self) -> u8 {
        match self {
            Self::All => 0,
            Self::Official => 1,
            Self::Service => 2,
            Self::Subscription => 3,
        }
    }

    /// Parses a user-facing name (`all`, `official`, `service`,
    /// `subscription`); unknown names fall back to [`AccountType::All`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "official" => Self::Official,
            "service" => Self::Service,
            "subscription" => Self::Subscription,
            _ => Self::All,
        }
    }
}

/// An account returned by search. Read-only downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    /// Opaque account identifier required by the article listing endpoint.
    pub fakeid: String,
    /// Display name.
    pub nickname: String,
    /// Optional public alias.
    #[serde(default)]
    pub alias: String,
}

/// One article from a listing page, before link enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleSummary {
    /// Article title.
    #[serde(default)]
    pub title: String,
    /// Canonical article URL.
    pub link: String,
    /// Publish/update timestamp (Unix seconds).
    #[serde(default)]
    pub update_time: i64,
}

/// An article enriched with extracted cross-references. Immutable once built.
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    /// Article title.
    pub title: String,
    /// Canonical article URL.
    pub link: String,
    /// Publish/update timestamp (Unix seconds).
    pub published_at: i64,
    /// Owning account display name.
    pub account: String,
    /// Deduplicated embedded links found in the article body.
    pub links: BTreeSet<String>,
}

/// A mini-program returned by search.
#[derive(Debug, Clone)]
pub struct MiniProgramRecord {
    /// Display name.
    pub name: String,
    /// External identifier.
    pub appid: String,
    /// Description text.
    pub description: String,
    /// Synthesized deep-link URI.
    pub deep_link: String,
}

/// Raw mini-program search entry as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMiniProgram {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub appid: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub username: String,
}

impl From<RawMiniProgram> for MiniProgramRecord {
    fn from(raw: RawMiniProgram) -> Self {
        Self {
            deep_link: format!("weixin://dl/business/?t={}", raw.username),
            name: raw.nickname,
            appid: raw.appid,
            description: raw.desc,
        }
    }
}

/// The `base_resp` envelope carried by every JSON endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BaseResp {
    #[serde(default)]
    pub ret: i64,
    #[serde(default)]
    pub err_msg: String,
}

/// Account-search response body.
#[derive(Debug, Deserialize)]
pub(crate) struct AccountSearchResponse {
    #[serde(default)]
    pub base_resp: BaseResp,
    #[serde(default)]
    pub list: Vec<AccountRecord>,
}

/// Article-listing response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ArticleListResponse {
    #[serde(default)]
    pub base_resp: BaseResp,
    #[serde(default)]
    pub app_msg_list: Vec<ArticleSummary>,
    /// 0/1 flag indicating more pages remain.
    #[serde(default)]
    pub has_more: u8,
}

/// Mini-program search response body.
#[derive(Debug, Deserialize)]
pub(crate) struct MiniProgramSearchResponse {
    #[serde(default)]
    pub base_resp: BaseResp,
    #[serde(default)]
    pub app_list: Vec<RawMiniProgram>,
}
