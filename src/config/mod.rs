//! Validation-rule configuration.
//!
//! The remote platform renames and shuffles its session-cookie fields without
//! notice, so the rules that decide whether a credential set is usable are
//! data, not code: which cookie names are mandatory, which count as session
//! evidence, and which regex digs the authorization token out of page markup.
//!
//! A [`ValidationRule`] is an immutable value. Components receive it at
//! construction time; "live reconfiguration" means building a new core
//! instance around a new rule, never mutating one that is already shared.

use std::fs;
use std::io;
use std::path::Path;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Default mandatory cookie fields (platform user identity).
pub const DEFAULT_CORE_FIELDS: &[&str] = &["wxuin", "mm_lang"];

/// Default session cookie fields (any one proves a live session).
pub const DEFAULT_SESSION_FIELDS: &[&str] = &["wxsid", "slave_sid", "sessionid"];

/// Default token-extraction pattern. Exactly one capture group.
pub const DEFAULT_TOKEN_PATTERN: &str = r"token=(\d+)";

/// Default per-request timeout in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 15;

/// Errors raised when a rule is structurally unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `core_fields` must name at least one cookie.
    #[error("core_fields must not be empty")]
    EmptyCoreFields,

    /// `session_fields` must name at least one cookie.
    #[error("session_fields must not be empty")]
    EmptySessionFields,

    /// The token pattern failed to compile.
    #[error("invalid token_pattern '{pattern}': {source}")]
    BadTokenPattern {
        /// The offending pattern text.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// The token pattern compiled but captures nothing.
    #[error("token_pattern '{pattern}' has no capture group")]
    NoCaptureGroup {
        /// The offending pattern text.
        pattern: String,
    },

    /// `api_timeout` must be a positive number of seconds.
    #[error("api_timeout must be positive")]
    ZeroTimeout,

    /// I/O error while reading or writing the config file.
    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Cookie-validation and token-discovery rules.
///
/// Construct with [`ValidationRule::new`] (which enforces the structural
/// invariants) or [`ValidationRule::default`]; load persisted overrides with
/// [`ValidationRule::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    core_fields: Vec<String>,
    session_fields: Vec<String>,
    token_pattern: String,
    api_timeout_secs: u64,
}

impl Default for ValidationRule {
    fn default() -> Self {
        Self {
            core_fields: DEFAULT_CORE_FIELDS.iter().map(|s| (*s).to_string()).collect(),
            session_fields: DEFAULT_SESSION_FIELDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

impl ValidationRule {
    /// Creates a rule, enforcing the structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `core_fields` or `session_fields` is
    /// empty, the pattern does not compile, the pattern has no capture
    /// group, or the timeout is zero.
    pub fn new(
        core_fields: Vec<String>,
        session_fields: Vec<String>,
        token_pattern: impl Into<String>,
        api_timeout_secs: u64,
    ) -> Result<Self, ConfigError> {
        let token_pattern = token_pattern.into();

        if core_fields.iter().all(|f| f.trim().is_empty()) {
            return Err(ConfigError::EmptyCoreFields);
        }
        if session_fields.iter().all(|f| f.trim().is_empty()) {
            return Err(ConfigError::EmptySessionFields);
        }
        let compiled = Regex::new(&token_pattern).map_err(|source| ConfigError::BadTokenPattern {
            pattern: token_pattern.clone(),
            source,
        })?;
        if compiled.captures_len() < 2 {
            // captures_len counts the implicit whole-match group 0.
            return Err(ConfigError::NoCaptureGroup {
                pattern: token_pattern,
            });
        }
        if api_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            core_fields: trim_fields(core_fields),
            session_fields: trim_fields(session_fields),
            token_pattern,
            api_timeout_secs,
        })
    }

    /// Cookie names that must all be present.
    #[must_use]
    pub fn core_fields(&self) -> &[String] {
        &self.core_fields
    }

    /// Cookie names of which at least one must be present.
    #[must_use]
    pub fn session_fields(&self) -> &[String] {
        &self.session_fields
    }

    /// The token-extraction pattern source text.
    #[must_use]
    pub fn token_pattern(&self) -> &str {
        &self.token_pattern
    }

    /// Compiles the token pattern.
    ///
    /// Infallible for rules built through [`ValidationRule::new`] or
    /// [`ValidationRule::load`], which already compiled it once.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn compiled_token_pattern(&self) -> Regex {
        Regex::new(&self.token_pattern).expect("token_pattern validated at construction")
    }

    /// Per-request timeout in seconds.
    #[must_use]
    pub fn api_timeout_secs(&self) -> u64 {
        self.api_timeout_secs
    }

    /// Loads a rule from a flat `key=value` file, falling back to defaults.
    ///
    /// A missing file is not an error: the defaults apply. Unknown keys and
    /// `#`-comment lines are ignored. A file whose values violate the
    /// structural invariants is rejected whole (better a loud failure than a
    /// rule that silently validates nothing).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when present values are structurally invalid,
    /// or [`ConfigError::Io`] when an existing file cannot be read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(defaults);
            }
            // An unreadable existing file must not silently revert to
            // defaults: the operator's overrides would be ignored.
            Err(err) => return Err(ConfigError::Io(err)),
        };

        let mut core_fields = defaults.core_fields;
        let mut session_fields = defaults.session_fields;
        let mut token_pattern = defaults.token_pattern;
        let mut api_timeout_secs = defaults.api_timeout_secs;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!(line, "skipping malformed config line");
                continue;
            };
            match key.trim() {
                "core_fields" => core_fields = split_field_list(value),
                "session_fields" => session_fields = split_field_list(value),
                "token_pattern" => token_pattern = value.trim().to_string(),
                "api_timeout" => match value.trim().parse::<u64>() {
                    Ok(secs) => api_timeout_secs = secs,
                    Err(_) => warn!(value, "ignoring non-numeric api_timeout"),
                },
                other => debug!(key = other, "ignoring unknown config key"),
            }
        }

        let rule = Self::new(core_fields, session_fields, token_pattern, api_timeout_secs)?;
        debug!(path = %path.display(), "loaded config file");
        Ok(rule)
    }

    /// Writes the rule back out in the same flat `key=value` format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on write failure.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut out = String::new();
        out.push_str(&format!("core_fields={}\n", self.core_fields.join(", ")));
        out.push_str(&format!(
            "session_fields={}\n",
            self.session_fields.join(", ")
        ));
        out.push_str(&format!("token_pattern={}\n", self.token_pattern));
        out.push_str(&format!("api_timeout={}\n", self.api_timeout_secs));
        fs::write(path, out)?;
        debug!(path = %path.display(), "saved config file");
        Ok(())
    }
}

/// Splits a comma-separated field list, dropping empty entries.
fn split_field_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn trim_fields(fields: Vec<String>) -> Vec<String> {
    fields
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}
