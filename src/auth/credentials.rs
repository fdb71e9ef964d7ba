//! Raw cookie-string parsing into a credential set.
//!
//! The platform session arrives as a browser-style `name=value; name=value`
//! string. Parsing is deliberately lenient: malformed segments are skipped
//! with a warning, never abort the whole parse, because browser exports
//! routinely carry stray separators and empty segments.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

/// A parsed set of session cookies, keyed by cookie name.
///
/// Values are sensitive; the `Debug` impl redacts them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    entries: BTreeMap<String, String>,
}

impl CredentialSet {
    /// Parses a raw `name=value; name=value` cookie string.
    ///
    /// Segments without an `=`, or with an empty name, are dropped (the
    /// parse itself never fails). The first `=` in a segment splits name
    /// from value, so values containing `=` survive intact.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut entries = BTreeMap::new();
        let mut skipped = 0usize;

        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => {
                    entries.insert(name.trim().to_string(), value.trim().to_string());
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "dropped malformed cookie segments");
        }
        debug!(cookies = entries.len(), "parsed credential set");

        Self { entries }
    }

    /// Whether a cookie of the given name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of cookies in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cookie names in the set, in deterministic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Renders the set as a `Cookie` request-header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// Cookie values must never reach logs.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}
