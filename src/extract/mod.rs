//! Heuristic extraction of embedded cross-references from article markup.
//!
//! Article pages reference mini-programs and cross-app targets in two ways:
//! hyperlink attributes carrying a discriminating marker substring, and
//! inline script blocks embedding fully-qualified URLs. [`extract_links`]
//! runs both passes and unions the results into a value-deduplicated set.
//! It is a pure function of its input: no I/O, no state, same answer for
//! the same document every time.
//!
//! Extraction is supplementary enrichment. Callers that fetch documents
//! treat any failure as an empty result, never a fault.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Host given to scheme-less candidate values.
const CANONICAL_BASE: &str = "https://mp.weixin.qq.com";

/// Marker substrings that make a hyperlink value a candidate.
const LINK_MARKERS: [&str; 4] = ["miniprogram", "wxurl", "weapp", "appmsg"];

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)href\s*=\s*["']([^"']+)["']"#)
});

static SCRIPT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?is)<script[^>]*>(.*?)</script>")
});

/// URL-shaped patterns applied to inline script text. Both require a full
/// scheme, so matches need no relative-URL handling.
static SCRIPT_URL_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile_static_regex(r#"https?://[^\s"']+?miniprogram[^\s"']*"#),
        compile_static_regex(r#"https?://[^\s"']+?weixin\.qq\.com/[^\s"']+?appid[^\s"']*"#),
    ]
});

fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Extracts embedded cross-reference links from a document body.
///
/// Two passes, unioned and deduplicated:
/// 1. hyperlink attributes whose value contains a marker substring,
///    normalized to absolute URLs;
/// 2. inline script text scanned with permissive URL-shaped patterns.
#[must_use]
pub fn extract_links(body: &str) -> BTreeSet<String> {
    let mut links = BTreeSet::new();

    for caps in HREF_RE.captures_iter(body) {
        if let Some(href) = caps.get(1) {
            let href = href.as_str();
            if LINK_MARKERS.iter().any(|marker| href.contains(marker)) {
                links.insert(normalize(href));
            }
        }
    }

    for block in SCRIPT_BLOCK_RE.captures_iter(body) {
        if let Some(script) = block.get(1) {
            for pattern in SCRIPT_URL_RES.iter() {
                for m in pattern.find_iter(script.as_str()) {
                    links.insert(m.as_str().to_string());
                }
            }
        }
    }

    links
}

/// Normalizes a candidate attribute value to an absolute URL.
///
/// `//host/...` gains the `https:` scheme; a value with no scheme is treated
/// as path-relative to the canonical host; absolute values pass unchanged.
fn normalize(href: &str) -> String {
    if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{CANONICAL_BASE}{href}")
    }
}
