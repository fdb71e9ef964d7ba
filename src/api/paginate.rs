//! Bounded pagination with partial-result salvage.
//!
//! List endpoints page in fixed-size batches with a server-supplied
//! `has_more` flag. [`collect`] drives the page loop and owns the retry
//! policy: a first-page failure means there is nothing to salvage and the
//! error propagates; a later-page failure is downgraded to a cooldown, one
//! retry of the same page index, then whatever accumulated is returned. A caller
//! who already retrieved several pages must not lose that work to one
//! transient failure.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// One batch from a list endpoint.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Records in this batch.
    pub records: Vec<T>,
    /// Whether the server indicates more pages remain.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub fn new(records: Vec<T>, has_more: bool) -> Self {
        Self { records, has_more }
    }
}

/// Collects records by calling `fetch` for pages `0..max_pages`.
///
/// Termination: an empty batch is a natural end, `has_more == false` stops
/// the loop, and the page cap bounds the whole walk. The cooldown should be
/// longer than the normal inter-request delay so a transient rate limit has
/// time to clear before the single retry.
///
/// # Errors
///
/// Propagates the fetch error only when page 0 fails; later failures
/// degrade to a partial result.
pub async fn collect<T, E, F, Fut>(
    mut fetch: F,
    max_pages: u32,
    cooldown: Duration,
) -> Result<Vec<T>, E>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut records = Vec::new();
    let mut page = 0u32;
    let mut retried_page = None;

    while page < max_pages {
        match fetch(page).await {
            Ok(batch) => {
                if batch.records.is_empty() {
                    debug!(page, "empty batch, listing exhausted");
                    break;
                }
                records.extend(batch.records);
                debug!(page, total = records.len(), "collected page");
                if !batch.has_more {
                    break;
                }
                page += 1;
            }
            Err(err) if page == 0 => {
                // No usable partial result yet.
                return Err(err);
            }
            Err(err) => {
                if retried_page == Some(page) {
                    warn!(page, error = %err, "page failed twice, keeping partial result");
                    break;
                }
                warn!(
                    page,
                    cooldown_ms = cooldown.as_millis(),
                    error = %err,
                    "page failed, cooling down before one retry"
                );
                retried_page = Some(page);
                tokio::time::sleep(cooldown).await;
            }
        }
    }

    Ok(records)
}
