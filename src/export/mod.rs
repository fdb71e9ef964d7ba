//! CSV export of discovery results.
//!
//! The output targets spreadsheet tools, which on the consuming side expect
//! UTF-8 *with* a byte-order mark (plain UTF-8 gets mis-sniffed). The header
//! row is flavored per record type, and multi-valued link fields are
//! newline-joined inside a single quoted cell.
//!
//! No crate in this project's dependency set covers CSV, so the quoting is
//! a small local RFC-4180 routine.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::info;

use crate::api::{ArticleRecord, MiniProgramRecord};

/// UTF-8 byte-order mark expected by spreadsheet imports.
const BOM: &str = "\u{feff}";

const ARTICLE_HEADER: [&str; 5] = ["title", "account", "published", "link", "mini_links"];
const MINIPROGRAM_HEADER: [&str; 4] = ["name", "appid", "description", "link"];

/// Errors while writing an export file.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There is nothing to export.
    #[error("no records to export")]
    Empty,

    /// Filesystem failure.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Target path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Writes article records to a CSV file.
///
/// # Errors
///
/// Returns [`ExportError::Empty`] for an empty slice, [`ExportError::Io`]
/// on write failure.
pub fn write_articles_csv(path: &Path, records: &[ArticleRecord]) -> Result<(), ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }
    write_file(path, &render_articles_csv(records))
}

/// Writes mini-program records to a CSV file.
///
/// # Errors
///
/// Returns [`ExportError::Empty`] for an empty slice, [`ExportError::Io`]
/// on write failure.
pub fn write_miniprograms_csv(
    path: &Path,
    records: &[MiniProgramRecord],
) -> Result<(), ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }
    write_file(path, &render_miniprograms_csv(records))
}

/// Renders article records as CSV text (BOM included).
#[must_use]
pub fn render_articles_csv(records: &[ArticleRecord]) -> String {
    let mut out = String::from(BOM);
    push_row(&mut out, ARTICLE_HEADER.iter().copied());
    for record in records {
        let links = record.links.iter().cloned().collect::<Vec<_>>().join("\n");
        push_row(
            &mut out,
            [
                record.title.as_str(),
                record.account.as_str(),
                &format_timestamp(record.published_at),
                record.link.as_str(),
                links.as_str(),
            ]
            .into_iter(),
        );
    }
    out
}

/// Renders mini-program records as CSV text (BOM included).
#[must_use]
pub fn render_miniprograms_csv(records: &[MiniProgramRecord]) -> String {
    let mut out = String::from(BOM);
    push_row(&mut out, MINIPROGRAM_HEADER.iter().copied());
    for record in records {
        push_row(
            &mut out,
            [
                record.name.as_str(),
                record.appid.as_str(),
                record.description.as_str(),
                record.deep_link.as_str(),
            ]
            .into_iter(),
        );
    }
    out
}

/// Default export filename carrying a local timestamp.
#[must_use]
pub fn default_export_filename(prefix: &str) -> String {
    format!("{prefix}_{}.csv", Local::now().format("%Y%m%d_%H%M%S"))
}

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "exported results");
    Ok(())
}

/// Formats a Unix timestamp as local `YYYY-MM-DD HH:MM`.
fn format_timestamp(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_default()
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let row = fields.map(escape_field).collect::<Vec<_>>().join(",");
    out.push_str(&row);
    out.push_str("\r\n");
}

/// RFC-4180 quoting: quote when the field carries a comma, quote, or line
/// break; embedded quotes double.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
