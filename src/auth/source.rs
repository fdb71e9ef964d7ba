//! Where raw cookie strings come from.
//!
//! Browser-profile extraction is an external collaborator; the core only
//! requires something that can produce a raw cookie string or fail. The CLI
//! plugs in a literal argument, a file, or stdin.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain a raw cookie string.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The source produced nothing usable.
    #[error("no cookie data available from {source_name}")]
    Empty {
        /// Human-readable source description.
        source_name: String,
    },

    /// I/O failure reading the source.
    #[error("failed to read cookie source: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies a raw cookie string on demand.
pub trait CredentialSource {
    /// Produces the raw `name=value; ...` cookie string.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when nothing usable can be produced.
    fn raw_cookie(&self) -> Result<String, CredentialError>;
}

/// A cookie string supplied directly (CLI argument, test fixture).
#[derive(Debug, Clone)]
pub struct LiteralCookie(pub String);

impl CredentialSource for LiteralCookie {
    fn raw_cookie(&self) -> Result<String, CredentialError> {
        if self.0.trim().is_empty() {
            return Err(CredentialError::Empty {
                source_name: "literal argument".to_string(),
            });
        }
        Ok(self.0.clone())
    }
}

/// A cookie string stored in a text file.
#[derive(Debug, Clone)]
pub struct CookieFile(pub PathBuf);

impl CredentialSource for CookieFile {
    fn raw_cookie(&self) -> Result<String, CredentialError> {
        let contents = fs::read_to_string(&self.0)?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty {
                source_name: format!("file {}", self.0.display()),
            });
        }
        Ok(trimmed.to_string())
    }
}

/// A cookie string piped through stdin.
#[derive(Debug, Clone, Copy)]
pub struct StdinCookie;

impl CredentialSource for StdinCookie {
    fn raw_cookie(&self) -> Result<String, CredentialError> {
        if io::stdin().is_terminal() {
            return Err(CredentialError::Empty {
                source_name: "stdin (terminal attached, nothing piped)".to_string(),
            });
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        let trimmed = buffer.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty {
                source_name: "stdin".to_string(),
            });
        }
        Ok(trimmed.to_string())
    }
}
