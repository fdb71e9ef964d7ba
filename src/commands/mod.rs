//! CLI command handlers.

mod config;
mod discover;
mod verify;

pub use config::run_config_command;
pub use discover::{run_articles_command, run_miniprograms_command};
pub use verify::run_verify_command;

use mp_scout::auth::{CookieFile, CredentialSource, LiteralCookie, StdinCookie};
use mp_scout::search::ProgressObserver;
use tracing::info;

use crate::cli::AuthArgs;

/// Picks the credential source from CLI flags; stdin is the fallback.
pub(crate) fn credential_source(auth: &AuthArgs) -> Box<dyn CredentialSource> {
    if let Some(cookie) = &auth.cookie {
        Box::new(LiteralCookie(cookie.clone()))
    } else if let Some(path) = &auth.cookie_file {
        Box::new(CookieFile(path.clone()))
    } else {
        Box::new(StdinCookie)
    }
}

/// Observer that forwards workflow progress to the log stream.
pub(crate) struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_status(&self, text: &str) {
        info!("{text}");
    }

    fn on_progress(&self, percent: u8) {
        info!(percent, "progress");
    }
}
