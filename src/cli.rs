//! CLI argument definitions using clap derive macros.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default flat config file, kept beside the working directory like the
/// results it produces.
pub const DEFAULT_CONFIG_FILE: &str = "mp-scout.ini";

/// Search official accounts and extract mini-program references.
///
/// mp-scout authenticates against the platform web API with a session
/// cookie, discovers accounts, articles, and mini-programs, and exports
/// the results as CSV.
#[derive(Parser, Debug)]
#[command(name = "mp-scout")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the validation-rule config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a session cookie and discover the authorization token
    Verify(AuthArgs),

    /// Search accounts by keyword, list articles, and extract embedded links
    Articles(ArticlesArgs),

    /// Search mini-programs by keyword
    Miniprograms(MiniprogramsArgs),

    /// Inspect or update the validation-rule configuration
    Config(ConfigArgs),
}

/// Where the session cookie comes from. Omit both flags to pipe it via stdin.
#[derive(Args, Clone)]
pub struct AuthArgs {
    /// Raw cookie string (name=value; name=value)
    #[arg(long, conflicts_with = "cookie_file")]
    pub cookie: Option<String>,

    /// File containing the raw cookie string
    #[arg(long)]
    pub cookie_file: Option<PathBuf>,

    /// Authorization token (skips automatic discovery)
    #[arg(long)]
    pub token: Option<String>,
}

// Cookie and token values are live session credentials; they must never
// reach the log stream through a derived Debug.
impl fmt::Debug for AuthArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthArgs")
            .field("cookie", &self.cookie.as_ref().map(|_| "[REDACTED]"))
            .field("cookie_file", &self.cookie_file)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Args, Debug)]
pub struct ArticlesArgs {
    /// Account search keyword
    pub keyword: String,

    #[command(flatten)]
    pub auth: AuthArgs,

    /// Account type filter: all, official, service, subscription
    #[arg(long = "type", default_value = "all")]
    pub account_type: String,

    /// Which search candidate to use (0-based)
    #[arg(long, default_value_t = 0)]
    pub account: usize,

    /// Maximum listing pages to fetch (1-20)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_pages: u32,

    /// Request delay in seconds (1-5)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=5))]
    pub delay: u64,

    /// CSV output path (default: timestamped file in the working directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MiniprogramsArgs {
    /// Mini-program search keyword
    pub keyword: String,

    #[command(flatten)]
    pub auth: AuthArgs,

    /// Request delay in seconds (1-5)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=5))]
    pub delay: u64,

    /// CSV output path (default: timestamped file in the working directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,

    /// Update one or more rule fields
    Set {
        /// Comma-separated mandatory cookie fields
        #[arg(long)]
        core_fields: Option<String>,

        /// Comma-separated session cookie fields (any-of)
        #[arg(long)]
        session_fields: Option<String>,

        /// Token extraction regex (one capture group)
        #[arg(long)]
        token_pattern: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        api_timeout: Option<u64>,
    },

    /// Restore the default configuration
    Reset,
}
