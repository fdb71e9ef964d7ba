//! Authentication: credential parsing, validation, and token discovery.

mod credentials;
mod manager;
mod source;

pub use credentials::CredentialSet;
pub use manager::{AuthError, AuthManager, AuthOutcome};
pub use source::{CookieFile, CredentialError, CredentialSource, LiteralCookie, StdinCookie};
