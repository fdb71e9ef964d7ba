//! Verify command: validate a cookie and discover the token.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use mp_scout::config::ValidationRule;
use mp_scout::search::Scout;

use crate::cli::AuthArgs;

use super::credential_source;

pub async fn run_verify_command(config_path: &Path, auth: &AuthArgs) -> Result<()> {
    let rule = ValidationRule::load(config_path).context("failed to load configuration")?;
    let mut scout = Scout::new(rule);

    let source = credential_source(auth);
    let token = scout
        .authenticate(source.as_ref(), auth.token.as_deref())
        .await
        .context("authentication failed")?;

    info!(token, "session verified");
    Ok(())
}
