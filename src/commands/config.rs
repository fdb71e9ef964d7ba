//! Config command: show, set, and reset the validation rules.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use mp_scout::config::ValidationRule;

use crate::cli::ConfigAction;

pub fn run_config_command(config_path: &Path, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let rule = ValidationRule::load(config_path).context("failed to load configuration")?;
            info!(
                core_fields = rule.core_fields().join(", "),
                session_fields = rule.session_fields().join(", "),
                token_pattern = rule.token_pattern(),
                api_timeout_secs = rule.api_timeout_secs(),
                "active configuration"
            );
        }
        ConfigAction::Set {
            core_fields,
            session_fields,
            token_pattern,
            api_timeout,
        } => {
            let current =
                ValidationRule::load(config_path).context("failed to load configuration")?;

            let core = core_fields
                .as_deref()
                .map_or_else(|| current.core_fields().to_vec(), split_list);
            let session = session_fields
                .as_deref()
                .map_or_else(|| current.session_fields().to_vec(), split_list);
            let pattern = token_pattern
                .clone()
                .unwrap_or_else(|| current.token_pattern().to_string());
            let timeout = api_timeout.unwrap_or_else(|| current.api_timeout_secs());

            let updated = ValidationRule::new(core, session, pattern, timeout)
                .context("rejected configuration update")?;
            updated.save(config_path).context("failed to save configuration")?;
            info!(path = %config_path.display(), "configuration updated");
        }
        ConfigAction::Reset => {
            ValidationRule::default()
                .save(config_path)
                .context("failed to save configuration")?;
            info!(path = %config_path.display(), "configuration reset to defaults");
        }
    }
    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}
