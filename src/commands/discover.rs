//! Discovery commands: account+article discovery and mini-program search.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use mp_scout::api::AccountType;
use mp_scout::config::ValidationRule;
use mp_scout::export;
use mp_scout::search::{CancelFlag, Scout};

use crate::cli::{ArticlesArgs, MiniprogramsArgs};

use super::{LogObserver, credential_source};

pub async fn run_articles_command(config_path: &Path, args: &ArticlesArgs) -> Result<()> {
    let mut scout = authenticated_scout(config_path, args).await?;
    scout.set_request_delay_secs(args.delay);

    let cancel = spawn_ctrl_c_handler();
    let records = scout
        .discover_articles(
            &args.keyword,
            AccountType::from_name(&args.account_type),
            args.account,
            args.max_pages,
            &LogObserver,
            &cancel,
        )
        .await
        .context("article discovery failed")?;

    if records.is_empty() {
        info!(keyword = %args.keyword, "no articles found");
        return Ok(());
    }

    let with_links = records.iter().filter(|r| !r.links.is_empty()).count();
    info!(
        articles = records.len(),
        with_links,
        "discovery complete"
    );

    let path = output_path(args.output.clone(), "mp_scout_articles");
    export::write_articles_csv(&path, &records).context("CSV export failed")?;
    Ok(())
}

pub async fn run_miniprograms_command(config_path: &Path, args: &MiniprogramsArgs) -> Result<()> {
    let rule = ValidationRule::load(config_path).context("failed to load configuration")?;
    let mut scout = Scout::new(rule);
    let source = credential_source(&args.auth);
    scout
        .authenticate(source.as_ref(), args.auth.token.as_deref())
        .await
        .context("authentication failed")?;
    scout.set_request_delay_secs(args.delay);

    let cancel = spawn_ctrl_c_handler();
    let records = scout
        .discover_miniprograms(&args.keyword, &LogObserver, &cancel)
        .await
        .context("mini-program discovery failed")?;

    if records.is_empty() {
        info!(keyword = %args.keyword, "no mini-programs found");
        return Ok(());
    }

    info!(mini_programs = records.len(), "discovery complete");

    let path = output_path(args.output.clone(), "mp_scout_miniprograms");
    export::write_miniprograms_csv(&path, &records).context("CSV export failed")?;
    Ok(())
}

async fn authenticated_scout(config_path: &Path, args: &ArticlesArgs) -> Result<Scout> {
    let rule = ValidationRule::load(config_path).context("failed to load configuration")?;
    let mut scout = Scout::new(rule);
    let source = credential_source(&args.auth);
    scout
        .authenticate(source.as_ref(), args.auth.token.as_deref())
        .await
        .context("authentication failed")?;
    Ok(scout)
}

/// Ctrl-C requests cooperative cancellation; the in-flight request finishes
/// and accumulated results are still exported.
fn spawn_ctrl_c_handler() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight request");
            flag.cancel();
        }
    });
    cancel
}

fn output_path(explicit: Option<PathBuf>, prefix: &str) -> PathBuf {
    explicit.unwrap_or_else(|| PathBuf::from(export::default_export_filename(prefix)))
}
