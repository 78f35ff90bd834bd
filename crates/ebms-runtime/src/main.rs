//! # ebMS Core
//!
//! Builds the processing core from configuration, loads the P-Modes and
//! reports what is in effect. Log output is controlled by `EBMS_LOG`
//! (default `info`).

use anyhow::{Context, Result};
use ebms_01_pmodes::PModeManagementApi;
use ebms_runtime::{load_pmodes, Core, CoreConfig};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("EBMS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = CoreConfig::load().context("Failed to load configuration")?;
    let core = Core::build(&config).context("Invalid configuration")?;

    match &config.pmodes.directory {
        Some(directory) => {
            let summary = load_pmodes(&*core.pmode_manager, directory)
                .context("Failed to load P-Modes")?;
            for (path, reason) in &summary.failed {
                warn!(path = %path.display(), %reason, "P-Mode not loaded");
            }
        }
        None => warn!("No P-Mode directory configured, starting without P-Modes"),
    }

    info!(
        host_id = %config.host_id.0,
        pmodes = core.pmode_manager.get_all().len(),
        "ebMS core ready"
    );
    Ok(())
}
