use anyhow::{Context, Result};
use clap::Parser;
use hawk_common::observability::init_logging;
use hawk_config::HawkConfigLoader;
use hawk_drivers::webdriver::WebDriverSession;
use hawk_portals::answers::ProfileAnswers;
use hawk_portals::orchestrator::Orchestrator;
use hawk_portals::{Portal, PortalSettings, get_job_portal};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    if args.list_portals {
        for portal in Portal::ALL {
            println!("{portal}");
        }
        return Ok(());
    }

    // 1) Load config (env wins over file, flags win over both)
    let mut cfg = HawkConfigLoader::new()
        .with_optional_file(&args.config)
        .load()
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    args.apply(&mut cfg);
    cfg.validate().context("invalid configuration")?;

    let log_path = init_logging(cfg.logging.to_log_config("jobhawk"))?;
    info!(log = %log_path.display(), portal = %cfg.portal, "jobhawk starting");

    // 2) Stop on Ctrl-C or when the run budget is spent
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; finishing current step");
                cancel.cancel();
            }
        });
    }
    if let Some(secs) = cfg.policy.run_timeout_secs {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    warn!(secs, "run timeout reached");
                    cancel.cancel();
                }
            }
        });
    }

    // 3) Browser session and portal binding
    let session = Arc::new(WebDriverSession::connect(&cfg.browser).await?);
    let answers = Arc::new(ProfileAnswers::from_config(&cfg));
    let settings = PortalSettings::from_config(&cfg, answers);
    let binding = get_job_portal(&cfg.portal, session.clone(), settings)
        .with_context(|| format!("resolving portal `{}`", cfg.portal))?;

    let orchestrator = Orchestrator::new(
        binding,
        cfg.search.clone(),
        cfg.policy.clone(),
        cancel.clone(),
    );
    let result = orchestrator.run().await;
    drop(orchestrator);
    cancel.cancel();

    match Arc::try_unwrap(session) {
        Ok(session) => {
            if let Err(err) = session.close().await {
                warn!(error = %err, "closing browser session failed");
            }
        }
        Err(_) => warn!("browser session still in use; leaving it open"),
    }

    let summary = result?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
