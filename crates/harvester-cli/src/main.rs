use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use harvester_cli::{load_access_token, Config};
use harvester_client::{Credentials, TwitterClient};
use harvester_core::{
    default_config_paths, default_credentials_path, resolve_settings, run_harvest, HarvestError,
    HarvestReport, HarvestRequest, OutputFormat, OutputSink, ShutdownCoordinator, StopReason,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::parse();

    // Setup logging (stderr to keep stdout clean for harvested tweets)
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(config).await {
        match e.downcast_ref::<HarvestError>() {
            Some(harvest_error) => error!("{}", harvest_error.user_message()),
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let settings = resolve_settings(&default_config_paths(), config.config.as_deref())?;
    let app = settings.require_app_credentials()?;
    info!(app = %app.app_name, "Configuration loaded");

    let token_path = config
        .credentials
        .clone()
        .or_else(default_credentials_path)
        .context("Cannot determine the home directory; pass --credentials")?;
    let token = load_access_token(&token_path)?;

    let request = HarvestRequest::select(&config.harvest_options())?;
    let format = OutputFormat::from(config.format);

    let client = TwitterClient::new(Credentials {
        consumer_key: app.consumer_key,
        consumer_secret: app.consumer_secret,
        token: token.token,
        token_secret: token.secret,
    })?;

    let sink = OutputSink::open(&config.outfile)
        .with_context(|| format!("Cannot open output file {}", config.outfile))?;

    let shutdown = ShutdownCoordinator::for_request(&request);
    let report = run_harvest(&client, &request, format, sink, shutdown.token()).await?;

    log_report(&report);
    Ok(())
}

fn log_report(report: &HarvestReport) {
    match report {
        HarvestReport::Batch(summary) => {
            info!(
                "Harvest complete: {} tweets from {} accounts ({} returned fewer than requested)",
                summary.total_records(),
                summary.total_accounts(),
                summary.short_count()
            );
        }
        HarvestReport::Stream(outcome) => {
            if outcome.stop == StopReason::Signal {
                info!("Harvest stopped by Ctrl+C.");
            }
            info!(
                "Harvest complete: {} tweets written, {} skipped",
                outcome.stats.accepted,
                outcome.stats.skipped()
            );
        }
    }
}
