use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::config::{Config, METRIC_NAME};
use common::models::{PriceSample, SyncRange, TimeSeries};
use common::prices;
use common::store::StoreClient;
use common::sync::{self, parse_timestamp};

/// Fetch Norwegian electricity spot prices and ship them to the
/// time-series store.
#[derive(Parser)]
#[command(name = "syncer")]
#[command(about = "Sync electricity spot prices into the time-series store")]
struct Args {
    /// Start of the sync window (RFC 3339 or YYYY-MM-DD). Defaults to the
    /// newest sample already in the store.
    #[arg(value_parser = parse_timestamp)]
    start: Option<DateTime<Utc>>,

    /// End of the sync window. Defaults to now plus a grace period.
    #[arg(value_parser = parse_timestamp)]
    end: Option<DateTime<Utc>>,
}

/// One GET per calendar day, in order. Failed days are logged and skipped
/// so a single gap never sinks the whole run.
async fn fetch_range(
    client: &reqwest::Client,
    config: &Config,
    range: SyncRange,
) -> Vec<PriceSample> {
    let mut samples = Vec::new();

    for date in range.days() {
        let day = prices::fetch_day(client, &config.base_url, &config.price_area, date).await;
        match day.and_then(|records| prices::to_samples(&records)) {
            Ok(day_samples) => samples.extend(day_samples),
            Err(e) => error!("Unable to download data for day '{date}': {e:#}"),
        }
    }

    samples
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("STROM_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    match &config.cert_path {
        Some(path) => info!("Using '{}' as store certificate", path.display()),
        None => info!("Will not verify the store certificate"),
    }
    if args.start.is_none() && args.end.is_none() {
        info!("Did not get any timestamps, running from last ingested sample (if any) to now");
    }

    let store = StoreClient::new(&config)?;
    let (start, end) = sync::resolve_window(
        &store,
        METRIC_NAME,
        args.start,
        args.end,
        config.end_grace,
        Utc::now(),
    )
    .await?;
    let range = SyncRange::new(start.date_naive(), end.date_naive())?;

    info!(
        "Fetching electricity prices for '{}' from '{}' to '{}'",
        config.price_area, range.start, range.end
    );

    let client = reqwest::Client::new();
    let samples = fetch_range(&client, &config, range).await;
    let series = TimeSeries::new(METRIC_NAME, &config.price_area, samples);
    info!("Got {} samples", series.len());

    info!("Sending samples to the store");
    store.write(&series).await?;

    Ok(())
}
