use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use common::config::Config;
use common::models::{PriceSample, SyncRange};
use common::prices;
use common::sync::parse_timestamp;

/// Fetch a range of spot prices and print summary statistics instead of
/// shipping them anywhere. Handy for eyeballing an area before syncing it.
#[derive(Parser)]
#[command(name = "summary")]
#[command(about = "Print summary statistics for a range of spot prices")]
struct Args {
    /// First day to fetch (RFC 3339 or YYYY-MM-DD). Defaults to today.
    #[arg(value_parser = parse_timestamp)]
    start: Option<DateTime<Utc>>,

    /// Last day to fetch, inclusive. Defaults to the start day.
    #[arg(value_parser = parse_timestamp)]
    end: Option<DateTime<Utc>>,

    /// Price area override, e.g. NO3. Defaults to the configured area.
    #[arg(long)]
    area: Option<String>,
}

struct Stats {
    count: usize,
    mean: f64,
    min: f64,
    max: f64,
}

fn describe(samples: &[PriceSample]) -> Option<Stats> {
    if samples.is_empty() {
        return None;
    }

    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for sample in samples {
        sum += sample.value;
        min = min.min(sample.value);
        max = max.max(sample.value);
    }

    Some(Stats {
        count: samples.len(),
        mean: sum / samples.len() as f64,
        min,
        max,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("STROM_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    let area = args.area.unwrap_or(config.price_area);

    let start = args
        .start
        .map(|ts| ts.date_naive())
        .unwrap_or_else(|| Utc::now().date_naive());
    let end = args.end.map(|ts| ts.date_naive()).unwrap_or(start);
    let range = SyncRange::new(start, end)?;

    let client = reqwest::Client::new();
    let mut samples = Vec::new();
    for date in range.days() {
        let day = prices::fetch_day(&client, &config.base_url, &area, date).await;
        match day.and_then(|records| prices::to_samples(&records)) {
            Ok(day_samples) => samples.extend(day_samples),
            Err(e) => error!("Unable to download data for day '{date}': {e:#}"),
        }
    }

    match describe(&samples) {
        Some(stats) => {
            println!(
                "{} from {} to {} ({} days)",
                area,
                range.start,
                range.end,
                range.num_days()
            );
            println!("samples: {}", stats.count);
            println!("mean:    {:.4} NOK/kWh", stats.mean);
            println!("min:     {:.4} NOK/kWh", stats.min);
            println!("max:     {:.4} NOK/kWh", stats.max);
        }
        None => println!("No samples for {} between {} and {}", area, range.start, range.end),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(value: f64) -> PriceSample {
        PriceSample {
            timestamp_ms: 0,
            value,
        }
    }

    #[test]
    fn describe_empty_is_none() {
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn describe_computes_mean_min_max() {
        let stats = describe(&[sample(1.0), sample(2.0), sample(3.0)]).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
    }
}
