use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Datelike, NaiveDate};
use reqwest::StatusCode;
use tracing::warn;

use crate::models::{PriceRecord, PriceSample};

/// Day-keyed price endpoint, e.g. `{base}/2022/12-01_NO1.json`.
pub fn price_url(base_url: &str, date: NaiveDate, price_area: &str) -> String {
    format!(
        "{}/{}/{:02}-{:02}_{}.json",
        base_url.trim_end_matches('/'),
        date.year(),
        date.month(),
        date.day(),
        price_area
    )
}

/// Fetch one day of spot prices. A 404 means the day is not published yet
/// and contributes zero records; any other failure is an error for the
/// caller to log and skip.
pub async fn fetch_day(
    client: &reqwest::Client,
    base_url: &str,
    price_area: &str,
    date: NaiveDate,
) -> Result<Vec<PriceRecord>> {
    let url = price_url(base_url, date, price_area);

    let res = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("requesting '{url}'"))?;

    if res.status() == StatusCode::NOT_FOUND {
        warn!("Data for '{date}' is not ready yet");
        return Ok(Vec::new());
    }
    if !res.status().is_success() {
        return Err(anyhow!("got '{}' from '{}'", res.status(), url));
    }

    let records = res
        .json()
        .await
        .with_context(|| format!("decoding response from '{url}'"))?;

    Ok(records)
}

/// Convert a raw record into a sample: epoch milliseconds plus the NOK
/// price carried through unchanged.
pub fn to_sample(record: &PriceRecord) -> Result<PriceSample> {
    let start = DateTime::parse_from_rfc3339(&record.time_start)
        .with_context(|| format!("parsing time_start '{}'", record.time_start))?;

    Ok(PriceSample {
        timestamp_ms: 1000 * start.timestamp(),
        value: record.nok_per_kwh,
    })
}

pub fn to_samples(records: &[PriceRecord]) -> Result<Vec<PriceSample>> {
    records.iter().map(to_sample).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_zero_pads_month_and_day() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        assert_eq!(
            price_url("https://www.hvakosterstrommen.no/api/v1/prices", date, "NO1"),
            "https://www.hvakosterstrommen.no/api/v1/prices/2023/01-05_NO1.json"
        );
    }

    #[test]
    fn url_tolerates_trailing_slash_in_base() {
        let date = NaiveDate::from_ymd_opt(2022, 12, 24).unwrap();
        assert_eq!(
            price_url("http://localhost:8080/prices/", date, "NO5"),
            "http://localhost:8080/prices/2022/12-24_NO5.json"
        );
    }

    #[test]
    fn samples_carry_epoch_millis_and_raw_price() {
        let records = vec![
            PriceRecord {
                time_start: "2022-12-01T00:00:00Z".to_string(),
                nok_per_kwh: 1.23,
            },
            PriceRecord {
                time_start: "2022-12-01T01:00:00Z".to_string(),
                nok_per_kwh: 1.45,
            },
        ];

        let samples = to_samples(&records).unwrap();
        assert_eq!(
            samples,
            vec![
                PriceSample {
                    timestamp_ms: 1669852800000,
                    value: 1.23
                },
                PriceSample {
                    timestamp_ms: 1669856400000,
                    value: 1.45
                },
            ]
        );
    }

    #[test]
    fn sample_respects_local_offset() {
        // Midnight Oslo time is 23:00 UTC the evening before.
        let record = PriceRecord {
            time_start: "2022-12-01T00:00:00+01:00".to_string(),
            nok_per_kwh: 0.5,
        };
        assert_eq!(to_sample(&record).unwrap().timestamp_ms, 1669849200000);
    }

    #[test]
    fn unparseable_time_start_is_an_error() {
        let record = PriceRecord {
            time_start: "yesterday-ish".to_string(),
            nok_per_kwh: 0.5,
        };
        assert!(to_sample(&record).is_err());
    }
}
