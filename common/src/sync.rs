use anyhow::{bail, Result};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use tracing::{info, warn};

use crate::store::LastTimestampSource;

/// Lookback windows tried in order when asking the store where to resume.
/// The short window covers the daily-run happy path; the long one catches
/// up after outages.
pub const LOOKBACKS: &[&str] = &["1d", "30d"];

/// Resolve the start of the sync window: explicit argument if given, else
/// the newest ingested timestamp found in the store, else the start of the
/// current month.
pub async fn resolve_start<S: LastTimestampSource>(
    store: &S,
    metric: &str,
    explicit: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    if let Some(start) = explicit {
        return Ok(start);
    }

    for lookback in LOOKBACKS {
        if let Some(ts) = store.last_timestamp(metric, lookback).await? {
            info!("Resuming from last ingested sample '{ts}' (lookback {lookback})");
            return Ok(ts);
        }
    }

    warn!("Query to get last metric timestamp returned nothing, using current month start..");
    Ok(start_of_month(now))
}

/// Resolve the full sync window. Fails if the resolved end precedes the
/// resolved start, which means the store holds a sample from the future.
pub async fn resolve_window<S: LastTimestampSource>(
    store: &S,
    metric: &str,
    explicit_start: Option<DateTime<Utc>>,
    explicit_end: Option<DateTime<Utc>>,
    end_grace: Duration,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let end = explicit_end.unwrap_or(now + end_grace);
    let start = resolve_start(store, metric, explicit_start, now).await?;

    if end < start {
        bail!(
            "resolved end '{end}' precedes start '{start}', the store has a future value in it"
        );
    }

    Ok((start, end))
}

pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .expect("UTC has no ambiguous wall times")
}

/// CLI timestamp parser shared by the binaries: RFC 3339, or a plain date
/// taken as UTC midnight.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    match s.parse::<chrono::NaiveDate>() {
        Ok(date) => Ok(date.and_hms_opt(0, 0, 0).expect("midnight exists").and_utc()),
        Err(_) => Err(format!("'{s}' is not an RFC 3339 timestamp or a date")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;

    /// Fake store answering per-lookback and recording the order queries
    /// arrive in.
    struct FakeStore {
        short: Option<DateTime<Utc>>,
        long: Option<DateTime<Utc>>,
        queried: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn new(short: Option<DateTime<Utc>>, long: Option<DateTime<Utc>>) -> Self {
            Self {
                short,
                long,
                queried: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LastTimestampSource for FakeStore {
        async fn last_timestamp(
            &self,
            _metric: &str,
            lookback: &str,
        ) -> Result<Option<DateTime<Utc>>> {
            self.queried.lock().unwrap().push(lookback.to_string());
            match lookback {
                "1d" => Ok(self.short),
                "30d" => Ok(self.long),
                other => bail!("unexpected lookback '{other}'"),
            }
        }
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn explicit_start_skips_the_store() {
        let store = FakeStore::new(None, None);
        let explicit = utc(2022, 12, 1, 0);

        let start = resolve_start(&store, "price_electricity", Some(explicit), utc(2022, 12, 24, 12))
            .await
            .unwrap();

        assert_eq!(start, explicit);
        assert!(store.queried.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_lookback_wins_when_it_has_data() {
        let store = FakeStore::new(Some(utc(2022, 12, 24, 0)), Some(utc(2022, 12, 1, 0)));

        let start = resolve_start(&store, "price_electricity", None, utc(2022, 12, 24, 12))
            .await
            .unwrap();

        assert_eq!(start, utc(2022, 12, 24, 0));
        assert_eq!(*store.queried.lock().unwrap(), vec!["1d"]);
    }

    #[tokio::test]
    async fn falls_back_to_long_lookback() {
        let store = FakeStore::new(None, Some(utc(2022, 12, 1, 0)));

        let start = resolve_start(&store, "price_electricity", None, utc(2022, 12, 24, 12))
            .await
            .unwrap();

        assert_eq!(start, utc(2022, 12, 1, 0));
        assert_eq!(*store.queried.lock().unwrap(), vec!["1d", "30d"]);
    }

    #[tokio::test]
    async fn empty_store_falls_back_to_month_start() {
        let store = FakeStore::new(None, None);

        let start = resolve_start(&store, "price_electricity", None, utc(2022, 12, 24, 12))
            .await
            .unwrap();

        assert_eq!(start, utc(2022, 12, 1, 0));
    }

    #[tokio::test]
    async fn window_end_defaults_to_now_plus_grace() {
        let store = FakeStore::new(Some(utc(2022, 12, 24, 0)), None);
        let now = utc(2022, 12, 24, 12);

        let (start, end) =
            resolve_window(&store, "price_electricity", None, None, Duration::hours(24), now)
                .await
                .unwrap();

        assert_eq!(start, utc(2022, 12, 24, 0));
        assert_eq!(end, utc(2022, 12, 25, 12));
    }

    #[test]
    fn timestamp_parses_rfc3339() {
        let ts = parse_timestamp("2022-12-01T06:30:00Z").unwrap();
        assert_eq!(ts.timestamp(), 1669876200);
    }

    #[test]
    fn timestamp_parses_plain_date_as_utc_midnight() {
        let ts = parse_timestamp("2022-12-01").unwrap();
        assert_eq!(ts.timestamp(), 1669852800);
    }

    #[test]
    fn timestamp_rejects_garbage() {
        assert!(parse_timestamp("next tuesday").is_err());
    }

    #[tokio::test]
    async fn future_store_timestamp_aborts() {
        // Store claims a sample two days past the end of the window.
        let store = FakeStore::new(Some(utc(2022, 12, 27, 0)), None);
        let now = utc(2022, 12, 24, 12);

        let result =
            resolve_window(&store, "price_electricity", None, None, Duration::hours(24), now)
                .await;

        assert!(result.is_err());
    }
}
