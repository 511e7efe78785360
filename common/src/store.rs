use std::fs;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Certificate, Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::models::TimeSeries;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query for '{metric}' failed with status {status}: {body}")]
    QueryFailed {
        metric: String,
        status: StatusCode,
        body: String,
    },
    #[error("unexpected scalar value in query result: {0}")]
    BadScalar(serde_json::Value),
    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(f64),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

// Instant-vector query response: data.result[0].value is
// [<eval time>, "<scalar>"].
#[derive(Debug, Deserialize)]
struct QueryResponse {
    data: QueryData,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    result: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    value: (serde_json::Value, serde_json::Value),
}

/// Promscale exposes scalars as strings, but be lenient and take plain
/// numbers too. Non-finite values ("NaN", "+Inf") are rejected; cast to an
/// epoch they would resolve to 1970 and trigger a massive backfill.
fn parse_scalar(value: &serde_json::Value) -> Result<f64, StoreError> {
    let scalar = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    };
    scalar
        .filter(|f| f.is_finite())
        .ok_or_else(|| StoreError::BadScalar(value.clone()))
}

/// Client for the time-series store's write and query endpoints.
pub struct StoreClient {
    http: Client,
    write_url: String,
    query_url: String,
    credentials: Option<(String, String)>,
}

impl StoreClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        match &config.cert_path {
            Some(path) => {
                let pem = fs::read(path)
                    .with_context(|| format!("reading certificate '{}'", path.display()))?;
                let cert = Certificate::from_pem(&pem)
                    .with_context(|| format!("parsing certificate '{}'", path.display()))?;
                builder = builder.add_root_certificate(cert);
            }
            None => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        Ok(Self {
            http: builder.build().context("building HTTP client")?,
            write_url: config.write_url.clone(),
            query_url: config.query_url.clone(),
            credentials: config.credentials.clone(),
        })
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }

    /// Newest ingested timestamp of `metric` within `lookback`, if any.
    pub async fn last_timestamp(
        &self,
        metric: &str,
        lookback: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let query = format!("max_over_time(timestamp({metric})[{lookback}:])");
        let res = self
            .with_auth(self.http.get(&self.query_url))
            .query(&[("query", query.as_str())])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(StoreError::QueryFailed {
                metric: metric.to_string(),
                status,
                body: res.text().await.unwrap_or_default(),
            });
        }

        let response: QueryResponse = res.json().await?;
        debug!("Query result from getting last timestamp: {:?}", response.data.result);

        let Some(first) = response.data.result.first() else {
            return Ok(None);
        };
        let seconds = parse_scalar(&first.value.1)?;
        let ts = DateTime::from_timestamp(seconds as i64, 0)
            .ok_or(StoreError::TimestampOutOfRange(seconds))?;

        Ok(Some(ts))
    }

    /// Ship one assembled series. Non-2xx responses are logged, not raised;
    /// only transport failures bubble up.
    pub async fn write(&self, series: &TimeSeries) -> Result<(), StoreError> {
        let res = self
            .with_auth(self.http.post(&self.write_url))
            .json(series)
            .send()
            .await?;

        if res.status().is_success() {
            info!("Successfully ingested {} samples", series.len());
        } else {
            error!("Unable to ingest samples, got '{}'", res.status());
        }

        Ok(())
    }
}

/// Where "resume from the newest ingested sample" lookups come from, so the
/// sync resolver can be exercised without a live store.
#[async_trait]
pub trait LastTimestampSource {
    async fn last_timestamp(
        &self,
        metric: &str,
        lookback: &str,
    ) -> Result<Option<DateTime<Utc>>>;
}

#[async_trait]
impl LastTimestampSource for StoreClient {
    async fn last_timestamp(
        &self,
        metric: &str,
        lookback: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(StoreClient::last_timestamp(self, metric, lookback).await?)
    }
}
