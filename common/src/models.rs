use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

/// One raw record from the price API. The API also reports the EUR price,
/// the exchange rate and the end time, none of which we carry.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRecord {
    /// ISO-8601 start of the hour this price applies to, with local offset.
    pub time_start: String,
    #[serde(rename = "NOK_per_kWh")]
    pub nok_per_kwh: f64,
}

/// A single ingestable point. Serializes as `[timestampMs, value]`, which
/// is the shape the store's write endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl Serialize for PriceSample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.timestamp_ms, self.value).serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesLabels {
    #[serde(rename = "__name__")]
    pub name: String,
    pub area: String,
}

/// One series assembled per sync run and shipped wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    pub labels: SeriesLabels,
    pub samples: Vec<PriceSample>,
}

impl TimeSeries {
    pub fn new(metric: &str, price_area: &str, samples: Vec<PriceSample>) -> Self {
        Self {
            labels: SeriesLabels {
                name: metric.to_string(),
                area: price_area.to_string(),
            },
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Inclusive day range covered by one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyncRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            bail!("range end '{end}' precedes start '{start}'");
        }
        Ok(Self { start, end })
    }

    /// Calendar days in ascending order, both endpoints included.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |d| d.succ_opt()).take_while(move |d| *d <= end)
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}
