//! Upstream series payloads and the host-facing series they map to.

use serde::{Deserialize, Serialize};

/// One entry of the `query-series` response's `data` array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesResult {
    #[serde(default)]
    pub elements: Vec<SeriesElement>,
}

/// A single upstream series.
///
/// Bound to a host when `host` is set, otherwise to an aggregate metric.
/// Values are evenly spaced across the result window; upstream sends no
/// per-point timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesElement {
    #[serde(default)]
    pub metric: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<u64>,

    #[serde(default)]
    pub series: Vec<Option<f64>>,
}

impl SeriesElement {
    /// Create an aggregate series for a metric.
    pub fn new(metric: impl Into<String>, series: Vec<Option<f64>>) -> Self {
        Self {
            metric: metric.into(),
            host: None,
            series,
        }
    }

    /// Bind the series to a host id.
    pub fn with_host(mut self, host: u64) -> Self {
        self.host = Some(host);
        self
    }
}

/// A `(value, timestamp_ms)` pair; serializes as `[value, timestamp_ms]`.
pub type Datapoint = (Option<f64>, i64);

/// A labeled series in the host's format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedSeries {
    pub target: String,
    pub datapoints: Vec<Datapoint>,
}

/// The host-facing result of a `query` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub data: Vec<MappedSeries>,
}

impl QueryResponse {
    /// A response carrying no series.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
