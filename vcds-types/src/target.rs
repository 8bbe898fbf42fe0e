//! Query targets and the options a host sends with them.

use serde::{Deserialize, Serialize};

use crate::TimeRange;

/// Default number of data points requested per series.
pub const DEFAULT_MAX_DATA_POINTS: u32 = 500;

/// One user-configured query unit within a panel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTarget {
    /// Host-assigned identifier for the target (e.g. "A").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,

    /// Metric expression. Alternation is written `(a|b)`.
    #[serde(default)]
    pub target: String,

    /// Host filter expression, e.g. `"db1 env=prod"`.
    #[serde(default)]
    pub hosts: String,

    /// Ask upstream to return one series per host.
    ///
    /// Not every API version understands this flag, so it is only sent when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separate_hosts: Option<bool>,

    /// Hidden targets are skipped when querying.
    #[serde(default)]
    pub hide: bool,
}

impl QueryTarget {
    /// Create a target for a metric expression.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Set the host filter expression.
    pub fn hosts(mut self, hosts: impl Into<String>) -> Self {
        self.hosts = hosts.into();
        self
    }

    /// Set the per-host split flag.
    pub fn separate_hosts(mut self, separate: bool) -> Self {
        self.separate_hosts = Some(separate);
        self
    }

    /// Set the reference id.
    pub fn ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    /// Mark the target as hidden.
    pub fn hidden(mut self) -> Self {
        self.hide = true;
        self
    }

    /// A target is queryable when it is visible and names a metric.
    pub fn is_queryable(&self) -> bool {
        !self.hide && !self.target.trim().is_empty()
    }
}

/// Everything the host passes to a single `query` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub range: TimeRange,

    #[serde(default)]
    pub targets: Vec<QueryTarget>,

    /// Point budget per series, used to derive the sample size.
    #[serde(default = "default_max_data_points")]
    pub max_data_points: u32,
}

fn default_max_data_points() -> u32 {
    DEFAULT_MAX_DATA_POINTS
}

impl QueryOptions {
    /// Create options with no targets.
    pub fn new(range: TimeRange) -> Self {
        Self {
            range,
            targets: Vec::new(),
            max_data_points: DEFAULT_MAX_DATA_POINTS,
        }
    }

    /// Add a target.
    pub fn target(mut self, target: QueryTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Set the point budget.
    pub fn max_data_points(mut self, points: u32) -> Self {
        self.max_data_points = points;
        self
    }
}
