//! Request parameter derivation for `query-series`.

use serde::Serialize;

use vcds_types::{HostRecord, QueryTarget, TimeRange};

use crate::filter::{test_host, HostFilter};
use crate::sample::calculate_sample_size;
use crate::template::TemplateSrv;

/// Query-string parameters of a `query-series` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    pub from: i64,
    pub until: i64,
    pub samplesize: u32,
    /// Comma-separated host ids.
    pub host: String,
    pub separate_hosts: Option<bool>,
}

impl RequestParams {
    /// Derive parameters for a time range, point budget and host id list.
    pub fn new(range: &TimeRange, max_data_points: u32, host: String) -> Self {
        let from = range.from_epoch();
        let until = range.until_epoch();
        Self {
            from,
            until,
            samplesize: calculate_sample_size(from, until, max_data_points),
            host,
            separate_hosts: None,
        }
    }

    /// Forward the per-host split flag when the target sets one.
    pub fn separate_hosts(mut self, separate: Option<bool>) -> Self {
        self.separate_hosts = separate;
        self
    }

    /// Render as query-string pairs.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("from".to_string(), self.from.to_string()),
            ("until".to_string(), self.until.to_string()),
            ("samplesize".to_string(), self.samplesize.to_string()),
            ("host".to_string(), self.host.clone()),
        ];
        if let Some(separate) = self.separate_hosts {
            query.push(("separateHosts".to_string(), separate.to_string()));
        }
        query
    }
}

/// JSON body of a `query-series` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryBody {
    pub metrics: String,
}

/// Select the targets worth querying.
///
/// Returns `None` when there is nothing to run: no targets at all, or only
/// hidden or blank ones.
pub fn build_query_targets(targets: &[QueryTarget]) -> Option<Vec<&QueryTarget>> {
    let selected: Vec<&QueryTarget> = targets.iter().filter(|t| t.is_queryable()).collect();
    if selected.is_empty() {
        None
    } else {
        Some(selected)
    }
}

/// Substitute template variables, then unescape `\.`.
pub fn interpolate_metric(templates: &dyn TemplateSrv, metric: &str) -> String {
    templates.replace(metric).replace(r"\.", ".")
}

/// Rewrite `(a|b|c)` alternation into the API's `a,b,c` list form.
///
/// Expressions without at least two alternatives pass through unchanged.
pub fn transform_metric_for_query(metric: &str) -> String {
    let stripped: String = metric.chars().filter(|c| *c != '(' && *c != ')').collect();
    let parts: Vec<&str> = stripped.split('|').collect();

    if parts.len() >= 2 {
        parts.join(",")
    } else {
        metric.to_string()
    }
}

/// Ids of the hosts passing `filters`, comma-joined.
pub fn host_ids(hosts: &[HostRecord], filters: &[HostFilter]) -> String {
    hosts
        .iter()
        .filter(|host| test_host(host, filters))
        .map(|host| host.id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
