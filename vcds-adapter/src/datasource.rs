//! The data source facade exposed to the host.
//!
//! Every call is a one-shot pipeline: interpolate, build parameters, fetch
//! hosts, filter, dispatch, map. Nothing is cached between calls.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vcds_adapter::VividCortexDatasource;
//! use vcds_types::{QueryOptions, QueryTarget, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let datasource = VividCortexDatasource::builder()
//!         .api_token("my-token")
//!         .build()?;
//!
//!     let options = QueryOptions::new(TimeRange::from_secs(1_700_000_000, 1_700_003_600))
//!         .target(QueryTarget::new("os.cpu.(user|system)").hosts("env=prod"));
//!
//!     for series in datasource.query(&options).await?.data {
//!         println!("{}: {} points", series.target, series.datapoints.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use vcds_types::{
    HostRecord, MappedSeries, MetricFindValue, QueryOptions, QueryResponse, QueryTarget,
    SeriesResult, TestResult, TimeRange,
};

use crate::client::{ApiClient, Method, RequestService, DEFAULT_API_URL};
use crate::filter::parse_filters;
use crate::mapper::map_query_response;
use crate::params::{
    build_query_targets, host_ids, interpolate_metric, transform_metric_for_query, QueryBody,
    RequestParams,
};
use crate::template::{TemplateSrv, VariableMap};
use crate::AdapterError;

/// Header carrying the start of the served window.
pub const META_FROM_HEADER: &str = "X-Vc-Meta-From";
/// Header carrying the end of the served window.
pub const META_UNTIL_HEADER: &str = "X-Vc-Meta-Until";

/// Metric-find query that lists hosts instead of metrics.
const HOSTS_QUERY: &str = "hosts";

/// VividCortex data source.
#[derive(Debug, Clone)]
pub struct VividCortexDatasource {
    client: ApiClient,
    templates: Arc<dyn TemplateSrv>,
    host_lookback: Duration,
}

impl VividCortexDatasource {
    /// Create a new builder for configuring the data source.
    pub fn builder() -> VividCortexDatasourceBuilder {
        VividCortexDatasourceBuilder::default()
    }

    /// Probe the API with a one-metric listing.
    ///
    /// Any failure, whether a rejected token or an unreachable endpoint,
    /// yields the same credentials error.
    pub async fn test_datasource(&self) -> TestResult {
        let query = vec![("limit".to_string(), "1".to_string())];
        match self
            .client
            .do_request("metrics", Method::Get, query, None)
            .await
        {
            Ok(response) if response.status == 200 => TestResult::success(),
            Ok(response) => {
                warn!(status = response.status, "connectivity probe rejected");
                TestResult::credentials_error()
            }
            Err(e) => {
                warn!(error = %e, "connectivity probe failed");
                TestResult::credentials_error()
            }
        }
    }

    /// Resolve a template-variable query.
    ///
    /// `hosts` (or `hosts()`) lists the hosts active during the lookback
    /// window; anything else searches metric names. Results are sorted by text.
    pub async fn metric_find_query(
        &self,
        query: &str,
    ) -> Result<Vec<MetricFindValue>, AdapterError> {
        let query = self.templates.replace(query.trim());

        let mut values: Vec<MetricFindValue> = if is_hosts_query(&query) {
            let range = i64::try_from(self.host_lookback.as_secs())
                .ok()
                .and_then(TimeRange::last_secs)
                .ok_or_else(|| {
                    AdapterError::Config(format!(
                        "host lookback of {}s is out of range",
                        self.host_lookback.as_secs()
                    ))
                })?;
            self.fetch_hosts(&range)
                .await?
                .into_iter()
                .map(|host| MetricFindValue::named(host.name))
                .collect()
        } else {
            self.search_metrics(&query)
                .await?
                .into_iter()
                .map(MetricFindValue::named)
                .collect()
        };

        values.sort_by(|a, b| a.text.cmp(&b.text));
        Ok(values)
    }

    /// Annotations are not supported.
    pub async fn annotation_query(&self) -> Result<Vec<Value>, AdapterError> {
        Err(AdapterError::Unsupported(
            "annotations are not implemented".to_string(),
        ))
    }

    /// Run every queryable target concurrently and collect their series.
    ///
    /// With nothing to query no request is made. If any target fails, the
    /// whole call fails.
    pub async fn query(&self, options: &QueryOptions) -> Result<QueryResponse, AdapterError> {
        let Some(targets) = build_query_targets(&options.targets) else {
            return Ok(QueryResponse::empty());
        };

        let results = try_join_all(
            targets
                .into_iter()
                .map(|target| self.query_target(target, &options.range, options.max_data_points)),
        )
        .await?;

        Ok(QueryResponse {
            data: results.into_iter().flatten().collect(),
        })
    }

    async fn query_target(
        &self,
        target: &QueryTarget,
        range: &TimeRange,
        max_data_points: u32,
    ) -> Result<Vec<MappedSeries>, AdapterError> {
        let metrics = transform_metric_for_query(&interpolate_metric(
            self.templates.as_ref(),
            &target.target,
        ));

        let hosts = self.fetch_hosts(range).await?;
        let filters = parse_filters(&self.templates.replace(&target.hosts));
        let host = host_ids(&hosts, &filters);

        // An empty `host` parameter means "all hosts" upstream, which would
        // widen the query instead of narrowing it.
        if host.is_empty() && !filters.is_empty() {
            debug!(filter = %target.hosts, "no hosts match filter");
            return Ok(Vec::new());
        }

        let params = RequestParams::new(range, max_data_points, host)
            .separate_hosts(target.separate_hosts);
        debug!(
            metrics = %metrics,
            host = %params.host,
            samplesize = params.samplesize,
            "querying series"
        );

        let body = serde_json::to_value(QueryBody { metrics })?;
        let response = self
            .client
            .do_request("metrics/query-series", Method::Post, params.to_query(), Some(body))
            .await?
            .error_for_status()?;

        let from = header_epoch(response.header(META_FROM_HEADER), META_FROM_HEADER, params.from);
        let until = header_epoch(
            response.header(META_UNTIL_HEADER),
            META_UNTIL_HEADER,
            params.until,
        );

        let series: Vec<SeriesResult> = response.data()?;
        Ok(map_query_response(&series, &hosts, from, until).data)
    }

    /// Hosts active during `range`, fetched fresh.
    async fn fetch_hosts(&self, range: &TimeRange) -> Result<Vec<HostRecord>, AdapterError> {
        let query = vec![
            ("from".to_string(), range.from_epoch().to_string()),
            ("until".to_string(), range.until_epoch().to_string()),
        ];

        let hosts: Vec<HostRecord> = self
            .client
            .do_request("hosts", Method::Get, query, None)
            .await?
            .error_for_status()?
            .data()?;

        debug!(count = hosts.len(), "fetched hosts");
        Ok(hosts)
    }

    async fn search_metrics(&self, filter: &str) -> Result<Vec<String>, AdapterError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MetricEntry {
            Named { name: String },
            Plain(String),
        }

        let query = vec![("filter".to_string(), filter.to_string())];
        let entries: Vec<MetricEntry> = self
            .client
            .do_request("metrics/search", Method::Get, query, None)
            .await?
            .error_for_status()?
            .data()?;

        Ok(entries
            .into_iter()
            .map(|entry| match entry {
                MetricEntry::Named { name } => name,
                MetricEntry::Plain(name) => name,
            })
            .collect())
    }
}

fn is_hosts_query(query: &str) -> bool {
    let query = query.strip_suffix("()").unwrap_or(query);
    query.eq_ignore_ascii_case(HOSTS_QUERY)
}

fn header_epoch(value: Option<&str>, name: &str, fallback: i64) -> i64 {
    match value.map(|v| v.trim().parse::<i64>()) {
        Some(Ok(epoch)) => epoch,
        Some(Err(_)) => {
            warn!(header = name, "unparsable result header, using request bounds");
            fallback
        }
        None => {
            warn!(header = name, "missing result header, using request bounds");
            fallback
        }
    }
}

/// Builder for VividCortexDatasource.
#[derive(Debug, Default)]
pub struct VividCortexDatasourceBuilder {
    api_token: Option<String>,
    api_url: Option<String>,
    timeout: Option<Duration>,
    host_lookback: Option<Duration>,
    templates: Option<Arc<dyn TemplateSrv>>,
    service: Option<Arc<dyn RequestService>>,
}

impl VividCortexDatasourceBuilder {
    /// Set the API token (required).
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the API base URL (default: "https://app.vividcortex.com").
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the transport timeout (default: 30 seconds).
    ///
    /// Ignored when a custom request service is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set how far back the `hosts` metric-find query looks (default: 1 hour).
    pub fn host_lookback(mut self, lookback: Duration) -> Self {
        self.host_lookback = Some(lookback);
        self
    }

    /// Use the host's template interpolation (default: no variables).
    pub fn template_srv(mut self, templates: Arc<dyn TemplateSrv>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Use the host's HTTP service instead of the built-in transport.
    pub fn request_service(mut self, service: Arc<dyn RequestService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Build the data source.
    pub fn build(self) -> Result<VividCortexDatasource, AdapterError> {
        let token = self
            .api_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AdapterError::Config("an API token is required".to_string()))?;

        let service = match self.service {
            Some(service) => service,
            None => default_service(self.timeout.unwrap_or(Duration::from_secs(30)))?,
        };

        let api_url = self
            .api_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(VividCortexDatasource {
            client: ApiClient::new(service, api_url, token),
            templates: self
                .templates
                .unwrap_or_else(|| Arc::new(VariableMap::new())),
            host_lookback: self.host_lookback.unwrap_or(Duration::from_secs(3600)),
        })
    }
}

#[cfg(feature = "reqwest")]
fn default_service(timeout: Duration) -> Result<Arc<dyn RequestService>, AdapterError> {
    Ok(Arc::new(crate::client::ReqwestService::new(timeout)?))
}

#[cfg(not(feature = "reqwest"))]
fn default_service(_timeout: Duration) -> Result<Arc<dyn RequestService>, AdapterError> {
    Err(AdapterError::Config(
        "no request service configured and the reqwest feature is disabled".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::ApiResponse;
    use crate::mock::MockService;

    fn datasource(service: &Arc<MockService>) -> VividCortexDatasource {
        VividCortexDatasource::builder()
            .api_token("token")
            .api_url("https://vc.test")
            .request_service(service.clone())
            .build()
            .unwrap()
    }

    fn prod_dev_hosts() -> ApiResponse {
        ApiResponse::ok(json!({"data": [
            {"id": 1, "name": "h1", "env": "prod"},
            {"id": 2, "name": "h2", "env": "dev"}
        ]}))
    }

    #[test]
    fn test_builder_defaults() {
        let service = Arc::new(MockService::new());
        let ds = VividCortexDatasource::builder()
            .api_token("token")
            .request_service(service)
            .build()
            .unwrap();

        assert_eq!(ds.client.base_url(), DEFAULT_API_URL);
        assert_eq!(ds.host_lookback, Duration::from_secs(3600));
    }

    #[test]
    fn test_builder_requires_token() {
        let result = VividCortexDatasource::builder().api_token("  ").build();
        assert!(matches!(result, Err(AdapterError::Config(_))));
    }

    #[tokio::test]
    async fn test_datasource_success() {
        let service = Arc::new(MockService::new());
        service.respond(Method::Get, "metrics", ApiResponse::ok(json!({"data": []})));

        let result = datasource(&service).test_datasource().await;

        assert!(result.is_success());
        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query_param("limit"), Some("1"));
    }

    #[tokio::test]
    async fn test_datasource_failures_collapse() {
        let rejected = Arc::new(MockService::new());
        rejected.respond(Method::Get, "metrics", ApiResponse::status(401));

        let unreachable = Arc::new(MockService::new());
        unreachable.fail(Method::Get, "metrics", || {
            AdapterError::Connection("refused".to_string())
        });

        let a = datasource(&rejected).test_datasource().await;
        let b = datasource(&unreachable).test_datasource().await;

        assert_eq!(a, TestResult::credentials_error());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_query_selects_filtered_hosts() {
        let service = Arc::new(MockService::new());
        service.respond(Method::Get, "hosts", prod_dev_hosts());
        service.respond(
            Method::Post,
            "metrics/query-series",
            ApiResponse::ok(json!({"data": [{"elements": [
                {"metric": "cpu.total", "host": 1, "series": [1.0, 2.0]}
            ]}]}))
            .with_header(META_FROM_HEADER, "1000")
            .with_header(META_UNTIL_HEADER, "2000"),
        );

        let options = QueryOptions::new(TimeRange::from_secs(1000, 2000))
            .target(QueryTarget::new("cpu.total").hosts("env=prod"));
        let response = datasource(&service).query(&options).await.unwrap();

        let host_requests = service.requests_to("hosts");
        assert_eq!(host_requests.len(), 1);
        assert_eq!(host_requests[0].query_param("from"), Some("1000"));
        assert_eq!(host_requests[0].query_param("until"), Some("2000"));

        let series_requests = service.requests_to("metrics/query-series");
        assert_eq!(series_requests.len(), 1);
        let request = &series_requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.query_param("host"), Some("1"));
        assert_eq!(request.query_param("from"), Some("1000"));
        assert_eq!(request.query_param("until"), Some("2000"));
        assert_eq!(request.query_param("samplesize"), Some("5"));
        assert_eq!(request.query_param("separateHosts"), None);
        assert_eq!(request.body, Some(json!({"metrics": "cpu.total"})));

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].target, "h1");
        assert_eq!(
            response.data[0].datapoints,
            vec![(Some(1.0), 1_000_000), (Some(2.0), 1_500_000)]
        );
    }

    #[tokio::test]
    async fn test_query_without_targets_makes_no_requests() {
        let service = Arc::new(MockService::new());
        let ds = datasource(&service);

        let empty = QueryOptions::new(TimeRange::from_secs(1000, 2000));
        assert!(ds.query(&empty).await.unwrap().is_empty());

        let hidden = QueryOptions::new(TimeRange::from_secs(1000, 2000))
            .target(QueryTarget::new("cpu").hidden());
        assert!(ds.query(&hidden).await.unwrap().is_empty());

        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn test_query_interpolates_and_transforms() {
        let service = Arc::new(MockService::new());
        service.respond(Method::Get, "hosts", prod_dev_hosts());
        service.respond(
            Method::Post,
            "metrics/query-series",
            ApiResponse::ok(json!({"data": [{"elements": [
                {"metric": "os.cpu.user", "series": [1.0]}
            ]}]})),
        );

        let templates: Arc<dyn TemplateSrv> =
            Arc::new(VariableMap::new().set("host", "h2").set("kind", "cpu"));
        let ds = VividCortexDatasource::builder()
            .api_token("token")
            .request_service(service.clone())
            .template_srv(templates)
            .build()
            .unwrap();

        let options = QueryOptions::new(TimeRange::from_secs(0, 60)).target(
            QueryTarget::new(r"os\.$kind\.(user|system)")
                .hosts("$host")
                .separate_hosts(true),
        );
        let response = ds.query(&options).await.unwrap();

        let request = &service.requests_to("metrics/query-series")[0];
        assert_eq!(request.body, Some(json!({"metrics": "os.cpu.user,system"})));
        assert_eq!(request.query_param("host"), Some("2"));
        assert_eq!(request.query_param("separateHosts"), Some("true"));

        // headers missing: request bounds are used
        assert_eq!(response.data[0].target, "os.cpu.user");
        assert_eq!(response.data[0].datapoints, vec![(Some(1.0), 0)]);
    }

    #[tokio::test]
    async fn test_query_runs_each_target() {
        let service = Arc::new(MockService::new());
        service.respond(Method::Get, "hosts", prod_dev_hosts());
        service.respond(
            Method::Post,
            "metrics/query-series",
            ApiResponse::ok(json!({"data": [{"elements": [
                {"metric": "m", "series": [1.0]}
            ]}]})),
        );

        let options = QueryOptions::new(TimeRange::from_secs(0, 60))
            .target(QueryTarget::new("a"))
            .target(QueryTarget::new("b"));
        let response = datasource(&service).query(&options).await.unwrap();

        assert_eq!(response.data.len(), 2);
        // hosts are fetched per target, never shared
        assert_eq!(service.requests_to("hosts").len(), 2);
        assert_eq!(service.requests_to("metrics/query-series").len(), 2);
        let all_hosts = service.requests_to("metrics/query-series")[0]
            .query_param("host")
            .map(str::to_string);
        assert_eq!(all_hosts.as_deref(), Some("1,2"));
    }

    #[tokio::test]
    async fn test_query_no_matching_hosts_skips_dispatch() {
        let service = Arc::new(MockService::new());
        service.respond(Method::Get, "hosts", prod_dev_hosts());

        let options = QueryOptions::new(TimeRange::from_secs(0, 60))
            .target(QueryTarget::new("cpu").hosts("env=staging"));
        let response = datasource(&service).query(&options).await.unwrap();

        assert!(response.is_empty());
        assert!(service.requests_to("metrics/query-series").is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_fails_everything() {
        let service = Arc::new(MockService::new());
        service.respond(Method::Get, "hosts", prod_dev_hosts());
        service.respond(Method::Post, "metrics/query-series", ApiResponse::status(500));

        let options = QueryOptions::new(TimeRange::from_secs(0, 60))
            .target(QueryTarget::new("a"))
            .target(QueryTarget::new("b"));
        let result = datasource(&service).query(&options).await;

        assert!(matches!(result, Err(AdapterError::Http(_))));
    }

    #[tokio::test]
    async fn test_query_empty_result() {
        let service = Arc::new(MockService::new());
        service.respond(Method::Get, "hosts", prod_dev_hosts());
        service.respond(
            Method::Post,
            "metrics/query-series",
            ApiResponse::ok(json!({"data": [{"elements": []}]})),
        );

        let options =
            QueryOptions::new(TimeRange::from_secs(0, 60)).target(QueryTarget::new("cpu"));
        assert!(datasource(&service).query(&options).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metric_find_hosts() {
        let service = Arc::new(MockService::new());
        service.respond(
            Method::Get,
            "hosts",
            ApiResponse::ok(json!({"data": [
                {"id": 3, "name": "web"},
                {"id": 1, "name": "db"},
                {"id": 2, "name": "cache"}
            ]})),
        );

        let values = datasource(&service).metric_find_query("hosts()").await.unwrap();

        let names: Vec<&str> = values.iter().map(|v| v.text.as_str()).collect();
        assert_eq!(names, vec!["cache", "db", "web"]);
        assert_eq!(values[0].value, "cache");

        let request = &service.requests_to("hosts")[0];
        let from: i64 = request.query_param("from").unwrap().parse().unwrap();
        let until: i64 = request.query_param("until").unwrap().parse().unwrap();
        assert_eq!(until - from, 3600);
    }

    #[tokio::test]
    async fn test_metric_find_hosts_huge_lookback() {
        let service = Arc::new(MockService::new());
        service.respond(Method::Get, "hosts", prod_dev_hosts());

        let ds = VividCortexDatasource::builder()
            .api_token("token")
            .request_service(service.clone())
            .host_lookback(Duration::from_secs(1_000_000_000 * 86_400))
            .build()
            .unwrap();

        let result = ds.metric_find_query("hosts").await;

        assert!(matches!(result, Err(AdapterError::Config(_))));
        assert!(service.requests().is_empty());

        let ds = VividCortexDatasource::builder()
            .api_token("token")
            .request_service(service.clone())
            .host_lookback(Duration::from_secs(u64::MAX))
            .build()
            .unwrap();

        assert!(matches!(
            ds.metric_find_query("hosts").await,
            Err(AdapterError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_metric_find_search() {
        let service = Arc::new(MockService::new());
        service.respond(
            Method::Get,
            "metrics/search",
            ApiResponse::ok(json!({"data": [
                {"name": "os.mem.free"},
                "os.cpu.user",
                {"name": "os.cpu.idle"}
            ]})),
        );

        let values = datasource(&service).metric_find_query("os.").await.unwrap();

        assert_eq!(
            values,
            vec![
                MetricFindValue::named("os.cpu.idle"),
                MetricFindValue::named("os.cpu.user"),
                MetricFindValue::named("os.mem.free"),
            ]
        );
        let request = &service.requests_to("metrics/search")[0];
        assert_eq!(request.query_param("filter"), Some("os."));
    }

    #[tokio::test]
    async fn test_metric_find_propagates_errors() {
        let service = Arc::new(MockService::new());
        service.respond(Method::Get, "metrics/search", ApiResponse::status(403));

        let result = datasource(&service).metric_find_query("cpu").await;
        assert!(matches!(result, Err(AdapterError::Auth(_))));
    }

    #[tokio::test]
    async fn test_annotations_unsupported() {
        let service = Arc::new(MockService::new());
        let result = datasource(&service).annotation_query().await;

        assert!(matches!(result, Err(AdapterError::Unsupported(_))));
        assert!(service.requests().is_empty());
    }

    #[test]
    fn test_is_hosts_query() {
        assert!(is_hosts_query("hosts"));
        assert!(is_hosts_query("Hosts()"));
        assert!(!is_hosts_query("hosts.cpu"));
    }

    #[test]
    fn test_header_epoch() {
        assert_eq!(header_epoch(Some(" 1200 "), META_FROM_HEADER, 1000), 1200);
        assert_eq!(header_epoch(Some("soon"), META_FROM_HEADER, 1000), 1000);
        assert_eq!(header_epoch(None, META_FROM_HEADER, 1000), 1000);
    }
}
