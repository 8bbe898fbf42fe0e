//! # vcds-adapter
//!
//! Translates a visualization host's time-series queries into VividCortex
//! API v2 calls and maps the answers back into the host's series format.
//!
//! ## Pipeline
//!
//! For each query target:
//!
//! 1. Interpolate template variables in the metric and host filter
//!    ([`template`]), then rewrite `(a|b)` alternation as `a,b` ([`params`]).
//! 2. Fetch the hosts active during the query window and keep those passing
//!    the host filter ([`filter`]).
//! 3. Derive the sample size from the window and point budget ([`sample`]).
//! 4. `POST /api/v2/metrics/query-series` through the [`RequestService`]
//!    ([`client`]).
//! 5. Spread each returned series evenly over the served window and label it
//!    with its host name or metric ([`mapper`]).
//!
//! ## Features
//!
//! - `reqwest` (default): a [`RequestService`] backed by reqwest. Without it,
//!   hosts must supply their own transport.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vcds_adapter::VividCortexDatasource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let datasource = VividCortexDatasource::builder()
//!         .api_token("my-token")
//!         .build()?;
//!
//!     let result = datasource.test_datasource().await;
//!     println!("{}: {}", result.title, result.message);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod datasource;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod params;
pub mod sample;
pub mod template;

#[cfg(test)]
mod mock;

pub use client::{ApiClient, ApiRequest, ApiResponse, Method, RequestService, DEFAULT_API_URL};
#[cfg(feature = "reqwest")]
pub use client::ReqwestService;
pub use datasource::{VividCortexDatasource, VividCortexDatasourceBuilder};
pub use error::AdapterError;
pub use filter::{parse_filters, test_host, HostFilter};
pub use mapper::map_query_response;
pub use params::{transform_metric_for_query, QueryBody, RequestParams};
pub use sample::calculate_sample_size;
pub use template::{TemplateSrv, VariableMap};

// Re-export types for convenience
pub use vcds_types::{
    HostRecord, MappedSeries, MetricFindValue, QueryOptions, QueryResponse, QueryTarget,
    TestResult, TimeRange,
};
