//! # vcds-types
//!
//! Data types shared by the VividCortex data source adapter and its hosts.
//!
//! The types fall into two groups:
//!
//! - **Host-facing**: what a visualization host sends in ([`QueryOptions`],
//!   [`QueryTarget`], [`TimeRange`]) and what it gets back ([`QueryResponse`],
//!   [`MappedSeries`], [`MetricFindValue`], [`TestResult`]).
//! - **Upstream**: the shapes returned by the VividCortex API v2
//!   ([`HostRecord`], [`SeriesResult`], [`SeriesElement`]).
//!
//! ## Example
//!
//! ```rust
//! use vcds_types::{QueryOptions, QueryTarget, TimeRange};
//!
//! let options = QueryOptions::new(TimeRange::from_secs(1000, 2000))
//!     .target(QueryTarget::new("cpu.total").hosts("env=prod"))
//!     .max_data_points(500);
//!
//! assert_eq!(options.targets.len(), 1);
//! assert_eq!(options.range.span_secs(), 1000);
//! ```

mod host;
mod range;
mod response;
mod series;
mod target;

pub use host::*;
pub use range::*;
pub use response::*;
pub use series::*;
pub use target::*;

/// Label used for series whose host id is not in the fetched host list.
pub const UNKNOWN_HOST: &str = "Unknown host";
