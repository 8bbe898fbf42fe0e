//! # vcds
//!
//! A command-line host for the VividCortex data source adapter. It plays the
//! part a dashboard application would: it loads settings, supplies template
//! variables, and prints the adapter's answers as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Check the token
//! VCDS_API_TOKEN=... vcds test
//!
//! # Populate a host-name variable
//! vcds --config vcds.toml metrics hosts
//!
//! # Run a query over the last six hours
//! vcds --config vcds.toml query --target 'os.cpu.(user|system)' \
//!     --hosts 'env=prod' --from now-6h --until now
//! ```
//!
//! - **[`settings`]**: settings loading (TOML file plus `VCDS_*` environment)
//! - **[`duration`]** and **[`time`]**: argument parsing

pub mod duration;
pub mod settings;
pub mod time;

pub use settings::Settings;
