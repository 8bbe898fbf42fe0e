//! Data source settings.
//!
//! Settings come from an optional TOML file layered under `VCDS_*`
//! environment variables:
//!
//! ```toml
//! api_token = "..."
//! api_url = "https://app.vividcortex.com"
//! timeout = "30s"
//! host_lookback = "1h"
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use vcds_adapter::{TemplateSrv, VividCortexDatasource};

use crate::duration::parse_duration;

/// Settings the host supplies to the data source.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_token: String,

    /// Falls back to the production endpoint when unset.
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout: String,

    #[serde(default = "default_host_lookback")]
    pub host_lookback: String,
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_host_lookback() -> String {
    "1h".to_string()
}

impl Settings {
    /// Load settings from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("VCDS"))
            .build()
            .context("Failed to read settings")?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self> {
        config
            .try_deserialize()
            .context("Invalid settings (is VCDS_API_TOKEN or api_token set?)")
    }

    /// Build a data source from these settings.
    pub fn datasource(&self, templates: Arc<dyn TemplateSrv>) -> Result<VividCortexDatasource> {
        let timeout = parse_duration(&self.timeout).context("Invalid timeout")?;
        let host_lookback = parse_duration(&self.host_lookback).context("Invalid host_lookback")?;

        let mut builder = VividCortexDatasource::builder()
            .api_token(&self.api_token)
            .timeout(timeout)
            .host_lookback(host_lookback)
            .template_srv(templates);
        if let Some(url) = &self.api_url {
            builder = builder.api_url(url);
        }

        Ok(builder.build()?)
    }
}
