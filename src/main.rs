use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vcds::time::parse_time;
use vcds::Settings;
use vcds_adapter::VariableMap;
use vcds_types::{QueryOptions, QueryTarget, TimeRange};

#[derive(Parser, Debug)]
#[command(name = "vcds")]
#[command(about = "Query the VividCortex API the way a dashboard data source does")]
struct Args {
    /// Path to a TOML settings file (VCDS_* environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Template variable available to metric and host expressions (name=value)
    #[arg(long = "var", global = true, value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the API token works
    Test,

    /// Look up metric names, or host names with the query "hosts"
    Metrics {
        /// Metric name filter, or "hosts"
        query: String,
    },

    /// Run a time-series query
    Query {
        /// Metric expression, e.g. "os.cpu.(user|system)"
        #[arg(short, long)]
        target: String,

        /// Host filter, e.g. "db1 env=prod"
        #[arg(long, default_value = "")]
        hosts: String,

        /// Ask for one series per host
        #[arg(long)]
        separate_hosts: bool,

        /// Start of the window: now, now-<duration>, epoch seconds or RFC 3339
        #[arg(long, default_value = "now-1h")]
        from: String,

        /// End of the window
        #[arg(long, default_value = "now")]
        until: String,

        /// Point budget per series
        #[arg(long, default_value = "500")]
        max_data_points: u32,
    },

    /// Annotation lookup (not supported by this data source)
    Annotations,
}

fn parse_var(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(anyhow!("Expected name=value, got: {}", s)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(args.config.as_deref())?;
    let templates = Arc::new(args.vars.into_iter().collect::<VariableMap>());
    let datasource = settings.datasource(templates)?;
    debug!(config = ?args.config, "data source ready");

    match args.command {
        Command::Test => {
            let result = datasource.test_datasource().await;
            print_json(&result)?;
            if !result.is_success() {
                bail!("{}", result.message);
            }
        }
        Command::Metrics { query } => {
            let values = datasource.metric_find_query(&query).await?;
            print_json(&values)?;
        }
        Command::Query {
            target,
            hosts,
            separate_hosts,
            from,
            until,
            max_data_points,
        } => {
            let now = Utc::now();
            let range = TimeRange::new(parse_time(&from, now)?, parse_time(&until, now)?);

            let mut target = QueryTarget::new(target).hosts(hosts);
            if separate_hosts {
                target = target.separate_hosts(true);
            }

            let options = QueryOptions::new(range)
                .target(target)
                .max_data_points(max_data_points);
            let response = datasource.query(&options).await?;
            print_json(&response)?;
        }
        Command::Annotations => {
            let annotations = datasource.annotation_query().await?;
            print_json(&annotations)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
