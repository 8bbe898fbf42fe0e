//! Host filter expressions.
//!
//! A filter expression is a whitespace-separated list of clauses. A bare
//! clause matches the host name; a `key=value` clause matches any host
//! field. Hosts must satisfy every clause. Malformed clauses are never an
//! error: they fall back to a literal name comparison.

use vcds_types::HostRecord;

/// A single predicate parsed from a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFilter {
    /// Matches `host.name == name`.
    Name(String),
    /// Matches `host[key] == value`.
    Field { key: String, value: String },
}

impl HostFilter {
    /// Parse one clause.
    pub fn parse(clause: &str) -> Self {
        match clause.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => HostFilter::Field {
                key: key.to_string(),
                value: value.to_string(),
            },
            _ => HostFilter::Name(clause.to_string()),
        }
    }

    /// Check whether a host satisfies this predicate.
    pub fn matches(&self, host: &HostRecord) -> bool {
        match self {
            HostFilter::Name(name) => host.name == *name,
            HostFilter::Field { key, value } => host.field(key).as_deref() == Some(value.as_str()),
        }
    }
}

/// Parse a filter expression into predicates.
///
/// An empty or blank expression yields no predicates, which matches every host.
pub fn parse_filters(expr: &str) -> Vec<HostFilter> {
    expr.split_whitespace().map(HostFilter::parse).collect()
}

/// Test a host against all predicates (logical AND).
pub fn test_host(host: &HostRecord, filters: &[HostFilter]) -> bool {
    filters.iter().all(|filter| filter.matches(host))
}
