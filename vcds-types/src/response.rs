//! Results of the connectivity probe and metric lookups.

use serde::{Deserialize, Serialize};

/// A `{text, value}` pair used to populate template variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFindValue {
    pub text: String,
    pub value: String,
}

impl MetricFindValue {
    /// A value whose display text and value are the same.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            text: name.clone(),
            value: name,
        }
    }
}

/// Outcome of a connectivity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Success,
    Error,
}

/// Descriptor returned by `test_datasource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub status: TestStatus,
    pub message: String,
    pub title: String,
}

impl TestResult {
    pub fn success() -> Self {
        Self {
            status: TestStatus::Success,
            message: "Data source is working".to_string(),
            title: "Success".to_string(),
        }
    }

    /// The only failure descriptor; bad tokens and unreachable endpoints
    /// both produce it.
    pub fn credentials_error() -> Self {
        Self {
            status: TestStatus::Error,
            message: "Your API token could not be verified. Check the token and API URL."
                .to_string(),
            title: "Credentials error".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TestStatus::Success
    }
}
