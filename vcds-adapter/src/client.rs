//! Authenticated request dispatch against the VividCortex API v2.
//!
//! The adapter never talks to the network directly. It hands fully built
//! [`ApiRequest`]s to a [`RequestService`], which the host provides. With the
//! `reqwest` feature, [`ReqwestService`] is available as a ready-made
//! transport.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::AdapterError;

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://app.vividcortex.com";

const API_PREFIX: &str = "/api/v2/";

/// HTTP methods used by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Value of a query-string parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A transport response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl ApiResponse {
    /// A 200 response carrying `body`.
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body,
        }
    }

    /// A bodiless response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail on non-success statuses.
    pub fn error_for_status(self) -> Result<Self, AdapterError> {
        match self.status {
            401 | 403 => Err(AdapterError::Auth(format!(
                "API returned status {}",
                self.status
            ))),
            _ if !self.is_success() => Err(AdapterError::Http(format!(
                "API returned status {}",
                self.status
            ))),
            _ => Ok(self),
        }
    }

    /// Decode the `data` member of the API's response envelope.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, AdapterError> {
        #[derive(Deserialize)]
        struct Envelope<T> {
            data: T,
        }

        let envelope: Envelope<T> = serde_json::from_value(self.body.clone())?;
        Ok(envelope.data)
    }
}

/// HTTP capability supplied by the host.
///
/// Implementations perform exactly one attempt per call and surface transport
/// failures as errors. Non-success statuses are returned as responses.
#[async_trait]
pub trait RequestService: Send + Sync + fmt::Debug {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AdapterError>;
}

/// Issues authenticated calls to the API.
#[derive(Clone)]
pub struct ApiClient {
    service: Arc<dyn RequestService>,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(
        service: Arc<dyn RequestService>,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint below `/api/v2/`.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            API_PREFIX,
            endpoint.trim_start_matches('/')
        )
    }

    /// Send a single request.
    ///
    /// Bearer auth and the JSON content type are always attached. A body with
    /// no fields is dropped rather than sent as `{}`.
    pub async fn do_request(
        &self,
        endpoint: &str,
        method: Method,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<ApiResponse, AdapterError> {
        let body = body.filter(|value| match value {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        });

        let request = ApiRequest {
            method,
            url: self.url(endpoint),
            query,
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.token),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        };

        debug!(%method, url = %request.url, "dispatching API request");
        self.service.send(request).await
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_service::ReqwestService;

#[cfg(feature = "reqwest")]
mod reqwest_service {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;
    use serde_json::Value;

    use super::{ApiRequest, ApiResponse, Method, RequestService};
    use crate::AdapterError;

    /// [`RequestService`] backed by a reqwest client.
    #[derive(Debug, Clone)]
    pub struct ReqwestService {
        client: Client,
    }

    impl ReqwestService {
        /// Build a service whose requests give up after `timeout`.
        pub fn new(timeout: Duration) -> Result<Self, AdapterError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| AdapterError::Config(e.to_string()))?;
            Ok(Self { client })
        }

        /// Wrap an existing client.
        pub fn with_client(client: Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl RequestService for ReqwestService {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AdapterError> {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
            };

            let mut builder = self
                .client
                .request(method, &request.url)
                .query(&request.query);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.to_string());
            }

            let response = builder.send().await?;

            let status = response.status();
            let headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
                })
                .collect();

            let bytes = response.bytes().await?;
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                match serde_json::from_slice(&bytes) {
                    Ok(body) => body,
                    Err(e) if status.is_success() => return Err(e.into()),
                    // Error pages are often HTML; the status carries the failure.
                    Err(_) => Value::Null,
                }
            };

            Ok(ApiResponse {
                status: status.as_u16(),
                headers,
                body,
            })
        }
    }

}
