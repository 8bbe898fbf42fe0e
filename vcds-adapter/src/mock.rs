//! Recording [`RequestService`] for tests.

use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{ApiRequest, ApiResponse, Method, RequestService};
use crate::AdapterError;

type ErrorFactory = Box<dyn Fn() -> AdapterError + Send + Sync>;

enum Reply {
    Response(ApiResponse),
    Error(ErrorFactory),
}

/// Answers requests from canned replies keyed by method and endpoint, and
/// records every request it sees. Unrouted requests get a 404.
#[derive(Default)]
pub(crate) struct MockService {
    routes: Mutex<Vec<(Method, String, Reply)>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, method: Method, endpoint: &str, response: ApiResponse) {
        self.routes.lock().unwrap().push((
            method,
            format!("/api/v2/{endpoint}"),
            Reply::Response(response),
        ));
    }

    pub(crate) fn fail<F>(&self, method: Method, endpoint: &str, error: F)
    where
        F: Fn() -> AdapterError + Send + Sync + 'static,
    {
        self.routes.lock().unwrap().push((
            method,
            format!("/api/v2/{endpoint}"),
            Reply::Error(Box::new(error)),
        ));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests whose URL ends with `/api/v2/{endpoint}`.
    pub(crate) fn requests_to(&self, endpoint: &str) -> Vec<ApiRequest> {
        let suffix = format!("/api/v2/{endpoint}");
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(&suffix))
            .collect()
    }
}

impl fmt::Debug for MockService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockService").finish()
    }
}

#[async_trait]
impl RequestService for MockService {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AdapterError> {
        self.requests.lock().unwrap().push(request.clone());

        let routes = self.routes.lock().unwrap();
        let reply = routes
            .iter()
            .find(|(method, suffix, _)| *method == request.method && request.url.ends_with(suffix));

        match reply {
            Some((_, _, Reply::Response(response))) => Ok(response.clone()),
            Some((_, _, Reply::Error(error))) => Err(error()),
            None => Ok(ApiResponse::status(404)),
        }
    }
}
