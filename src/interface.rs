#![allow(async_fn_in_trait)] // the join flow runs on a single task; futures need not be Send

use crate::config::JoinConfig;
use crate::error::Result;
use crate::model::{JoinParams, JoinResponse};

/// Common trait for HTTP client functionality
pub trait HttpClient {
    /// Create a new HTTP client instance for the given configuration
    fn new(config: &JoinConfig) -> Result<Self>
    where
        Self: Sized;
}

/// The one remote operation the join flow needs.
pub trait JoinApi {
    /// `POST {api_base}/class/join` with bearer + CSRF headers and `{"classCode": ..}`.
    ///
    /// Issued once, never retried. Any body that parses as a JSON object is
    /// returned, whatever the HTTP status.
    async fn join_class(&self, params: JoinParams<'_>) -> Result<JoinResponse>;
}

impl<T: JoinApi> JoinApi for &T {
    async fn join_class(&self, params: JoinParams<'_>) -> Result<JoinResponse> {
        (**self).join_class(params).await
    }
}
