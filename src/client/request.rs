//! No-WASM HTTP client implementation using reqwest
//!
//! This module provides the join request for non-WASM environments
//! using the reqwest crate.

use crate::config::JoinConfig;
use crate::error::{ErrorKind, Result};
use crate::interface::{HttpClient, JoinApi};
use crate::model::{JoinParams, JoinRequest, JoinResponse};
use reqwest::{
    Client, Url,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};

use super::CSRF_HEADER;

/// HTTP client for no-WASM environments using reqwest
#[derive(Debug, Clone)]
pub struct NoWasmClient {
    client: Client,
    join_url: Url,
}

impl HttpClient for NoWasmClient {
    fn new(config: &JoinConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            join_url: config.join_url()?,
        })
    }
}

impl NoWasmClient {
    /// Reuse an existing reqwest client (connection pool, proxies) for the join endpoint.
    pub fn with_client(client: Client, config: &JoinConfig) -> Result<Self> {
        Ok(Self {
            client,
            join_url: config.join_url()?,
        })
    }

    pub fn join_url(&self) -> &Url {
        &self.join_url
    }
}

fn join_headers(params: &JoinParams<'_>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", params.access_token))
        .map_err(|_| ErrorKind::InvalidHeader("access token is not a valid header value".to_string()))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut csrf = HeaderValue::from_str(params.csrf_token)
        .map_err(|_| ErrorKind::InvalidHeader("CSRF token is not a valid header value".to_string()))?;
    csrf.set_sensitive(true);
    headers.insert(HeaderName::from_static(CSRF_HEADER), csrf);

    Ok(headers)
}

impl JoinApi for NoWasmClient {
    async fn join_class(&self, params: JoinParams<'_>) -> Result<JoinResponse> {
        let headers = join_headers(&params)?;
        let body = JoinRequest::new(params.class_code);

        log::debug!("POST {} (class code length {})", self.join_url, body.class_code.len());

        let resp = self
            .client
            .post(self.join_url.clone())
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        log::debug!("join response: HTTP {status}, {} bytes", text.len());

        if !status.is_success() {
            log::debug!("join endpoint answered HTTP {status}; interpreting body anyway");
        }

        Ok(serde_json::from_str::<JoinResponse>(&text)?)
    }
}
