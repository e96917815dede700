//! WASM HTTP client implementation using gloo_net
//!
//! This module provides the join request for WASM environments
//! using the gloo_net crate, i.e. the browser's fetch API.

use crate::config::JoinConfig;
use crate::error::{ErrorKind, Result};
use crate::interface::{HttpClient, JoinApi};
use crate::model::{JoinParams, JoinRequest, JoinResponse};
use gloo_net::http::Request;
use web_sys::RequestMode;

use super::CSRF_HEADER;

/// HTTP client for WASM environments using gloo_net
#[derive(Debug, Clone)]
pub struct WasmClient {
    join_url: String,
}

impl HttpClient for WasmClient {
    fn new(config: &JoinConfig) -> Result<Self> {
        if config.request_timeout.is_some() {
            log::debug!("request timeout is not applied by the fetch backend");
        }
        Ok(Self {
            join_url: config.join_url()?.to_string(),
        })
    }
}

impl JoinApi for WasmClient {
    async fn join_class(&self, params: JoinParams<'_>) -> Result<JoinResponse> {
        let bearer = format!("Bearer {}", params.access_token);
        let body = JoinRequest::new(params.class_code);

        log::debug!("POST {} (class code length {})", self.join_url, body.class_code.len());

        let resp = Request::post(&self.join_url)
            .mode(RequestMode::Cors)
            .header("Authorization", &bearer)
            .header("Content-Type", "application/json")
            .header(CSRF_HEADER, params.csrf_token)
            .json(&body)?
            .send()
            .await?;

        log::debug!("join response status: {:?}", resp.status());

        let text = resp.text().await?;
        serde_json::from_str::<JoinResponse>(&text).map_err(|e| {
            log::debug!("join response is not a JSON object ({} bytes)", text.len());
            ErrorKind::SerdeJsonError(e).into()
        })
    }
}
