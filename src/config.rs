//! Join-flow configuration.
//!
//! Built in code with [`JoinConfig::new`], or loaded from a TOML file such as
//! `~/.class-join/config.toml`:
//!
//! ```toml
//! api-base = "https://school.example/api"
//! request-timeout-ms = 10000
//! token-wait-ms = 2000
//! submit-policy = "supersede-previous"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ErrorKind, Result};

/// Path of the join endpoint, relative to the API base.
pub const JOIN_CLASS_PATH: &str = "class/join";

/// What a submit does to a request that is still in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitPolicy {
    /// Both requests run to completion; the last one to finish wins.
    #[default]
    Concurrent,
    /// The older request is cancelled and never reconciled.
    SupersedePrevious,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinConfig {
    pub api_base: Url,
    /// `None` leaves the transport's default in place.
    pub request_timeout: Option<Duration>,
    /// `None` fails a submit immediately when a token is not ready.
    pub token_wait: Option<Duration>,
    pub submit_policy: SubmitPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    api_base: String,
    request_timeout_ms: Option<u64>,
    token_wait_ms: Option<u64>,
    #[serde(default)]
    submit_policy: SubmitPolicy,
}

impl JoinConfig {
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base,
            request_timeout: None,
            token_wait: None,
            submit_policy: SubmitPolicy::default(),
        }
    }

    /// Parse an API base such as `https://school.example/api`.
    pub fn parse(api_base: &str) -> Result<Self> {
        Ok(Self::new(parse_api_base(api_base)?))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_token_wait(mut self, wait: Duration) -> Self {
        self.token_wait = Some(wait);
        self
    }

    pub fn with_submit_policy(mut self, policy: SubmitPolicy) -> Self {
        self.submit_policy = policy;
        self
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents)?;
        Ok(Self {
            api_base: parse_api_base(&raw.api_base)?,
            request_timeout: raw.request_timeout_ms.map(Duration::from_millis),
            token_wait: raw.token_wait_ms.map(Duration::from_millis),
            submit_policy: raw.submit_policy,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents).map_err(|e| {
            ErrorKind::ConfigError(format!("invalid config at {}: {e}", path.display())).into()
        })
    }

    /// The config file path: `~/.class-join/config.toml`.
    #[cfg(feature = "no-wasm")]
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|h| h.join(".class-join").join("config.toml"))
    }

    /// `{api_base}/class/join`, keeping any path prefix on the base.
    pub fn join_url(&self) -> Result<Url> {
        let mut base = self.api_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(JOIN_CLASS_PATH)?)
    }
}

fn parse_api_base(api_base: &str) -> Result<Url> {
    let url = Url::parse(api_base)?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ErrorKind::ConfigError(format!("api base must be an http(s) URL: {api_base}")).into());
    }
    Ok(url)
}
