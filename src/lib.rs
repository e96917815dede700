pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod interface;
pub mod model;

pub use app::{JoinClassForm, Notice, Reconciliation, TokenCache, TokenSource, TokenStatus};
pub use config::{JoinConfig, SubmitPolicy};
pub use error::{Error, ErrorKind, Result, TokenKind};

#[cfg(feature = "no-wasm")]
pub use client::request::NoWasmClient;
#[cfg(feature = "wasm")]
pub use client::gloo::WasmClient;

#[cfg(feature = "no-wasm")]
pub use reqwest::Client;
#[cfg(feature = "no-wasm")]
pub use tokio;
