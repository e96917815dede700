//! Client module - issues the join request for both WASM and no-WASM environments
//!
//! Both implementations speak the same wire protocol through the
//! [`JoinApi`](crate::interface::JoinApi) trait: reqwest natively, gloo_net in the browser.

/// Anti-forgery header the backend requires on state-changing requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

#[cfg(feature = "no-wasm")]
pub mod request;

#[cfg(feature = "wasm")]
pub mod gloo;
