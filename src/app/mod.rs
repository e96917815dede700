//! Application module - the join-class workflow
//!
//! Leaf-first: the credential holder and token providers feed the executor,
//! whose completions the reconciler turns into cache and banner updates.
//! [`JoinClassForm`] puts them together.

pub mod banner;
pub mod cache;
pub mod credential;
pub mod executor;
pub mod form;
pub mod reconcile;
pub mod tokens;

#[cfg(test)]
pub(crate) mod testing;

pub use banner::{BannerState, SUCCESS_MESSAGE, SuccessBanner};
pub use cache::{ACCESS_TOKEN_RESPONSE, TokenCache};
pub use credential::CredentialHolder;
pub use executor::{Completion, JoinExecutor, RequestId, RequestState};
pub use form::{JoinClassForm, Notice};
pub use reconcile::{Reconciler, Reconciliation};
pub use tokens::{TokenSource, TokenStatus};
