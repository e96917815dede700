//! Turns a completed join request into its effects on shared state.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use super::banner::SuccessBanner;
use super::cache::TokenCache;
use super::executor::{Completion, RequestId};
use crate::error::Result;
use crate::model::{JoinResponse, JoinStatus, TokenRecord};

/// What reconciling one completed request did.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The class was joined; `record` is now the cached token record.
    Joined { record: TokenRecord },
    /// The server answered `"error"`. Nothing changed; the user may retry.
    Rejected { response: JoinResponse },
    /// The server answered with a status this client does not know.
    /// Nothing changed.
    Unrecognized { status: String, response: JoinResponse },
    /// This request was reconciled before; no effects this time.
    AlreadyHandled { id: RequestId },
}

impl Reconciliation {
    pub fn is_joined(&self) -> bool {
        matches!(self, Reconciliation::Joined { .. })
    }
}

/// Request ids that are done with, either reconciled or retired.
///
/// Every id below `below` is settled; `ahead` holds settled ids past the
/// first gap, so it only grows while an older request is still running.
#[derive(Debug)]
struct Settled {
    below: u64,
    ahead: BTreeSet<u64>,
}

impl Settled {
    fn new() -> Self {
        Self {
            below: RequestId::FIRST.get(),
            ahead: BTreeSet::new(),
        }
    }

    /// Returns `false` if `id` was already settled.
    fn insert(&mut self, id: RequestId) -> bool {
        let id = id.get();
        if id < self.below || !self.ahead.insert(id) {
            return false;
        }
        while self.ahead.remove(&self.below) {
            self.below += 1;
        }
        true
    }
}

/// Fires the cache write and banner exactly once per completed request.
#[derive(Debug)]
pub struct Reconciler {
    cache: TokenCache,
    banner: SuccessBanner,
    settled: Mutex<Settled>,
}

impl Reconciler {
    pub fn new(cache: TokenCache, banner: SuccessBanner) -> Self {
        Self {
            cache,
            banner,
            settled: Mutex::new(Settled::new()),
        }
    }

    /// Mark a request that will never be reconciled (cancelled or failed).
    pub fn retire(&self, id: RequestId) {
        self.settled.lock().unwrap_or_else(PoisonError::into_inner).insert(id);
    }

    pub fn reconcile(&self, completion: &Completion) -> Result<Reconciliation> {
        let Completion { id, response } = completion;

        let first_time = self
            .settled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*id);
        if !first_time {
            log::debug!("join request {id} already reconciled");
            return Ok(Reconciliation::AlreadyHandled { id: *id });
        }

        match response.status() {
            JoinStatus::Success => {
                let record = TokenRecord::try_from(response).inspect_err(|e| {
                    log::error!("join request {id} succeeded but {e}");
                })?;
                self.cache.publish(record.clone());
                self.banner.show();
                log::info!("join request {id}: class joined");
                Ok(Reconciliation::Joined { record })
            }
            JoinStatus::Error => {
                log::warn!("join request {id} rejected: {}", rejection_message(response));
                Ok(Reconciliation::Rejected {
                    response: response.clone(),
                })
            }
            JoinStatus::Other(status) => {
                log::warn!("join request {id} returned unrecognized status {status:?}");
                Ok(Reconciliation::Unrecognized {
                    status: status.clone(),
                    response: response.clone(),
                })
            }
        }
    }
}

/// Best human-readable reason the server gave, if any.
pub fn rejection_message(response: &JoinResponse) -> String {
    ["message", "error", "detail"]
        .iter()
        .find_map(|field| response.get(field).and_then(|v| v.as_str()))
        .unwrap_or("the class code was not accepted")
        .to_string()
}
