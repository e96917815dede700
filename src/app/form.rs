//! The "enter a class code" form without its layout.
//!
//! `JoinClassForm` wires the credential holder, the two token providers, the
//! executor and the reconciler into the submit workflow:
//!
//! 1. the code is snapshotted and the input cleared, synchronously;
//! 2. both tokens are resolved, failing with `TokenUnavailable` if either is
//!    not ready (optionally after waiting `JoinConfig::token_wait`);
//! 3. the request runs inside a child of the form's cancellation scope;
//! 4. the completion is reconciled exactly once.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::banner::{BannerState, SuccessBanner};
use super::cache::TokenCache;
use super::credential::CredentialHolder;
use super::executor::{JoinExecutor, RequestState};
use super::reconcile::{Reconciler, Reconciliation, rejection_message};
use super::tokens::{TokenSource, TokenStatus};
use crate::config::{JoinConfig, SubmitPolicy};
use crate::error::{Error, ErrorKind, Result, TokenKind};
use crate::interface::JoinApi;
use crate::model::{AuthTokens, JoinRequest};

/// User-visible message about the last submit that did not join a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The server said `"error"`.
    Rejected(String),
    /// The server answered with a status the client does not understand.
    Unrecognized(String),
    /// The request could not be made or its answer could not be read.
    Failed(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Rejected(m) | Notice::Unrecognized(m) | Notice::Failed(m) => m,
        }
    }
}

pub struct JoinClassForm<C> {
    config: JoinConfig,
    credential: CredentialHolder,
    cache: TokenCache,
    csrf: TokenSource<String>,
    executor: JoinExecutor<C>,
    reconciler: Reconciler,
    banner: SuccessBanner,
    notice: watch::Sender<Option<Notice>>,
    scope: CancellationToken,
    submits: AtomicU64,
    in_flight: Mutex<InFlight>,
}

/// The newest submit that has started sending, by submit order.
#[derive(Debug, Default)]
struct InFlight {
    newest: u64,
    current: Option<(u64, CancellationToken)>,
}

impl<C: JoinApi> JoinClassForm<C> {
    pub fn new(client: C, config: JoinConfig, cache: TokenCache, csrf: TokenSource<String>) -> Self {
        let banner = SuccessBanner::new();
        let (notice, _) = watch::channel(None);
        Self {
            config,
            credential: CredentialHolder::new(),
            reconciler: Reconciler::new(cache.clone(), banner.clone()),
            cache,
            csrf,
            executor: JoinExecutor::new(client),
            banner,
            notice,
            scope: CancellationToken::new(),
            submits: AtomicU64::new(0),
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    pub fn set_code(&self, value: impl Into<String>) {
        self.credential.set_code(value);
    }

    pub fn code(&self) -> String {
        self.credential.code()
    }

    pub fn subscribe_code(&self) -> watch::Receiver<String> {
        self.credential.subscribe()
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn banner(&self) -> &SuccessBanner {
        &self.banner
    }

    pub fn banner_visible(&self) -> bool {
        self.banner.state() == BannerState::Visible
    }

    pub fn dismiss_banner(&self) {
        self.banner.dismiss();
    }

    pub fn request_state(&self) -> RequestState {
        self.executor.state()
    }

    pub fn subscribe_request_state(&self) -> watch::Receiver<RequestState> {
        self.executor.subscribe()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.borrow().clone()
    }

    pub fn subscribe_notice(&self) -> watch::Receiver<Option<Notice>> {
        self.notice.subscribe()
    }

    /// Tear the form down. In-flight requests are cancelled and nothing they
    /// return is written to the cache or the banner.
    pub fn close(&self) {
        self.scope.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Submit the current code.
    ///
    /// The code is captured and the submit's place in line is fixed when this
    /// is called, not when the returned future is first polled.
    pub fn submit(&self) -> impl Future<Output = Result<Reconciliation>> + '_ {
        let code = self.credential.take_snapshot();
        let seq = self.submits.fetch_add(1, Ordering::Relaxed) + 1;
        self.notice.send_replace(None);
        self.submit_request(seq, JoinRequest::new(code))
    }

    async fn submit_request(&self, seq: u64, request: JoinRequest) -> Result<Reconciliation> {
        let tokens = match self.resolve_tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                log::warn!("join not sent: {e}");
                self.post_notice(Notice::Failed(e.to_string()));
                return Err(e);
            }
        };

        let Some(cancel) = self.request_scope(seq) else {
            log::debug!("submit {seq} was superseded before it was sent");
            return Err(ErrorKind::Cancelled.into());
        };
        let id = self.executor.begin();
        let outcome = self.executor.execute(id, &request, &tokens, &cancel).await;
        self.release_scope(seq);

        let completion = match outcome {
            Ok(completion) => completion,
            Err(e) => {
                self.reconciler.retire(id);
                if !matches!(e.kind(), ErrorKind::Cancelled) {
                    self.post_notice(Notice::Failed(e.to_string()));
                }
                return Err(e);
            }
        };

        let reconciliation = self.reconciler.reconcile(&completion);
        match &reconciliation {
            Ok(Reconciliation::Rejected { response }) => {
                self.post_notice(Notice::Rejected(rejection_message(response)));
            }
            Ok(Reconciliation::Unrecognized { status, .. }) => {
                self.post_notice(Notice::Unrecognized(format!(
                    "the server answered with an unexpected status {status:?}"
                )));
            }
            Err(e) => self.post_notice(Notice::Failed(e.to_string())),
            Ok(_) => {}
        }
        reconciliation
    }

    async fn resolve_tokens(&self) -> Result<AuthTokens> {
        if let Some(wait) = self.config.token_wait {
            self.wait_for_tokens(wait).await;
        }

        let access = ready_or_unavailable(self.cache.access_token(), TokenKind::Access)?;
        let csrf = ready_or_unavailable(self.csrf.status(), TokenKind::Csrf)?;
        Ok(AuthTokens::new(access, csrf))
    }

    #[cfg(feature = "no-wasm")]
    async fn wait_for_tokens(&self, wait: std::time::Duration) {
        let settled = async { tokio::join!(self.cache.wait_settled(), self.csrf.wait_settled()) };
        tokio::select! {
            _ = tokio::time::timeout(wait, settled) => {}
            _ = self.scope.cancelled() => {}
        }
    }

    // No timer without the tokio runtime; the wait ends when both providers
    // settle or the form closes.
    #[cfg(not(feature = "no-wasm"))]
    async fn wait_for_tokens(&self, _wait: std::time::Duration) {
        let settled = async { tokio::join!(self.cache.wait_settled(), self.csrf.wait_settled()) };
        tokio::select! {
            _ = settled => {}
            _ = self.scope.cancelled() => {}
        }
    }

    /// Cancellation scope for submit `seq`, or `None` if a later submit has
    /// already started and this one must not be sent.
    fn request_scope(&self, seq: u64) -> Option<CancellationToken> {
        let token = self.scope.child_token();
        if self.config.submit_policy != SubmitPolicy::SupersedePrevious {
            return Some(token);
        }

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if seq < in_flight.newest {
            return None;
        }
        if let Some((previous, previous_token)) = in_flight.current.replace((seq, token.clone())) {
            log::debug!("submit {seq} supersedes submit {previous}");
            previous_token.cancel();
        }
        in_flight.newest = seq;
        Some(token)
    }

    fn release_scope(&self, seq: u64) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(in_flight.current, Some((current, _)) if current == seq) {
            in_flight.current = None;
        }
    }

    fn post_notice(&self, notice: Notice) {
        self.notice.send_replace(Some(notice));
    }
}

fn ready_or_unavailable(status: TokenStatus<String>, kind: TokenKind) -> Result<String> {
    match status {
        TokenStatus::Ready(token) => Ok(token),
        TokenStatus::Loading => Err(Error::new(ErrorKind::TokenUnavailable(kind))),
        TokenStatus::Failed(reason) => {
            log::warn!("{kind} provider failed: {reason}");
            Err(Error::new(ErrorKind::TokenUnavailable(kind)))
        }
    }
}
