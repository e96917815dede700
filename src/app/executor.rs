//! Join-request executor.
//!
//! Issues one POST per submit and tracks it through `RequestState`. Requests
//! are not de-duplicated: two overlapping submits both run, and whichever
//! finishes last owns the final state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{ErrorKind, Result};
use crate::interface::JoinApi;
use crate::model::{AuthTokens, JoinParams, JoinRequest, JoinResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// The id of the first request an executor issues.
    pub const FIRST: RequestId = RequestId(1);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestState {
    #[default]
    Idle,
    Pending {
        id: RequestId,
    },
    Success {
        id: RequestId,
        response: JoinResponse,
    },
    Error {
        id: RequestId,
        message: String,
    },
}

impl RequestState {
    pub fn id(&self) -> Option<RequestId> {
        match self {
            RequestState::Idle => None,
            RequestState::Pending { id }
            | RequestState::Success { id, .. }
            | RequestState::Error { id, .. } => Some(*id),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending { .. })
    }
}

/// A request that came back with a parsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub id: RequestId,
    pub response: JoinResponse,
}

pub struct JoinExecutor<C> {
    client: C,
    state: watch::Sender<RequestState>,
    next_id: AtomicU64,
}

impl<C: JoinApi> JoinExecutor<C> {
    pub fn new(client: C) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            client,
            state,
            next_id: AtomicU64::new(RequestId::FIRST.0),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Issue a join request that cannot be cancelled.
    pub async fn submit(&self, request: &JoinRequest, tokens: &AuthTokens) -> Result<Completion> {
        let id = self.begin();
        self.execute(id, request, tokens, &CancellationToken::new()).await
    }

    /// Allocate an id and move to `Pending`.
    pub fn begin(&self) -> RequestId {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.state.send_replace(RequestState::Pending { id });
        id
    }

    /// Send the request for `id`, racing it against `cancel`.
    ///
    /// A cancelled request leaves no trace: if it was the latest one the state
    /// falls back to `Idle`, otherwise the newer request's state is kept.
    pub async fn execute(
        &self,
        id: RequestId,
        request: &JoinRequest,
        tokens: &AuthTokens,
        cancel: &CancellationToken,
    ) -> Result<Completion> {
        let call = self
            .client
            .join_class(JoinParams::new(tokens, &request.class_code));

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ErrorKind::Cancelled.into()),
            result = call => result,
        };

        match result {
            Ok(response) => {
                log::debug!("join request {id} completed with status {:?}", response.status().as_str());
                self.state.send_replace(RequestState::Success {
                    id,
                    response: response.clone(),
                });
                Ok(Completion { id, response })
            }
            Err(e) if matches!(e.kind(), ErrorKind::Cancelled) => {
                log::debug!("join request {id} cancelled");
                self.state.send_if_modified(|state| {
                    if *state != (RequestState::Pending { id }) {
                        return false;
                    }
                    *state = RequestState::Idle;
                    true
                });
                Err(e)
            }
            Err(e) => {
                log::error!("join request {id} failed: {e}");
                self.state.send_replace(RequestState::Error {
                    id,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{RecordedCall, ScriptedApi, response};
    use serde_json::json;

    fn tokens() -> AuthTokens {
        AuthTokens::new("access-1", "csrf-1")
    }

    #[tokio::test]
    async fn one_call_per_submit() {
        let api = ScriptedApi::new();
        api.reply(json!({ "status": "success", "accessToken": "T2" }));
        let executor = JoinExecutor::new(&api);

        let completion = executor.submit(&JoinRequest::new("MATH101"), &tokens()).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![RecordedCall {
                class_code: "MATH101".to_string(),
                access_token: "access-1".to_string(),
                csrf_token: "csrf-1".to_string(),
            }]
        );
        assert_eq!(
            executor.state(),
            RequestState::Success {
                id: completion.id,
                response: completion.response.clone(),
            }
        );
    }

    #[tokio::test]
    async fn pending_while_in_flight() {
        let api = ScriptedApi::new();
        let reply = api.deferred();
        let executor = JoinExecutor::new(&api);
        let request = JoinRequest::new("A");
        let tokens = tokens();

        assert_eq!(executor.state(), RequestState::Idle);

        let (result, ()) = tokio::join!(executor.submit(&request, &tokens), async {
            tokio::task::yield_now().await;
            assert!(executor.state().is_pending());
            let _ = reply.send(Ok(response(json!({ "status": "error" }))));
        });

        assert!(result.is_ok());
        assert!(matches!(executor.state(), RequestState::Success { .. }));
    }

    #[tokio::test]
    async fn transport_failure_moves_to_error() {
        let api = ScriptedApi::new();
        api.fail(ErrorKind::TimedOut);
        let executor = JoinExecutor::new(&api);

        let err = executor.submit(&JoinRequest::new("A"), &tokens()).await.unwrap_err();

        assert!(err.is_transport());
        match executor.state() {
            RequestState::Error { message, .. } => assert!(message.contains("timed out")),
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn last_completion_owns_the_state() {
        let api = ScriptedApi::new();
        let first_reply = api.deferred();
        let second_reply = api.deferred();
        let executor = JoinExecutor::new(&api);
        let tokens = tokens();
        let (first, second) = (JoinRequest::new("A"), JoinRequest::new("B"));
        let mut state = executor.subscribe();

        let (a, b, ()) = tokio::join!(
            executor.submit(&first, &tokens),
            executor.submit(&second, &tokens),
            async {
                let _ = second_reply.send(Ok(response(json!({ "status": "success", "accessToken": "B" }))));
                state
                    .wait_for(|s| matches!(s, RequestState::Success { .. }))
                    .await
                    .unwrap();
                let _ = first_reply.send(Ok(response(json!({ "status": "success", "accessToken": "A" }))));
            }
        );

        let a = a.unwrap();
        assert!(b.is_ok());
        assert_eq!(
            executor.state(),
            RequestState::Success {
                id: a.id,
                response: a.response,
            }
        );
    }

    #[tokio::test]
    async fn cancelled_request_returns_to_idle() {
        let api = ScriptedApi::new();
        let _reply = api.deferred();
        let executor = JoinExecutor::new(&api);
        let cancel = CancellationToken::new();
        let request = JoinRequest::new("A");
        let tokens = tokens();

        let id = executor.begin();
        let (result, ()) = tokio::join!(executor.execute(id, &request, &tokens, &cancel), async {
            tokio::task::yield_now().await;
            cancel.cancel();
        });

        assert!(matches!(result.unwrap_err().kind(), ErrorKind::Cancelled));
        assert_eq!(executor.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn cancelled_older_request_keeps_newer_state() {
        let api = ScriptedApi::new();
        let executor = JoinExecutor::new(&api);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let older = executor.begin();
        let newer = executor.begin();
        let err = executor
            .execute(older, &JoinRequest::new("A"), &tokens(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::Cancelled));
        assert_eq!(executor.state(), RequestState::Pending { id: newer });
        assert!(api.calls().is_empty());
    }
}
