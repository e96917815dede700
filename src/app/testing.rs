//! In-memory `JoinApi` whose replies the test hands out one by one.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{ErrorKind, Result};
use crate::interface::JoinApi;
use crate::model::{JoinParams, JoinResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub class_code: String,
    pub access_token: String,
    pub csrf_token: String,
}

#[derive(Default)]
pub struct ScriptedApi {
    calls: RefCell<Vec<RecordedCall>>,
    replies: RefCell<VecDeque<oneshot::Receiver<Result<JoinResponse>>>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply that is already available.
    pub fn reply(&self, body: Value) {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(response(body)));
        self.replies.borrow_mut().push_back(rx);
    }

    pub fn fail(&self, kind: ErrorKind) {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(kind.into()));
        self.replies.borrow_mut().push_back(rx);
    }

    /// Queue a reply the test completes later through the returned sender.
    pub fn deferred(&self) -> oneshot::Sender<Result<JoinResponse>> {
        let (tx, rx) = oneshot::channel();
        self.replies.borrow_mut().push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl JoinApi for ScriptedApi {
    async fn join_class(&self, params: JoinParams<'_>) -> Result<JoinResponse> {
        self.calls.borrow_mut().push(RecordedCall {
            class_code: params.class_code.to_string(),
            access_token: params.access_token.to_string(),
            csrf_token: params.csrf_token.to_string(),
        });

        let reply = self.replies.borrow_mut().pop_front();
        match reply {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ErrorKind::ConfigError("reply dropped".to_string()).into())),
            None => panic!("no scripted reply for class code {:?}", params.class_code),
        }
    }
}

pub fn response(body: Value) -> JoinResponse {
    serde_json::from_value(body).expect("scripted reply must be a JSON object")
}
