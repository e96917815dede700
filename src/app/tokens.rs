//! Boundary to the token-acquisition hooks.
//!
//! How tokens are fetched and refreshed lives outside this crate. That code
//! writes into a [`TokenSource`]; the join form only reads from it.

use std::sync::Arc;

use tokio::sync::watch;

/// Loading/success/error status of an asynchronously obtained token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> TokenStatus<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, TokenStatus::Ready(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, TokenStatus::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            TokenStatus::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TokenStatus<U> {
        match self {
            TokenStatus::Loading => TokenStatus::Loading,
            TokenStatus::Ready(value) => TokenStatus::Ready(f(value)),
            TokenStatus::Failed(reason) => TokenStatus::Failed(reason),
        }
    }
}

/// Shared, observable slot for one token. Clones share the same slot.
#[derive(Debug)]
pub struct TokenSource<T> {
    tx: Arc<watch::Sender<TokenStatus<T>>>,
}

impl<T> Clone for TokenSource<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone> Default for TokenSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> TokenSource<T> {
    /// A source that has not produced a token yet.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TokenStatus::Loading);
        Self { tx: Arc::new(tx) }
    }

    pub fn ready(value: T) -> Self {
        let source = Self::new();
        source.set_ready(value);
        source
    }

    pub fn set_loading(&self) {
        self.tx.send_replace(TokenStatus::Loading);
    }

    pub fn set_ready(&self, value: T) {
        self.tx.send_replace(TokenStatus::Ready(value));
    }

    pub fn set_failed(&self, reason: impl Into<String>) {
        self.tx.send_replace(TokenStatus::Failed(reason.into()));
    }

    pub fn status(&self) -> TokenStatus<T> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TokenStatus<T>> {
        self.tx.subscribe()
    }

    /// Wait until the source is no longer loading and return what it settled on.
    pub async fn wait_settled(&self) -> TokenStatus<T> {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        match rx.wait_for(|status| !status.is_loading()).await {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_loading() {
        let source: TokenSource<String> = TokenSource::new();
        assert_eq!(source.status(), TokenStatus::Loading);
    }

    #[test]
    fn clones_share_the_slot() {
        let source = TokenSource::new();
        let handle = source.clone();

        handle.set_ready("csrf-1".to_string());
        assert_eq!(source.status().ready().map(String::as_str), Some("csrf-1"));

        handle.set_failed("expired");
        assert_eq!(source.status(), TokenStatus::Failed("expired".to_string()));
    }

    #[test]
    fn map_keeps_the_state() {
        let status = TokenStatus::Ready(2).map(|n| n * 10);
        assert_eq!(status, TokenStatus::Ready(20));
        assert_eq!(TokenStatus::<u8>::Loading.map(|n| n + 1), TokenStatus::Loading);
    }

    #[tokio::test]
    async fn wait_settled_returns_once_loaded() {
        let source: TokenSource<String> = TokenSource::new();
        let writer = source.clone();

        let (status, ()) = tokio::join!(source.wait_settled(), async move {
            tokio::task::yield_now().await;
            writer.set_ready("late".to_string());
        });

        assert_eq!(status, TokenStatus::Ready("late".to_string()));
    }

    #[tokio::test]
    async fn wait_settled_returns_failure_too() {
        let source: TokenSource<String> = TokenSource::new();
        source.set_failed("no session");
        assert_eq!(source.wait_settled().await, TokenStatus::Failed("no session".to_string()));
    }
}
