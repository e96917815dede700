//! Shared `accessTokenResponse` record.
//!
//! Other parts of the application read the current token record from here and
//! the access token for the join request comes from it too. Inside this crate
//! only the reconciler writes to it, through [`TokenCache::publish`].

use tokio::sync::watch;

use super::tokens::{TokenSource, TokenStatus};
use crate::model::TokenRecord;

/// Logical key the record is known by across the application.
pub const ACCESS_TOKEN_RESPONSE: &str = "accessTokenResponse";

#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    source: TokenSource<TokenRecord>,
}

impl TokenCache {
    /// An empty cache; the access token counts as still loading.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: TokenRecord) -> Self {
        Self {
            source: TokenSource::ready(record),
        }
    }

    pub fn key(&self) -> &'static str {
        ACCESS_TOKEN_RESPONSE
    }

    pub fn status(&self) -> TokenStatus<TokenRecord> {
        self.source.status()
    }

    pub fn record(&self) -> Option<TokenRecord> {
        self.source.status().ready().cloned()
    }

    /// The access token as the join request sees it.
    pub fn access_token(&self) -> TokenStatus<String> {
        self.source
            .status()
            .map(|record| record.access_token().to_string())
    }

    pub fn subscribe(&self) -> watch::Receiver<TokenStatus<TokenRecord>> {
        self.source.subscribe()
    }

    pub async fn wait_settled(&self) -> TokenStatus<TokenRecord> {
        self.source.wait_settled().await
    }

    /// Entry points for the token-acquisition hook that owns login and refresh.
    pub fn refresh(&self, record: TokenRecord) {
        self.source.set_ready(record);
    }

    pub fn mark_loading(&self) {
        self.source.set_loading();
    }

    pub fn mark_failed(&self, reason: impl Into<String>) {
        self.source.set_failed(reason);
    }

    /// Overwrite the record wholesale after a successful join.
    pub(crate) fn publish(&self, record: TokenRecord) {
        log::debug!("publishing new {ACCESS_TOKEN_RESPONSE} record");
        self.source.set_ready(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(token: &str) -> TokenRecord {
        serde_json::from_value(json!({ "accessToken": token })).unwrap()
    }

    #[test]
    fn empty_cache_has_no_access_token() {
        let cache = TokenCache::new();
        assert_eq!(cache.access_token(), TokenStatus::Loading);
        assert!(cache.record().is_none());
        assert_eq!(cache.key(), "accessTokenResponse");
    }

    #[test]
    fn publish_is_seen_by_every_handle() {
        let cache = TokenCache::with_record(record("T1"));
        let reader = cache.clone();
        let mut rx = reader.subscribe();

        cache.publish(record("T2"));

        assert!(rx.has_changed().unwrap());
        assert_eq!(reader.access_token(), TokenStatus::Ready("T2".to_string()));
        assert_eq!(reader.record(), Some(record("T2")));
    }

    #[test]
    fn failed_refresh_surfaces_reason() {
        let cache = TokenCache::with_record(record("T1"));
        cache.mark_failed("refresh token expired");
        assert_eq!(
            cache.access_token(),
            TokenStatus::Failed("refresh token expired".to_string())
        );
    }
}
