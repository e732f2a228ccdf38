//! In-memory per-session selection store.
//!
//! Sessions live for the lifetime of the process. Form posts mutate a session
//! under the write lock. A planning pass works on a snapshot and hands back
//! only its address lookup, which is dropped if the session moved on while
//! the pass was waiting on Maps.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header::COOKIE, HeaderMap};
use farmalog_core::SelectionState;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "farmalog_session";

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SelectionState>>>,
}

impl SessionStore {
    /// Current state of a session; a fresh default for unknown ids.
    pub async fn snapshot(&self, id: Uuid) -> SelectionState {
        self.inner.read().await.get(&id).cloned().unwrap_or_default()
    }

    /// Merges the address lookup of a pass that started from `before` and
    /// ended at `after`. See [`SelectionState::apply_lookup`].
    pub async fn apply_lookup(
        &self,
        id: Uuid,
        before: &SelectionState,
        after: &SelectionState,
    ) -> bool {
        let applied = self.update(id, |s| s.apply_lookup(before, after)).await;
        if !applied {
            tracing::debug!(session = %id, "session changed during planning pass; lookup discarded");
        }
        applied
    }

    /// Applies `f` to the session's state under the write lock.
    pub async fn update<F, T>(&self, id: Uuid, f: F) -> T
    where
        F: FnOnce(&mut SelectionState) -> T,
    {
        let mut sessions = self.inner.write().await;
        f(sessions.entry(id).or_default())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Session id from the `Cookie` header(s), if present and well-formed.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value for a session.
pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_session_among_other_cookies() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}; lang=es")).unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn malformed_or_missing_cookie_yields_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id_from_headers(&headers), None);

        headers.insert(
            COOKIE,
            HeaderValue::from_static("farmalog_session=not-a-uuid"),
        );
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn cookie_round_trips_through_header() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id);
        let pair = cookie.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(pair).unwrap());
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[tokio::test]
    async fn unknown_session_snapshots_default() {
        let store = SessionStore::default();
        let state = store.snapshot(Uuid::new_v4()).await;
        assert_eq!(state, SelectionState::default());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn stored_state_is_returned_and_isolated_per_session() {
        let store = SessionStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store
            .update(a, |s| s.select_origin(Some("Hub Norte".to_string())))
            .await;

        assert_eq!(
            store.snapshot(a).await.origin.as_deref(),
            Some("Hub Norte")
        );
        assert_eq!(store.snapshot(b).await, SelectionState::default());
    }

    #[tokio::test]
    async fn update_creates_and_mutates_in_place() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();

        store.update(id, |s| s.set_radius(2.0)).await;
        let changed = store.update(id, |s| s.set_address_query("Av. Amazonas")).await;

        assert!(changed);
        let state = store.snapshot(id).await;
        assert!((state.radius_km - 2.0).abs() < f64::EPSILON);
        assert_eq!(state.address_query, "Av. Amazonas");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn stale_lookup_does_not_undo_reset() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        store
            .update(id, |s| {
                s.select_origin(Some("Hub Norte".to_string()));
                s.set_address_query("Amazonas");
            })
            .await;

        let before = store.snapshot(id).await;
        let mut after = before.clone();
        after.resolve_destination(farmalog_core::Coordinate::new(-0.17, -78.48));

        store.update(id, SelectionState::reset).await;
        assert!(!store.apply_lookup(id, &before, &after).await);
        assert_eq!(store.snapshot(id).await, SelectionState::default());
    }
}
