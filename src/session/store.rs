//! Client-held session state.
//!
//! The store is a cheap handle over a `watch` channel: every write publishes
//! a new [`Session`] snapshot, so views can subscribe instead of polling.
//! Overlapping calls to [`SessionStore::fetch_authenticated_user`] are not
//! serialized; the one that finishes last decides the final state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::auth::services::{lookup_current_user, UserLookup};
use crate::auth::User;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub is_loading: bool,
}

impl Default for Session {
    /// Starts optimistically loading until the first reconciliation.
    fn default() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            is_loading: true,
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears `is_loading` when dropped, whichever way reconciliation ends.
struct LoadingGuard<'a> {
    store: &'a SessionStore,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn set_is_authenticated(&self, value: bool) {
        self.tx.send_modify(|s| s.is_authenticated = value);
    }

    pub fn set_user(&self, user: Option<User>) {
        self.tx.send_modify(|s| s.user = user);
    }

    pub fn set_loading(&self, value: bool) {
        self.tx.send_modify(|s| s.is_loading = value);
    }

    fn settle(&self, user: Option<User>) {
        self.tx.send_modify(|s| {
            s.is_authenticated = user.is_some();
            s.user = user;
        });
    }

    /// Refresh the session from the backend. Lookup failures are logged and
    /// treated as signed out; nothing is returned to the caller.
    pub async fn fetch_authenticated_user(&self, st: &AppState) {
        self.set_loading(true);
        let _loading = LoadingGuard { store: self };

        match lookup_current_user(st).await {
            UserLookup::Found(user) => {
                debug!(user_id = %user.id, "session authenticated");
                self.settle(Some(user));
            }
            UserLookup::NotFound => {
                debug!("no profile for current account");
                self.settle(None);
            }
            UserLookup::TransportError(detail) => {
                warn!(error = %detail, "fetch_authenticated_user failed");
                self.settle(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::CreateUserParams;
    use crate::auth::services::{create_user, sign_out};
    use crate::backend::Backend;
    use crate::error::BackendError;
    use serde_json::json;
    use std::time::Duration;

    fn assert_settled(session: &Session) {
        assert!(!session.is_loading);
        assert_eq!(session.is_authenticated, session.user.is_some());
    }

    async fn sign_up(st: &AppState) {
        create_user(
            st,
            CreateUserParams {
                email: "jane@example.com".into(),
                password: "password123".into(),
                name: "Jane Doe".into(),
            },
        )
        .await
        .expect("create user");
    }

    #[test]
    fn starts_unauthenticated_and_loading() {
        let store = SessionStore::new();
        assert_eq!(
            store.snapshot(),
            Session {
                is_authenticated: false,
                user: None,
                is_loading: true,
            }
        );
    }

    #[test]
    fn raw_setters_do_not_enforce_invariant() {
        let store = SessionStore::new();
        store.set_is_authenticated(true);
        let s = store.snapshot();
        assert!(s.is_authenticated);
        assert!(s.user.is_none());
        store.set_loading(false);
        assert!(!store.snapshot().is_loading);
    }

    #[tokio::test]
    async fn no_current_account_settles_signed_out() {
        let (st, _fake) = AppState::fake();
        let store = SessionStore::new();
        store.fetch_authenticated_user(&st).await;

        let s = store.snapshot();
        assert!(!s.is_authenticated);
        assert!(s.user.is_none());
        assert_settled(&s);
    }

    #[tokio::test]
    async fn found_profile_is_projected() {
        let (st, fake) = AppState::fake();
        fake.create_account("A1", "a1@example.com", "password123", "A One")
            .await
            .expect("account");
        fake.create_email_password_session("a1@example.com", "password123")
            .await
            .expect("session");
        let cfg = &st.config.appwrite;
        fake.seed_document(
            &cfg.database_id,
            &cfg.user_collection_id,
            json!({
                "$id": "U1",
                "$collectionId": "users",
                "$databaseId": "db",
                "$createdAt": "2025-07-27T10:00:00.000+00:00",
                "$updatedAt": "2025-07-28T10:00:00.000+00:00",
                "$permissions": ["read(\"user:A1\")"],
                "$sequence": 7,
                "$tenant": "ignored",
                "accountId": "A1",
                "name": "A One",
                "email": "a1@example.com",
                "avatar": "https://fake.local/v1/avatars/initials?name=A+One&project=test",
                "favourite": "pizza"
            }),
        )
        .await;

        let store = SessionStore::new();
        store.fetch_authenticated_user(&st).await;
        let s = store.snapshot();
        assert!(s.is_authenticated);
        assert_settled(&s);

        let user = serde_json::to_value(s.user.expect("user")).expect("serialize");
        assert_eq!(
            user,
            json!({
                "$id": "U1",
                "$collectionId": "users",
                "$databaseId": "db",
                "$createdAt": "2025-07-27T10:00:00.000+00:00",
                "$updatedAt": "2025-07-28T10:00:00.000+00:00",
                "$permissions": ["read(\"user:A1\")"],
                "$sequence": 7,
                "name": "A One",
                "email": "a1@example.com",
                "avatar": "https://fake.local/v1/avatars/initials?name=A+One&project=test"
            })
        );
    }

    #[tokio::test]
    async fn account_without_profile_settles_signed_out() {
        let (st, fake) = AppState::fake();
        fake.create_account("A1", "a1@example.com", "password123", "A One")
            .await
            .expect("account");
        fake.create_email_password_session("a1@example.com", "password123")
            .await
            .expect("session");

        let store = SessionStore::new();
        store.set_is_authenticated(true);
        store.fetch_authenticated_user(&st).await;
        let s = store.snapshot();
        assert!(!s.is_authenticated);
        assert_settled(&s);
    }

    #[tokio::test]
    async fn backend_failure_is_swallowed() {
        let (st, fake) = AppState::fake();
        sign_up(&st).await;
        let store = SessionStore::new();
        store.fetch_authenticated_user(&st).await;
        assert!(store.snapshot().is_authenticated);

        fake.set_failure(Some(BackendError::Request("connection reset".into())))
            .await;
        store.fetch_authenticated_user(&st).await;
        let s = store.snapshot();
        assert!(!s.is_authenticated);
        assert!(s.user.is_none());
        assert_settled(&s);
    }

    #[tokio::test]
    async fn sign_out_then_fetch_is_signed_out() {
        let (st, _fake) = AppState::fake();
        sign_up(&st).await;
        let store = SessionStore::new();
        store.fetch_authenticated_user(&st).await;
        assert!(store.snapshot().is_authenticated);

        sign_out(&st).await.expect("sign out");
        store.fetch_authenticated_user(&st).await;
        let s = store.snapshot();
        assert!(!s.is_authenticated);
        assert!(s.user.is_none());
        assert_settled(&s);
    }

    #[tokio::test]
    async fn invariant_holds_after_fetch_whatever_the_setters_did() {
        let (st, _fake) = AppState::fake();
        sign_up(&st).await;
        let store = SessionStore::new();
        store.fetch_authenticated_user(&st).await;
        let real_user = store.snapshot().user;

        let sequences: Vec<Vec<(Option<bool>, Option<Option<User>>)>> = vec![
            vec![(Some(false), None)],
            vec![(None, Some(None)), (Some(true), None)],
            vec![(Some(true), Some(None)), (Some(false), Some(real_user.clone()))],
            vec![(None, Some(real_user.clone())), (Some(false), None)],
        ];
        for seq in sequences {
            for (auth, user) in seq {
                if let Some(auth) = auth {
                    store.set_is_authenticated(auth);
                }
                if let Some(user) = user {
                    store.set_user(user);
                }
            }
            store.fetch_authenticated_user(&st).await;
            let s = store.snapshot();
            assert_settled(&s);
            assert_eq!(s.user, real_user);
        }
    }

    #[tokio::test]
    async fn dropped_fetch_still_clears_loading() {
        let (st, fake) = AppState::fake();
        fake.set_stalled(true);
        let store = SessionStore::new();

        let res = tokio::time::timeout(
            Duration::from_millis(50),
            store.fetch_authenticated_user(&st),
        )
        .await;
        assert!(res.is_err(), "stalled lookup should time out");
        assert!(!store.snapshot().is_loading);
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_settled() {
        let (st, _fake) = AppState::fake();
        let store = SessionStore::new();
        store.set_loading(false);
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.fetch_authenticated_user(&st).await;
        assert!(rx.has_changed().expect("sender alive"));
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen, store.snapshot());
        assert_settled(&seen);
    }
}
