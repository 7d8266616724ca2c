//! The session store: who is logged in, for the whole process.
//!
//! State machine:
//!
//! ```text
//! Uninitialized --initialize()--> LoggedOut | LoggedIn
//! LoggedOut     --login()-------> LoggedIn
//! LoggedIn      --logout()------> LoggedOut   (explicit, expiry, or a 401)
//! ```
//!
//! Decode and expiry problems never escape as errors from `initialize`; they
//! settle the session as logged out. Shells gate rendering on
//! `wait_until_loaded` (or on `Session::is_loading`) before making any
//! decision that depends on the user.

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{watch, OnceCell};
use tracing::{debug, error, info, warn};

use super::notify::{Notice, Notifier};
use super::storage::TokenVault;
use super::token::{decode_claims, TokenError, UserId};
use crate::api::LogoutHandler;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid token: {0}")]
    Decode(#[from] TokenError),

    #[error("Token has already expired")]
    Expired,

    #[error("Token storage failed: {0:#}")]
    Storage(anyhow::Error),
}

/// Snapshot of the session as seen by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<UserId>,
    pub is_loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user_id: None,
            is_loading: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    LoggedOut,
    LoggedIn(UserId),
}

/// What `initialize` found in storage
enum Restored {
    Empty,
    Unreadable,
    Invalid,
    Expired,
    Active(UserId),
}

pub struct SessionStore {
    vault: TokenVault,
    notifier: Arc<dyn Notifier>,
    session: watch::Sender<Session>,
    initialized: OnceCell<()>,
}

impl SessionStore {
    pub fn new(vault: TokenVault, notifier: Arc<dyn Notifier>) -> Self {
        let (session, _) = watch::channel(Session::default());
        Self {
            vault,
            notifier,
            session,
            initialized: OnceCell::new(),
        }
    }

    /// Restore the session from storage.
    ///
    /// Only the first call touches storage; every later call (concurrent or
    /// not) waits for that one and returns the current snapshot.
    pub async fn initialize(&self) -> Session {
        self.initialized.get_or_init(|| self.restore()).await;
        self.session()
    }

    async fn restore(&self) {
        // Published under the vault lock so the snapshot always matches storage
        let restored = self
            .vault
            .with_storage(|storage| {
                let restored = match storage.load() {
                    Ok(None) => Restored::Empty,
                    Err(e) => {
                        error!(error = %format!("{:#}", e), "Failed to read stored token");
                        Restored::Unreadable
                    }
                    Ok(Some(token)) => match decode_claims(&token) {
                        Err(e) => {
                            error!(error = %e, "Failed to decode stored token");
                            Restored::Invalid
                        }
                        Ok(claims) if claims.is_expired() => {
                            if let Err(e) = storage.clear() {
                                error!(error = %format!("{:#}", e), "Failed to clear expired token");
                            }
                            Restored::Expired
                        }
                        Ok(claims) => Restored::Active(claims.id),
                    },
                };
                let user_id = match &restored {
                    Restored::Active(user_id) => Some(user_id.clone()),
                    _ => None,
                };
                self.publish(user_id);
                restored
            })
            .await;

        match restored {
            Restored::Active(user_id) => info!(user_id = %user_id, "Session restored"),
            Restored::Expired => {
                info!("Stored token expired, forcing logout");
                self.notifier.notify(&Notice::session_expired());
            }
            Restored::Empty => debug!("No stored token"),
            Restored::Unreadable | Restored::Invalid => {}
        }
    }

    /// Persist `token` and make its subject the current user.
    ///
    /// A token that does not decode, or that has already expired, is rejected
    /// before anything is written, and the session keeps its prior state. The
    /// same holds if persisting fails.
    pub async fn login(&self, token: &str) -> Result<UserId, SessionError> {
        let claims = decode_claims(token).map_err(|e| {
            error!(error = %e, "Rejected login token");
            SessionError::Decode(e)
        })?;

        if claims.is_expired() {
            warn!(exp = claims.exp, "Rejected login token that has already expired");
            return Err(SessionError::Expired);
        }

        self.vault
            .with_storage(|storage| -> anyhow::Result<()> {
                storage.store(token)?;
                self.publish(Some(claims.id.clone()));
                Ok(())
            })
            .await
            .map_err(|e| {
                error!(error = %format!("{:#}", e), "Failed to persist token");
                SessionError::Storage(e)
            })?;

        info!(user_id = %claims.id, "User logged in");
        Ok(claims.id)
    }

    /// Forget the stored token and the current user.
    ///
    /// Always ends logged out, even if storage cannot be cleared. With
    /// `notify`, the user is told their session expired.
    pub async fn logout(&self, notify: bool) {
        let cleared = self
            .vault
            .with_storage(|storage| {
                let cleared = storage.clear();
                self.publish(None);
                cleared
            })
            .await;
        if let Err(e) = cleared {
            error!(error = %format!("{:#}", e), "Failed to clear stored token");
        }
        info!(forced = notify, "User logged out");

        if notify {
            self.notifier.notify(&Notice::session_expired());
        }
    }

    /// Handle to give the request pipeline, so a 401 can end this session
    pub fn logout_handler(self: &Arc<Self>) -> Arc<dyn LogoutHandler> {
        self.clone()
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.session.borrow().user_id.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.borrow().user_id.is_some()
    }

    pub fn state(&self) -> SessionState {
        let session = self.session.borrow();
        match (&session.user_id, session.is_loading) {
            (Some(id), _) => SessionState::LoggedIn(id.clone()),
            (None, true) => SessionState::Uninitialized,
            (None, false) => SessionState::LoggedOut,
        }
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Resolve once the session has settled (`is_loading == false`)
    pub async fn wait_until_loaded(&self) -> Session {
        let mut rx = self.session.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|s| !s.is_loading).await;
        self.session()
    }

    fn publish(&self, user_id: Option<UserId>) {
        self.session.send_replace(Session {
            user_id,
            is_loading: false,
        });
    }
}

impl LogoutHandler for SessionStore {
    fn force_logout(&self, notify: bool) -> BoxFuture<'_, ()> {
        Box::pin(self.logout(notify))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::notify::test_support::RecordingNotifier;
    use crate::auth::storage::test_support::FlakyStorage;
    use crate::auth::storage::MemoryStorage;
    use crate::auth::token::test_support::{expired_token, make_token, valid_token};
    use std::sync::atomic::Ordering;

    fn store_with(vault: TokenVault) -> (SessionStore, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (SessionStore::new(vault, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn test_initialize_with_valid_token() {
        let vault = TokenVault::in_memory();
        vault.write(&valid_token("u1")).await.unwrap();
        let (store, notifier) = store_with(vault);

        assert_eq!(store.state(), SessionState::Uninitialized);
        let session = store.initialize().await;

        assert_eq!(session.user_id, Some(UserId::from("u1")));
        assert!(!session.is_loading);
        assert_eq!(store.state(), SessionState::LoggedIn(UserId::from("u1")));
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_initialize_with_expired_token_forces_logout() {
        let vault = TokenVault::in_memory();
        vault.write(&expired_token("u2")).await.unwrap();
        let (store, notifier) = store_with(vault.clone());

        let session = store.initialize().await;

        assert_eq!(session.user_id, None);
        assert!(!session.is_loading);
        assert_eq!(notifier.notices(), vec![Notice::session_expired()]);
        assert_eq!(vault.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_initialize_without_token() {
        let (store, notifier) = store_with(TokenVault::in_memory());

        let session = store.initialize().await;

        assert_eq!(session, Session { user_id: None, is_loading: false });
        assert_eq!(store.state(), SessionState::LoggedOut);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_initialize_with_garbage_token() {
        let vault = TokenVault::in_memory();
        vault.write("not-a-token").await.unwrap();
        let (store, notifier) = store_with(vault.clone());

        let session = store.initialize().await;

        assert_eq!(session.user_id, None);
        assert!(!session.is_loading);
        assert_eq!(notifier.count(), 0);
        // Left in place; only expiry or logout removes it
        assert!(vault.read().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_initialize_with_unreadable_storage() {
        let storage = Arc::new(FlakyStorage::default());
        storage.fail_reads.store(true, Ordering::SeqCst);
        let (store, notifier) = store_with(TokenVault::new(storage));

        let session = store.initialize().await;

        assert_eq!(session.user_id, None);
        assert!(!session.is_loading);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let vault = TokenVault::in_memory();
        vault.write(&expired_token("u2")).await.unwrap();
        let (store, notifier) = store_with(vault.clone());

        store.initialize().await;
        // A fresh token written afterwards is not picked up by a second call
        vault.write(&valid_token("u3")).await.unwrap();
        let second = store.initialize().await;

        assert_eq!(second.user_id, None);
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_initialize_restores_once() {
        let vault = TokenVault::in_memory();
        vault.write(&expired_token("u2")).await.unwrap();
        let (store, notifier) = store_with(vault);
        let store = Arc::new(store);

        let a = tokio::spawn({
            let store = store.clone();
            async move { store.initialize().await }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move { store.initialize().await }
        });
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_login_then_initialize_restores_same_user() {
        let vault = TokenVault::in_memory();
        let (store, _) = store_with(vault.clone());
        store.initialize().await;

        let user = store.login(&valid_token("u1")).await.unwrap();
        assert_eq!(user, UserId::from("u1"));

        // Next app start sees the same user
        let (restarted, _) = store_with(vault);
        let session = restarted.initialize().await;
        assert_eq!(session.user_id, Some(UserId::from("u1")));
        assert!(!session.is_loading);
    }

    #[tokio::test]
    async fn test_login_with_numeric_backend_id() {
        let (store, _) = store_with(TokenVault::in_memory());
        let token = make_token(serde_json::json!({
            "sub": "ana@example.com",
            "id": 7,
            "exp": chrono::Utc::now().timestamp() + 600
        }));

        store.login(&token).await.unwrap();

        assert_eq!(store.user_id(), Some(UserId::from(7)));
    }

    #[tokio::test]
    async fn test_login_settles_loading_before_initialize() {
        let (store, _) = store_with(TokenVault::in_memory());
        store.login(&valid_token("u1")).await.unwrap();
        assert!(!store.session().is_loading);
    }

    #[tokio::test]
    async fn test_login_rejects_undecodable_token_and_keeps_state() {
        let vault = TokenVault::in_memory();
        let (store, _) = store_with(vault.clone());
        store.initialize().await;
        store.login(&valid_token("u1")).await.unwrap();

        let result = store.login("validToken").await;

        assert!(matches!(result, Err(SessionError::Decode(_))));
        assert_eq!(store.user_id(), Some(UserId::from("u1")));
        // The previous token is still the stored one
        let stored = vault.read().await.unwrap().unwrap();
        assert_eq!(decode_claims(&stored).unwrap().id, UserId::from("u1"));
    }

    #[tokio::test]
    async fn test_login_rejects_expired_token() {
        let vault = TokenVault::in_memory();
        let (store, notifier) = store_with(vault.clone());
        store.initialize().await;

        let result = store.login(&expired_token("u1")).await;

        assert!(matches!(result, Err(SessionError::Expired)));
        assert_eq!(store.state(), SessionState::LoggedOut);
        assert_eq!(vault.read().await.unwrap(), None);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_login_storage_failure_keeps_prior_state() {
        let storage = Arc::new(FlakyStorage::default());
        let (store, _) = store_with(TokenVault::new(storage.clone()));
        store.initialize().await;

        storage.fail_writes.store(true, Ordering::SeqCst);
        let result = store.login(&valid_token("u1")).await;

        assert!(matches!(result, Err(SessionError::Storage(_))));
        assert_eq!(store.state(), SessionState::LoggedOut);
    }

    #[tokio::test]
    async fn test_login_then_silent_logout() {
        let vault = TokenVault::in_memory();
        let (store, notifier) = store_with(vault.clone());
        store.initialize().await;
        store.login(&valid_token("u1")).await.unwrap();

        store.logout(false).await;

        assert_eq!(vault.read().await.unwrap(), None);
        assert_eq!(store.user_id(), None);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let vault = TokenVault::in_memory();
        let (store, _) = store_with(vault.clone());
        store.login(&valid_token("u1")).await.unwrap();

        store.logout(false).await;
        assert_eq!(store.user_id(), None);
        assert_eq!(vault.read().await.unwrap(), None);

        store.logout(false).await;
        assert_eq!(store.user_id(), None);
        assert_eq!(vault.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_forced_logout_notifies() {
        let (store, notifier) = store_with(TokenVault::in_memory());
        store.login(&valid_token("u1")).await.unwrap();

        store.logout(true).await;

        assert_eq!(store.state(), SessionState::LoggedOut);
        assert_eq!(notifier.notices(), vec![Notice::session_expired()]);
    }

    #[tokio::test]
    async fn test_logout_clears_state_even_if_storage_fails() {
        let storage = Arc::new(FlakyStorage::default());
        let (store, _) = store_with(TokenVault::new(storage.clone()));
        store.login(&valid_token("u1")).await.unwrap();

        storage.fail_writes.store(true, Ordering::SeqCst);
        store.logout(false).await;

        assert_eq!(store.user_id(), None);
    }

    #[tokio::test]
    async fn test_no_token_resurrection_after_logout() {
        let vault = TokenVault::new(MemoryStorage::new());
        let (store, _) = store_with(vault.clone());
        store.initialize().await;
        store.login(&valid_token("u1")).await.unwrap();
        store.login(&valid_token("u2")).await.unwrap();
        store.logout(false).await;

        let (restarted, _) = store_with(vault);
        assert_eq!(restarted.initialize().await.user_id, None);
    }

    #[tokio::test]
    async fn test_wait_until_loaded_resolves_after_initialize() {
        let vault = TokenVault::in_memory();
        vault.write(&valid_token("u1")).await.unwrap();
        let (store, _) = store_with(vault);
        let store = Arc::new(store);

        let waiter = tokio::spawn({
            let store = store.clone();
            async move { store.wait_until_loaded().await }
        });
        store.initialize().await;

        let session = waiter.await.unwrap();
        assert!(!session.is_loading);
        assert_eq!(session.user_id, Some(UserId::from("u1")));
    }

    #[tokio::test]
    async fn test_subscribers_see_logout() {
        let (store, _) = store_with(TokenVault::in_memory());
        store.login(&valid_token("u1")).await.unwrap();
        let mut rx = store.subscribe();

        store.logout(false).await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().user_id, None);
    }

    #[tokio::test]
    async fn test_logout_handler_forces_notified_logout() {
        let (store, notifier) = store_with(TokenVault::in_memory());
        let store = Arc::new(store);
        store.login(&valid_token("u1")).await.unwrap();

        store.logout_handler().force_logout(true).await;

        assert_eq!(store.user_id(), None);
        assert_eq!(notifier.count(), 1);
    }

    async fn assert_matches_storage(store: &SessionStore, vault: &TokenVault) {
        let stored = vault.read().await.unwrap();
        let stored_id = stored.map(|token| decode_claims(&token).unwrap().id);
        assert_eq!(store.user_id(), stored_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_login_and_logout_agree_with_storage() {
        for _ in 0..200 {
            let vault = TokenVault::in_memory();
            let (store, _) = store_with(vault.clone());
            let store = Arc::new(store);
            store.initialize().await;

            let login = tokio::spawn({
                let store = store.clone();
                async move { store.login(&valid_token("u1")).await }
            });
            let logout = tokio::spawn({
                let store = store.clone();
                async move { store.logout(false).await }
            });
            login.await.unwrap().unwrap();
            logout.await.unwrap();

            assert_matches_storage(&store, &vault).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_initialize_and_logout_agree_with_storage() {
        for _ in 0..200 {
            let vault = TokenVault::in_memory();
            vault.write(&valid_token("u1")).await.unwrap();
            let (store, _) = store_with(vault.clone());
            let store = Arc::new(store);

            let init = tokio::spawn({
                let store = store.clone();
                async move { store.initialize().await }
            });
            let logout = tokio::spawn({
                let store = store.clone();
                async move { store.logout(false).await }
            });
            init.await.unwrap();
            logout.await.unwrap();

            assert_matches_storage(&store, &vault).await;
            assert!(!store.session().is_loading);
        }
    }
}
