//! Request pipeline: credentials out, authorization failures back in.
//!
//! Every request the `ApiClient` sends passes through `before_request`, and
//! every failed response through `on_response_error`. The pipeline never
//! retries; callers decide what to do with the error it hands back.

use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::{debug, error, warn};

use super::endpoints::UNAUTHENTICATED;
use super::ApiError;
use crate::auth::TokenVault;

/// Ends the session when the backend rejects our credentials.
///
/// Implemented by `SessionStore`; injected into the pipeline so that a 401
/// from any screen's request logs the user out everywhere.
pub trait LogoutHandler: Send + Sync {
    fn force_logout(&self, notify: bool) -> BoxFuture<'_, ()>;
}

/// True for authentication bootstrap calls (login, registration)
pub fn is_unauthenticated(url: &str) -> bool {
    UNAUTHENTICATED.iter().any(|path| url.contains(path))
}

pub struct RequestPipeline {
    vault: TokenVault,
    logout_handler: RwLock<Option<Arc<dyn LogoutHandler>>>,
}

impl RequestPipeline {
    pub fn new(vault: TokenVault) -> Self {
        Self {
            vault,
            logout_handler: RwLock::new(None),
        }
    }

    pub fn with_logout_handler(self, handler: Arc<dyn LogoutHandler>) -> Self {
        self.set_logout_handler(handler);
        self
    }

    /// Install the handler invoked on a 401, replacing any previous one
    pub fn set_logout_handler(&self, handler: Arc<dyn LogoutHandler>) {
        let mut slot = self.logout_handler.write().unwrap_or_else(|e| e.into_inner());
        if slot.replace(handler).is_some() {
            debug!("Replaced logout handler");
        }
    }

    fn logout_handler(&self) -> Option<Arc<dyn LogoutHandler>> {
        self.logout_handler
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Attach `Authorization: Bearer <token>` unless the request is a login
    /// or registration call. Without a stored token the request goes out
    /// bare and the server decides.
    pub async fn before_request(&self, request: &mut reqwest::Request) {
        if is_unauthenticated(request.url().as_str()) {
            debug!(url = %request.url(), "Sending without credentials");
            return;
        }

        let token = match self.vault.read().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(url = %request.url(), "No stored token, sending without credentials");
                return;
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Failed to read stored token");
                return;
            }
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Stored token is not a valid header value, sending without credentials"),
        }
    }

    /// React to a failed request and hand the error back for the caller.
    ///
    /// A 401 from an authenticated endpoint clears the stored token and ends
    /// the session with a user-visible notice. Anything else passes through.
    pub async fn on_response_error(&self, url: &str, err: ApiError) -> ApiError {
        if !err.is_unauthorized() || is_unauthenticated(url) {
            return err;
        }

        warn!(url = url, "Request unauthorized, ending session");
        if let Err(e) = self.vault.clear().await {
            error!(error = %format!("{:#}", e), "Failed to clear stored token");
        }

        match self.logout_handler() {
            Some(handler) => handler.force_logout(true).await,
            None => warn!("Logout handler not set"),
        }
        err
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingHandler;
    use super::*;
    use crate::auth::notify::test_support::RecordingNotifier;
    use crate::auth::token::test_support::valid_token;
    use crate::auth::SessionStore;

    const BASE: &str = "http://localhost:8080";

    fn request(path: &str) -> reqwest::Request {
        reqwest::Client::new()
            .get(format!("{}{}", BASE, path))
            .header("X-Trace", "1")
            .build()
            .unwrap()
    }

    #[test]
    fn test_unauthenticated_matching() {
        assert!(is_unauthenticated("http://h:8080/users/login"));
        assert!(is_unauthenticated("http://h:8080/users/register?x=1"));
        assert!(!is_unauthenticated("http://h:8080/users/profile/1"));
        assert!(!is_unauthenticated("http://h:8080/api/clothing/user/1"));
    }

    #[tokio::test]
    async fn test_login_request_never_carries_token() {
        let vault = TokenVault::in_memory();
        vault.write("a.b.c").await.unwrap();
        let pipeline = RequestPipeline::new(vault);

        for path in ["/users/login", "/users/register"] {
            let mut req = request(path);
            pipeline.before_request(&mut req).await;
            assert!(req.headers().get(AUTHORIZATION).is_none(), "{} got a token", path);
        }
    }

    #[tokio::test]
    async fn test_token_attached_to_other_requests() {
        let vault = TokenVault::in_memory();
        vault.write("a.b.c").await.unwrap();
        let pipeline = RequestPipeline::new(vault);

        let mut req = request("/api/outfits/user/1");
        pipeline.before_request(&mut req).await;

        assert_eq!(req.headers().get(AUTHORIZATION).unwrap(), "Bearer a.b.c");
        // Existing headers are kept
        assert_eq!(req.headers().get("X-Trace").unwrap(), "1");
    }

    #[tokio::test]
    async fn test_no_token_no_header() {
        let pipeline = RequestPipeline::new(TokenVault::in_memory());
        let mut req = request("/api/posts");
        pipeline.before_request(&mut req).await;
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token_and_calls_handler_once() {
        let vault = TokenVault::in_memory();
        vault.write("a.b.c").await.unwrap();
        let handler = Arc::new(RecordingHandler::default());
        let pipeline = RequestPipeline::new(vault.clone()).with_logout_handler(handler.clone());

        let err = pipeline
            .on_response_error("http://h/api/posts", ApiError::Unauthorized)
            .await;

        assert!(err.is_unauthorized());
        assert_eq!(vault.read().await.unwrap(), None);
        assert_eq!(handler.calls(), vec![true]);
    }

    #[tokio::test]
    async fn test_other_errors_pass_through_untouched() {
        let vault = TokenVault::in_memory();
        vault.write("a.b.c").await.unwrap();
        let handler = Arc::new(RecordingHandler::default());
        let pipeline = RequestPipeline::new(vault.clone()).with_logout_handler(handler.clone());

        let err = pipeline
            .on_response_error("http://h/api/posts", ApiError::AccessDenied("no".into()))
            .await;

        assert!(matches!(err, ApiError::AccessDenied(_)));
        assert!(vault.read().await.unwrap().is_some());
        assert!(handler.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_login_does_not_force_logout() {
        let handler = Arc::new(RecordingHandler::default());
        let pipeline =
            RequestPipeline::new(TokenVault::in_memory()).with_logout_handler(handler.clone());

        let err = pipeline
            .on_response_error("http://h/users/login", ApiError::Unauthorized)
            .await;

        assert!(err.is_unauthorized());
        assert!(handler.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_handler_is_not_fatal() {
        let vault = TokenVault::in_memory();
        vault.write("a.b.c").await.unwrap();
        let pipeline = RequestPipeline::new(vault.clone());

        let err = pipeline
            .on_response_error("http://h/api/posts", ApiError::Unauthorized)
            .await;

        assert!(err.is_unauthorized());
        assert_eq!(vault.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_newer_handler_replaces_older() {
        let first = Arc::new(RecordingHandler::default());
        let second = Arc::new(RecordingHandler::default());
        let pipeline = RequestPipeline::new(TokenVault::in_memory()).with_logout_handler(first.clone());
        pipeline.set_logout_handler(second.clone());

        pipeline
            .on_response_error("http://h/api/posts", ApiError::Unauthorized)
            .await;

        assert!(first.calls().is_empty());
        assert_eq!(second.calls(), vec![true]);
    }

    #[tokio::test]
    async fn test_unauthorized_ends_session_store() {
        let vault = TokenVault::in_memory();
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(SessionStore::new(vault.clone(), notifier.clone()));
        store.initialize().await;
        store.login(&valid_token("u1")).await.unwrap();

        let pipeline = RequestPipeline::new(vault.clone()).with_logout_handler(store.logout_handler());
        pipeline
            .on_response_error("http://h/api/outfits/user/1", ApiError::Unauthorized)
            .await;

        assert_eq!(store.user_id(), None);
        assert_eq!(vault.read().await.unwrap(), None);
        assert_eq!(notifier.count(), 1);
    }
}
