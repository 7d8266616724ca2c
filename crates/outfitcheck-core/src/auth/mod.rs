//! Authentication module for managing the signed-in user.
//!
//! This module provides:
//! - `SessionStore`: single source of truth for who is logged in
//! - `TokenVault`: serialized access to the persisted bearer token
//! - `TokenClaims`: locally decoded (never verified) token payload
//! - `Notifier`: the toast-style channel used on forced logout
//!
//! The raw token only ever lives in storage. The session keeps the decoded
//! subject identifier and re-reads storage when a request needs the token.

pub mod notify;
pub mod session;
pub mod storage;
pub mod token;

pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use session::{Session, SessionError, SessionState, SessionStore};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, TokenStorage, TokenVault};
pub use token::{decode_claims, TokenClaims, TokenError, UserId};
