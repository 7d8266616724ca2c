//! Core library for OutfitCheck clients.
//!
//! This crate holds everything a client shell needs below the UI:
//!
//! - `auth`: the session store, token decoding, persistent token storage
//!   and the user-facing notification channel
//! - `api`: the request pipeline and the typed REST client for the backend
//! - `models`: serde types for the backend's JSON payloads
//! - `config`: persisted client configuration
//! - `utils`: small display helpers shared by front ends

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, LogoutHandler, RequestPipeline};
pub use auth::{
    LogNotifier, Notice, NoticeLevel, Notifier, Session, SessionError, SessionState,
    SessionStore, TokenClaims, TokenVault, UserId,
};
pub use config::{Config, StorageBackend};
