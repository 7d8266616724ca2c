//! REST API access for the OutfitCheck backend.
//!
//! - `RequestPipeline`: attaches the stored bearer token to outgoing requests
//!   and turns a 401 into a forced logout
//! - `ApiClient`: typed endpoints, every call routed through the pipeline
//! - `endpoints`: the backend's URL paths
//!
//! Login and registration are the only calls sent without credentials.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod pipeline;

pub use client::ApiClient;
pub use error::ApiError;
pub use pipeline::{LogoutHandler, RequestPipeline};
