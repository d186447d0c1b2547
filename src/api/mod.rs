//! HTTP API.
//!
//! Exposes the labeling pipeline and the Session Store as JSON endpoints
//! under `/api/`. Handlers are thin: they validate, then call into
//! `pipeline::labeling`, `sessions`, `review` and `export`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server, LabelServer, ServerError};
pub use types::ApiContext;
