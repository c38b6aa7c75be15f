//! Axum handlers and the state they share.

pub mod books;
pub mod health;
pub mod users;

pub use health::{health_handler, liveness_handler, readiness_handler};

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::middleware::REQUEST_ID_HEADER;
use super::{NetworkConfig, ShutdownController};
use crate::context::RequestContext;
use crate::repository::CachedBookRepository;
use crate::rpc::UserClient;

/// State cloned into every handler. All fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub shutdown: Arc<ShutdownController>,
    pub config: Arc<NetworkConfig>,
    /// Used for uptime reporting.
    pub start_time: Instant,
    pub books: Arc<CachedBookRepository>,
    /// `None` when no user service is wired in.
    pub users: Option<Arc<UserClient>>,
}

/// Builds the per-request context: the request id becomes the trace id and
/// the configured request timeout becomes the deadline.
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = match parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some(id) => RequestContext::with_trace_id(id),
            None => RequestContext::new(),
        };
        Ok(ctx.with_timeout(state.config.request_timeout))
    }
}
