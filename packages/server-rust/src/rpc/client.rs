//! The RPC transport seam.
//!
//! [`RpcClient`] is whatever can put a named operation on the wire and bring
//! back either a response payload or a [`TransportError`]. The transport
//! itself lives outside this crate; tests use in-process fakes.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use folio_core::StatusCode;

use crate::context::RequestContext;

/// Abstract call-capable client for a remote service.
///
/// Used as `Arc<dyn RpcClient>`.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Issues `operation` with an encoded request payload.
    ///
    /// Implementations must honor `ctx` (deadline and cancellation).
    async fn invoke(
        &self,
        ctx: &RequestContext,
        operation: &str,
        payload: Bytes,
    ) -> Result<Bytes, TransportError>;
}

/// Status attached to a failed call by the remote side or the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcStatus {
    /// Raw wire value; may fall outside [`StatusCode`].
    pub code: i32,
    pub message: String,
}

impl RpcStatus {
    #[must_use]
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_i32(),
            message: message.into(),
        }
    }

    /// Decoded status code, `None` if the wire value is unknown.
    #[must_use]
    pub fn code(&self) -> Option<StatusCode> {
        StatusCode::from_i32(self.code)
    }
}

impl fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => write!(f, "status {}: {}", self.code, self.message),
        }
    }
}

/// Failure reported by an [`RpcClient`].
///
/// Connection-level failures carry no status.
#[derive(Debug, thiserror::Error)]
#[error("{source:#}")]
pub struct TransportError {
    status: Option<RpcStatus>,
    source: anyhow::Error,
}

impl TransportError {
    /// A failure the remote side answered with a status.
    #[must_use]
    pub fn from_status(status: RpcStatus) -> Self {
        let source = anyhow::anyhow!("rpc error: {status}");
        Self {
            status: Some(status),
            source,
        }
    }

    /// Shorthand for [`from_status`](Self::from_status) with a known code.
    #[must_use]
    pub fn status(code: StatusCode, message: impl Into<String>) -> Self {
        Self::from_status(RpcStatus::new(code, message))
    }

    /// A failure below the status layer (refused connection, reset, etc.).
    #[must_use]
    pub fn connection(err: impl Into<anyhow::Error>) -> Self {
        Self {
            status: None,
            source: err.into(),
        }
    }

    #[must_use]
    pub fn rpc_status(&self) -> Option<&RpcStatus> {
        self.status.as_ref()
    }
}
