//! Errors produced at the RPC boundary.

use folio_core::Severity;

use super::client::TransportError;

/// A remote failure normalized to a [`Severity`].
///
/// Built once by [`RpcCaller`](super::RpcCaller) and handed upward as-is.
/// Callers decide on `severity` and `message`; the cause is kept for
/// diagnostics only.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    severity: Severity,
    message: String,
    #[source]
    cause: TransportError,
}

impl ClassifiedError {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>, cause: TransportError) -> Self {
        Self {
            severity,
            message: message.into(),
            cause,
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Message reported by the remote side.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of a failed call through [`RpcCaller`](super::RpcCaller).
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Failed below the status layer; passed through untranslated.
    #[error(transparent)]
    Transport(TransportError),
    /// Carried a status with no severity mapping; passed through untranslated.
    #[error(transparent)]
    Unclassified(TransportError),
    #[error(transparent)]
    Classified(#[from] ClassifiedError),
    /// The request could not be encoded or the response could not be decoded.
    #[error("rpc payload codec error: {0:#}")]
    Codec(anyhow::Error),
}

impl RpcError {
    /// Severity of a classified failure, `None` otherwise.
    #[must_use]
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Self::Classified(e) => Some(e.severity()),
            _ => None,
        }
    }

    /// The untranslated transport error, if this failure was passed through.
    #[must_use]
    pub fn into_transport(self) -> Option<TransportError> {
        match self {
            Self::Transport(e) | Self::Unclassified(e) => Some(e),
            Self::Classified(_) | Self::Codec(_) => None,
        }
    }
}
