//! The RPC call wrapper: one outbound call, failures normalized.

use std::sync::Arc;

use bytes::Bytes;
use folio_core::{classify_raw, Codec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use super::client::{RpcClient, TransportError};
use super::error::{ClassifiedError, RpcError};
use crate::context::RequestContext;

/// Issues typed calls against one remote service.
///
/// Each [`call`](Self::call) makes exactly one attempt. Retrying, if wanted,
/// is the caller's business.
#[derive(Clone)]
pub struct RpcCaller {
    service: &'static str,
    client: Arc<dyn RpcClient>,
    codec: Codec,
}

impl RpcCaller {
    /// Creates a caller that encodes payloads as JSON.
    #[must_use]
    pub fn new(service: &'static str, client: Arc<dyn RpcClient>) -> Self {
        Self {
            service,
            client,
            codec: Codec::Json,
        }
    }

    #[must_use]
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Sends `request` as `operation` and decodes the response.
    ///
    /// Every failure is logged at error level before it is returned.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Classified`] when the failure carried a mapped status
    /// - [`RpcError::Unclassified`] / [`RpcError::Transport`] with the raw
    ///   transport error otherwise
    /// - [`RpcError::Codec`] if the payloads cannot be encoded or decoded
    pub async fn call<Req, Resp>(
        &self,
        ctx: &RequestContext,
        operation: &str,
        request: &Req,
    ) -> Result<Resp, RpcError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = self.codec.encode(request).map_err(|err| {
            error!(
                service = self.service,
                operation,
                trace_id = %ctx.trace_id,
                error = %format!("{err:#}"),
                "failed to encode request"
            );
            RpcError::Codec(err)
        })?;

        let outcome = match ctx
            .run(self.client.invoke(ctx, operation, Bytes::from(payload)))
            .await
        {
            Ok(outcome) => outcome,
            Err(interrupted) => Err(TransportError::connection(interrupted)),
        };

        match outcome {
            Ok(body) => self.codec.decode(&body).map_err(|err| {
                error!(
                    service = self.service,
                    operation,
                    trace_id = %ctx.trace_id,
                    error = %format!("{err:#}"),
                    "failed to decode response"
                );
                RpcError::Codec(err)
            }),
            Err(err) => {
                error!(
                    service = self.service,
                    operation,
                    trace_id = %ctx.trace_id,
                    error = %err,
                    "error from remote service"
                );
                Err(normalize(err))
            }
        }
    }
}

/// Converts a transport failure into an [`RpcError`].
///
/// A missing status or an unclassifiable one leaves the transport error
/// untouched; otherwise it becomes the cause of a [`ClassifiedError`].
#[must_use]
pub fn normalize(err: TransportError) -> RpcError {
    let Some(status) = err.rpc_status() else {
        return RpcError::Transport(err);
    };

    let severity = classify_raw(status.code);
    if !severity.is_classified() {
        return RpcError::Unclassified(err);
    }

    let message = status.message.clone();
    RpcError::Classified(ClassifiedError::new(severity, message, err))
}
