//! Outbound RPC: transport seam, call wrapper, and failure normalization.
//!
//! Callers above this module only ever see [`RpcError`]; a status the
//! transport attached to a failure is either classified into a
//! [`Severity`](folio_core::Severity) or passed through untouched.

pub mod call;
pub mod client;
pub mod error;
pub mod user;

pub use call::{normalize, RpcCaller};
pub use client::{RpcClient, RpcStatus, TransportError};
pub use error::{ClassifiedError, RpcError};
pub use user::{SignIn, SignUp, Tokens, UpdateUser, User, UserClient};
