//! Transport status taxonomy and the fault classifier.
//!
//! [`StatusCode`] is the closed set of status codes an RPC transport can
//! report (the gRPC code space). [`classify`] maps each code onto a
//! transport-agnostic [`Severity`]. Codes with no meaningful severity map to
//! [`Severity::Unclassified`], which tells the caller to propagate the
//! original transport error untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status code reported by a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl StatusCode {
    /// Every code the transport defines, in numeric order.
    pub const ALL: [StatusCode; 17] = [
        Self::Ok,
        Self::Cancelled,
        Self::Unknown,
        Self::InvalidArgument,
        Self::DeadlineExceeded,
        Self::NotFound,
        Self::AlreadyExists,
        Self::PermissionDenied,
        Self::ResourceExhausted,
        Self::FailedPrecondition,
        Self::Aborted,
        Self::OutOfRange,
        Self::Unimplemented,
        Self::Internal,
        Self::Unavailable,
        Self::DataLoss,
        Self::Unauthenticated,
    ];

    /// Converts a wire value. Returns `None` for values outside the code space.
    #[must_use]
    pub fn from_i32(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Aborted => "ABORTED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::DataLoss => "DATA_LOSS",
            Self::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized category of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    NotFound,
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    Unavailable,
    Internal,
    /// No mapping exists; the raw transport error must be propagated.
    Unclassified,
}

impl Severity {
    #[must_use]
    pub fn is_classified(self) -> bool {
        self != Self::Unclassified
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "permission_denied",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
            Self::Unclassified => "unclassified",
        }
    }

    /// HTTP status an outward-facing layer should answer with.
    ///
    /// `None` for [`Severity::Unclassified`].
    #[must_use]
    pub fn http_status(self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::InvalidArgument => Some(400),
            Self::Unauthenticated => Some(401),
            Self::PermissionDenied => Some(403),
            Self::Unavailable => Some(503),
            Self::Internal => Some(500),
            Self::Unclassified => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a transport status code to its severity.
///
/// Total over [`StatusCode`] and free of side effects.
#[must_use]
pub fn classify(code: StatusCode) -> Severity {
    match code {
        StatusCode::NotFound => Severity::NotFound,
        StatusCode::InvalidArgument
        | StatusCode::AlreadyExists
        | StatusCode::FailedPrecondition
        | StatusCode::OutOfRange => Severity::InvalidArgument,
        StatusCode::Unauthenticated => Severity::Unauthenticated,
        StatusCode::PermissionDenied => Severity::PermissionDenied,
        StatusCode::Unavailable
        | StatusCode::DeadlineExceeded
        | StatusCode::ResourceExhausted => Severity::Unavailable,
        StatusCode::Internal | StatusCode::DataLoss | StatusCode::Unimplemented => {
            Severity::Internal
        }
        StatusCode::Ok | StatusCode::Cancelled | StatusCode::Unknown | StatusCode::Aborted => {
            Severity::Unclassified
        }
    }
}

/// Classifies a raw wire value. Values outside the code space are unclassified.
#[must_use]
pub fn classify_raw(code: i32) -> Severity {
    StatusCode::from_i32(code).map_or(Severity::Unclassified, classify)
}
