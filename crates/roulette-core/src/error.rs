//! Lookup failure taxonomy.
//!
//! Every network failure is folded into a `LookupError` at the client
//! boundary; the orchestrator only ever inspects `kind` to decide between
//! "show and stop" and "retry".

use std::fmt;

/// Message shown once transient failures have used up every attempt.
pub const CONNECTION_UNSTABLE: &str = "Connection unstable. Please try once more in a few seconds.";

/// Fallback when an error body carries no `error` field.
pub const REQUEST_FAILED: &str = "Request failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid input or a 4xx-class response. Shown verbatim, never retried.
    UserFacing,
    /// 5xx, non-JSON body or no response at all. Eligible for retry.
    Transient,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UserFacing => write!(f, "user-facing"),
            ErrorKind::Transient => write!(f, "transient"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct LookupError {
    pub kind: ErrorKind,
    pub message: String,
}

impl LookupError {
    pub fn user_facing(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UserFacing,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::Transient
    }

    /// Text for the error banner. Transient failures never leak server detail.
    pub fn display_message(&self) -> &str {
        match self.kind {
            ErrorKind::UserFacing => &self.message,
            ErrorKind::Transient => CONNECTION_UNSTABLE,
        }
    }
}
