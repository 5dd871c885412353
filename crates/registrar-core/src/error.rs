//! Error types for the registrar reconciliation engine
//!
//! Variants are grouped the way callers have to react to them:
//! validation and business-rule failures are terminal, convergence failures
//! may be retried on a later reconciliation cycle, and transport failures are
//! passed through from the [`Registrar`](crate::traits::Registrar) untouched.

use std::fmt;
use thiserror::Error;

/// Result type alias for registrar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of failures reported by a registrar adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Credentials rejected or insufficient permissions
    Unauthorized,
    /// The addressed resource does not exist on the registrar
    NotFound,
    /// The registrar throttled the request
    RateLimited,
    /// Network failure, timeout or registrar-side 5xx
    Unavailable,
    /// The request or the response could not be understood
    Malformed,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not found",
            Self::RateLimited => "rate limited",
            Self::Unavailable => "unavailable",
            Self::Malformed => "malformed",
        };
        f.write_str(name)
    }
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A registrar timestamp did not match the expected layout
    #[error("Malformed timestamp '{value}': {reason}")]
    MalformedTimestamp {
        /// The offending input
        value: String,
        /// Parser diagnostic
        reason: String,
    },

    /// Fewer name servers than the registrar accepts
    #[error("At least {required} name servers are required, got {actual}")]
    InsufficientNameServers {
        /// Minimum accepted count
        required: usize,
        /// Count after normalization
        actual: usize,
    },

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The domain is registered to someone else
    #[error("Domain is not available for purchase: {0}")]
    NotAvailable(String),

    /// The registrar's quote exceeds the caller's ceiling
    #[error("Quoted price of {quoted_micros} micro-units exceeds the maximum of {max_micros}")]
    Overpriced {
        /// Registrar quote in micro-units
        quoted_micros: u64,
        /// Caller ceiling in micro-units
        max_micros: u64,
    },

    /// A mutation did not become visible within the poll budget
    #[error("{operation} did not converge after {attempts} attempt(s); last seen: {last_seen}")]
    ConvergenceTimeout {
        /// What was being waited for
        operation: String,
        /// Number of check invocations
        attempts: u32,
        /// Debug rendering of the last check result
        last_seen: String,
    },

    /// Polling was aborted through a [`CancelSignal`](crate::poller::CancelSignal)
    #[error("{operation} was cancelled")]
    Cancelled {
        /// What was being waited for
        operation: String,
    },

    /// Failure reported by the registrar adapter
    #[error("Registrar error ({kind}): {message}")]
    Registrar {
        /// Failure classification
        kind: TransportErrorKind,
        /// Registrar-provided detail, verbatim
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O errors (manifest loading)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a malformed timestamp error
    pub fn malformed_timestamp(value: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::MalformedTimestamp {
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a registrar error of the given kind
    pub fn registrar(kind: TransportErrorKind, msg: impl Into<String>) -> Self {
        Self::Registrar {
            kind,
            message: msg.into(),
        }
    }

    /// Create an authentication error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::registrar(TransportErrorKind::Unauthorized, msg)
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::registrar(TransportErrorKind::NotFound, msg)
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::registrar(TransportErrorKind::RateLimited, msg)
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::registrar(TransportErrorKind::Unavailable, msg)
    }

    /// Create a malformed request/response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::registrar(TransportErrorKind::Malformed, msg)
    }

    /// Transport classification, if this error came from the registrar
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Registrar { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the registrar reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        self.transport_kind() == Some(TransportErrorKind::NotFound)
    }

    /// Whether a later reconciliation cycle may succeed without input changes
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConvergenceTimeout { .. } => true,
            Self::Registrar { kind, .. } => matches!(
                kind,
                TransportErrorKind::RateLimited | TransportErrorKind::Unavailable
            ),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
