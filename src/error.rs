//! Crate-wide error type.
//!
//! Every fallible operation in `courier` returns [`DnsError`]. Parse and
//! verification failures are surfaced to the caller; ID mismatches during a
//! resolver call are recovered internally and never escape as an error.

use thiserror::Error;

/// TSIG verification outcomes that map onto a DNS rcode (RFC 8945 §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsigErrorCode {
    BadKey,
    BadSig,
    BadTime,
    FormErr,
}

impl std::fmt::Display for TsigErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TsigErrorCode::BadKey => "BADKEY",
            TsigErrorCode::BadSig => "BADSIG",
            TsigErrorCode::BadTime => "BADTIME",
            TsigErrorCode::FormErr => "FORMERR",
        };
        f.write_str(s)
    }
}

pub type Result<T> = std::result::Result<T, DnsError>;

#[derive(Debug, Error)]
pub enum DnsError {
    /// Wire parse failure: bad name, bad RDLENGTH, TSIG not last, pointer loop.
    #[error("malformed DNS message: {0}")]
    Malformed(String),

    /// Text-form parse requested for a type that has none (e.g. TSIG).
    #[error("no text format defined for {0}")]
    NoTextFormat(String),

    /// Caller-side contract violation: unknown algorithm, oversized name, etc.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// Deadline elapsed waiting for a reply.
    #[error("operation timed out")]
    Timeout,

    /// Transport-level failure (socket error, connection refused, ...).
    #[error("network error: {0}")]
    NetworkError(String),

    /// TSIG verification did not succeed.
    #[error("TSIG verification failed: {0}")]
    TsigVerifyFailed(TsigErrorCode),

    /// Internal-only sentinel: a reply's ID did not match the request.
    /// Resolvers catch this and keep listening until the deadline; it is
    /// never returned from a public `send`/`send_async` call.
    #[error("response ID did not match request")]
    IdMismatch,

    /// Response was truncated and the caller opted out of TCP fallback.
    #[error("response truncated")]
    Truncated,

    #[error("cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DnsError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        DnsError::Malformed(msg.into())
    }

    pub fn illegal_argument(msg: impl Into<String>) -> Self {
        DnsError::IllegalArgument(msg.into())
    }
}
