//! Error types for sfsight.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! - **NotFound**: a lookup returned nothing or an invalid/empty payload
//!   (unknown account, endpoint missing required fields)
//! - **InvalidCredential**: authentication explicitly rejected by the server,
//!   with the server-supplied message and code preserved for display
//! - **ProtocolViolation**: the loopback listener received something other
//!   than the expected single GET carrying the token
//! - **Network/Timeout**: transport-level failures, never retried here
//! - **Config/Io/Json**: ambient failures around the pipeline
//!
//! Every pipeline stage fails fast: there is no partial-success session.

use thiserror::Error;

/// Exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Authentication rejected
    CredentialError = 2,
    /// Lookup or parse failure
    NotFound = 3,
    /// Timeout (network or SSO rendezvous)
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Main error type for sfsight operations.
#[derive(Error, Debug)]
pub enum SightError {
    /// A lookup call returned nothing, or a reply was missing required fields.
    #[error("not found: {0}")]
    NotFound(String),

    /// Authentication explicitly rejected by the server.
    ///
    /// `message` and `code` are the server-supplied values, preserved so the
    /// user sees what the service actually said (e.g. code `390100`).
    #[error("invalid credentials for {user}@{account}: {message} ({code})")]
    InvalidCredential {
        user: String,
        account: String,
        message: String,
        code: String,
    },

    /// The loopback listener received something other than the expected
    /// single GET with the token query prefix.
    #[error("SSO callback protocol violation: {0}")]
    ProtocolViolation(String),

    /// The bounded SSO rendezvous wait expired before the browser called back.
    #[error("timed out after {seconds}s waiting for the SSO browser callback")]
    SsoTimeout { seconds: u64 },

    /// Raw `Set-Cookie` header had no cookie with the required name prefix.
    #[error("no cookie with prefix '{prefix}' in response")]
    MissingCookie { prefix: String },

    /// Malformed cookie string.
    #[error("cookie parse error: {0}")]
    CookieParse(String),

    /// Transport-level failure. No retry is attempted; the calling pipeline
    /// stage decides whether this is fatal (it always is, today).
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out at the transport layer.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    /// Saved session context missing, corrupt, or otherwise unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SightError {
    /// Map error to a CLI exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidCredential { .. } => ExitCode::CredentialError,
            Self::NotFound(_)
            | Self::MissingCookie { .. }
            | Self::CookieParse(_)
            | Self::Config(_) => ExitCode::NotFound,
            Self::Timeout(_) | Self::SsoTimeout { .. } => ExitCode::Timeout,
            Self::ProtocolViolation(_)
            | Self::Network(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// True when the server itself rejected the credentials, as opposed to
    /// the pipeline failing to reach or parse it.
    #[must_use]
    pub const fn is_credential_rejection(&self) -> bool {
        matches!(self, Self::InvalidCredential { .. })
    }
}

/// Result type alias for sfsight operations.
pub type Result<T> = std::result::Result<T, SightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credential_message_carries_server_code() {
        let err = SightError::InvalidCredential {
            user: "JDOE".into(),
            account: "acme".into(),
            message: "Incorrect username or password was specified.".into(),
            code: "390100".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("390100"));
        assert!(rendered.contains("JDOE@acme"));
    }

    #[test]
    fn exit_codes_follow_taxonomy() {
        assert_eq!(
            SightError::NotFound("x".into()).exit_code(),
            ExitCode::NotFound
        );
        assert_eq!(
            SightError::SsoTimeout { seconds: 30 }.exit_code(),
            ExitCode::Timeout
        );
        assert_eq!(
            SightError::ProtocolViolation("POST".into()).exit_code(),
            ExitCode::GeneralError
        );
    }
}
