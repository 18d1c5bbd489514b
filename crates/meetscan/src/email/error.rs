//! Mail source error types.

use thiserror::Error;

/// Errors that can occur while talking to the mail server.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Failed to connect to the IMAP server.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No usable credential could be resolved.
    #[error("Credentials not found: {0}")]
    CredentialsNotFound(String),

    /// IMAP protocol error.
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse a fetched message.
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    /// Folder not found.
    #[error("IMAP folder '{0}' not found")]
    FolderNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The server did not return the requested message.
    #[error("Message with UID {0} not found")]
    MessageNotFound(u32),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// A call was made before `connect` succeeded.
    #[error("Not connected")]
    NotConnected,
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

impl From<crate::secrets::SecretError> for EmailError {
    fn from(err: crate::secrets::SecretError) -> Self {
        EmailError::CredentialsNotFound(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for EmailError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        EmailError::Timeout(err.to_string())
    }
}

/// Result type for email operations.
pub type Result<T> = std::result::Result<T, EmailError>;
