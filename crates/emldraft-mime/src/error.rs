//! Error types for MIME assembly.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed email address.
    #[error("Invalid address {input:?}: {reason}")]
    AddressSyntax {
        /// The text that failed to parse.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// Invalid multipart structure.
    #[error("Invalid multipart structure: {0}")]
    InvalidMultipart(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid Message-ID.
    #[error("Invalid Message-ID: {0}")]
    InvalidMessageId(String),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Header that may only be produced by the serializer.
    #[error("Header {0} cannot be set as an additional header")]
    ReservedHeader(String),

    /// Message built without a sender.
    #[error("Missing required From address")]
    MissingFrom,
}

impl Error {
    pub(crate) fn address(input: &str, reason: &'static str) -> Self {
        Self::AddressSyntax {
            input: input.to_string(),
            reason,
        }
    }
}
