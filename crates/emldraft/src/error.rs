//! Error types for draft composition.

use crate::markup::RenderError;
use thiserror::Error;

/// Errors that can occur while composing a draft.
#[derive(Debug, Error)]
pub enum Error {
    /// Message assembly failed.
    #[error("MIME error: {0}")]
    Mime(#[from] emldraft_mime::Error),

    /// The draft has no primary recipient.
    #[error("Draft has no To recipients")]
    EmptyRecipients,

    /// The markup renderer failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Options could not be deserialized.
    #[error("Options error: {0}")]
    Options(#[from] serde_json::Error),

    /// The `date` option is not a valid RFC 2822 or RFC 3339 timestamp.
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
