//! Apple Mail draft compatibility headers.
//!
//! Apple Mail only treats an imported `.eml` as an editable draft when it
//! carries a fixed set of extension headers. [`AppleOverlay`] derives a new
//! [`Message`] with those headers set; the input message is not modified, so
//! one base message can feed several variants.

use crate::error::{Error, Result};
use crate::message::Message;
use crate::source::random_uuid;
use rand::RngCore;

/// `Mime-Version` as written by Apple Mail, including its product tag.
pub const APPLE_MIME_VERSION: &str = "1.0 (Mac OS X Mail 16.0 \\(3731.500.231\\))";

/// Base URL marker Apple Mail uses for local drafts.
pub const APPLE_BASE_URL: &str = "x-msg://1/";

/// Uniform type identifier of a Mail draft.
pub const DRAFT_TYPE_IDENTIFIER: &str = "com.apple.mail-draft";

/// Sets the Apple Mail draft headers on a copy of a message.
///
/// Applying the same overlay twice yields the same headers: every entry is
/// written with replace semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleOverlay {
    universal_id: String,
}

impl AppleOverlay {
    /// Creates an overlay with a caller-chosen universal identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the identifier is empty or holds
    /// anything but visible ASCII.
    pub fn new(universal_id: impl Into<String>) -> Result<Self> {
        let universal_id = universal_id.into();
        if universal_id.is_empty() || !universal_id.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::InvalidHeader(format!(
                "invalid universal identifier {universal_id:?}"
            )));
        }
        Ok(Self { universal_id })
    }

    /// Creates an overlay with a fresh random identifier (upper-case UUID).
    pub fn generate(rng: &mut dyn RngCore) -> Self {
        Self {
            universal_id: random_uuid(rng).hyphenated().to_string().to_uppercase(),
        }
    }

    /// Returns the universal identifier.
    #[must_use]
    pub fn universal_id(&self) -> &str {
        &self.universal_id
    }

    /// The seven headers this overlay sets, in output order.
    #[must_use]
    pub fn headers(&self) -> [(&'static str, String); 7] {
        [
            ("Mime-Version", APPLE_MIME_VERSION.to_string()),
            ("X-Apple-Base-Url", APPLE_BASE_URL.to_string()),
            (
                "X-Universally-Unique-Identifier",
                self.universal_id.clone(),
            ),
            ("X-Apple-Mail-Remote-Attachments", "YES".to_string()),
            ("X-Apple-Windows-Friendly", "1".to_string()),
            ("X-Apple-Auto-Saved", "1".to_string()),
            ("X-Uniform-Type-Identifier", DRAFT_TYPE_IDENTIFIER.to_string()),
        ]
    }

    /// Returns a copy of `message` with the Apple headers set.
    #[must_use]
    pub fn apply(&self, message: &Message) -> Message {
        tracing::debug!(
            universal_id = %self.universal_id,
            message_id = message.message_id(),
            "applying Apple Mail overlay"
        );
        message.with_trusted_headers(self.headers())
    }
}

/// Applies the Apple Mail overlay, generating a universal identifier from
/// `rng` when none is given.
///
/// # Errors
///
/// Returns [`Error::InvalidHeader`] for an invalid `universal_id`.
pub fn overlay(
    message: &Message,
    universal_id: Option<&str>,
    rng: &mut dyn RngCore,
) -> Result<Message> {
    let overlay = match universal_id {
        Some(id) => AppleOverlay::new(id)?,
        None => AppleOverlay::generate(rng),
    };
    Ok(overlay.apply(message))
}
