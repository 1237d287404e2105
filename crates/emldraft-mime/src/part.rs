//! Leaf MIME body parts.

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_quoted_printable, normalize_crlf};
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TransferEncoding {
    /// 7-bit ASCII, passed through.
    SevenBit,
    /// 8-bit text, passed through.
    EightBit,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Base64 encoding.
    Base64,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "7bit" => Some(Self::SevenBit),
            "8bit" => Some(Self::EightBit),
            "quoted-printable" => Some(Self::QuotedPrintable),
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }

    /// Returns the `Content-Transfer-Encoding` token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
        }
    }

    /// Transforms raw content into transport-safe content.
    ///
    /// Pass-through encodings only normalize line endings to CRLF.
    #[must_use]
    pub fn encode(self, raw: &[u8]) -> Vec<u8> {
        match self {
            Self::SevenBit | Self::EightBit => normalize_crlf(raw),
            Self::QuotedPrintable => encode_quoted_printable(raw).into_bytes(),
            Self::Base64 => encode_base64_wrapped(raw).into_bytes(),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leaf content unit of a message.
///
/// Immutable once built; the encoded form is computed at construction so
/// rendering and boundary checks see the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    content_type: ContentType,
    transfer_encoding: TransferEncoding,
    raw_content: Vec<u8>,
    encoded: Vec<u8>,
}

impl BodyPart {
    /// Creates a part, encoding `raw_content` with `transfer_encoding`.
    #[must_use]
    pub fn new(
        content_type: ContentType,
        transfer_encoding: TransferEncoding,
        raw_content: impl Into<Vec<u8>>,
    ) -> Self {
        let raw_content = raw_content.into();
        if transfer_encoding == TransferEncoding::SevenBit && !raw_content.is_ascii() {
            tracing::warn!(
                content_type = %content_type,
                "7bit part carries non-ASCII bytes"
            );
        }
        let encoded = transfer_encoding.encode(&raw_content);
        Self {
            content_type,
            transfer_encoding,
            raw_content,
            encoded,
        }
    }

    /// `text/plain; charset=UTF-8`, 7bit.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(
            ContentType::text_plain(),
            TransferEncoding::SevenBit,
            content.into(),
        )
    }

    /// `text/html; charset=UTF-8`, 7bit.
    #[must_use]
    pub fn html(content: impl Into<String>) -> Self {
        Self::new(
            ContentType::text_html(),
            TransferEncoding::SevenBit,
            content.into(),
        )
    }

    /// Returns the content type.
    #[must_use]
    pub const fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Returns the transfer encoding.
    #[must_use]
    pub const fn transfer_encoding(&self) -> TransferEncoding {
        self.transfer_encoding
    }

    /// Returns the content before transfer encoding.
    #[must_use]
    pub fn raw_content(&self) -> &[u8] {
        &self.raw_content
    }

    /// Returns the content after transfer encoding.
    #[must_use]
    pub fn encoded_content(&self) -> &[u8] {
        &self.encoded
    }

    /// Renders the part: its two content headers, a blank line, and the
    /// encoded content.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded.len() + 96);
        out.extend_from_slice(self.header_block().as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.encoded);
        out
    }

    fn header_block(&self) -> String {
        format!(
            "Content-Type: {}\r\nContent-Transfer-Encoding: {}\r\n",
            self.content_type, self.transfer_encoding
        )
    }
}
