//! Construction options.
//!
//! Options pin the values that would otherwise come from the clock or the
//! random source, and carry extension headers. They deserialize from JSON:
//!
//! ```json
//! {
//!   "boundary": "b1",
//!   "message_id": "<draft-1@example.com>",
//!   "date": "Mon, 02 Jan 2006 15:04:05 -0700",
//!   "universal_id": "3F2504E0-4F89-11D3-9A0C-0305E82C3301",
//!   "additional_headers": [["X-Mailer", "emldraft"]]
//! }
//! ```

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use emldraft_mime::MessageBuilder;
use emldraft_mime::serialize::format_date;
use serde::{Deserialize, Serialize};

/// Overrides for one composition. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposeOptions {
    /// Multipart boundary. Generated when absent.
    pub boundary: Option<String>,
    /// Message-ID, with or without angle brackets. Generated when absent.
    pub message_id: Option<String>,
    /// `Date` as an RFC 2822 or RFC 3339 timestamp. The clock is read when absent.
    pub date: Option<String>,
    /// Apple Mail universal identifier. Generated when absent.
    pub universal_id: Option<String>,
    /// Extension headers, applied in order.
    pub additional_headers: Vec<(String, String)>,
}

impl ComposeOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] for malformed JSON or unknown fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pins the multipart boundary.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Pins the Message-ID.
    #[must_use]
    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Pins the `Date` header.
    #[must_use]
    pub fn with_date(mut self, date: &DateTime<FixedOffset>) -> Self {
        self.date = Some(format_date(date));
        self
    }

    /// Pins the Apple Mail universal identifier.
    #[must_use]
    pub fn with_universal_id(mut self, id: impl Into<String>) -> Self {
        self.universal_id = Some(id.into());
        self
    }

    /// Adds an extension header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.push((name.into(), value.into()));
        self
    }

    /// Parses the `date` option.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDate`] if the value is neither RFC 2822 nor
    /// RFC 3339.
    pub fn parsed_date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        let Some(date) = self.date.as_deref() else {
            return Ok(None);
        };
        DateTime::parse_from_rfc2822(date)
            .or_else(|_| DateTime::parse_from_rfc3339(date))
            .map(Some)
            .map_err(|_| Error::InvalidDate(date.to_string()))
    }

    /// Feeds the pinned values and headers into a builder.
    pub(crate) fn apply(&self, mut builder: MessageBuilder) -> Result<MessageBuilder> {
        if let Some(boundary) = &self.boundary {
            builder = builder.boundary(boundary.as_str());
        }
        if let Some(id) = &self.message_id {
            builder = builder.message_id(id);
        }
        if let Some(date) = self.parsed_date()? {
            builder = builder.date(date);
        }
        for (name, value) in &self.additional_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder)
    }
}
