//! RFC 5322 message serialization.
//!
//! Header order is fixed:
//!
//! ```text
//! From, To, Cc, Subject, Date, Message-ID, Reply-To, Mime-Version,
//! Content-Type, Content-Transfer-Encoding, <additional headers...>
//! ```
//!
//! `Cc` and `Reply-To` are omitted when empty, `Content-Transfer-Encoding`
//! only appears for single-part bodies, and `Bcc` is never written. An
//! additional `Mime-Version` header replaces the standard value in its
//! standard position.

use crate::address::Address;
use crate::encoding::encode_rfc2047;
use crate::header::fold_header;
use crate::message::Message;
use chrono::{DateTime, FixedOffset};

/// RFC 5322 `date-time` layout with a numeric zone, e.g.
/// `Mon, 02 Jan 2006 15:04:05 -0700`.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// The only standard field an additional header may override.
const MIME_VERSION_FIELD: &str = "Mime-Version";

/// Formats a timestamp for the `Date` header.
#[must_use]
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Returns the header fields of `message` in output order, unfolded.
#[must_use]
pub fn header_fields(message: &Message) -> Vec<(String, String)> {
    let extra = message.additional_headers();
    let mut fields: Vec<(String, String)> = Vec::with_capacity(10 + extra.len());

    let mut standard = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            fields.push((name.to_string(), value));
        }
    };

    standard("From", Some(message.from().header_value()));
    standard("To", address_list(message.to()));
    standard("Cc", address_list(message.cc()));
    standard("Subject", Some(encode_text(message.subject())));
    standard("Date", Some(format_date(&message.date())));
    standard("Message-ID", Some(message.message_id().to_string()));
    standard("Reply-To", message.reply_to().map(Address::header_value));
    let mime_version = extra
        .get(MIME_VERSION_FIELD)
        .map_or_else(|| message.mime_version().to_string(), encode_text);
    standard(MIME_VERSION_FIELD, Some(mime_version));

    let body = message.body();
    fields.push((
        "Content-Type".to_string(),
        body.content_type().header_value(),
    ));
    if let Some(encoding) = body.transfer_encoding() {
        fields.push((
            "Content-Transfer-Encoding".to_string(),
            encoding.to_string(),
        ));
    }

    for (name, value) in extra.iter() {
        if name.eq_ignore_ascii_case(MIME_VERSION_FIELD) {
            continue;
        }
        fields.push((name.to_string(), encode_text(value)));
    }

    fields
}

/// Renders `message`: folded CRLF header lines, an empty line, the body.
#[must_use]
pub fn render(message: &Message) -> Vec<u8> {
    let body = message.body().render();
    let mut out = Vec::with_capacity(body.len() + 1024);
    for (name, value) in header_fields(message) {
        out.extend_from_slice(fold_header(&name, &value).as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&body);
    out
}

/// Joins addresses with `", "`; `None` for an empty list so the header is
/// omitted.
fn address_list(addresses: &[Address]) -> Option<String> {
    if addresses.is_empty() {
        return None;
    }
    Some(
        addresses
            .iter()
            .map(Address::header_value)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Unstructured header text: RFC 2047 encoded when not plain ASCII.
fn encode_text(value: &str) -> String {
    if value.is_ascii() && !value.chars().any(char::is_control) {
        value.to_string()
    } else {
        encode_rfc2047(value, "UTF-8")
    }
}
