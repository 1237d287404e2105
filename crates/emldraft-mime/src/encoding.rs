//! MIME transfer encodings.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding. Every
//! encoder here emits CRLF line endings and keeps lines within the
//! 76 character limit of RFC 2045.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length for Base64 and Quoted-Printable (RFC 2045).
pub const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64 without line breaks.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 body content, wrapped at 76 characters with CRLF.
///
/// The final line is not followed by a line break.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);
    for (i, chunk) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        // Base64 output is ASCII, so chunking bytes never splits a char
        result.push_str(&String::from_utf8_lossy(chunk));
    }
    result
}

/// Encodes bytes using Quoted-Printable encoding (RFC 2045 section 6.7).
///
/// Line breaks in the input (CRLF or bare LF) become CRLF hard breaks.
/// Whitespace before a hard break is encoded, and soft breaks (`=\r\n`)
/// keep every output line at or under 76 characters.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len() * 3 / 2);
    let mut line_length = 0;
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];

        if byte == b'\n' || (byte == b'\r' && data.get(i + 1) == Some(&b'\n')) {
            result.push_str("\r\n");
            line_length = 0;
            i += if byte == b'\r' { 2 } else { 1 };
            continue;
        }

        let at_line_end = matches!(data.get(i + 1), None | Some(b'\n'))
            || (data.get(i + 1) == Some(&b'\r') && data.get(i + 2) == Some(&b'\n'));

        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            // Trailing whitespace would be stripped in transit
            b' ' | b'\t' => !at_line_end,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };

        // Leave room for the '=' of a soft break unless this is the last
        // character on the line.
        let limit = if at_line_end {
            MAX_LINE_LENGTH
        } else {
            MAX_LINE_LENGTH - 1
        };
        if line_length + width > limit {
            result.push_str("=\r\n");
            line_length = 0;
        }

        if literal {
            result.push(char::from(byte));
        } else {
            let _ = write!(result, "={byte:02X}");
        }
        line_length += width;
        i += 1;
    }

    result
}

/// Encodes a header value using RFC 2047 `B` encoding when needed.
///
/// ASCII text without encoded-word delimiters is returned unchanged.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_rfc2047(text) {
        return text.to_string();
    }

    // Encoded words are limited to 75 characters; split on char boundaries
    // so every word decodes to valid UTF-8 on its own. A charset name too
    // long for that limit still gets one character per word.
    let overhead = charset.len() + "=??B??=".len();
    let max_raw = 75usize.saturating_sub(overhead) / 4 * 3;

    let mut words = Vec::new();
    let mut chunk_start = 0;
    let mut chunk_len = 0;
    for (idx, ch) in text.char_indices() {
        if chunk_len + ch.len_utf8() > max_raw && chunk_len > 0 {
            words.push(&text[chunk_start..idx]);
            chunk_start = idx;
            chunk_len = 0;
        }
        chunk_len += ch.len_utf8();
    }
    words.push(&text[chunk_start..]);

    words
        .into_iter()
        .map(|w| format!("=?{charset}?B?{}?=", encode_base64(w.as_bytes())))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Checks whether a header value needs RFC 2047 encoding.
#[must_use]
pub fn needs_rfc2047(text: &str) -> bool {
    !text.is_ascii() || text.contains("=?") || text.chars().any(char::is_control)
}

/// Converts bare LF and bare CR line breaks to CRLF.
#[must_use]
pub fn normalize_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 32);
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'\r' => {
                out.extend_from_slice(b"\r\n");
                if data.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => out.extend_from_slice(b"\r\n"),
            byte => out.push(byte),
        }
        i += 1;
    }
    out
}
