//! MIME content type handling.

use crate::error::{Error, Result};
use std::fmt;

/// Characters that force a parameter value to be quoted (RFC 2045 `tspecials`).
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// MIME content type with parameters.
///
/// Parameters keep their insertion order, and keys are unique ignoring case.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "alternative").
    pub sub_type: String,
    parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Charset used for every text part this crate produces.
    pub const UTF_8: &'static str = "UTF-8";

    /// Creates a new content type without parameters.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// `text/plain; charset=UTF-8`.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", Self::UTF_8)
    }

    /// `text/html; charset=UTF-8`.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", Self::UTF_8)
    }

    /// `multipart/<subtype>; boundary="<boundary>"`.
    #[must_use]
    pub fn multipart(sub_type: impl Into<String>, boundary: impl Into<String>) -> Self {
        Self::new("multipart", sub_type).with_parameter("boundary", boundary)
    }

    /// Adds a parameter, replacing an existing one with the same key.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(key, value);
        self
    }

    /// Sets a parameter in place. A replaced parameter keeps its position.
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .parameters
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((key, value)),
        }
    }

    /// Looks up a parameter, ignoring key case.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over parameters in insertion order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Checks the media type, ignoring case and parameters.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main_type)
            && self.sub_type.eq_ignore_ascii_case(sub_type)
    }

    /// Renders the value of a `Content-Type` header.
    #[must_use]
    pub fn header_value(&self) -> String {
        self.to_string()
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing or not a token.
    pub fn parse(s: &str) -> Result<Self> {
        let (type_str, rest) = s.split_once(';').unwrap_or((s, ""));

        let (main_type, sub_type) = type_str
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("missing subtype in {s:?}")))?;
        let main_type = main_type.trim();
        let sub_type = sub_type.trim();
        if !is_token(main_type) || !is_token(sub_type) {
            return Err(Error::InvalidContentType(format!(
                "invalid media type in {s:?}"
            )));
        }

        let mut content_type = Self::new(main_type.to_lowercase(), sub_type.to_lowercase());

        for param in split_parameters(rest) {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (key, value) = param.split_once('=').ok_or_else(|| {
                Error::InvalidContentType(format!("parameter without value: {param:?}"))
            })?;
            let key = key.trim().to_lowercase();
            if !is_token(&key) {
                return Err(Error::InvalidContentType(format!(
                    "invalid parameter name {key:?}"
                )));
            }
            content_type.set_parameter(key, unquote(value.trim()));
        }

        Ok(content_type)
    }
}

impl std::str::FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = self.main_type.to_ascii_lowercase();
        let sub = self.sub_type.to_ascii_lowercase();
        write!(f, "{main}/{sub}")?;

        for (key, value) in &self.parameters {
            // Boundaries are always quoted; some clients choke on bare '=' or '_'
            let force = key.eq_ignore_ascii_case("boundary");
            if force || needs_quoting(value) {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "; {key}=\"{escaped}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || TSPECIALS.contains(c))
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_graphic() && !TSPECIALS.contains(c))
}

/// Splits on ';' outside of quoted strings.
fn split_parameters(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
