//! Header registry and header-line formatting.

use crate::error::{Error, Result};
use std::fmt;

/// Practical width at which header lines are folded (RFC 5322 section 2.1.1).
pub const FOLD_WIDTH: usize = 78;

/// Ordered collection of extension headers.
///
/// Names keep the case they were given for output, but lookup and
/// replacement ignore case. [`Headers::set`] replaces an existing entry in
/// place, so overriding a header never moves it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header value, replacing any existing values with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name is not a valid field name
    /// or the value contains a line break.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        validate(&name, &value)?;
        self.replace(name, value);
        Ok(())
    }

    /// Sets a header whose name and value are known to be valid.
    pub(crate) fn replace(&mut self, name: String, value: String) {
        let mut existing = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, (n, _))| n.eq_ignore_ascii_case(&name))
            .map(|(i, _)| i);
        if let Some(first) = existing.next() {
            let duplicates: Vec<usize> = existing.collect();
            self.entries[first].1 = value;
            for i in duplicates.into_iter().rev() {
                self.entries.remove(i);
            }
        } else {
            self.entries.push((name, value));
        }
    }

    /// Appends a header value, keeping any existing values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] under the same rules as [`Headers::set`].
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        validate(&name, &value)?;
        self.entries.push((name, value));
        Ok(())
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Checks whether a header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Number of header entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            f.write_str(&fold_header(name, value))?;
        }
        Ok(())
    }
}

fn validate(name: &str, value: &str) -> Result<()> {
    if name.is_empty()
        || !name
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b':')
    {
        return Err(Error::InvalidHeader(format!("invalid field name {name:?}")));
    }
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidHeader(format!(
            "line break in value of {name}"
        )));
    }
    Ok(())
}

/// Formats `Name: value` as one or more CRLF-terminated lines.
///
/// Lines longer than [`FOLD_WIDTH`] are folded with `CRLF SP` at whitespace
/// that sits outside quoted strings and angle-bracket addresses. A single
/// token that is longer than the limit is left intact.
#[must_use]
pub fn fold_header(name: &str, value: &str) -> String {
    if value.is_empty() {
        return format!("{name}:\r\n");
    }
    let mut out = String::with_capacity(name.len() + value.len() + 4);
    let mut line_len = name.len() + 1;
    out.push_str(name);
    out.push(':');

    for (i, word) in fold_points(value).into_iter().enumerate() {
        // The first word always stays on the name line
        if i > 0 && !word.is_empty() && line_len + 1 + word.len() > FOLD_WIDTH {
            out.push_str("\r\n");
            line_len = 0;
        }
        out.push(' ');
        out.push_str(word);
        line_len += 1 + word.len();
    }

    out.push_str("\r\n");
    out
}

/// Splits a header value into runs separated by single foldable spaces.
fn fold_points(value: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut in_angle = false;
    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ' ' if !in_quotes && !in_angle => {
                out.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&value[start..]);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_set_get_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("X-Mailer", "emldraft").unwrap();
        assert_eq!(headers.get("x-mailer"), Some("emldraft"));
        assert!(headers.contains("X-MAILER"));
    }

    #[test]
    fn test_headers_set_replaces_in_place() {
        let mut headers = Headers::new();
        headers.set("X-One", "1").unwrap();
        headers.set("X-Two", "2").unwrap();
        headers.set("x-one", "uno").unwrap();

        let entries: Vec<_> = headers.iter().collect();
        assert_eq!(entries, vec![("X-One", "uno"), ("X-Two", "2")]);
    }

    #[test]
    fn test_headers_set_collapses_appended_values() {
        let mut headers = Headers::new();
        headers.append("X-Tag", "a").unwrap();
        headers.append("X-Other", "b").unwrap();
        headers.append("x-tag", "c").unwrap();
        assert_eq!(headers.get_all("X-Tag"), vec!["a", "c"]);

        headers.set("X-Tag", "z").unwrap();
        assert_eq!(headers.get_all("X-Tag"), vec!["z"]);
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.set("X-Tag", "a").unwrap();
        headers.remove("x-tag");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_reject_injection() {
        let mut headers = Headers::new();
        assert!(headers.set("X-Bad", "a\r\nBcc: victim@example.com").is_err());
        assert!(headers.set("Bad Name", "a").is_err());
        assert!(headers.set("Bad:Name", "a").is_err());
        assert!(headers.set("", "a").is_err());
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_display_in_order() {
        let mut headers = Headers::new();
        headers.set("X-B", "2").unwrap();
        headers.set("X-A", "1").unwrap();
        assert_eq!(headers.to_string(), "X-B: 2\r\nX-A: 1\r\n");
    }

    #[test]
    fn test_fold_short_line_untouched() {
        assert_eq!(fold_header("Subject", "Hi"), "Subject: Hi\r\n");
    }

    #[test]
    fn test_fold_empty_value_has_no_trailing_space() {
        assert_eq!(fold_header("Subject", ""), "Subject:\r\n");
    }

    #[test]
    fn test_fold_long_line() {
        let value = "word ".repeat(30);
        let folded = fold_header("Subject", value.trim_end());
        for line in folded.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(line.len() <= FOLD_WIDTH, "{line}");
        }
        let unfolded = folded.trim_end_matches("\r\n").replace("\r\n", "");
        assert_eq!(unfolded, format!("Subject: {}", value.trim_end()));
    }

    #[test]
    fn test_fold_keeps_addresses_and_quotes_whole() {
        let value = (0..6)
            .map(|i| format!("\"Person Number {i}\" <person.number.{i}@example.com>"))
            .collect::<Vec<_>>()
            .join(", ");
        let folded = fold_header("To", &value);
        assert!(folded.contains("\r\n "));
        for i in 0..6 {
            assert!(folded.contains(&format!("\"Person Number {i}\"")));
            assert!(folded.contains(&format!("<person.number.{i}@example.com>")));
        }
    }

    #[test]
    fn test_fold_never_splits_long_token() {
        let token = "x".repeat(120);
        let folded = fold_header("X-Token", &token);
        assert_eq!(folded, format!("X-Token: {token}\r\n"));
    }
}
