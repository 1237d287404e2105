//! Email address parsing and rendering.
//!
//! Accepts the forms a person types into an address field:
//!
//! ```text
//! "Jane Doe" <jane@example.com>
//! Jane Doe <jane@example.com>
//! <jane@example.com>
//! jane@example.com
//! ```
//!
//! Validation follows a pragmatic subset of RFC 5322/5321: enough to reject
//! typos and header injection, not a full `address-list` grammar.

use crate::encoding::{encode_rfc2047, needs_rfc2047};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Characters that cannot appear in an unquoted local part.
const LOCAL_SPECIALS: &str = "()<>[]:;@\\,\"";

/// Characters that cannot appear in a domain.
const DOMAIN_SPECIALS: &str = "()<>:;@\\,\"";

/// A single email address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    display_name: Option<String>,
    local_part: String,
    domain: String,
}

impl Address {
    /// Creates an address from its local part and domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressSyntax`] if either part is empty or invalid.
    pub fn new(local_part: impl Into<String>, domain: impl Into<String>) -> Result<Self> {
        let local_part = local_part.into();
        let domain = domain.into();
        let input = format!("{local_part}@{domain}");
        validate_local(&input, &local_part, false)?;
        validate_domain(&input, &domain)?;
        Ok(Self {
            display_name: None,
            local_part,
            domain,
        })
    }

    /// Returns a copy of this address carrying a display name.
    ///
    /// An empty or all-whitespace name clears the display name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressSyntax`] if the name contains control characters.
    pub fn with_display_name(self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.chars().any(char::is_control) {
            return Err(Error::address(&name, "control character in display name"));
        }
        let name = name.trim();
        Ok(Self {
            display_name: (!name.is_empty()).then(|| name.to_string()),
            ..self
        })
    }

    /// Parses a single address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressSyntax`] describing the first problem found.
    pub fn parse(text: &str) -> Result<Self> {
        if text.chars().any(char::is_control) {
            return Err(Error::address(text, "control character"));
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::address(text, "empty address"));
        }

        match find_unquoted(trimmed, '<') {
            Some(open) => {
                let close = trimmed
                    .rfind('>')
                    .filter(|&close| close > open)
                    .ok_or_else(|| Error::address(text, "unbalanced angle brackets"))?;
                if close != trimmed.len() - 1 {
                    return Err(Error::address(text, "text after closing angle bracket"));
                }
                let addr_spec = &trimmed[open + 1..close];
                if addr_spec.contains(['<', '>']) {
                    return Err(Error::address(text, "unbalanced angle brackets"));
                }
                let display_name = parse_display_name(text, &trimmed[..open])?;
                let (local_part, domain) = parse_addr_spec(text, addr_spec.trim())?;
                Ok(Self {
                    display_name,
                    local_part,
                    domain,
                })
            }
            None => {
                if find_unquoted(trimmed, '>').is_some() {
                    return Err(Error::address(text, "unbalanced angle brackets"));
                }
                let (local_part, domain) = parse_addr_spec(text, trimmed)?;
                Ok(Self {
                    display_name: None,
                    local_part,
                    domain,
                })
            }
        }
    }

    /// Parses a comma-separated address list.
    ///
    /// Commas inside quoted display names or angle brackets do not split.
    /// Empty entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::AddressSyntax`] encountered.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        split_list(text)
            .into_iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Returns the display name, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the local part (unquoted).
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// Returns the domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the bare `local@domain` form, quoting the local part if needed.
    #[must_use]
    pub fn email(&self) -> String {
        if local_needs_quoting(&self.local_part) {
            format!("{}@{}", quote(&self.local_part), self.domain)
        } else {
            format!("{}@{}", self.local_part, self.domain)
        }
    }

    /// Renders the canonical form: `"Name" <local@domain>` or `local@domain`.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Renders the address for use inside a header field.
    ///
    /// Same as [`Address::render`] except that non-ASCII display names are
    /// RFC 2047 encoded.
    #[must_use]
    pub fn header_value(&self) -> String {
        match &self.display_name {
            Some(name) if needs_rfc2047(name) => {
                format!("{} <{}>", encode_rfc2047(name, "UTF-8"), self.email())
            }
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} <{}>", quote(name), self.email()),
            None => f.write_str(&self.email()),
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Address {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

/// Anything that can be turned into an [`Address`]: parsed values pass
/// through, strings are parsed.
pub trait IntoAddress {
    /// Converts into an address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressSyntax`] if a string fails to parse.
    fn into_address(self) -> Result<Address>;
}

impl IntoAddress for Address {
    fn into_address(self) -> Result<Address> {
        Ok(self)
    }
}

impl IntoAddress for &Address {
    fn into_address(self) -> Result<Address> {
        Ok(self.clone())
    }
}

impl IntoAddress for &str {
    fn into_address(self) -> Result<Address> {
        Address::parse(self)
    }
}

impl IntoAddress for String {
    fn into_address(self) -> Result<Address> {
        Address::parse(&self)
    }
}

impl IntoAddress for &String {
    fn into_address(self) -> Result<Address> {
        Address::parse(self)
    }
}

fn parse_display_name(input: &str, raw: &str) -> Result<Option<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let name = if raw.starts_with('"') {
        let (name, rest) =
            take_quoted(raw).ok_or_else(|| Error::address(input, "unbalanced quotes"))?;
        if !rest.trim().is_empty() {
            return Err(Error::address(input, "text after quoted display name"));
        }
        name
    } else {
        if raw.contains('"') {
            return Err(Error::address(input, "unbalanced quotes"));
        }
        raw.to_string()
    };
    let name = name.trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

fn parse_addr_spec(input: &str, spec: &str) -> Result<(String, String)> {
    if spec.is_empty() {
        return Err(Error::address(input, "empty address"));
    }

    let (local, domain, quoted) = if spec.starts_with('"') {
        let (local, rest) =
            take_quoted(spec).ok_or_else(|| Error::address(input, "unbalanced quotes"))?;
        let domain = rest
            .strip_prefix('@')
            .ok_or_else(|| Error::address(input, "missing @"))?;
        (local, domain.to_string(), true)
    } else {
        let (local, domain) = spec
            .split_once('@')
            .ok_or_else(|| Error::address(input, "missing @"))?;
        (local.to_string(), domain.to_string(), false)
    };

    validate_local(input, &local, quoted)?;
    validate_domain(input, &domain)?;
    Ok((local, domain))
}

fn validate_local(input: &str, local: &str, quoted: bool) -> Result<()> {
    if local.is_empty() {
        return Err(Error::address(input, "empty local part"));
    }
    if local.chars().any(char::is_control) {
        return Err(Error::address(input, "control character"));
    }
    if quoted {
        return Ok(());
    }
    if local.chars().any(char::is_whitespace) {
        return Err(Error::address(input, "whitespace in local part"));
    }
    if local.contains(|c| LOCAL_SPECIALS.contains(c)) {
        return Err(Error::address(input, "invalid character in local part"));
    }
    Ok(())
}

fn validate_domain(input: &str, domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::address(input, "empty domain"));
    }
    if domain.chars().any(char::is_control) {
        return Err(Error::address(input, "control character"));
    }
    if domain.chars().any(char::is_whitespace) {
        return Err(Error::address(input, "whitespace in domain"));
    }
    if domain.contains('@') {
        return Err(Error::address(input, "more than one @"));
    }
    if domain.contains(|c| DOMAIN_SPECIALS.contains(c)) {
        return Err(Error::address(input, "invalid character in domain"));
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(Error::address(input, "empty domain label"));
    }
    Ok(())
}

fn local_needs_quoting(local: &str) -> bool {
    local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
        || local
            .chars()
            .any(|c| c.is_whitespace() || LOCAL_SPECIALS.contains(c))
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Reads a quoted string from the start of `s`, returning the unescaped
/// content and the remainder after the closing quote.
fn take_quoted(s: &str) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some((out, &s[i + 1..]));
        } else {
            out.push(c);
        }
    }
    None
}

/// Finds `needle` outside of quoted strings.
fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == needle && !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn split_list(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => depth += 1,
            '>' if !in_quotes => depth = depth.saturating_sub(1),
            ',' if !in_quotes && depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}
