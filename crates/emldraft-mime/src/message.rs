//! Message model and builder.

use crate::address::{Address, IntoAddress};
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::multipart::{Boundary, Multipart};
use crate::part::{BodyPart, TransferEncoding};
use crate::serialize;
use crate::source::{Sources, SystemClock};
use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Default `Mime-Version` value.
pub const MIME_VERSION: &str = "1.0";

/// Headers only the serializer may write. Each has a typed builder method
/// or is derived from the body.
const RESERVED_HEADERS: [&str; 10] = [
    "From",
    "To",
    "Cc",
    "Bcc",
    "Reply-To",
    "Subject",
    "Date",
    "Message-ID",
    "Content-Type",
    "Content-Transfer-Encoding",
];

/// Message body: a single leaf part or a multipart entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Single-part body.
    Part(BodyPart),
    /// Multipart body.
    Multipart(Multipart),
}

impl Body {
    /// Content type the message advertises for this body.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Part(part) => part.content_type().clone(),
            Self::Multipart(multipart) => multipart.content_type(),
        }
    }

    /// Transfer encoding header for single-part bodies.
    #[must_use]
    pub const fn transfer_encoding(&self) -> Option<TransferEncoding> {
        match self {
            Self::Part(part) => Some(part.transfer_encoding()),
            Self::Multipart(_) => None,
        }
    }

    /// Renders the body content that follows the header block.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        match self {
            Self::Part(part) => part.encoded_content().to_vec(),
            Self::Multipart(multipart) => multipart.render(),
        }
    }
}

impl From<BodyPart> for Body {
    fn from(part: BodyPart) -> Self {
        Self::Part(part)
    }
}

impl From<Multipart> for Body {
    fn from(multipart: Multipart) -> Self {
        Self::Multipart(multipart)
    }
}

/// A fully assembled, render-ready email message.
///
/// Messages are immutable. Deriving a variant (for example adding vendor
/// headers) goes through [`Message::with_headers`], which returns a new value
/// and leaves the original untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    from: Address,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    reply_to: Option<Address>,
    subject: String,
    date: DateTime<FixedOffset>,
    message_id: String,
    body: Body,
    additional_headers: Headers,
    mime_version: String,
}

impl Message {
    /// Starts building a message.
    #[must_use]
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Sender.
    #[must_use]
    pub const fn from(&self) -> &Address {
        &self.from
    }

    /// Primary recipients.
    #[must_use]
    pub fn to(&self) -> &[Address] {
        &self.to
    }

    /// Carbon-copy recipients.
    #[must_use]
    pub fn cc(&self) -> &[Address] {
        &self.cc
    }

    /// Blind recipients. Never written to the rendered headers.
    #[must_use]
    pub fn bcc(&self) -> &[Address] {
        &self.bcc
    }

    /// Reply-To address.
    #[must_use]
    pub const fn reply_to(&self) -> Option<&Address> {
        self.reply_to.as_ref()
    }

    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Origination date.
    #[must_use]
    pub const fn date(&self) -> DateTime<FixedOffset> {
        self.date
    }

    /// Message-ID including angle brackets.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Extension headers, in output order.
    #[must_use]
    pub const fn additional_headers(&self) -> &Headers {
        &self.additional_headers
    }

    /// `Mime-Version` value unless overridden by an additional header.
    #[must_use]
    pub fn mime_version(&self) -> &str {
        &self.mime_version
    }

    /// Every address the message is delivered to (To, Cc, Bcc).
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }

    /// Returns a copy of this message with `headers` set in its additional
    /// headers, replacing same-named entries in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedHeader`] or [`Error::InvalidHeader`]; the
    /// original message is unaffected either way.
    pub fn with_headers<N, V>(&self, headers: impl IntoIterator<Item = (N, V)>) -> Result<Self>
    where
        N: Into<String>,
        V: Into<String>,
    {
        let mut additional_headers = self.additional_headers.clone();
        for (name, value) in headers {
            let name = name.into();
            check_reserved(&name)?;
            additional_headers.set(name, value)?;
        }
        Ok(Self {
            additional_headers,
            ..self.clone()
        })
    }

    /// Copy-with-overlay for headers built from constants and validated
    /// values.
    pub(crate) fn with_trusted_headers<'h>(
        &self,
        headers: impl IntoIterator<Item = (&'h str, String)>,
    ) -> Self {
        let mut additional_headers = self.additional_headers.clone();
        for (name, value) in headers {
            additional_headers.replace(name.to_string(), value);
        }
        Self {
            additional_headers,
            ..self.clone()
        }
    }

    /// Renders the message in RFC 5322 wire format.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        serialize::render(self)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.render()))
    }
}

fn check_reserved(name: &str) -> Result<()> {
    match RESERVED_HEADERS
        .iter()
        .find(|reserved| reserved.eq_ignore_ascii_case(name))
    {
        Some(reserved) => Err(Error::ReservedHeader((*reserved).to_string())),
        None => Ok(()),
    }
}

/// Normalizes a caller-supplied Message-ID to `<left@right>`.
fn normalize_message_id(id: &str) -> Result<String> {
    let trimmed = id.trim();
    let inner = trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(trimmed);
    let valid = inner
        .split_once('@')
        .is_some_and(|(left, right)| !left.is_empty() && !right.is_empty() && !right.contains('@'))
        && inner
            .chars()
            .all(|c| c.is_ascii_graphic() && c != '<' && c != '>');
    if valid {
        Ok(format!("<{inner}>"))
    } else {
        Err(Error::InvalidMessageId(id.to_string()))
    }
}

/// Builder for [`Message`].
///
/// Setters never fail; the first invalid input is remembered and returned
/// from [`MessageBuilder::build`], so no partially valid message escapes.
///
/// When both [`text_body`](Self::text_body) and
/// [`html_body`](Self::html_body) are given the body becomes
/// `multipart/alternative`. An explicit [`body`](Self::body) takes precedence
/// over both.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    from: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    reply_to: Option<Address>,
    subject: String,
    date: Option<DateTime<FixedOffset>>,
    message_id: Option<String>,
    text: Option<String>,
    html: Option<String>,
    body: Option<Body>,
    boundary: Boundary,
    headers: Headers,
    mime_version: String,
    error: Option<Error>,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: None,
            subject: String::new(),
            date: None,
            message_id: None,
            text: None,
            html: None,
            body: None,
            boundary: Boundary::default(),
            headers: Headers::new(),
            mime_version: MIME_VERSION.to_string(),
            error: None,
        }
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn address(&mut self, address: impl IntoAddress) -> Option<Address> {
        match address.into_address() {
            Ok(address) => Some(address),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    fn address_list(&mut self, list: &str) -> Vec<Address> {
        Address::parse_list(list).unwrap_or_else(|e| {
            self.fail(e);
            Vec::new()
        })
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, address: impl IntoAddress) -> Self {
        self.from = self.address(address);
        self
    }

    /// Adds a primary recipient.
    #[must_use]
    pub fn to(mut self, address: impl IntoAddress) -> Self {
        if let Some(address) = self.address(address) {
            self.to.push(address);
        }
        self
    }

    /// Adds every address of a comma-separated list as primary recipients.
    #[must_use]
    pub fn to_list(mut self, list: &str) -> Self {
        let parsed = self.address_list(list);
        self.to.extend(parsed);
        self
    }

    /// Adds a carbon-copy recipient.
    #[must_use]
    pub fn cc(mut self, address: impl IntoAddress) -> Self {
        if let Some(address) = self.address(address) {
            self.cc.push(address);
        }
        self
    }

    /// Adds every address of a comma-separated list as carbon-copy recipients.
    #[must_use]
    pub fn cc_list(mut self, list: &str) -> Self {
        let parsed = self.address_list(list);
        self.cc.extend(parsed);
        self
    }

    /// Adds a blind recipient.
    #[must_use]
    pub fn bcc(mut self, address: impl IntoAddress) -> Self {
        if let Some(address) = self.address(address) {
            self.bcc.push(address);
        }
        self
    }

    /// Adds every address of a comma-separated list as blind recipients.
    #[must_use]
    pub fn bcc_list(mut self, list: &str) -> Self {
        let parsed = self.address_list(list);
        self.bcc.extend(parsed);
        self
    }

    /// Sets the Reply-To address.
    #[must_use]
    pub fn reply_to(mut self, address: impl IntoAddress) -> Self {
        self.reply_to = self.address(address);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Pins the `Date` header instead of reading the clock.
    #[must_use]
    pub fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Pins the Message-ID. Angle brackets are added when missing.
    #[must_use]
    pub fn message_id(mut self, id: impl AsRef<str>) -> Self {
        match normalize_message_id(id.as_ref()) {
            Ok(id) => self.message_id = Some(id),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html_body(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the body directly.
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the boundary used if a multipart/alternative body is assembled.
    #[must_use]
    pub fn boundary(mut self, boundary: impl Into<Boundary>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Sets an additional header, replacing a previous one with the same name.
    ///
    /// `Mime-Version` overrides the standard value in place. The other
    /// standard fields are reserved and must be set through their typed
    /// methods.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if let Err(e) = check_reserved(&name).and_then(|()| self.headers.set(name, value)) {
            self.fail(e);
        }
        self
    }

    /// Sets the `Mime-Version` value.
    #[must_use]
    pub fn mime_version(mut self, version: impl Into<String>) -> Self {
        self.mime_version = version.into();
        self
    }

    /// Builds with the system clock and thread-local entropy.
    ///
    /// # Errors
    ///
    /// Returns the first invalid input, [`Error::MissingFrom`] without a
    /// sender, or [`Error::InvalidMultipart`] for a bad boundary.
    pub fn build(self) -> Result<Message> {
        let mut rng = rand::thread_rng();
        self.build_with(&mut Sources::new(&SystemClock, &mut rng))
    }

    /// Builds with the given clock and entropy.
    ///
    /// # Errors
    ///
    /// Same as [`MessageBuilder::build`].
    pub fn build_with(self, sources: &mut Sources<'_>) -> Result<Message> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let from = self.from.ok_or(Error::MissingFrom)?;

        let body = match (self.body, self.text, self.html) {
            (Some(body), _, _) => body,
            (None, Some(text), Some(html)) => {
                Multipart::alternative(text, html, self.boundary, sources.rng)?.into()
            }
            (None, None, Some(html)) => BodyPart::html(html).into(),
            (None, text, None) => BodyPart::text(text.unwrap_or_default()).into(),
        };

        let message_id = self.message_id.unwrap_or_else(|| {
            format!("<{}@{}>", sources.uuid().simple(), from.domain())
        });
        let date = self.date.unwrap_or_else(|| sources.now());

        tracing::debug!(
            %message_id,
            to = self.to.len(),
            cc = self.cc.len(),
            bcc = self.bcc.len(),
            "built message"
        );

        Ok(Message {
            from,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            reply_to: self.reply_to,
            subject: self.subject,
            date,
            message_id,
            body,
            additional_headers: self.headers,
            mime_version: self.mime_version,
        })
    }
}
