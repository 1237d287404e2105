//! Drafts composed from address strings and HTML.

use crate::error::{Error, Result};
use crate::markup::{HtmdConverter, HtmlToText, MarkupRenderer};
use crate::options::ComposeOptions;
use emldraft_mime::apple;
use emldraft_mime::{BoundaryStyle, Message, MessageBuilder, Sources, SystemClock};

/// An email draft before composition.
///
/// Address fields hold raw strings; each entry may be a single address or a
/// comma-separated list. Parsing happens in [`Draft::compose`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// CC addresses.
    pub cc: Vec<String>,
    /// BCC addresses. Kept on the message, never written to the output.
    pub bcc: Vec<String>,
    /// Reply-To address.
    pub reply_to: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: Option<String>,
    /// HTML body.
    pub html: Option<String>,
}

impl Draft {
    /// Creates a new draft.
    #[must_use]
    pub fn new(from: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Sets the Reply-To address.
    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the HTML body from a renderer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if rendering fails.
    pub fn markup(mut self, renderer: &dyn MarkupRenderer) -> Result<Self> {
        self.html = Some(renderer.render()?);
        Ok(self)
    }

    /// Composes the draft with the system clock, thread-local entropy and
    /// the `htmd` text fallback.
    ///
    /// # Errors
    ///
    /// See [`Draft::compose_with`].
    pub fn compose(&self, options: &ComposeOptions) -> Result<Message> {
        let mut rng = rand::thread_rng();
        self.compose_with(
            options,
            &HtmdConverter,
            &mut Sources::new(&SystemClock, &mut rng),
        )
    }

    /// Composes the draft into a message.
    ///
    /// Without an explicit text body a fallback is derived from the HTML
    /// with `converter`. Text and HTML together become
    /// `multipart/alternative`; HTML alone is a single `text/html` part.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mime`] for invalid addresses, headers or boundaries,
    /// [`Error::InvalidDate`] for a bad `date` option, and
    /// [`Error::EmptyRecipients`] when no `To` address remains.
    pub fn compose_with(
        &self,
        options: &ComposeOptions,
        converter: &dyn HtmlToText,
        sources: &mut Sources<'_>,
    ) -> Result<Message> {
        self.build(Message::builder(), options, converter, sources)
    }

    /// Composes an Apple Mail draft with the system clock, thread-local
    /// entropy and the `htmd` text fallback.
    ///
    /// # Errors
    ///
    /// See [`Draft::compose_apple_with`].
    pub fn compose_apple(&self, options: &ComposeOptions) -> Result<Message> {
        let mut rng = rand::thread_rng();
        self.compose_apple_with(
            options,
            &HtmdConverter,
            &mut Sources::new(&SystemClock, &mut rng),
        )
    }

    /// Composes the draft and applies the Apple Mail overlay.
    ///
    /// Generated boundaries use the `Apple-Mail=_<UUID>` form. The
    /// universal identifier comes from `options.universal_id` or is drawn
    /// from `sources`.
    ///
    /// # Errors
    ///
    /// As [`Draft::compose_with`], plus [`Error::Mime`] for an invalid
    /// universal identifier.
    pub fn compose_apple_with(
        &self,
        options: &ComposeOptions,
        converter: &dyn HtmlToText,
        sources: &mut Sources<'_>,
    ) -> Result<Message> {
        let builder = Message::builder().boundary(BoundaryStyle::AppleMail);
        let message = self.build(builder, options, converter, sources)?;
        Ok(apple::overlay(
            &message,
            options.universal_id.as_deref(),
            sources.rng,
        )?)
    }

    fn build(
        &self,
        builder: MessageBuilder,
        options: &ComposeOptions,
        converter: &dyn HtmlToText,
        sources: &mut Sources<'_>,
    ) -> Result<Message> {
        let mut builder = builder.from(self.from.as_str()).subject(self.subject.as_str());
        for to in &self.to {
            builder = builder.to_list(to);
        }
        for cc in &self.cc {
            builder = builder.cc_list(cc);
        }
        for bcc in &self.bcc {
            builder = builder.bcc_list(bcc);
        }
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.as_str());
        }

        let text = self.text.clone().or_else(|| {
            let html = self.html.as_deref()?;
            let derived = converter.convert(html);
            tracing::debug!(derived = derived.is_some(), "text fallback from HTML");
            derived
        });
        if let Some(text) = text {
            builder = builder.text_body(text);
        }
        if let Some(html) = &self.html {
            builder = builder.html_body(html.as_str());
        }

        let message = options.apply(builder)?.build_with(sources)?;
        if message.to().is_empty() {
            return Err(Error::EmptyRecipients);
        }

        tracing::debug!(
            message_id = message.message_id(),
            recipients = message.recipients().count(),
            "composed draft"
        );
        Ok(message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::markup::{NoFallback, RenderError, from_fn};
    use chrono::DateTime;
    use emldraft_mime::{Body, FixedClock};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn compose(draft: &Draft, converter: &dyn HtmlToText) -> Result<Message> {
        let clock =
            FixedClock(DateTime::parse_from_rfc2822("Mon, 02 Jan 2006 15:04:05 -0700").unwrap());
        let mut rng = StdRng::seed_from_u64(7);
        draft.compose_with(
            &ComposeOptions::default(),
            converter,
            &mut Sources::new(&clock, &mut rng),
        )
    }

    #[test]
    fn test_empty_recipients_rejected() {
        let draft = Draft::new("a@x.com", "Hi").text("Hello");
        assert!(matches!(
            compose(&draft, &NoFallback),
            Err(Error::EmptyRecipients)
        ));
    }

    #[test]
    fn test_address_error_wins_over_empty_recipients() {
        let draft = Draft::new("a@x.com", "Hi").to("not-an-address");
        assert!(matches!(
            compose(&draft, &NoFallback),
            Err(Error::Mime(emldraft_mime::Error::AddressSyntax { .. }))
        ));
    }

    #[test]
    fn test_html_only_without_fallback_is_single_part() {
        let draft = Draft::new("a@x.com", "Hi").to("b@y.com").html("<h1>Hi</h1>");
        let msg = compose(&draft, &NoFallback).unwrap();
        assert!(matches!(msg.body(), Body::Part(p) if p.content_type().is("text", "html")));
    }

    #[test]
    fn test_html_with_fallback_is_alternative() {
        let draft = Draft::new("a@x.com", "Hi").to("b@y.com").html("<h1>Hi</h1>");
        let fallback = |_: &str| Some("Hi".to_string());
        let msg = compose(&draft, &fallback).unwrap();
        let Body::Multipart(multipart) = msg.body() else {
            panic!("expected multipart");
        };
        assert_eq!(multipart.subtype(), "alternative");
        assert_eq!(multipart.parts()[0].raw_content(), b"Hi");
        assert_eq!(multipart.parts()[1].raw_content(), b"<h1>Hi</h1>");
    }

    #[test]
    fn test_explicit_text_skips_converter() {
        let draft = Draft::new("a@x.com", "Hi")
            .to("b@y.com")
            .text("plain")
            .html("<p>rich</p>");
        let converter = |_: &str| -> Option<String> { panic!("converter called") };
        let msg = compose(&draft, &converter).unwrap();
        let Body::Multipart(multipart) = msg.body() else {
            panic!("expected multipart");
        };
        assert_eq!(multipart.parts()[0].raw_content(), b"plain");
    }

    #[test]
    fn test_address_lists_split() {
        let draft = Draft::new("a@x.com", "Hi")
            .to("b@y.com, \"Doe, Jane\" <jane@y.com>")
            .cc("c@y.com")
            .bcc("d@y.com")
            .reply_to("r@x.com")
            .text("t");
        let msg = compose(&draft, &NoFallback).unwrap();
        assert_eq!(msg.to().len(), 2);
        assert_eq!(msg.to()[1].display_name(), Some("Doe, Jane"));
        assert_eq!(msg.cc().len(), 1);
        assert_eq!(msg.bcc().len(), 1);
        assert_eq!(msg.reply_to().map(|a| a.email()), Some("r@x.com".to_string()));
    }

    #[test]
    fn test_markup_renderer() {
        let draft = Draft::new("a@x.com", "Hi")
            .markup(&from_fn(|| Ok("<p>made</p>".to_string())))
            .unwrap();
        assert_eq!(draft.html.as_deref(), Some("<p>made</p>"));

        let err = Draft::new("a@x.com", "Hi")
            .markup(&from_fn(|| Err(RenderError::new("boom"))))
            .unwrap_err();
        assert!(matches!(err, Error::Render(e) if e.message() == "boom"));
    }

    #[test]
    fn test_apple_boundary_style() {
        let clock =
            FixedClock(DateTime::parse_from_rfc2822("Mon, 02 Jan 2006 15:04:05 -0700").unwrap());
        let mut rng = StdRng::seed_from_u64(7);
        let draft = Draft::new("a@x.com", "Hi")
            .to("b@y.com")
            .text("t")
            .html("<p>h</p>");
        let msg = draft
            .compose_apple_with(
                &ComposeOptions::default(),
                &NoFallback,
                &mut Sources::new(&clock, &mut rng),
            )
            .unwrap();
        let Body::Multipart(multipart) = msg.body() else {
            panic!("expected multipart");
        };
        assert!(multipart.boundary().starts_with("Apple-Mail=_"));
        assert!(
            msg.additional_headers()
                .contains("X-Universally-Unique-Identifier")
        );
    }
}
