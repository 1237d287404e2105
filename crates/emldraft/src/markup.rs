//! Collaborators that turn markup descriptions into HTML and HTML into text.
//!
//! Both are kept behind small traits so a caller can plug in its own
//! templating engine or text extractor:
//!
//! - [`MarkupRenderer`] produces the HTML body of a draft.
//! - [`HtmlToText`] derives the plain-text fallback from that HTML.

use std::fmt;

/// Failure reported by a [`MarkupRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    /// Creates a render error with a description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Produces an HTML string.
pub trait MarkupRenderer {
    /// Renders the markup.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the description cannot be rendered.
    fn render(&self) -> Result<String, RenderError>;
}

impl MarkupRenderer for str {
    fn render(&self) -> Result<String, RenderError> {
        Ok(self.to_string())
    }
}

impl MarkupRenderer for String {
    fn render(&self) -> Result<String, RenderError> {
        Ok(self.clone())
    }
}

impl<R: MarkupRenderer + ?Sized> MarkupRenderer for &R {
    fn render(&self) -> Result<String, RenderError> {
        (**self).render()
    }
}

/// Renderer backed by a closure. Created with [`from_fn`].
#[derive(Clone, Copy)]
pub struct FromFn<F>(F);

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FromFn")
    }
}

impl<F> MarkupRenderer for FromFn<F>
where
    F: Fn() -> Result<String, RenderError>,
{
    fn render(&self) -> Result<String, RenderError> {
        (self.0)()
    }
}

/// Wraps a closure as a [`MarkupRenderer`].
///
/// ```ignore
/// let page = emldraft::from_fn(|| Ok(format!("<h1>{}</h1>", title)));
/// ```
pub const fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn() -> Result<String, RenderError>,
{
    FromFn(f)
}

/// Extracts a plain-text fallback from HTML.
///
/// Returning `None` means no fallback is available; the draft is then
/// composed from the HTML alone.
pub trait HtmlToText {
    /// Converts `html` to plain text.
    fn convert(&self, html: &str) -> Option<String>;
}

impl<F> HtmlToText for F
where
    F: Fn(&str) -> Option<String>,
{
    fn convert(&self, html: &str) -> Option<String> {
        self(html)
    }
}

/// Converts HTML to Markdown-flavored text with `htmd`.
///
/// `<head>`, `<script>` and `<style>` contents are dropped. Conversion errors
/// and blank results yield no fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmdConverter;

impl HtmlToText for HtmdConverter {
    fn convert(&self, html: &str) -> Option<String> {
        let converter = htmd::HtmlToMarkdown::builder()
            .skip_tags(vec!["head", "script", "style"])
            .build();
        match converter.convert(html) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "HTML to text conversion failed");
                None
            }
        }
    }
}

/// Never derives a fallback, so HTML-only drafts stay single-part.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl HtmlToText for NoFallback {
    fn convert(&self, _html: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_render_themselves() {
        assert_eq!("<p>x</p>".render().unwrap(), "<p>x</p>");
        assert_eq!(String::from("<b>y</b>").render().unwrap(), "<b>y</b>");
    }

    #[test]
    fn test_from_fn_propagates_errors() {
        let ok = from_fn(|| Ok("<i>z</i>".to_string()));
        assert_eq!(ok.render().unwrap(), "<i>z</i>");

        let failing = from_fn(|| Err(RenderError::new("template missing")));
        let err = failing.render().unwrap_err();
        assert_eq!(err.message(), "template missing");
        assert_eq!(err.to_string(), "template missing");
    }

    #[test]
    fn test_htmd_strips_tags() {
        let html = "<html><head><style>p{}</style></head>\
                    <body><h1>Hi</h1><p>there</p></body></html>";
        let text = HtmdConverter.convert(html).unwrap();
        assert!(text.contains("Hi"));
        assert!(text.contains("there"));
        assert!(!text.contains('<'));
        assert!(!text.contains("p{}"));
    }

    #[test]
    fn test_htmd_blank_is_none() {
        assert_eq!(HtmdConverter.convert("<div>  </div>"), None);
    }

    #[test]
    fn test_no_fallback() {
        assert_eq!(NoFallback.convert("<p>x</p>"), None);
    }

    #[test]
    fn test_closure_converter() {
        let upper = |html: &str| Some(html.to_uppercase());
        assert_eq!(upper.convert("ab").as_deref(), Some("AB"));
    }
}
