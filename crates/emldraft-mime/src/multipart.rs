//! Multipart assembly (RFC 2046 section 5.1).

use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::part::BodyPart;
use crate::source::{random_token, random_uuid};
use rand::RngCore;

/// Maximum boundary length (RFC 2046 `boundary := 0*69<bchars> bcharsnospace`).
pub const MAX_BOUNDARY_LENGTH: usize = 70;

/// Length of generated alphanumeric boundaries.
const GENERATED_BOUNDARY_LENGTH: usize = 40;

/// Attempts at generating a boundary that does not occur in the parts.
const MAX_BOUNDARY_ATTEMPTS: usize = 8;

/// How a generated boundary looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryStyle {
    /// 40 random alphanumerics.
    #[default]
    Alphanumeric,
    /// `Apple-Mail=_<UUID>`, as written by Apple Mail.
    AppleMail,
}

impl BoundaryStyle {
    /// Generates a fresh boundary in this style.
    pub fn generate(self, rng: &mut dyn RngCore) -> String {
        match self {
            Self::Alphanumeric => random_token(rng, GENERATED_BOUNDARY_LENGTH),
            Self::AppleMail => format!(
                "Apple-Mail=_{}",
                random_uuid(rng).hyphenated().to_string().to_uppercase()
            ),
        }
    }
}

/// Where a multipart boundary comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// Caller-supplied; rejected if it is malformed or collides with content.
    Fixed(String),
    /// Generated fresh, regenerated on collision.
    Generated(BoundaryStyle),
}

impl Default for Boundary {
    fn default() -> Self {
        Self::Generated(BoundaryStyle::default())
    }
}

impl From<String> for Boundary {
    fn from(s: String) -> Self {
        Self::Fixed(s)
    }
}

impl From<&str> for Boundary {
    fn from(s: &str) -> Self {
        Self::Fixed(s.to_string())
    }
}

impl From<BoundaryStyle> for Boundary {
    fn from(style: BoundaryStyle) -> Self {
        Self::Generated(style)
    }
}

impl From<Option<String>> for Boundary {
    fn from(boundary: Option<String>) -> Self {
        boundary.map_or_else(Self::default, Self::Fixed)
    }
}

/// A `multipart/<subtype>` entity: an ordered, non-empty list of parts under
/// one boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    subtype: String,
    boundary: String,
    parts: Vec<BodyPart>,
}

impl Multipart {
    /// Assembles `parts` under a boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMultipart`] if `parts` is empty, a fixed
    /// boundary is malformed or occurs in a part, or no collision-free
    /// boundary could be generated.
    pub fn new(
        subtype: impl Into<String>,
        parts: Vec<BodyPart>,
        boundary: impl Into<Boundary>,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        let subtype = subtype.into().to_ascii_lowercase();
        if parts.is_empty() {
            return Err(Error::InvalidMultipart(format!(
                "multipart/{subtype} needs at least one part"
            )));
        }

        let rendered: Vec<Vec<u8>> = parts.iter().map(BodyPart::render).collect();

        let boundary = match boundary.into() {
            Boundary::Fixed(boundary) => {
                validate_boundary(&boundary)?;
                if collides(&boundary, &rendered) {
                    return Err(Error::InvalidMultipart(format!(
                        "boundary {boundary:?} occurs in part content"
                    )));
                }
                boundary
            }
            Boundary::Generated(style) => generate_boundary(style, &rendered, rng)?,
        };

        tracing::debug!(%subtype, %boundary, parts = parts.len(), "assembled multipart");

        Ok(Self {
            subtype,
            boundary,
            parts,
        })
    }

    /// Builds `multipart/alternative` with a plain-text part followed by an
    /// HTML part, both `charset=UTF-8` and 7bit.
    ///
    /// Plain text comes first so that clients which stop at the first
    /// acceptable part fall back to text, while capable clients take the
    /// last acceptable part.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMultipart`] for a bad or colliding boundary.
    pub fn alternative(
        text: impl Into<String>,
        html: impl Into<String>,
        boundary: impl Into<Boundary>,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        Self::new(
            "alternative",
            vec![BodyPart::text(text), BodyPart::html(html)],
            boundary,
            rng,
        )
    }

    /// Returns the subtype (e.g. `alternative`).
    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Returns the boundary.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the parts in order.
    #[must_use]
    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    /// `multipart/<subtype>; boundary="<boundary>"`.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        ContentType::multipart(self.subtype.clone(), self.boundary.clone())
    }

    /// Renders the multipart body: each part preceded by its delimiter line
    /// and followed by CRLF, then the close delimiter.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(b"--");
            out.extend_from_slice(self.boundary.as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.render());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(b"--\r\n");
        out
    }
}

fn generate_boundary(
    style: BoundaryStyle,
    rendered: &[Vec<u8>],
    rng: &mut dyn RngCore,
) -> Result<String> {
    for attempt in 1..=MAX_BOUNDARY_ATTEMPTS {
        let boundary = style.generate(rng);
        if !collides(&boundary, rendered) {
            return Ok(boundary);
        }
        tracing::warn!(attempt, %boundary, "generated boundary occurs in content, regenerating");
    }
    Err(Error::InvalidMultipart(format!(
        "no collision-free boundary after {MAX_BOUNDARY_ATTEMPTS} attempts"
    )))
}

fn validate_boundary(boundary: &str) -> Result<()> {
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LENGTH {
        return Err(Error::InvalidMultipart(format!(
            "boundary must be 1 to {MAX_BOUNDARY_LENGTH} characters, got {}",
            boundary.len()
        )));
    }
    let valid = boundary
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c));
    if !valid || boundary.ends_with(' ') {
        return Err(Error::InvalidMultipart(format!(
            "boundary {boundary:?} contains characters outside RFC 2046 bchars"
        )));
    }
    Ok(())
}

fn collides(boundary: &str, rendered: &[Vec<u8>]) -> bool {
    let needle = boundary.as_bytes();
    rendered
        .iter()
        .any(|part| part.windows(needle.len()).any(|w| w == needle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::part::TransferEncoding;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(2006)
    }

    #[test]
    fn test_alternative_has_text_then_html() {
        let mp = Multipart::alternative("Hi", "<h1>Hi</h1>", Boundary::default(), &mut rng())
            .unwrap();
        assert_eq!(mp.parts().len(), 2);
        assert!(mp.parts()[0].content_type().is("text", "plain"));
        assert!(mp.parts()[1].content_type().is("text", "html"));
        assert_eq!(mp.parts()[0].transfer_encoding(), TransferEncoding::SevenBit);
        assert_eq!(mp.boundary().len(), 40);
    }

    #[test]
    fn test_render_with_fixed_boundary() {
        let mp = Multipart::alternative("Hi", "<h1>Hi</h1>", "b1", &mut rng()).unwrap();
        let rendered = String::from_utf8(mp.render()).unwrap();
        assert_eq!(
            rendered,
            "--b1\r\n\
             Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             Hi\r\n\
             --b1\r\n\
             Content-Type: text/html; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             <h1>Hi</h1>\r\n\
             --b1--\r\n"
        );
        assert_eq!(
            mp.content_type().to_string(),
            "multipart/alternative; boundary=\"b1\""
        );
    }

    #[test]
    fn test_zero_parts_rejected() {
        let err = Multipart::new("mixed", Vec::new(), Boundary::default(), &mut rng()).unwrap_err();
        assert!(matches!(err, Error::InvalidMultipart(_)));
    }

    #[test]
    fn test_fixed_boundary_collision_rejected() {
        let err =
            Multipart::alternative("see --sep-- here", "<p/>", "sep", &mut rng()).unwrap_err();
        assert!(matches!(err, Error::InvalidMultipart(_)));
    }

    #[test]
    fn test_malformed_fixed_boundary_rejected() {
        let long = "x".repeat(71);
        for boundary in ["", "has\"quote", "trailing ", long.as_str()] {
            assert!(
                Multipart::alternative("a", "b", boundary, &mut rng()).is_err(),
                "{boundary:?}"
            );
        }
    }

    #[test]
    fn test_apple_style_boundary() {
        let mp = Multipart::alternative("a", "b", BoundaryStyle::AppleMail, &mut rng()).unwrap();
        let boundary = mp.boundary();
        assert!(boundary.starts_with("Apple-Mail=_"));
        assert_eq!(boundary.len(), "Apple-Mail=_".len() + 36);
        assert_eq!(boundary, boundary.to_uppercase().replace("APPLE-MAIL", "Apple-Mail"));
    }

    #[test]
    fn test_generated_boundaries_are_reproducible_with_seed() {
        let a = Multipart::alternative("a", "b", Boundary::default(), &mut rng()).unwrap();
        let b = Multipart::alternative("a", "b", Boundary::default(), &mut rng()).unwrap();
        assert_eq!(a.boundary(), b.boundary());
    }

    #[test]
    fn test_generated_boundary_avoids_content() {
        // Content that contains the first boundary the seeded rng produces.
        let first = BoundaryStyle::Alphanumeric.generate(&mut rng());
        let mp = Multipart::alternative(first.clone(), "<p/>", Boundary::default(), &mut rng())
            .unwrap();
        assert_ne!(mp.boundary(), first);
    }
}
