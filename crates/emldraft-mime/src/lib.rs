//! # emldraft-mime
//!
//! MIME message assembly and RFC 5322 serialization.
//!
//! ## Features
//!
//! - **Addresses**: Parse and render `"Name" <local@domain>` addresses
//! - **Content types**: Ordered, case-insensitive parameters
//! - **Transfer encodings**: 7bit, 8bit, Quoted-Printable, Base64, RFC 2047 headers
//! - **Multipart**: `multipart/alternative` assembly with collision-checked boundaries
//! - **Serialization**: Fixed header order, folding, CRLF line endings
//! - **Apple Mail**: Draft compatibility header overlay
//!
//! ## Quick Start
//!
//! ```ignore
//! use emldraft_mime::Message;
//!
//! let message = Message::builder()
//!     .from("sender@example.com")
//!     .to("recipient@example.com")
//!     .subject("Test")
//!     .text_body("Plain text version")
//!     .html_body("<h1>HTML version</h1>")
//!     .build()?; // multipart/alternative
//!
//! std::fs::write("draft.eml", message.render())?;
//! ```
//!
//! ### Deterministic output
//!
//! ```ignore
//! use emldraft_mime::{FixedClock, Message, Sources};
//! use rand::SeedableRng;
//!
//! let clock = FixedClock(chrono::DateTime::parse_from_rfc2822(
//!     "Mon, 02 Jan 2006 15:04:05 -0700",
//! )?);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let message = Message::builder()
//!     .from("a@x.com")
//!     .to("b@y.com")
//!     .text_body("Hello")
//!     .build_with(&mut Sources::new(&clock, &mut rng))?;
//! ```
//!
//! ### Apple Mail drafts
//!
//! ```ignore
//! use emldraft_mime::apple::AppleOverlay;
//!
//! let draft = AppleOverlay::new("F1A6F8A2-3C1E-4F4B-9E7E-2B8D0C9D1E2F")?.apply(&message);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod message;
mod multipart;
mod part;
mod source;

pub mod apple;
pub mod encoding;
pub mod serialize;

pub use address::{Address, IntoAddress};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{FOLD_WIDTH, Headers, fold_header};
pub use message::{Body, MIME_VERSION, Message, MessageBuilder};
pub use multipart::{Boundary, BoundaryStyle, MAX_BOUNDARY_LENGTH, Multipart};
pub use part::{BodyPart, TransferEncoding};
pub use source::{Clock, FixedClock, Sources, SystemClock, random_token, random_uuid};
