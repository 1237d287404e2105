//! # emldraft
//!
//! Compose email drafts and save them as `.eml` files.
//!
//! This crate provides:
//! - [`Draft`]: recipients, subject, text and HTML as plain strings
//! - [`ComposeOptions`]: pinned boundary, Message-ID, date, Apple identifier
//!   and extension headers, loadable from JSON
//! - Plain-text fallback derived from HTML with `htmd`
//! - Apple Mail drafts through [`Draft::compose_apple`]
//!
//! Message assembly and serialization live in [`emldraft_mime`].
//!
//! ```ignore
//! use emldraft::{ComposeOptions, Draft};
//!
//! let draft = Draft::new("me@example.com", "Weekly report")
//!     .to("team@example.com")
//!     .html("<h1>Report</h1><p>All green.</p>");
//!
//! let message = draft.compose_apple(&ComposeOptions::default())?;
//! std::fs::write("report.eml", message.render())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod draft;
mod error;
pub mod markup;
mod options;

pub use draft::Draft;
pub use error::{Error, Result};
pub use markup::{HtmdConverter, HtmlToText, MarkupRenderer, NoFallback, RenderError, from_fn};
pub use options::ComposeOptions;

pub use emldraft_mime;
pub use emldraft_mime::Message;
