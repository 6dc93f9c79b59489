#![warn(missing_docs)]

//! Allow-list HTML sanitizer.
//!
//! Untrusted markup is parsed into a tree the way browsers recover broken HTML,
//! every element and attribute the [`Policy`] does not name is removed, URL
//! attributes are checked against the allowed schemes and the tree is written
//! back out as escaped, well formed HTML.
//!
//! # How to use
//!
//! - Build a [`Policy`] once with [`Policy::builder`] or start from a preset
//!   ([`Policy::ugc`], [`Policy::strict`]) and share it, it is cheap to clone and
//!   safe to use from any number of threads.
//! - Call [`sanitize`] for a string in and a string out, or a [`Sanitizer`] to
//!   set [`Limits`](configuration::Limits) and get the tree with the
//!   [`was_modified`](sanitizer::Sanitized::was_modified) flag.
//!
//! # Basic usage
//!
//! ```rust
//! use spider_sanitizer::{sanitize, Policy};
//!
//! let html = sanitize(
//!     r#"<p onclick="steal()">Hi <a href="https://spider.cloud">there</a><script>bad()</script></p>"#,
//!     &Policy::ugc(),
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     html,
//!     r#"<p>Hi <a href="https://spider.cloud" rel="nofollow">there</a></p>"#
//! );
//! ```
//!
//! Output sanitized once is a fixed point: sanitizing it again with the same
//! policy returns it unchanged and reports no modification.

#[macro_use]
extern crate string_concat;
extern crate hashbrown;
extern crate log;
pub extern crate url;

/// Resource limits.
pub mod configuration;
/// Error types.
pub mod error;
/// Element and attribute decisions.
pub mod matcher;
/// The document tree.
pub mod node;
/// HTML parsing.
pub mod parser;
/// Allow-list policies.
pub mod policy;
/// Applying a policy to a tree.
pub mod sanitizer;
/// Writing a tree back to HTML.
pub mod serializer;
/// Tag tables and URL helpers.
pub mod utils;

pub use configuration::Limits;
pub use error::{Error, Result};
pub use node::{Attribute, Comment, Document, Element, Node, Text};
pub use parser::{parse, Parser};
pub use policy::{Disposition, Policy, PolicyBuilder, PolicyRule, PolicyTable};
pub use sanitizer::{sanitize, sanitize_tree, Sanitized, Sanitizer};
pub use serializer::serialize;
