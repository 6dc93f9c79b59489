//! HTML parsing.
//!
//! Parsing never fails. Malformed markup is recovered the way browsers recover it
//! and the input is read as a `<body>` fragment. The only thing that stops the
//! parser early is the nesting ceiling from [`Limits`], reported through
//! [`ParseOutcome::truncated`].

/// Character reference decoding.
pub mod entities;
/// Tokenizer.
pub(crate) mod tokenizer;
/// Tree construction.
pub(crate) mod tree_builder;

use crate::configuration::Limits;
use crate::node::{Document, Node};
use std::borrow::Cow;
use tokenizer::Tokenizer;
use tree_builder::TreeBuilder;

/// The result of a parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// The parsed document.
    pub document: Document,
    /// Parsing stopped at the nesting ceiling and the rest of the input was dropped.
    pub truncated: bool,
}

/// HTML parser with resource ceilings.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    limits: Limits,
}

/// Strip NUL bytes and fold `\r\n` and `\r` into `\n`.
pub fn normalize_input(input: &str) -> Cow<'_, str> {
    if memchr::memchr2(b'\0', b'\r', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\0' => (),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

impl Parser {
    /// A parser with the limits.
    pub fn new(limits: Limits) -> Self {
        Parser { limits }
    }

    /// The limits in use.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Parse the input into a document, dropping anything past the nesting ceiling.
    pub fn parse(&self, input: &str) -> Document {
        self.parse_with_outcome(input).document
    }

    /// Parse the input and report whether the nesting ceiling truncated it.
    pub fn parse_with_outcome(&self, input: &str) -> ParseOutcome {
        let input = normalize_input(input);
        let mut builder = TreeBuilder::new(self.limits.max_depth);

        builder.consume(Tokenizer::new(&input));

        let truncated = builder.is_truncated();

        ParseOutcome {
            document: builder.finish(),
            truncated,
        }
    }
}

/// Parse HTML with the default limits. The returned node is always a document root.
pub fn parse(input: &str) -> Node {
    Node::Document(Parser::default().parse(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Element;

    #[test]
    fn test_parse_returns_document() {
        let node = parse("<p>text");
        assert!(node.is_document());
        assert_eq!(
            node.children(),
            &[Node::from(Element::new("p").with_text("text"))]
        );
    }

    #[test]
    fn test_nul_and_carriage_returns() {
        assert_eq!(normalize_input("a\0b\r\nc\rd"), "ab\nc\nd");
        assert!(matches!(normalize_input("plain"), Cow::Borrowed(_)));

        let node = parse("<scr\0ipt>alert(1)</script>");
        assert_eq!(
            node.children(),
            &[Node::from(Element::new("script").with_text("alert(1)"))]
        );
    }

    #[test]
    fn test_outcome_reports_truncation() {
        let parser = Parser::new(Limits::default().with_max_depth(2));
        let outcome = parser.parse_with_outcome("<b><i><u>x</u></i></b>");
        assert!(outcome.truncated);
        assert_eq!(outcome.document.children.len(), 1);

        let outcome = parser.parse_with_outcome("<b><i>x</i></b>");
        assert!(!outcome.truncated);
    }

    #[test]
    fn test_garbage_never_panics() {
        for input in [
            "<",
            "<<<>>>",
            "</",
            "<!",
            "<!-",
            "<a",
            "<a b='",
            "&#",
            "&#x",
            "<table><td></tr></table></td>",
            "<p><p><p></div></span>",
            "\u{FEFF}<é attr=ü>✓</é>",
        ] {
            let _ = parse(input);
        }
    }
}
