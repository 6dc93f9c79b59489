//! HTML serialization.
//!
//! Text and attribute values are escaped so nothing in them reads as markup
//! again. Elements with verbatim content (`script`, `style`, ...) are the
//! exception: their text is written as is apart from anything that would end
//! the element early. Inside `svg` and `math` those elements hold markup, so
//! their text is escaped like any other.

use crate::node::{Element, Node};
use crate::utils::{
    is_foreign, is_raw_text, is_valid_attribute_name, is_valid_tag_name, is_void,
};
use std::borrow::Cow;
use std::fmt::{self, Write};

/// Escape text content.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text, |c| matches!(c, '&' | '<' | '>' | '\r'))
}

/// Escape a double quoted attribute value.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    escape(value, |c| matches!(c, '&' | '<' | '>' | '"' | '\'' | '\r'))
}

fn escape(input: &str, needs_escape: impl Fn(char) -> bool) -> Cow<'_, str> {
    let first = match input.find(&needs_escape) {
        Some(first) => first,
        None => return Cow::Borrowed(input),
    };

    let mut out = String::with_capacity(input.len() + 16);
    out.push_str(&input[..first]);

    for c in input[first..].chars() {
        match c {
            '&' if needs_escape(c) => out.push_str("&amp;"),
            '<' if needs_escape(c) => out.push_str("&lt;"),
            '>' if needs_escape(c) => out.push_str("&gt;"),
            '"' if needs_escape(c) => out.push_str("&#34;"),
            '\'' if needs_escape(c) => out.push_str("&#39;"),
            // carriage returns are folded away when the markup is parsed again
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

/// Raw text with every `</name` that would close the element written as `<\/name`.
fn escape_raw_text<'a>(text: &'a str, name: &str) -> Cow<'a, str> {
    let bytes = text.as_bytes();
    let closes_at = |at: usize| {
        let rest = &bytes[at + 2..];
        rest.len() >= name.len()
            && rest[..name.len()].eq_ignore_ascii_case(name.as_bytes())
            && matches!(
                rest.get(name.len()),
                Some(b'\t' | b'\n' | b'\x0C' | b'\r' | b' ' | b'/' | b'>')
            )
    };

    let mut out: Option<String> = None;
    let mut copied = 0;

    for at in memchr::memmem::find_iter(bytes, b"</") {
        if closes_at(at) {
            let buf = out.get_or_insert_with(|| String::with_capacity(text.len() + 8));
            buf.push_str(&text[copied..at]);
            buf.push_str("<\\/");
            copied = at + 2;
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}

/// Comment text that cannot end the comment early.
fn neutralize_comment(comment: &str) -> Cow<'_, str> {
    let unsafe_start = comment.starts_with('>') || comment.starts_with("->");
    if !unsafe_start && !comment.contains("-->") && !comment.contains("--!>") {
        return Cow::Borrowed(comment);
    }

    let mut out = String::with_capacity(comment.len() + 4);
    if unsafe_start {
        out.push(' ');
    }
    out.push_str(&comment.replace("-->", "-- >").replace("--!>", "--! >"));
    Cow::Owned(out)
}

fn write_element<W: Write>(element: &Element, out: &mut W, foreign: bool) -> fmt::Result {
    let name = element.name();
    let emit_tags = is_valid_tag_name(name);

    if emit_tags {
        write!(out, "<{}", name)?;
        for attr in &element.attrs {
            if is_valid_attribute_name(&attr.name) {
                write!(out, " {}=\"{}\"", attr.name, escape_attribute(&attr.value))?;
            }
        }
        out.write_char('>')?;

        if is_void(name) {
            return Ok(());
        }
    }

    let raw = emit_tags && !foreign && is_raw_text(name);
    let foreign = foreign || (emit_tags && is_foreign(name));

    for child in &element.children {
        match child {
            Node::Text(text) if raw => out.write_str(&escape_raw_text(text, name))?,
            child => write_node(child, out, foreign)?,
        }
    }

    if emit_tags {
        write!(out, "</{}>", name)?;
    }

    Ok(())
}

fn write_node<W: Write>(node: &Node, out: &mut W, foreign: bool) -> fmt::Result {
    match node {
        Node::Document(document) => {
            for child in &document.children {
                write_node(child, out, foreign)?;
            }
            Ok(())
        }
        Node::Element(element) => write_element(element, out, foreign),
        Node::Text(text) => out.write_str(&escape_text(text)),
        Node::Comment(comment) => write!(out, "<!--{}-->", neutralize_comment(comment)),
    }
}

/// Write a node as HTML.
pub fn serialize_to<W: Write>(node: &Node, out: &mut W) -> fmt::Result {
    write_node(node, out, false)
}

/// Render a node as HTML.
pub fn serialize(node: &Node) -> String {
    let mut out = String::new();
    // writing into a String does not fail
    let _ = serialize_to(node, &mut out);
    out
}
