//! Streaming HTML tokenizer.
//!
//! Works on the byte view of the input and only splits at ASCII delimiters, so
//! every slice it hands out stays on a char boundary. Malformed markup is
//! recovered the way browsers do it: a stray `<` is text, a tag cut off by the
//! end of input is discarded, an unterminated comment runs to the end.

use super::entities::decode;
use crate::node::{Attribute, Attributes};
use crate::utils::{RAW_TEXT_ELEMENTS, RCDATA_ELEMENTS};
use std::borrow::Cow;

/// A token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// A start tag with lower-case name and de-duplicated attributes.
    StartTag {
        name: String,
        attrs: Attributes,
        self_closing: bool,
    },
    /// An end tag.
    EndTag { name: String },
    /// Decoded text.
    Text(Cow<'a, str>),
    /// Comment content.
    Comment(&'a str),
    /// A doctype, ignored by the tree builder.
    Doctype,
}

/// How the content of the current raw element is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextMode {
    /// Verbatim up to the end tag.
    Raw,
    /// Character references decoded.
    Rcdata,
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// HTML tokenizer over a normalized input.
pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Set after a start tag of a raw text or RCDATA element.
    text_mode: Option<(String, TextMode)>,
    /// Inside `svg` or `math`, where every start tag is markup.
    foreign: bool,
}

impl<'a> Tokenizer<'a> {
    /// A new tokenizer.
    pub(crate) fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            pos: 0,
            text_mode: None,
            foreign: false,
        }
    }

    /// Tell the tokenizer whether foreign content is open.
    pub(crate) fn set_foreign(&mut self, foreign: bool) {
        self.foreign = foreign;
    }

    #[inline]
    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    #[inline]
    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    #[cfg_attr(feature = "inline-more", inline)]
    fn starts_with_ignore_case(&self, at: usize, pat: &str) -> bool {
        self.bytes()
            .get(at..at + pat.len())
            .map_or(false, |s| s.eq_ignore_ascii_case(pat.as_bytes()))
    }

    #[cfg_attr(feature = "inline-more", inline)]
    fn skip_spaces(&mut self) {
        while matches!(self.peek(0), Some(b) if is_space(b)) {
            self.pos += 1;
        }
    }

    /// Read until one of the delimiters, returning the slice.
    fn read_until(&mut self, stop: impl Fn(u8) -> bool) -> &'a str {
        let input = self.input;
        let bytes = input.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len() && !stop(bytes[self.pos]) {
            self.pos += 1;
        }
        &input[start..self.pos]
    }

    /// Find the end tag closing the current raw element.
    fn find_raw_end(&self, name: &str) -> Option<usize> {
        let bytes = self.bytes();
        let mut from = self.pos;

        while let Some(p) = memchr::memchr(b'<', &bytes[from..]) {
            let at = from + p;
            if bytes.get(at + 1) == Some(&b'/') && self.starts_with_ignore_case(at + 2, name) {
                match bytes.get(at + 2 + name.len()) {
                    Some(&b) if is_space(b) || b == b'/' || b == b'>' => return Some(at),
                    _ => (),
                }
            }
            from = at + 1;
        }

        None
    }

    /// Text content of a raw text or RCDATA element.
    fn raw_text(&mut self, name: String, mode: TextMode) -> Option<Token<'a>> {
        let input = self.input;
        let end = self.find_raw_end(&name).unwrap_or(input.len());
        let text = &input[self.pos..end];
        self.pos = end;

        if text.is_empty() {
            return None;
        }

        Some(Token::Text(match mode {
            TextMode::Raw => Cow::Borrowed(text),
            TextMode::Rcdata => decode(text, false),
        }))
    }

    /// Plain text up to the next `<`.
    fn text(&mut self) -> Token<'a> {
        let input = self.input;
        let start = self.pos;
        let end = match memchr::memchr(b'<', &input.as_bytes()[start..]) {
            Some(p) => start + p,
            None => input.len(),
        };
        self.pos = end;
        Token::Text(decode(&input[start..end], false))
    }

    /// Attributes of a tag up to and including `>`. `None` when input ends first.
    fn attributes(&mut self) -> Option<(Attributes, bool)> {
        let mut attrs = Attributes::new();

        loop {
            self.skip_spaces();

            match self.peek(0)? {
                b'>' => {
                    self.pos += 1;
                    return Some((attrs, false));
                }
                b'/' => {
                    self.pos += 1;
                    if self.peek(0)? == b'>' {
                        self.pos += 1;
                        return Some((attrs, true));
                    }
                    continue;
                }
                _ => (),
            }

            // a leading `=` is part of the name
            let start = self.pos;
            self.pos += 1;
            self.read_until(|b| is_space(b) || matches!(b, b'/' | b'>' | b'='));
            let name = self.input[start..self.pos].to_ascii_lowercase();

            self.skip_spaces();

            let value = if self.peek(0) == Some(b'=') {
                self.pos += 1;
                self.skip_spaces();
                match self.peek(0)? {
                    quote @ (b'"' | b'\'') => {
                        self.pos += 1;
                        let raw = self.read_until(|b| b == quote);
                        self.peek(0)?;
                        self.pos += 1;
                        decode(raw, true).into_owned()
                    }
                    b'>' => String::new(),
                    _ => {
                        let raw = self.read_until(|b| is_space(b) || b == b'>');
                        decode(raw, true).into_owned()
                    }
                }
            } else {
                String::new()
            };

            match attrs.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attribute { name, value }),
            }
        }
    }

    /// A start tag, `pos` at the first letter of the name.
    fn start_tag(&mut self) -> Option<Token<'a>> {
        let name = self
            .read_until(|b| is_space(b) || b == b'/' || b == b'>')
            .to_ascii_lowercase();

        let (attrs, self_closing) = match self.attributes() {
            Some(parsed) => parsed,
            None => {
                self.pos = self.input.len();
                return None;
            }
        };

        // raw text elements are ordinary markup in foreign content
        if !self.foreign {
            if RAW_TEXT_ELEMENTS.contains(name.as_str()) {
                self.text_mode = Some((name.clone(), TextMode::Raw));
            } else if RCDATA_ELEMENTS.contains(name.as_str()) {
                self.text_mode = Some((name.clone(), TextMode::Rcdata));
            }
        }

        Some(Token::StartTag {
            name,
            attrs,
            self_closing,
        })
    }

    /// An end tag, `pos` at the first letter of the name.
    fn end_tag(&mut self) -> Option<Token<'a>> {
        let name = self
            .read_until(|b| is_space(b) || b == b'/' || b == b'>')
            .to_ascii_lowercase();

        // end tags may carry attributes, they are parsed and thrown away
        match self.attributes() {
            Some(_) => Some(Token::EndTag { name }),
            None => {
                self.pos = self.input.len();
                None
            }
        }
    }

    /// A comment, `pos` after `<!--`.
    fn comment(&mut self) -> Token<'a> {
        // abrupt closing `<!-->` and `<!--->`
        if self.peek(0) == Some(b'>') {
            self.pos += 1;
            return Token::Comment("");
        }
        if self.peek(0) == Some(b'-') && self.peek(1) == Some(b'>') {
            self.pos += 2;
            return Token::Comment("");
        }

        let input = self.input;
        let bytes = input.as_bytes();
        let start = self.pos;
        let mut from = start;

        while let Some(p) = memchr::memchr(b'-', &bytes[from..]) {
            let at = from + p;
            if bytes.get(at + 1) == Some(&b'-') {
                if bytes.get(at + 2) == Some(&b'>') {
                    self.pos = at + 3;
                    return Token::Comment(&input[start..at]);
                }
                if bytes.get(at + 2) == Some(&b'!') && bytes.get(at + 3) == Some(&b'>') {
                    self.pos = at + 4;
                    return Token::Comment(&input[start..at]);
                }
            }
            from = at + 1;
        }

        self.pos = input.len();
        Token::Comment(&input[start..])
    }

    /// Everything up to `>` becomes a comment, `pos` at its first byte.
    fn bogus_comment(&mut self) -> Token<'a> {
        let text = self.read_until(|b| b == b'>');
        if self.pos < self.input.len() {
            self.pos += 1;
        }
        Token::Comment(text)
    }

    /// Markup starting at `<`.
    fn markup(&mut self) -> Option<Token<'a>> {
        match self.peek(1) {
            Some(b) if b.is_ascii_alphabetic() => {
                self.pos += 1;
                self.start_tag()
            }
            Some(b'/') => match self.peek(2) {
                Some(b) if b.is_ascii_alphabetic() => {
                    self.pos += 2;
                    self.end_tag()
                }
                Some(b'>') => {
                    self.pos += 3;
                    None
                }
                Some(_) => {
                    self.pos += 2;
                    Some(self.bogus_comment())
                }
                None => {
                    self.pos += 2;
                    Some(Token::Text(Cow::Borrowed("</")))
                }
            },
            Some(b'!') => {
                if self.starts_with_ignore_case(self.pos + 2, "--") {
                    self.pos += 4;
                    Some(self.comment())
                } else if self.starts_with_ignore_case(self.pos + 2, "doctype") {
                    self.pos += 2;
                    self.bogus_comment();
                    Some(Token::Doctype)
                } else {
                    self.pos += 2;
                    Some(self.bogus_comment())
                }
            }
            Some(b'?') => {
                self.pos += 1;
                Some(self.bogus_comment())
            }
            _ => {
                self.pos += 1;
                Some(Token::Text(Cow::Borrowed("<")))
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        while self.pos < self.input.len() {
            if let Some((name, mode)) = self.text_mode.take() {
                match self.raw_text(name, mode) {
                    Some(token) => return Some(token),
                    None => continue,
                }
            }

            let token = if self.bytes()[self.pos] == b'<' {
                self.markup()
            } else {
                Some(self.text())
            };

            if token.is_some() {
                return token;
            }
        }

        None
    }
}
