//! Tree construction over the token stream.
//!
//! Open elements live on a stack and are attached to their parent when they are
//! popped, so every node has exactly one owner from the moment it is built.

use super::tokenizer::{Token, Tokenizer};
use crate::node::{Attributes, Comment, Document, Element, Node, Text};
use crate::utils::{
    is_foreign, CLOSES_P, HEADINGS, HTML_ELEMENTS, IGNORED_TAGS, NO_SELF_NESTING,
    SCOPE_BOUNDARIES, SPECIAL_ELEMENTS, VOID_ELEMENTS,
};

/// Builds a document from tokens.
pub(crate) struct TreeBuilder {
    /// Children of the document root.
    root: Vec<Node>,
    /// The stack of open elements.
    stack: Vec<Element>,
    /// Most elements allowed open at once.
    max_depth: usize,
    /// The depth ceiling stopped tree construction.
    truncated: bool,
}

/// Append text merging into a trailing text node.
pub(crate) fn append_text(children: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    match children.last_mut() {
        Some(Node::Text(last)) => last.text.push_str(text),
        _ => children.push(Node::Text(Text {
            text: text.to_string(),
        })),
    }
}

impl TreeBuilder {
    /// A new builder with a nesting ceiling.
    pub(crate) fn new(max_depth: usize) -> Self {
        TreeBuilder {
            root: Vec::new(),
            stack: Vec::new(),
            max_depth,
            truncated: false,
        }
    }

    /// Has the depth ceiling been hit.
    pub(crate) fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// An `svg` or `math` element is open.
    pub(crate) fn in_foreign_content(&self) -> bool {
        self.stack.iter().any(|el| is_foreign(&el.name))
    }

    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(el) => &mut el.children,
            None => &mut self.root,
        }
    }

    fn current_name(&self) -> Option<&str> {
        self.stack.last().map(|el| el.name.as_str())
    }

    /// Pop the current element attaching it to its parent.
    fn pop(&mut self) {
        if let Some(el) = self.stack.pop() {
            self.children_mut().push(Node::Element(el));
        }
    }

    /// Pop elements until the one at `index` has been popped.
    fn pop_through(&mut self, index: usize) {
        while self.stack.len() > index {
            self.pop();
        }
    }

    /// Position of the nearest open `name` before a scope boundary.
    fn in_scope(&self, name: &str, extra_boundary: &[&str]) -> Option<usize> {
        for (i, el) in self.stack.iter().enumerate().rev() {
            if el.name == name {
                return Some(i);
            }
            if SCOPE_BOUNDARIES.contains(el.name.as_str())
                || extra_boundary.contains(&el.name.as_str())
            {
                return None;
            }
        }
        None
    }

    /// Position of the nearest open element in `names`, stopping at special elements
    /// other than `address`, `div` and `p`.
    fn list_item_in_scope(&self, names: &[&str]) -> Option<usize> {
        for (i, el) in self.stack.iter().enumerate().rev() {
            let name = el.name.as_str();
            if names.contains(&name) {
                return Some(i);
            }
            if SPECIAL_ELEMENTS.contains(name) && !matches!(name, "address" | "div" | "p") {
                return None;
            }
        }
        None
    }

    /// Position of the nearest open element in `names`, stopping at `boundary`.
    fn find_before(&self, names: &[&str], boundary: &[&str]) -> Option<usize> {
        for (i, el) in self.stack.iter().enumerate().rev() {
            let name = el.name.as_str();
            if names.contains(&name) {
                return Some(i);
            }
            if boundary.contains(&name) {
                return None;
            }
        }
        None
    }

    /// Close the elements a new start tag implies the end of.
    fn close_implied(&mut self, name: &str) {
        if CLOSES_P.contains(name) {
            if let Some(i) = self.in_scope("p", &["button"]) {
                self.pop_through(i);
            }
        }

        match name {
            "li" => {
                if let Some(i) = self.list_item_in_scope(&["li"]) {
                    self.pop_through(i);
                }
            }
            "dd" | "dt" => {
                if let Some(i) = self.list_item_in_scope(&["dd", "dt"]) {
                    self.pop_through(i);
                }
            }
            "option" => {
                if self.current_name() == Some("option") {
                    self.pop();
                }
            }
            "optgroup" => {
                if self.current_name() == Some("option") {
                    self.pop();
                }
                if self.current_name() == Some("optgroup") {
                    self.pop();
                }
            }
            "tr" => {
                if let Some(i) = self.find_before(&["tr"], &["table", "thead", "tbody", "tfoot"])
                {
                    self.pop_through(i);
                }
            }
            "td" | "th" => {
                if let Some(i) = self.find_before(&["td", "th"], &["tr", "table"]) {
                    self.pop_through(i);
                }
            }
            "thead" | "tbody" | "tfoot" => {
                if let Some(i) = self.find_before(&["thead", "tbody", "tfoot"], &["table"]) {
                    self.pop_through(i);
                }
            }
            _ if HEADINGS.contains(name) => {
                if self.current_name().map_or(false, |n| HEADINGS.contains(n)) {
                    self.pop();
                }
            }
            _ if NO_SELF_NESTING.contains(name) => {
                if let Some(i) = self.in_scope(name, &[]) {
                    self.pop_through(i);
                }
            }
            _ => (),
        }
    }

    /// Handle a start tag. Returns false once the depth ceiling is hit.
    fn start_tag(&mut self, name: String, attrs: Attributes, self_closing: bool) -> bool {
        if IGNORED_TAGS.contains(name.as_str()) {
            return true;
        }

        self.close_implied(&name);

        if self.stack.len() >= self.max_depth {
            log::warn!(
                "html nesting exceeded {} open elements, truncating parse",
                self.max_depth
            );
            self.truncated = true;
            return false;
        }

        let closes_now = VOID_ELEMENTS.contains(name.as_str())
            || (self_closing
                && (!HTML_ELEMENTS.contains(name.as_str()) || self.in_foreign_content()));

        let el = Element {
            name,
            attrs,
            children: Vec::new(),
        };

        if closes_now {
            self.children_mut().push(Node::Element(el));
        } else {
            self.stack.push(el);
        }

        true
    }

    /// Handle an end tag.
    fn end_tag(&mut self, name: String) -> bool {
        if IGNORED_TAGS.contains(name.as_str()) {
            return true;
        }

        if name == "br" {
            return self.start_tag(name, Attributes::new(), false);
        }

        let open = match name.as_str() {
            "table" => self.find_before(&["table"], &["template", "html"]),
            "caption" | "thead" | "tbody" | "tfoot" | "tr" | "td" | "th" => {
                self.find_before(&[name.as_str()], &["table", "template", "html"])
            }
            _ => self.in_scope(&name, &[]),
        };

        if let Some(i) = open {
            self.pop_through(i);
        }

        true
    }

    /// Feed a token. Returns false once the builder stops accepting input.
    pub(crate) fn process(&mut self, token: Token<'_>) -> bool {
        if self.truncated {
            return false;
        }

        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => self.start_tag(name, attrs, self_closing),
            Token::EndTag { name } => self.end_tag(name),
            Token::Text(text) => {
                append_text(self.children_mut(), &text);
                true
            }
            Token::Comment(comment) => {
                self.children_mut().push(Node::Comment(Comment {
                    comment: comment.to_string(),
                }));
                true
            }
            Token::Doctype => true,
        }
    }

    /// Feed every token, keeping the tokenizer told about foreign content.
    pub(crate) fn consume(&mut self, mut tokenizer: Tokenizer<'_>) {
        while let Some(token) = tokenizer.next() {
            if !self.process(token) {
                break;
            }
            tokenizer.set_foreign(self.in_foreign_content());
        }
    }

    /// Close everything still open and return the document.
    pub(crate) fn finish(mut self) -> Document {
        self.pop_through(0);
        Document::with_children(self.root)
    }
}
