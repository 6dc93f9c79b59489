//! HTML nodes.

use smallvec::SmallVec;
use std::fmt;
use std::ops::Deref;

/// An HTML node. Every non-root node is owned by its parent's child list.
// `Element` is usally the most common variant and hence boxing it
// will most likely not improve performance overall.
#[allow(variant_size_differences)]
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// The document root.
    Document(Document),

    /// An element.
    Element(Element),

    /// Text.
    Text(Text),

    /// A comment.
    Comment(Comment),
}

impl Node {
    /// A text node.
    pub fn text<S: Into<String>>(text: S) -> Self {
        Node::Text(Text { text: text.into() })
    }

    /// A comment node.
    pub fn comment<S: Into<String>>(comment: S) -> Self {
        Node::Comment(Comment {
            comment: comment.into(),
        })
    }

    /// Returns true if node is the document root.
    pub fn is_document(&self) -> bool {
        matches!(*self, Node::Document(_))
    }

    /// Returns true if node is an element.
    pub fn is_element(&self) -> bool {
        matches!(*self, Node::Element(_))
    }

    /// Returns true if node is text.
    pub fn is_text(&self) -> bool {
        matches!(*self, Node::Text(_))
    }

    /// Returns true if node is a comment.
    pub fn is_comment(&self) -> bool {
        matches!(*self, Node::Comment(_))
    }

    /// Returns self as an element.
    pub fn as_element(&self) -> Option<&Element> {
        match *self {
            Node::Element(ref e) => Some(e),
            _ => None,
        }
    }

    /// Returns self as text.
    pub fn as_text(&self) -> Option<&Text> {
        match *self {
            Node::Text(ref t) => Some(t),
            _ => None,
        }
    }

    /// Returns self as a comment.
    pub fn as_comment(&self) -> Option<&Comment> {
        match *self {
            Node::Comment(ref c) => Some(c),
            _ => None,
        }
    }

    /// The child nodes. Text and comments have none.
    pub fn children(&self) -> &[Node] {
        match *self {
            Node::Document(ref d) => &d.children,
            Node::Element(ref e) => &e.children,
            _ => &[],
        }
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match *self {
            Node::Text(ref t) => out.push_str(t),
            Node::Comment(_) => (),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Document> for Node {
    fn from(document: Document) -> Self {
        Node::Document(document)
    }
}

// Always use one line.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            Node::Document(ref d) => write!(f, "Document({:?})", d.children),
            Node::Element(ref e) => write!(f, "Element({:?})", e),
            Node::Text(ref t) => write!(f, "Text({:?})", t),
            Node::Comment(ref c) => write!(f, "Comment({:?})", c),
        }
    }
}

/// The document root holding the top level nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    /// The top level nodes.
    pub children: Vec<Node>,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// A document with the nodes.
    pub fn with_children(children: Vec<Node>) -> Self {
        Document { children }
    }
}

/// HTML text. The text is stored decoded; escaping happens on serialization.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Text {
    /// The text.
    pub text: String,
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &str {
        self.text.deref()
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{:?}", self.deref())
    }
}

/// An HTML comment.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comment {
    /// The comment text.
    pub comment: String,
}

impl Deref for Comment {
    type Target = str;

    fn deref(&self) -> &str {
        self.comment.deref()
    }
}

impl fmt::Debug for Comment {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "<!-- {:?} -->", self.deref())
    }
}

/// A single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    /// The lower-case attribute name.
    pub name: String,
    /// The decoded attribute value.
    pub value: String,
}

impl Attribute {
    /// A new attribute, the name is lower-cased.
    pub fn new<N: AsRef<str>, V: Into<String>>(name: N, value: V) -> Self {
        Attribute {
            name: name.as_ref().to_ascii_lowercase(),
            value: value.into(),
        }
    }
}

/// Ordered attribute list. Most elements carry only a handful.
pub type Attributes = SmallVec<[Attribute; 4]>;

/// An HTML element.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element {
    /// The lower-case element name.
    pub name: String,

    /// The element attributes in source order, names unique.
    pub attrs: Attributes,

    /// The child nodes.
    pub children: Vec<Node>,
}

impl Element {
    /// A new element without attributes or children. The name is lower-cased.
    pub fn new<N: AsRef<str>>(name: N) -> Self {
        Element {
            name: name.as_ref().to_ascii_lowercase(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Returns the element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of an attribute. Names match case-insensitively.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Returns true if the attribute exists.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute. A duplicate name keeps its position and takes the new value.
    pub fn set_attr<N: AsRef<str>, V: Into<String>>(&mut self, name: N, value: V) {
        let name = name.as_ref();
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value.into(),
            None => self.attrs.push(Attribute::new(name, value)),
        }
    }

    /// Remove an attribute returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).value)
    }

    /// Returns an iterator over the element's attributes.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
    }

    /// Chain an attribute onto the element.
    pub fn with_attr<N: AsRef<str>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Chain a child onto the element.
    pub fn with_child<C: Into<Node>>(mut self, child: C) -> Self {
        self.children.push(child.into());
        self
    }

    /// Chain a text child onto the element.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.children.push(Node::text(text));
        self
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "<{}", self.name())?;
        for (key, value) in self.attrs() {
            write!(f, " {}={:?}", key, value)?;
        }
        write!(f, ">")?;
        if !self.children.is_empty() {
            write!(f, "{:?}", self.children)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_names_are_lower_cased() {
        let el = Element::new("DIV").with_attr("CLASS", "x");
        assert_eq!(el.name(), "div");
        assert_eq!(el.attr("class"), Some("x"));
        assert_eq!(el.attr("Class"), Some("x"));
    }

    #[test]
    fn duplicate_attribute_last_value_wins_first_position() {
        let mut el = Element::new("a");
        el.set_attr("href", "/one");
        el.set_attr("title", "t");
        el.set_attr("HREF", "/two");

        let attrs: Vec<_> = el.attrs().collect();
        assert_eq!(attrs, vec![("href", "/two"), ("title", "t")]);
    }

    #[test]
    fn remove_attr_returns_value() {
        let mut el = Element::new("img").with_attr("src", "/a.png");
        assert_eq!(el.remove_attr("SRC"), Some("/a.png".to_string()));
        assert!(!el.has_attr("src"));
        assert_eq!(el.remove_attr("src"), None);
    }

    #[test]
    fn text_content_skips_comments() {
        let node: Node = Element::new("p")
            .with_text("a")
            .with_child(Node::comment("hidden"))
            .with_child(Element::new("b").with_text("c"))
            .into();
        assert_eq!(node.text_content(), "ac");
    }
}
