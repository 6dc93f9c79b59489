//! Tree sanitization.
//!
//! The walk consumes the input tree and builds fresh child lists, so dropping
//! or unwrapping a node never disturbs the iteration over its siblings.

use crate::configuration::Limits;
use crate::error::{Error, Result};
use crate::matcher::{self, AttributeDecision, Decision};
use crate::node::{Attributes, Document, Element, Node};
use crate::parser::tree_builder::append_text;
use crate::parser::Parser;
use crate::policy::Policy;
use crate::serializer;
use crate::utils::url::is_fully_qualified;
use crate::utils::{is_text_only, is_void, LINK_ELEMENTS};
use smallvec::SmallVec;

/// The output of a sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    /// The sanitized tree.
    pub node: Node,
    /// Something was removed or rewritten. An unmodified input was already safe.
    pub was_modified: bool,
}

impl Sanitized {
    /// Render the sanitized tree.
    pub fn html(&self) -> String {
        serializer::serialize(&self.node)
    }

    /// Split into the tree and the modified flag.
    pub fn into_parts(self) -> (Node, bool) {
        (self.node, self.was_modified)
    }
}

/// Applies a policy to markup.
///
/// ```rust
/// use spider_sanitizer::{Policy, Sanitizer};
///
/// let mut builder = Policy::builder();
/// builder
///     .allow_elements(["a"])
///     .allow_attributes_on(["a"], ["href"])
///     .allow_url_schemes(["https"]);
///
/// let sanitizer = Sanitizer::new(builder.build());
/// let html = sanitizer
///     .sanitize(r#"<a href="javascript:alert(1)" onclick="x()">go</a><script>bad()</script>"#)
///     .unwrap();
///
/// assert_eq!(html, "<a>go</a>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    policy: Policy,
    limits: Limits,
}

impl Sanitizer {
    /// A sanitizer with the default limits.
    pub fn new(policy: Policy) -> Self {
        Sanitizer {
            policy,
            limits: Limits::default(),
        }
    }

    /// Set the resource limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The policy in use.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The limits in use.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn parser(&self) -> Parser {
        Parser::new(self.limits)
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.limits.max_input_bytes {
            log::warn!(
                "refusing {} bytes of html, limit is {}",
                size,
                self.limits.max_input_bytes
            );
            return Err(Error::InputTooLarge {
                size,
                limit: self.limits.max_input_bytes,
            });
        }
        Ok(())
    }

    fn write(node: &Node, capacity: usize) -> Result<String> {
        let mut out = String::with_capacity(capacity);
        serializer::serialize_to(node, &mut out)
            .map_err(|_| Error::Internal("failed to serialize the sanitized tree"))?;
        Ok(out)
    }

    /// Parse a document, refusing it when it nests past the depth ceiling.
    fn parse(&self, html: &str) -> Result<Document> {
        let outcome = self.parser().parse_with_outcome(html);
        if outcome.truncated {
            return Err(Error::DepthExceeded {
                limit: self.limits.max_depth,
            });
        }
        Ok(outcome.document)
    }

    /// Sanitize markup into safe markup.
    pub fn sanitize(&self, html: &str) -> Result<String> {
        let sanitized = self.sanitize_document(html)?;
        Self::write(&sanitized.node, html.len())
    }

    /// Sanitize raw bytes. Invalid UTF-8 sequences become U+FFFD.
    pub fn sanitize_bytes(&self, bytes: &[u8]) -> Result<String> {
        self.check_size(bytes.len())?;
        match simdutf8::basic::from_utf8(bytes) {
            Ok(html) => self.sanitize(html),
            Err(_) => self.sanitize(&String::from_utf8_lossy(bytes)),
        }
    }

    /// Sanitize markup and keep the tree and the modified flag.
    pub fn sanitize_document(&self, html: &str) -> Result<Sanitized> {
        self.check_size(html.len())?;

        let mut walker = TreeWalker::new(&self.policy, self.limits.max_depth);
        let document = walker.document(self.parse(html)?)?;

        if !walker.unwrapped {
            return Ok(Sanitized {
                node: Node::Document(document),
                was_modified: walker.modified,
            });
        }

        // children spliced into a new parent can parse differently, settle the
        // tree on its own serialization so the output is a fixed point
        let html = Self::write(&Node::Document(document), html.len())?;
        let mut settle = TreeWalker::new(&self.policy, self.limits.max_depth);
        let document = settle.document(self.parse(&html)?)?;

        Ok(Sanitized {
            node: Node::Document(document),
            was_modified: true,
        })
    }

    /// Sanitize a tree built in memory. A root that is removed or unwrapped
    /// comes back as a document holding whatever survived.
    pub fn sanitize_tree(&self, node: Node) -> Result<Sanitized> {
        let mut walker = TreeWalker::new(&self.policy, self.limits.max_depth);

        let node = match node {
            Node::Document(document) => Node::Document(walker.document(document)?),
            node => {
                let mut out = Vec::with_capacity(1);
                walker.node(node, &mut out, 0)?;
                if out.len() == 1 && !walker.root_removed {
                    out.remove(0)
                } else {
                    Node::Document(Document::with_children(out))
                }
            }
        };

        Ok(Sanitized {
            node,
            was_modified: walker.modified,
        })
    }
}

/// One pass over a tree.
struct TreeWalker<'p> {
    policy: &'p Policy,
    max_depth: usize,
    /// Anything changed.
    modified: bool,
    /// An element was unwrapped.
    unwrapped: bool,
    /// An element at the top of the walk was dropped or unwrapped.
    root_removed: bool,
}

impl<'p> TreeWalker<'p> {
    fn new(policy: &'p Policy, max_depth: usize) -> Self {
        TreeWalker {
            policy,
            max_depth,
            modified: false,
            unwrapped: false,
            root_removed: false,
        }
    }

    fn document(&mut self, document: Document) -> Result<Document> {
        Ok(Document::with_children(self.children(document.children, 0)?))
    }

    fn children(&mut self, children: Vec<Node>, depth: usize) -> Result<Vec<Node>> {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            self.node(child, &mut out, depth)?;
        }
        Ok(out)
    }

    /// Leave a space where an element was removed when the policy asks for it.
    fn strip_space(&self, out: &mut Vec<Node>) {
        if !self.policy.adds_space_when_stripping() {
            return;
        }
        match out.last() {
            Some(Node::Text(text)) if text.ends_with(' ') => (),
            _ => append_text(out, " "),
        }
    }

    /// Sanitize a node into `out`. `depth` counts the element levels above it, kept or not.
    fn node(&mut self, node: Node, out: &mut Vec<Node>, depth: usize) -> Result<()> {
        match node {
            Node::Text(text) => append_text(out, &text.text),
            Node::Comment(comment) => {
                if self.policy.allows_comments() {
                    out.push(Node::Comment(comment));
                } else {
                    self.modified = true;
                }
            }
            Node::Document(document) => {
                self.check_depth(depth)?;
                self.modified = true;
                self.unwrapped = true;
                for child in document.children {
                    self.node(child, out, depth + 1)?;
                }
            }
            Node::Element(element) => self.element(element, out, depth)?,
        }
        Ok(())
    }

    /// Fail once the walk is nested `max_depth` levels deep.
    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            log::warn!("html nesting exceeded {} elements", self.max_depth);
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn element(&mut self, element: Element, out: &mut Vec<Node>, depth: usize) -> Result<()> {
        self.check_depth(depth)?;

        let evaluation = matcher::evaluate(&element, self.policy);

        match evaluation.decision {
            Decision::Drop => {
                log::debug!("dropping <{}> with its content", element.name);
                self.modified = true;
                self.root_removed |= depth == 0;
                self.strip_space(out);
            }
            Decision::Unwrap => {
                log::debug!("unwrapping <{}>", element.name);
                self.modified = true;
                self.unwrapped = true;
                self.root_removed |= depth == 0;
                self.strip_space(out);
                for child in element.children {
                    self.node(child, out, depth + 1)?;
                }
                self.strip_space(out);
            }
            Decision::Keep => {
                let Element {
                    name,
                    attrs,
                    children,
                } = element;

                let original: Option<Attributes> = if self.policy.link_rules().is_active()
                    && LINK_ELEMENTS.contains(name.as_str())
                {
                    Some(attrs.clone())
                } else {
                    None
                };
                let mut attrs_changed = false;
                let mut kept = Attributes::with_capacity(attrs.len());

                for (mut attr, decision) in attrs.into_iter().zip(evaluation.attributes) {
                    match decision {
                        AttributeDecision::Keep => kept.push(attr),
                        AttributeDecision::Rewrite(value) => {
                            attrs_changed = true;
                            attr.value = value;
                            kept.push(attr);
                        }
                        AttributeDecision::Strip(reason) => {
                            log::trace!("stripping {} from <{}>: {}", attr.name, name, reason);
                            attrs_changed = true;
                        }
                    }
                }

                let mut sanitized = Element {
                    name,
                    attrs: kept,
                    children: Vec::new(),
                };

                if let Some(original) = original {
                    self.apply_link_rules(&mut sanitized);
                    attrs_changed = sanitized.attrs != original;
                }

                if attrs_changed {
                    self.modified = true;
                }

                let children = if is_void(&sanitized.name) {
                    if !children.is_empty() {
                        self.modified = true;
                    }
                    Vec::new()
                } else if is_text_only(&sanitized.name) {
                    let mut text = Vec::with_capacity(1);
                    for child in children {
                        match child {
                            Node::Text(t) => append_text(&mut text, &t.text),
                            _ => self.modified = true,
                        }
                    }
                    text
                } else {
                    self.children(children, depth + 1)?
                };

                sanitized.children = children;
                out.push(Node::Element(sanitized));
            }
        }

        Ok(())
    }

    /// Add the `rel` and `target` values the policy requires on links.
    fn apply_link_rules(&self, element: &mut Element) {
        let rules = self.policy.link_rules();

        let fully_qualified = match element.attr("href") {
            Some(href) => is_fully_qualified(href),
            None => return,
        };

        let target_blank = rules.target_blank_fully_qualified && fully_qualified;
        let mut required: SmallVec<[&str; 3]> = SmallVec::new();

        if rules.nofollow || (rules.nofollow_fully_qualified && fully_qualified) {
            required.push("nofollow");
        }
        if rules.noreferrer {
            required.push("noreferrer");
        }
        if target_blank {
            required.push("noopener");
        }

        let mut set: SmallVec<[(&str, String); 2]> = SmallVec::new();

        if !required.is_empty() {
            let mut tokens: Vec<&str> = element
                .attr("rel")
                .map(|rel| rel.split_ascii_whitespace().collect())
                .unwrap_or_default();

            for &token in &required {
                if !tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                    tokens.push(token);
                }
            }

            let merged = tokens.join(" ");
            let rel = if self.permits(&element.name, "rel", &merged) {
                merged
            } else {
                required.join(" ")
            };
            set.push(("rel", rel));
        }

        if target_blank {
            set.push(("target", "_blank".to_string()));
        }

        // values the attribute rules reject are stripped and pushed again on
        // every pass, they go after the permitted ones so the order is stable
        let (permitted, rejected): (Vec<_>, Vec<_>) = set
            .into_iter()
            .partition(|(name, value)| self.permits(&element.name, name, value));

        for (name, value) in permitted {
            element.set_attr(name, value);
        }
        for (name, value) in rejected {
            element.remove_attr(name);
            element.set_attr(name, value);
        }
    }

    /// Would the attribute rules keep the value.
    fn permits(&self, tag: &str, name: &str, value: &str) -> bool {
        self.policy
            .attribute_rule(tag, name)
            .map_or(false, |rule| rule.matches(value))
    }
}

/// Sanitize markup with a policy and the default limits.
pub fn sanitize(html: &str, policy: &Policy) -> Result<String> {
    Sanitizer::new(policy.clone()).sanitize(html)
}

/// Sanitize a tree with a policy and the default limits.
pub fn sanitize_tree(node: Node, policy: &Policy) -> Result<Sanitized> {
    Sanitizer::new(policy.clone()).sanitize_tree(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyBuilder;

    fn basic() -> Policy {
        let mut builder = PolicyBuilder::new();
        builder
            .allow_elements(["a", "b", "p", "span", "ul", "li", "img", "br", "style"])
            .allow_attributes_on(["a"], ["href"])
            .allow_attributes_on(["img"], ["src"])
            .allow_attributes_globally(["title"])
            .allow_url_schemes(["http", "https"]);
        builder.build()
    }

    fn run(html: &str, policy: &Policy) -> (String, bool) {
        let sanitized = Sanitizer::new(policy.clone()).sanitize_document(html).unwrap();
        (sanitized.html(), sanitized.was_modified)
    }

    #[test]
    fn test_safe_input_unmodified() {
        let (html, modified) = run("<p title=\"x\">a <b>b</b></p>", &basic());
        assert_eq!(html, "<p title=\"x\">a <b>b</b></p>");
        assert!(!modified);
    }

    #[test]
    fn test_drop_and_unwrap() {
        let (html, modified) = run(
            "<div>x<script>bad()</script><span onclick=\"y\">y</span><iframe>z</iframe></div>",
            &basic(),
        );
        assert_eq!(html, "x<span>y</span>");
        assert!(modified);
    }

    #[test]
    fn test_unwrap_settles() {
        let policy = basic();
        let (html, _) = run("<ol><li>a<li>b</ol>", &policy);
        assert_eq!(html, "<li>a</li><li>b</li>");
        assert_eq!(run(&html, &policy), (html.clone(), false));
    }

    #[test]
    fn test_comments() {
        let (html, modified) = run("a<!-- hidden -->b", &basic());
        assert_eq!(html, "ab");
        assert!(modified);

        let mut builder = PolicyBuilder::new();
        builder.allow_comments(true);
        assert_eq!(
            run("a<!-- shown -->b", &builder.build()),
            ("a<!-- shown -->b".to_string(), false)
        );
    }

    #[test]
    fn test_space_when_stripping() {
        let mut builder = PolicyBuilder::new();
        builder.add_space_when_stripping(true);
        let (html, _) = run("one<div>two</div>three<script>x</script>four", &builder.build());
        assert_eq!(html, "one two three four");
    }

    #[test]
    fn test_link_rules() {
        let mut builder = PolicyBuilder::new();
        builder
            .allow_elements(["a"])
            .allow_attributes_on(["a"], ["href", "rel"])
            .allow_url_schemes(["https"])
            .require_nofollow_on_links(true)
            .require_noreferrer_on_links(true)
            .add_target_blank_to_fully_qualified_links(true);
        let policy = builder.build();

        let (html, modified) = run(
            "<a href=\"https://example.com\" rel=\"external\">x</a>",
            &policy,
        );
        assert_eq!(
            html,
            "<a href=\"https://example.com\" rel=\"external nofollow noreferrer noopener\" target=\"_blank\">x</a>"
        );
        assert!(modified);
        assert_eq!(run(&html, &policy), (html.clone(), false));

        let (html, _) = run("<a href=\"/local\">x</a>", &policy);
        assert_eq!(html, "<a href=\"/local\" rel=\"nofollow noreferrer\">x</a>");

        let (html, _) = run("<a name=\"x\">x</a>", &policy);
        assert_eq!(html, "<a>x</a>");
    }

    #[test]
    fn test_link_rules_with_disallowed_rel() {
        let mut builder = PolicyBuilder::new();
        builder
            .allow_elements(["a"])
            .allow_attributes_on(["a"], ["href"])
            .allow_url_schemes(["https"])
            .require_nofollow_on_fully_qualified_links(true);
        let policy = builder.build();

        let (html, modified) = run("<a rel=\"nofollow\" href=\"https://e.com\">x</a>", &policy);
        assert_eq!(html, "<a href=\"https://e.com\" rel=\"nofollow\">x</a>");
        assert!(modified);
        assert_eq!(run(&html, &policy), (html.clone(), false));
    }

    #[test]
    fn test_text_only_and_void_elements() {
        let policy = basic();
        let tree = Node::from(
            Element::new("p")
                .with_child(Element::new("style").with_text("a{}").with_child(Element::new("b")))
                .with_child(Element::new("br").with_text("x")),
        );
        let sanitized = Sanitizer::new(policy).sanitize_tree(tree).unwrap();
        assert!(sanitized.was_modified);
        assert_eq!(sanitized.html(), "<p><style>a{}</style><br></p>");
    }

    #[test]
    fn test_sanitize_tree_roots() {
        let policy = basic();

        let kept = sanitize_tree(Node::from(Element::new("b").with_text("x")), &policy).unwrap();
        assert!(kept.node.is_element());
        assert!(!kept.was_modified);

        let unwrapped =
            sanitize_tree(Node::from(Element::new("div").with_text("x")), &policy).unwrap();
        assert!(unwrapped.node.is_document());
        assert_eq!(unwrapped.html(), "x");

        let dropped = sanitize_tree(Node::from(Element::new("script")), &policy).unwrap();
        assert_eq!(dropped.node.children().len(), 0);
        assert!(dropped.was_modified);

        let text = sanitize_tree(Node::text("<x>"), &policy).unwrap();
        assert_eq!(text.html(), "&lt;x&gt;");
    }

    #[test]
    fn test_limits() {
        let sanitizer =
            Sanitizer::new(basic()).with_limits(Limits::default().with_max_input_bytes(8));
        assert_eq!(
            sanitizer.sanitize("<p>too long</p>"),
            Err(Error::InputTooLarge { size: 15, limit: 8 })
        );
        assert_eq!(
            sanitizer.sanitize_bytes(&[b'a'; 9]),
            Err(Error::InputTooLarge { size: 9, limit: 8 })
        );

        let sanitizer = Sanitizer::new(basic()).with_limits(Limits::default().with_max_depth(2));
        assert_eq!(sanitizer.sanitize("<b><b>x</b></b>").unwrap(), "<b><b>x</b></b>");
        assert_eq!(
            sanitizer.sanitize("<b><b><b>x</b></b></b>"),
            Err(Error::DepthExceeded { limit: 2 })
        );

        let deep = Node::from(
            Element::new("b").with_child(Element::new("b").with_child(Element::new("b"))),
        );
        assert_eq!(
            sanitizer.sanitize_tree(deep),
            Err(Error::DepthExceeded { limit: 2 })
        );

        // unwrapped levels count toward the ceiling too
        let mut chain = Element::new("div").with_text("x");
        for _ in 0..200 {
            chain = Element::new("div").with_child(chain);
        }
        let sanitizer =
            Sanitizer::new(Policy::strict()).with_limits(Limits::default().with_max_depth(64));
        assert_eq!(
            sanitizer.sanitize_tree(Node::from(chain)),
            Err(Error::DepthExceeded { limit: 64 })
        );

        let mut nested = Node::from(Document::with_children(vec![Node::text("x")]));
        for _ in 0..100 {
            nested = Node::from(Document::with_children(vec![nested]));
        }
        assert_eq!(
            sanitizer.sanitize_tree(nested),
            Err(Error::DepthExceeded { limit: 64 })
        );

        let mut shallow = Element::new("div").with_text("x");
        for _ in 0..62 {
            shallow = Element::new("div").with_child(shallow);
        }
        assert_eq!(sanitizer.sanitize_tree(Node::from(shallow)).unwrap().html(), "x");
    }

    #[test]
    fn test_foreign_content_raw_text() {
        let mut builder = PolicyBuilder::new();
        builder.allow_elements(["svg", "style", "math", "mi"]);
        let policy = builder.build();

        let (html, modified) = run(
            "<svg><style><img src=x onerror=alert(1)></style></svg>",
            &policy,
        );
        assert_eq!(html, "<svg><style></style></svg>");
        assert!(modified);

        let escaped = "<math><mi><style>&lt;/style&gt;&lt;img src=x onerror=alert(1)&gt;</style></mi></math>";
        assert_eq!(run(escaped, &policy), (escaped.to_string(), false));

        let tree = Node::from(
            Element::new("svg").with_child(Element::new("style").with_text("</style><script>x()</script>")),
        );
        let html = sanitize_tree(tree, &policy).unwrap().html();
        assert_eq!(
            html,
            "<svg><style>&lt;/style&gt;&lt;script&gt;x()&lt;/script&gt;</style></svg>"
        );
        assert_eq!(run(&html, &policy), (html.clone(), false));
    }

    #[test]
    fn test_sanitize_bytes_lossy() {
        let html = Sanitizer::new(basic())
            .sanitize_bytes(b"<b>caf\xe9</b>")
            .unwrap();
        assert_eq!(html, "<b>caf\u{FFFD}</b>");
    }
}
