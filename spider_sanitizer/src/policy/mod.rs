//! Allow-list policies.
//!
//! A [`Policy`] is built once through [`PolicyBuilder`] and never changes after.
//! It is a cheap handle over shared state, clone it freely across threads.
//! Anything the policy does not name is denied.

/// Policy construction.
pub mod builder;
/// Ready made policies.
pub mod presets;
/// Flat (element, attribute, scheme) tables.
pub mod table;

pub use builder::PolicyBuilder;
pub use table::{PolicyRule, PolicyTable};

use hashbrown::{HashMap, HashSet};
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use std::sync::Arc;

lazy_static! {
    /// Names accepted by `allow_data_attributes`.
    static ref DATA_ATTRIBUTE: Regex = Regex::new(r"^data-[a-z0-9_][a-z0-9_.\-]*$").unwrap();
}

/// What happens to an element the policy does not allow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Disposition {
    /// Remove the element with its whole subtree.
    Drop,
    #[default]
    /// Remove the element and splice its children into the parent.
    Unwrap,
}

/// Rewriting applied to kept links that carry an `href`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkRules {
    /// Add `rel="nofollow"` to every link.
    pub nofollow: bool,
    /// Add `rel="nofollow"` to links leaving the site.
    pub nofollow_fully_qualified: bool,
    /// Add `rel="noreferrer"` to every link.
    pub noreferrer: bool,
    /// Add `target="_blank"` and `rel="noopener"` to links leaving the site.
    pub target_blank_fully_qualified: bool,
}

impl LinkRules {
    /// Any rule set.
    pub fn is_active(&self) -> bool {
        self.nofollow
            || self.nofollow_fully_qualified
            || self.noreferrer
            || self.target_blank_fully_qualified
    }
}

/// The values an allowed attribute may take.
#[derive(Debug, Clone, Default)]
pub struct AttributeRule {
    /// Registered without a pattern, any value passes.
    pub(crate) any_value: bool,
    /// Anchored patterns, one must match the whole value.
    pub(crate) patterns: Vec<Regex>,
}

impl AttributeRule {
    /// Does the value satisfy the rule.
    pub fn matches(&self, value: &str) -> bool {
        self.any_value || self.patterns.iter().any(|p| p.is_match(value))
    }

    /// The value is constrained by patterns.
    pub fn is_restricted(&self) -> bool {
        !self.any_value
    }
}

/// The immutable policy state.
#[derive(Debug, Clone)]
pub(crate) struct PolicyInner {
    pub(crate) elements: HashSet<String>,
    pub(crate) element_attributes: HashMap<String, HashMap<String, AttributeRule>>,
    pub(crate) global_attributes: HashMap<String, AttributeRule>,
    pub(crate) allow_data_attributes: bool,
    pub(crate) default_schemes: HashSet<String>,
    pub(crate) attribute_schemes: HashMap<String, HashSet<String>>,
    pub(crate) drop_elements: HashSet<String>,
    pub(crate) default_disposition: Disposition,
    pub(crate) allow_comments: bool,
    pub(crate) allow_relative_urls: bool,
    pub(crate) require_parseable_urls: bool,
    pub(crate) protocol_relative_scheme: Option<String>,
    pub(crate) link_rules: LinkRules,
    pub(crate) add_space_when_stripping: bool,
}

/// Lower-case a name only when needed.
pub(crate) fn lower(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

/// A finalized allow-list policy.
///
/// ```rust
/// use spider_sanitizer::policy::Policy;
///
/// let mut builder = Policy::builder();
/// builder
///     .allow_elements(["a", "p"])
///     .allow_attributes_on(["a"], ["href"])
///     .allow_url_schemes_on("href", ["http", "https"]);
/// let policy = builder.build();
///
/// assert!(policy.is_element_allowed("A"));
/// assert!(policy.is_scheme_allowed("href", "https"));
/// assert!(!policy.is_scheme_allowed("href", "javascript"));
/// ```
#[derive(Debug, Clone)]
pub struct Policy {
    inner: Arc<PolicyInner>,
}

impl Default for Policy {
    fn default() -> Self {
        PolicyBuilder::new().build()
    }
}

impl Policy {
    pub(crate) fn from_inner(inner: PolicyInner) -> Self {
        Policy {
            inner: Arc::new(inner),
        }
    }

    /// Start a new policy.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::new()
    }

    /// Is the element on the allow-list.
    pub fn is_element_allowed(&self, tag: &str) -> bool {
        self.inner.elements.contains(lower(tag).as_ref())
    }

    /// What happens to the element when it is not allowed.
    pub fn disposition_for(&self, tag: &str) -> Disposition {
        if self.inner.drop_elements.contains(lower(tag).as_ref()) {
            Disposition::Drop
        } else {
            self.inner.default_disposition
        }
    }

    /// Attribute names allowed on the element, its own and the global ones, sorted.
    /// `data-*` names allowed through [`PolicyBuilder::allow_data_attributes`] are not listed.
    pub fn allowed_attributes_for(&self, tag: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .inner
            .global_attributes
            .keys()
            .map(String::as_str)
            .collect();

        if let Some(attrs) = self.inner.element_attributes.get(lower(tag).as_ref()) {
            names.extend(attrs.keys().map(String::as_str));
        }

        names.sort_unstable();
        names.dedup();
        names
    }

    /// The rule for an attribute on an element. The element's own rule wins over the global one.
    pub fn attribute_rule(&self, tag: &str, attr: &str) -> Option<&AttributeRule> {
        let attr = lower(attr);
        self.inner
            .element_attributes
            .get(lower(tag).as_ref())
            .and_then(|attrs| attrs.get(attr.as_ref()))
            .or_else(|| self.inner.global_attributes.get(attr.as_ref()))
    }

    /// Is the attribute a `data-*` attribute the policy lets through.
    pub fn is_data_attribute_allowed(&self, attr: &str) -> bool {
        self.inner.allow_data_attributes && DATA_ATTRIBUTE.is_match(lower(attr).as_ref())
    }

    /// Is the scheme allowed on the URL attribute. Schemes registered for the
    /// attribute replace the policy wide ones.
    pub fn is_scheme_allowed(&self, attr: &str, scheme: &str) -> bool {
        let scheme = lower(scheme);
        match self.inner.attribute_schemes.get(lower(attr).as_ref()) {
            Some(schemes) => schemes.contains(scheme.as_ref()),
            None => self.inner.default_schemes.contains(scheme.as_ref()),
        }
    }

    /// Comments survive sanitization.
    pub fn allows_comments(&self) -> bool {
        self.inner.allow_comments
    }

    /// URLs without a scheme survive sanitization.
    pub fn allows_relative_urls(&self) -> bool {
        self.inner.allow_relative_urls
    }

    /// URLs must parse to survive.
    pub fn requires_parseable_urls(&self) -> bool {
        self.inner.require_parseable_urls
    }

    /// Scheme prefixed onto protocol relative URLs.
    pub fn protocol_relative_scheme(&self) -> Option<&str> {
        self.inner.protocol_relative_scheme.as_deref()
    }

    /// Link rewriting rules.
    pub fn link_rules(&self) -> &LinkRules {
        &self.inner.link_rules
    }

    /// Stripped elements leave a space behind.
    pub fn adds_space_when_stripping(&self) -> bool {
        self.inner.add_space_when_stripping
    }

    /// Export the allow-lists as a flat table. Value patterns and flags are not
    /// part of the table format. Attributes restricted by a pattern are left
    /// out, and so is a global attribute an element narrows with a pattern, so
    /// loading the table never allows more than this policy.
    pub fn to_table(&self) -> PolicyTable {
        let inner = &self.inner;
        let mut table = PolicyTable::new();

        let mut elements: Vec<&String> = inner.elements.iter().collect();
        elements.sort_unstable();
        for element in elements {
            table.push(PolicyRule::element(element));
        }

        let mut element_attributes: Vec<(&String, &String)> = inner
            .element_attributes
            .iter()
            .flat_map(|(element, attrs)| {
                attrs
                    .iter()
                    .filter(|(_, rule)| !rule.is_restricted())
                    .map(move |(attr, _)| (element, attr))
            })
            .collect();
        element_attributes.sort_unstable();
        for (element, attr) in element_attributes {
            table.push(PolicyRule::attribute(Some(element.as_str()), attr));
        }

        let narrowed = |attr: &str| {
            inner
                .element_attributes
                .values()
                .any(|attrs| attrs.get(attr).map_or(false, AttributeRule::is_restricted))
        };
        let mut global: Vec<&String> = inner
            .global_attributes
            .iter()
            .filter(|(attr, rule)| !rule.is_restricted() && !narrowed(attr.as_str()))
            .map(|(attr, _)| attr)
            .collect();
        global.sort_unstable();
        for attr in global {
            table.push(PolicyRule::attribute(None, attr));
        }

        let mut schemes: Vec<&String> = inner.default_schemes.iter().collect();
        schemes.sort_unstable();
        for scheme in schemes {
            table.push(PolicyRule::scheme(None, scheme));
        }

        let mut attribute_schemes: Vec<(&String, &String)> = inner
            .attribute_schemes
            .iter()
            .flat_map(|(attr, schemes)| schemes.iter().map(move |scheme| (attr, scheme)))
            .collect();
        attribute_schemes.sort_unstable();
        for (attr, scheme) in attribute_schemes {
            table.push(PolicyRule::scheme(Some(attr.as_str()), scheme));
        }

        table
    }
}
