use super::{lower, AttributeRule, Disposition, LinkRules, Policy, PolicyInner, PolicyRule, PolicyTable};
use hashbrown::{HashMap, HashSet};
use regex::Regex;

/// Elements removed with their content unless the policy says otherwise.
const DEFAULT_DROP_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "noembed", "noframes", "noscript", "object", "embed", "applet",
    "frameset", "frame", "template", "title", "xmp", "plaintext", "textarea", "select", "math",
    "svg",
];

/// Build a [`Policy`].
///
/// Every allow call is additive. Names are matched case-insensitively and
/// stored lower-cased. Calling [`PolicyBuilder::build`] snapshots the current
/// state, the builder can keep going afterwards without touching the built policy.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    inner: PolicyInner,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        PolicyBuilder::new()
    }
}

/// Normalize a name for storage, `None` when it is empty.
fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(lower(name).into_owned())
    }
}

/// Normalize a scheme for storage, accepting a trailing `:`.
fn normalize_scheme(scheme: &str) -> Option<String> {
    normalize_name(scheme.trim().trim_end_matches(':'))
}

/// Anchor a value pattern so it has to match the whole value.
fn anchored(pattern: &Regex) -> Option<Regex> {
    match Regex::new(&string_concat!(r"\A(?:", pattern.as_str(), r")\z")) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("ignoring attribute pattern {:?}: {}", pattern.as_str(), e);
            None
        }
    }
}

/// Add a rule for the attribute to the map.
fn register(map: &mut HashMap<String, AttributeRule>, attr: String, pattern: Option<&Regex>) {
    let rule = map.entry(attr).or_default();
    match pattern {
        Some(pattern) => rule.patterns.push(pattern.clone()),
        None => rule.any_value = true,
    }
}

impl PolicyBuilder {
    /// An empty policy. Nothing is allowed, a fixed set of executable and
    /// raw text elements is dropped with its content, everything else unwraps.
    pub fn new() -> Self {
        PolicyBuilder {
            inner: PolicyInner {
                elements: HashSet::new(),
                element_attributes: HashMap::new(),
                global_attributes: HashMap::new(),
                allow_data_attributes: false,
                default_schemes: HashSet::new(),
                attribute_schemes: HashMap::new(),
                drop_elements: DEFAULT_DROP_ELEMENTS.iter().map(|s| s.to_string()).collect(),
                default_disposition: Disposition::default(),
                allow_comments: false,
                allow_relative_urls: true,
                require_parseable_urls: true,
                protocol_relative_scheme: None,
                link_rules: LinkRules::default(),
                add_space_when_stripping: false,
            },
        }
    }

    /// Allow an element.
    pub fn allow_element(&mut self, name: &str) -> &mut Self {
        if let Some(name) = normalize_name(name) {
            self.inner.elements.insert(name);
        }
        self
    }

    /// Allow elements.
    pub fn allow_elements<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.allow_element(name.as_ref());
        }
        self
    }

    /// Allow an attribute with any value, on one element or globally when `element` is `None`.
    pub fn allow_attribute(&mut self, element: Option<&str>, attr: &str) -> &mut Self {
        self.register_attribute(element, attr, None);
        self
    }

    fn register_attribute(&mut self, element: Option<&str>, attr: &str, pattern: Option<&Regex>) {
        let attr = match normalize_name(attr) {
            Some(attr) => attr,
            None => return,
        };

        match element {
            Some(element) => {
                if let Some(element) = normalize_name(element) {
                    register(
                        self.inner.element_attributes.entry(element).or_default(),
                        attr,
                        pattern,
                    );
                }
            }
            None => register(&mut self.inner.global_attributes, attr, pattern),
        }
    }

    /// Allow attributes with any value on the elements.
    pub fn allow_attributes_on<E, A, S, T>(&mut self, elements: E, attrs: A) -> &mut Self
    where
        E: IntoIterator<Item = S>,
        A: IntoIterator<Item = T>,
        A::IntoIter: Clone,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let attrs = attrs.into_iter();
        for element in elements {
            for attr in attrs.clone() {
                self.register_attribute(Some(element.as_ref()), attr.as_ref(), None);
            }
        }
        self
    }

    /// Allow attributes with any value on every element.
    pub fn allow_attributes_globally<A, T>(&mut self, attrs: A) -> &mut Self
    where
        A: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for attr in attrs {
            self.register_attribute(None, attr.as_ref(), None);
        }
        self
    }

    /// Allow attributes on the elements when the whole value matches the pattern.
    /// A pattern that cannot be anchored registers nothing.
    pub fn allow_attributes_matching_on<E, A, S, T>(
        &mut self,
        elements: E,
        attrs: A,
        pattern: &Regex,
    ) -> &mut Self
    where
        E: IntoIterator<Item = S>,
        A: IntoIterator<Item = T>,
        A::IntoIter: Clone,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        if let Some(pattern) = anchored(pattern) {
            let attrs = attrs.into_iter();
            for element in elements {
                for attr in attrs.clone() {
                    self.register_attribute(Some(element.as_ref()), attr.as_ref(), Some(&pattern));
                }
            }
        }
        self
    }

    /// Allow attributes on every element when the whole value matches the pattern.
    pub fn allow_attributes_matching_globally<A, T>(&mut self, attrs: A, pattern: &Regex) -> &mut Self
    where
        A: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        if let Some(pattern) = anchored(pattern) {
            for attr in attrs {
                self.register_attribute(None, attr.as_ref(), Some(&pattern));
            }
        }
        self
    }

    /// Allow well-formed `data-*` attributes on every allowed element.
    pub fn allow_data_attributes(&mut self) -> &mut Self {
        self.inner.allow_data_attributes = true;
        self
    }

    /// Allow a URL scheme, for one attribute or policy wide when `attr` is `None`.
    pub fn allow_url_scheme(&mut self, attr: Option<&str>, scheme: &str) -> &mut Self {
        let scheme = match normalize_scheme(scheme) {
            Some(scheme) => scheme,
            None => return self,
        };

        match attr {
            Some(attr) => {
                if let Some(attr) = normalize_name(attr) {
                    self.inner
                        .attribute_schemes
                        .entry(attr)
                        .or_default()
                        .insert(scheme);
                }
            }
            None => {
                self.inner.default_schemes.insert(scheme);
            }
        }
        self
    }

    /// Allow URL schemes on every URL attribute without its own list.
    pub fn allow_url_schemes<I, S>(&mut self, schemes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for scheme in schemes {
            self.allow_url_scheme(None, scheme.as_ref());
        }
        self
    }

    /// Allow URL schemes on one attribute. The attribute stops using the policy wide list.
    pub fn allow_url_schemes_on<I, S>(&mut self, attr: &str, schemes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for scheme in schemes {
            self.allow_url_scheme(Some(attr), scheme.as_ref());
        }
        self
    }

    /// Remove these elements with their content when they are not allowed.
    pub fn drop_elements<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            if let Some(name) = normalize_name(name.as_ref()) {
                self.inner.drop_elements.insert(name);
            }
        }
        self
    }

    /// Keep the content of these elements when they are not allowed.
    pub fn unwrap_elements<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            if let Some(name) = normalize_name(name.as_ref()) {
                self.inner.drop_elements.remove(&name);
            }
        }
        self
    }

    /// What happens to disallowed elements without an explicit disposition.
    pub fn with_default_disposition(&mut self, disposition: Disposition) -> &mut Self {
        self.inner.default_disposition = disposition;
        self
    }

    /// Keep comments.
    pub fn allow_comments(&mut self, allow: bool) -> &mut Self {
        self.inner.allow_comments = allow;
        self
    }

    /// Keep URLs without a scheme.
    pub fn allow_relative_urls(&mut self, allow: bool) -> &mut Self {
        self.inner.allow_relative_urls = allow;
        self
    }

    /// Strip URLs that do not parse.
    pub fn require_parseable_urls(&mut self, require: bool) -> &mut Self {
        self.inner.require_parseable_urls = require;
        self
    }

    /// Prefix protocol relative URLs (`//host/path`) with the scheme. The
    /// rewritten URL then has to pass the scheme check.
    pub fn rewrite_protocol_relative_urls(&mut self, scheme: Option<&str>) -> &mut Self {
        self.inner.protocol_relative_scheme = scheme.and_then(normalize_scheme);
        self
    }

    /// Add `rel="nofollow"` to kept links.
    pub fn require_nofollow_on_links(&mut self, require: bool) -> &mut Self {
        self.inner.link_rules.nofollow = require;
        self
    }

    /// Add `rel="nofollow"` to kept links that leave the site.
    pub fn require_nofollow_on_fully_qualified_links(&mut self, require: bool) -> &mut Self {
        self.inner.link_rules.nofollow_fully_qualified = require;
        self
    }

    /// Add `rel="noreferrer"` to kept links.
    pub fn require_noreferrer_on_links(&mut self, require: bool) -> &mut Self {
        self.inner.link_rules.noreferrer = require;
        self
    }

    /// Open links that leave the site in a new tab, with `rel="noopener"`.
    pub fn add_target_blank_to_fully_qualified_links(&mut self, add: bool) -> &mut Self {
        self.inner.link_rules.target_blank_fully_qualified = add;
        self
    }

    /// Leave a single space where a disallowed element was removed, so words do not run together.
    pub fn add_space_when_stripping(&mut self, add: bool) -> &mut Self {
        self.inner.add_space_when_stripping = add;
        self
    }

    /// Apply a single table rule.
    pub fn apply_rule(&mut self, rule: &PolicyRule) -> &mut Self {
        match (&rule.element, &rule.attribute, &rule.scheme) {
            (_, attr, Some(scheme)) => self.allow_url_scheme(attr.as_deref(), scheme),
            (element, Some(attr), None) => self.allow_attribute(element.as_deref(), attr),
            (Some(element), None, None) => self.allow_element(element),
            (None, None, None) => self,
        }
    }

    /// Apply every rule of a table.
    pub fn apply_table(&mut self, table: &PolicyTable) -> &mut Self {
        for rule in table.iter() {
            self.apply_rule(rule);
        }
        self
    }

    /// Snapshot the builder into an immutable policy.
    pub fn build(&self) -> Policy {
        log::debug!(
            "built policy: {} elements, {} global attributes, {} default schemes",
            self.inner.elements.len(),
            self.inner.global_attributes.len(),
            self.inner.default_schemes.len()
        );
        Policy::from_inner(self.inner.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_normalized() {
        let mut builder = PolicyBuilder::new();
        builder
            .allow_elements([" P ", "", "Span"])
            .allow_url_schemes(["HTTPS:", " "]);
        let policy = builder.build();

        assert!(policy.is_element_allowed("p"));
        assert!(policy.is_element_allowed("SPAN"));
        assert!(!policy.is_element_allowed(""));
        assert!(policy.is_scheme_allowed("href", "https"));
    }

    #[test]
    fn test_patterns_are_anchored() {
        let mut builder = PolicyBuilder::new();
        builder
            .allow_elements(["p"])
            .allow_attributes_matching_on(["p"], ["class"], &Regex::new("foo|bar").unwrap());
        let policy = builder.build();
        let rule = policy.attribute_rule("p", "class").unwrap();

        assert!(rule.is_restricted());
        assert!(rule.matches("foo"));
        assert!(rule.matches("bar"));
        assert!(!rule.matches("foobar"));
        assert!(!rule.matches("xfoo"));
    }

    #[test]
    fn test_patterns_accumulate() {
        let mut builder = PolicyBuilder::new();
        builder
            .allow_attributes_matching_globally(["dir"], &Regex::new("ltr").unwrap())
            .allow_attributes_matching_globally(["dir"], &Regex::new("rtl").unwrap());
        let policy = builder.build();
        let rule = policy.attribute_rule("div", "dir").unwrap();

        assert!(rule.matches("ltr"));
        assert!(rule.matches("rtl"));
        assert!(!rule.matches("auto"));

        builder.allow_attribute(None, "dir");
        assert!(builder.build().attribute_rule("div", "dir").unwrap().matches("auto"));
        assert!(!rule.matches("auto"));
    }

    #[test]
    fn test_dispositions() {
        let mut builder = PolicyBuilder::new();
        builder.drop_elements(["Form"]).unwrap_elements(["svg"]);
        let policy = builder.build();

        assert_eq!(policy.disposition_for("form"), Disposition::Drop);
        assert_eq!(policy.disposition_for("svg"), Disposition::Unwrap);
        assert_eq!(policy.disposition_for("script"), Disposition::Drop);

        builder.with_default_disposition(Disposition::Drop);
        assert_eq!(builder.build().disposition_for("span"), Disposition::Drop);
    }

    #[test]
    fn test_build_snapshots() {
        let mut builder = PolicyBuilder::new();
        builder.allow_element("p");
        let first = builder.build();
        builder.allow_element("a").allow_comments(true);
        let second = builder.build();

        assert!(!first.is_element_allowed("a"));
        assert!(!first.allows_comments());
        assert!(second.is_element_allowed("a"));
        assert!(second.allows_comments());
    }

    #[test]
    fn test_flags() {
        let mut builder = PolicyBuilder::new();
        builder
            .allow_relative_urls(false)
            .require_parseable_urls(false)
            .rewrite_protocol_relative_urls(Some("HTTPS"))
            .require_nofollow_on_links(true)
            .add_target_blank_to_fully_qualified_links(true)
            .add_space_when_stripping(true);
        let policy = builder.build();

        assert!(!policy.allows_relative_urls());
        assert!(!policy.requires_parseable_urls());
        assert_eq!(policy.protocol_relative_scheme(), Some("https"));
        assert!(policy.link_rules().nofollow);
        assert!(!policy.link_rules().noreferrer);
        assert!(policy.link_rules().target_blank_fully_qualified);
        assert!(policy.adds_space_when_stripping());
    }

    #[test]
    fn test_apply_rule() {
        let mut builder = PolicyBuilder::new();
        builder
            .apply_rule(&PolicyRule::element("a"))
            .apply_rule(&PolicyRule::attribute(Some("a"), "href"))
            .apply_rule(&PolicyRule::attribute(None, "title"))
            .apply_rule(&PolicyRule::scheme(Some("href"), "mailto"))
            .apply_rule(&PolicyRule::scheme(None, "https"));
        let policy = builder.build();

        assert!(policy.is_element_allowed("a"));
        assert!(policy.attribute_rule("a", "href").is_some());
        assert!(policy.attribute_rule("p", "title").is_some());
        assert!(policy.is_scheme_allowed("href", "mailto"));
        assert!(!policy.is_scheme_allowed("href", "https"));
        assert!(policy.is_scheme_allowed("src", "https"));
    }
}
