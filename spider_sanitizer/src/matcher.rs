//! Element and attribute decisions.
//!
//! The matcher only answers questions. It never touches the tree, the
//! [`sanitizer`](crate::sanitizer) applies what it decides.

use crate::node::{Attribute, Element};
use crate::policy::{lower, Disposition, Policy};
use crate::utils::url::{self, UrlKind};
use crate::utils::{is_url_attribute, is_valid_attribute_name};

/// What happens to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    /// Keep the element and filter its attributes.
    Keep,
    /// Remove the element and keep its children in its place.
    Unwrap,
    /// Remove the element with its subtree.
    Drop,
}

impl From<Disposition> for Decision {
    fn from(disposition: Disposition) -> Self {
        match disposition {
            Disposition::Drop => Decision::Drop,
            Disposition::Unwrap => Decision::Unwrap,
        }
    }
}

/// Why an attribute was stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StripReason {
    /// The attribute is not allowed on the element.
    NotAllowed,
    /// The value does not match the attribute patterns.
    PatternMismatch,
    /// The URL scheme is not allowed, or the scheme token is malformed.
    SchemeRejected,
    /// The URL has no scheme and relative URLs are not allowed.
    RelativeRejected,
    /// The URL does not parse.
    Unparseable,
}

/// What happens to an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeDecision {
    /// Keep as is.
    Keep,
    /// Keep with a new value.
    Rewrite(String),
    /// Remove.
    Strip(StripReason),
}

impl AttributeDecision {
    /// The attribute survives, as is or rewritten.
    pub fn is_kept(&self) -> bool {
        !matches!(self, AttributeDecision::Strip(_))
    }
}

/// The decisions for an element. `attributes` follows the element attribute
/// order and is empty unless the element is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The element decision.
    pub decision: Decision,
    /// One decision per attribute.
    pub attributes: Vec<AttributeDecision>,
}

/// Decide what happens to an element and each of its attributes.
pub fn evaluate(element: &Element, policy: &Policy) -> Evaluation {
    let name = element.name();

    if !policy.is_element_allowed(name) {
        return Evaluation {
            decision: policy.disposition_for(name).into(),
            attributes: Vec::new(),
        };
    }

    Evaluation {
        decision: Decision::Keep,
        attributes: element
            .attrs
            .iter()
            .map(|attr| evaluate_attribute(name, attr, policy))
            .collect(),
    }
}

/// Decide what happens to one attribute of an allowed element.
pub fn evaluate_attribute(tag: &str, attr: &Attribute, policy: &Policy) -> AttributeDecision {
    if !is_valid_attribute_name(&attr.name) {
        return AttributeDecision::Strip(StripReason::NotAllowed);
    }

    let name = lower(&attr.name);

    let rule = match policy.attribute_rule(tag, &name) {
        Some(rule) => rule,
        None if policy.is_data_attribute_allowed(&name) => return AttributeDecision::Keep,
        None => return AttributeDecision::Strip(StripReason::NotAllowed),
    };

    if !rule.matches(&attr.value) {
        return AttributeDecision::Strip(StripReason::PatternMismatch);
    }

    if !is_url_attribute(&name) {
        return AttributeDecision::Keep;
    }

    match evaluate_url(&name, &attr.value, policy) {
        AttributeDecision::Rewrite(value) if !rule.matches(&value) => {
            AttributeDecision::Strip(StripReason::PatternMismatch)
        }
        decision => decision,
    }
}

/// Check a single URL. `Ok(Some(_))` carries a rewritten value.
fn check_url(
    attr: &str,
    value: &str,
    policy: &Policy,
) -> Result<Option<String>, StripReason> {
    let kind = url::classify(value);

    match kind {
        UrlKind::Invalid => Err(StripReason::SchemeRejected),
        UrlKind::Absolute(ref scheme) => {
            if !policy.is_scheme_allowed(attr, scheme) {
                Err(StripReason::SchemeRejected)
            } else if policy.requires_parseable_urls() && !url::is_parseable(value, &kind) {
                Err(StripReason::Unparseable)
            } else {
                Ok(None)
            }
        }
        UrlKind::ProtocolRelative => match policy.protocol_relative_scheme() {
            Some(scheme) => {
                if !policy.is_scheme_allowed(attr, scheme) {
                    return Err(StripReason::SchemeRejected);
                }
                let rewritten = url::with_scheme(value, scheme);
                if policy.requires_parseable_urls()
                    && !url::is_parseable(&rewritten, &UrlKind::Absolute(scheme.to_string()))
                {
                    return Err(StripReason::Unparseable);
                }
                Ok(Some(rewritten))
            }
            None => check_relative(value, &kind, policy),
        },
        UrlKind::Relative => check_relative(value, &kind, policy),
    }
}

fn check_relative(value: &str, kind: &UrlKind, policy: &Policy) -> Result<Option<String>, StripReason> {
    if !policy.allows_relative_urls() {
        Err(StripReason::RelativeRejected)
    } else if policy.requires_parseable_urls() && !url::is_parseable(value, kind) {
        Err(StripReason::Unparseable)
    } else {
        Ok(None)
    }
}

/// Decide what happens to a URL valued attribute. Every `srcset` candidate is
/// checked and one bad candidate strips the whole attribute.
pub fn evaluate_url(attr: &str, value: &str, policy: &Policy) -> AttributeDecision {
    if attr != "srcset" {
        return match check_url(attr, value, policy) {
            Ok(None) => AttributeDecision::Keep,
            Ok(Some(rewritten)) => AttributeDecision::Rewrite(rewritten),
            Err(reason) => AttributeDecision::Strip(reason),
        };
    }

    let candidates = url::split_srcset(value);
    let mut rewritten = false;
    let mut out: Vec<(String, Option<&str>)> = Vec::with_capacity(candidates.len());

    for candidate in &candidates {
        match check_url(attr, candidate.url, policy) {
            Ok(None) => out.push((candidate.url.to_string(), candidate.descriptor)),
            Ok(Some(url)) => {
                rewritten = true;
                out.push((url, candidate.descriptor));
            }
            Err(reason) => return AttributeDecision::Strip(reason),
        }
    }

    if rewritten {
        AttributeDecision::Rewrite(url::join_srcset(&out))
    } else {
        AttributeDecision::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyBuilder;
    use regex::Regex;

    fn links() -> Policy {
        let mut builder = PolicyBuilder::new();
        builder
            .allow_elements(["a", "img", "p"])
            .allow_attributes_on(["a"], ["href", "title"])
            .allow_attributes_on(["img"], ["src", "srcset"])
            .allow_attributes_matching_globally(["class"], &Regex::new("[a-z]+").unwrap())
            .allow_url_schemes(["http", "https"])
            .allow_url_schemes_on("src", ["https"]);
        builder.build()
    }

    fn href(value: &str, policy: &Policy) -> AttributeDecision {
        evaluate_attribute("a", &Attribute::new("href", value), policy)
    }

    #[test]
    fn test_disallowed_element_disposition() {
        let policy = links();
        let span = Element::new("span").with_attr("class", "x");
        let script = Element::new("script");

        let evaluation = evaluate(&span, &policy);
        assert_eq!(evaluation.decision, Decision::Unwrap);
        assert!(evaluation.attributes.is_empty());
        assert_eq!(evaluate(&script, &policy).decision, Decision::Drop);
    }

    #[test]
    fn test_attribute_decisions_follow_order() {
        let policy = links();
        let a = Element::new("a")
            .with_attr("onclick", "x()")
            .with_attr("href", "https://example.com")
            .with_attr("class", "Bad");

        assert_eq!(
            evaluate(&a, &policy),
            Evaluation {
                decision: Decision::Keep,
                attributes: vec![
                    AttributeDecision::Strip(StripReason::NotAllowed),
                    AttributeDecision::Keep,
                    AttributeDecision::Strip(StripReason::PatternMismatch),
                ],
            }
        );
    }

    #[test]
    fn test_scheme_rejection() {
        let policy = links();

        assert_eq!(href("http://example.com/", &policy), AttributeDecision::Keep);
        for value in [
            "javascript:alert(1)",
            "JavaScript:alert(1)",
            " java\tscript:alert(1)",
            "java\u{0}script:alert(1)",
            "\u{1}javascript:alert(1)",
            "data:text/html,<script>",
            "vbscript:msgbox",
        ] {
            assert_eq!(
                href(value, &policy),
                AttributeDecision::Strip(StripReason::SchemeRejected),
                "{value:?}"
            );
        }
        assert_eq!(
            href("<x>:y", &policy),
            AttributeDecision::Strip(StripReason::SchemeRejected)
        );
    }

    #[test]
    fn test_relative_urls() {
        let policy = links();
        assert_eq!(href("/path?q=1#top", &policy), AttributeDecision::Keep);
        assert_eq!(href("page.html", &policy), AttributeDecision::Keep);
        assert_eq!(href("//cdn.example.com/x", &policy), AttributeDecision::Keep);

        let mut builder = PolicyBuilder::new();
        builder
            .allow_elements(["a"])
            .allow_attributes_on(["a"], ["href"])
            .allow_relative_urls(false);
        let strict = builder.build();
        assert_eq!(
            href("/path", &strict),
            AttributeDecision::Strip(StripReason::RelativeRejected)
        );
    }

    #[test]
    fn test_unparseable() {
        let policy = links();
        assert_eq!(
            href("http://[::1", &policy),
            AttributeDecision::Strip(StripReason::Unparseable)
        );

        let mut builder = PolicyBuilder::new();
        builder
            .allow_elements(["a"])
            .allow_attributes_on(["a"], ["href"])
            .allow_url_schemes(["http"])
            .require_parseable_urls(false);
        assert_eq!(href("http://[::1", &builder.build()), AttributeDecision::Keep);
    }

    #[test]
    fn test_protocol_relative_rewrite() {
        let mut builder = PolicyBuilder::new();
        builder
            .allow_elements(["a"])
            .allow_attributes_on(["a"], ["href"])
            .allow_url_schemes(["https"])
            .rewrite_protocol_relative_urls(Some("https"));
        let policy = builder.build();

        assert_eq!(
            href("//example.com/a", &policy),
            AttributeDecision::Rewrite("https://example.com/a".into())
        );
        assert_eq!(href("https://example.com/a", &policy), AttributeDecision::Keep);

        builder.rewrite_protocol_relative_urls(Some("ftp"));
        assert_eq!(
            href("//example.com/a", &builder.build()),
            AttributeDecision::Strip(StripReason::SchemeRejected)
        );
    }

    #[test]
    fn test_per_attribute_schemes() {
        let policy = links();
        let img = |value: &str| evaluate_attribute("img", &Attribute::new("src", value), &policy);

        assert_eq!(img("https://example.com/a.png"), AttributeDecision::Keep);
        assert_eq!(
            img("http://example.com/a.png"),
            AttributeDecision::Strip(StripReason::SchemeRejected)
        );
    }

    #[test]
    fn test_srcset() {
        let policy = links();

        assert_eq!(
            evaluate_url("srcset", "https://a/1.png 1x, /2.png 2x", &policy),
            AttributeDecision::Keep
        );
        assert_eq!(
            evaluate_url("srcset", "https://a/1.png 1x, javascript:x 2x", &policy),
            AttributeDecision::Strip(StripReason::SchemeRejected)
        );

        let mut builder = PolicyBuilder::new();
        builder
            .allow_url_schemes(["https"])
            .rewrite_protocol_relative_urls(Some("https"));
        assert_eq!(
            evaluate_url("srcset", "//a/1.png 1x,/2.png", &builder.build()),
            AttributeDecision::Rewrite("https://a/1.png 1x, /2.png".into())
        );
    }

    #[test]
    fn test_data_attributes() {
        let mut builder = PolicyBuilder::new();
        builder.allow_elements(["p"]).allow_data_attributes();
        let policy = builder.build();

        assert_eq!(
            evaluate_attribute("p", &Attribute::new("data-id", "7"), &policy),
            AttributeDecision::Keep
        );
        assert_eq!(
            evaluate_attribute("p", &Attribute::new("data-", "7"), &policy),
            AttributeDecision::Strip(StripReason::NotAllowed)
        );
    }

    #[test]
    fn test_invalid_attribute_name() {
        let mut builder = PolicyBuilder::new();
        builder.allow_elements(["p"]).allow_attribute(None, "a\"b");
        let attr = Attribute {
            name: "a\"b".into(),
            value: String::new(),
        };

        assert_eq!(
            evaluate_attribute("p", &attr, &builder.build()),
            AttributeDecision::Strip(StripReason::NotAllowed)
        );
        assert_eq!(StripReason::PatternMismatch.to_string(), "pattern_mismatch");
    }
}
