use lazy_static::lazy_static;
use url::Url;

lazy_static! {
    /// Base used to check that relative references resolve.
    static ref RELATIVE_BASE: Option<Url> = Url::parse("http://localhost/").ok();
}

/// What kind of reference a URL attribute value holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlKind {
    /// An explicit scheme, normalized to lower case.
    Absolute(String),
    /// `//host/path` inheriting the scheme of the page.
    ProtocolRelative,
    /// Path, query or fragment only.
    Relative,
    /// A scheme delimiter preceded by something that is not a scheme.
    Invalid,
}

/// Characters the URL parser removes or trims that can hide a scheme.
#[inline]
fn is_ignorable(c: char) -> bool {
    c.is_control() || c.is_whitespace() || c == '\u{200B}' || c == '\u{FEFF}'
}

/// Trim the leading and trailing whitespace and control characters browsers ignore.
pub fn trim_url(value: &str) -> &str {
    value.trim_matches(is_ignorable)
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => (),
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Classify a URL value. Whitespace and control characters inside the scheme
/// token are removed before matching, so `java\tscript:` is seen as `javascript`.
pub fn classify(value: &str) -> UrlKind {
    let value = trim_url(value);
    let mut scheme = String::new();

    for c in value.chars() {
        match c {
            ':' => {
                return if is_valid_scheme(&scheme) {
                    scheme.make_ascii_lowercase();
                    UrlKind::Absolute(scheme)
                } else {
                    UrlKind::Invalid
                };
            }
            '/' | '\\' | '?' | '#' => break,
            c if is_ignorable(c) => (),
            c => scheme.push(c),
        }
    }

    let mut lead = value.chars().filter(|c| !matches!(c, '\t' | '\n' | '\r'));

    match (lead.next(), lead.next()) {
        (Some('/' | '\\'), Some('/' | '\\')) => UrlKind::ProtocolRelative,
        _ => UrlKind::Relative,
    }
}

/// Does the value parse as a URL of its kind.
pub fn is_parseable(value: &str, kind: &UrlKind) -> bool {
    let value = trim_url(value);
    match kind {
        UrlKind::Absolute(_) => Url::parse(value).is_ok(),
        UrlKind::ProtocolRelative | UrlKind::Relative => match RELATIVE_BASE.as_ref() {
            Some(base) => base.join(value).is_ok(),
            _ => false,
        },
        UrlKind::Invalid => false,
    }
}

/// Does the link leave the current site: an absolute URL with a host, or protocol relative.
pub fn is_fully_qualified(value: &str) -> bool {
    match classify(value) {
        UrlKind::Absolute(_) => Url::parse(trim_url(value))
            .map(|u| u.host().is_some())
            .unwrap_or_default(),
        UrlKind::ProtocolRelative => true,
        _ => false,
    }
}

/// Prefix a protocol relative URL with a scheme.
pub fn with_scheme(value: &str, scheme: &str) -> String {
    string_concat!(scheme, ":", trim_url(value))
}

/// A single `srcset` candidate: the URL and its optional descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetCandidate<'a> {
    /// The image URL.
    pub url: &'a str,
    /// Width or density descriptor.
    pub descriptor: Option<&'a str>,
}

/// Split a `srcset` value into its candidates. Empty candidates are skipped.
pub fn split_srcset(value: &str) -> Vec<SrcsetCandidate<'_>> {
    value
        .split(',')
        .filter_map(|candidate| {
            let candidate = candidate.trim();
            if candidate.is_empty() {
                return None;
            }
            let mut parts = candidate.splitn(2, char::is_whitespace);
            let url = parts.next()?;
            let descriptor = parts.next().map(str::trim).filter(|d| !d.is_empty());
            Some(SrcsetCandidate { url, descriptor })
        })
        .collect()
}

/// Join `srcset` candidates back into an attribute value.
pub fn join_srcset<S: AsRef<str>>(candidates: &[(S, Option<&str>)]) -> String {
    let mut out = String::new();
    for (i, (url, descriptor)) in candidates.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(url.as_ref());
        if let Some(descriptor) = descriptor {
            out.push(' ');
            out.push_str(descriptor);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_absolute() {
        assert_eq!(
            classify("https://example.com"),
            UrlKind::Absolute("https".into())
        );
        assert_eq!(
            classify("  JavaScript:alert(1)"),
            UrlKind::Absolute("javascript".into())
        );
        assert_eq!(
            classify("mailto:a@example.com"),
            UrlKind::Absolute("mailto".into())
        );
    }

    #[test]
    fn test_classify_obfuscated_scheme() {
        assert_eq!(
            classify("java\tscript:alert(1)"),
            UrlKind::Absolute("javascript".into())
        );
        assert_eq!(
            classify("java\u{0000}script:alert(1)"),
            UrlKind::Absolute("javascript".into())
        );
        assert_eq!(
            classify("\u{0001}\njavascript :alert(1)"),
            UrlKind::Absolute("javascript".into())
        );
        assert_eq!(classify("jav%61script:alert(1)"), UrlKind::Invalid);
    }

    #[test]
    fn test_classify_relative() {
        assert_eq!(classify("/path/to"), UrlKind::Relative);
        assert_eq!(classify("page.html?a=b:c"), UrlKind::Relative);
        assert_eq!(classify("#top"), UrlKind::Relative);
        assert_eq!(classify(""), UrlKind::Relative);
        assert_eq!(classify("./a:b"), UrlKind::Relative);
    }

    #[test]
    fn test_classify_protocol_relative() {
        assert_eq!(classify("//example.com/x"), UrlKind::ProtocolRelative);
        assert_eq!(classify("\\\\example.com/x"), UrlKind::ProtocolRelative);
        assert_eq!(classify("/\t/example.com"), UrlKind::ProtocolRelative);
    }

    #[test]
    fn test_parseable() {
        let kind = classify("http://exa mple.com");
        assert!(!is_parseable("http://exa mple.com", &kind));
        assert!(is_parseable("/ok/path", &UrlKind::Relative));
        assert!(is_parseable(
            "https://example.com/a",
            &UrlKind::Absolute("https".into())
        ));
    }

    #[test]
    fn test_fully_qualified() {
        assert!(is_fully_qualified("https://example.com"));
        assert!(is_fully_qualified("//example.com"));
        assert!(!is_fully_qualified("/local"));
        assert!(!is_fully_qualified("mailto:a@example.com"));
    }

    #[test]
    fn test_with_scheme() {
        assert_eq!(
            with_scheme(" //example.com/a", "https"),
            "https://example.com/a"
        );
    }

    #[test]
    fn test_srcset() {
        let candidates = split_srcset("a.png 1x, b.png 2x,, c.png");
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].url, "a.png");
        assert_eq!(candidates[1].descriptor, Some("2x"));
        assert_eq!(candidates[2].descriptor, None);

        let joined = join_srcset(&[("a.png", Some("1x")), ("c.png", None)]);
        assert_eq!(joined, "a.png 1x, c.png");
    }
}
