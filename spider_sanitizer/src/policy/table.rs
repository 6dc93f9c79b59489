//! Flat policy tables.
//!
//! A table is a list of `(element, attribute, scheme)` rows that can be kept in a
//! text file and loaded back into a [`PolicyBuilder`](super::PolicyBuilder).
//!
//! ```text
//! # element  attribute  scheme
//! a          -          -
//! a          href       -
//! *          title      -
//! *          href       https
//! *          *          mailto
//! ```
//!
//! A row with only an element allows the element. A row with an attribute allows
//! the attribute on the element, or on every element when the element is `*`.
//! A row with a scheme allows the scheme on the attribute, or on every URL
//! attribute when the attribute is `*`. `-` marks an empty column and `#` starts
//! a comment.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// One row of a policy table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyRule {
    /// The element, `None` for every element.
    pub element: Option<String>,
    /// The attribute, `None` for none or every attribute.
    pub attribute: Option<String>,
    /// The URL scheme.
    pub scheme: Option<String>,
}

/// Valid element and attribute name in a table.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
}

/// Valid URL scheme in a table.
fn is_valid_scheme(scheme: &str) -> bool {
    let mut bytes = scheme.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

impl PolicyRule {
    /// Allow an element.
    pub fn element(element: &str) -> Self {
        PolicyRule {
            element: Some(element.to_string()),
            ..Default::default()
        }
    }

    /// Allow an attribute on an element, or globally.
    pub fn attribute(element: Option<&str>, attribute: &str) -> Self {
        PolicyRule {
            element: element.map(str::to_string),
            attribute: Some(attribute.to_string()),
            scheme: None,
        }
    }

    /// Allow a scheme on a URL attribute, or on all of them.
    pub fn scheme(attribute: Option<&str>, scheme: &str) -> Self {
        PolicyRule {
            element: None,
            attribute: attribute.map(str::to_string),
            scheme: Some(scheme.to_string()),
        }
    }

    /// Check the rule is well formed.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(element) = &self.element {
            if !is_valid_name(element) {
                return Err(format!("invalid element name {:?}", element));
            }
        }
        if let Some(attribute) = &self.attribute {
            if !is_valid_name(attribute) {
                return Err(format!("invalid attribute name {:?}", attribute));
            }
        }
        match &self.scheme {
            Some(scheme) if !is_valid_scheme(scheme) => {
                Err(format!("invalid url scheme {:?}", scheme))
            }
            Some(_) if self.element.is_some() => {
                Err("scheme rules apply to attributes, use * for the element".into())
            }
            None if self.element.is_none() && self.attribute.is_none() => {
                Err("rule allows nothing".into())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let element = self.element.as_deref().unwrap_or("*");
        let attribute = match (&self.attribute, &self.scheme) {
            (Some(attribute), _) => attribute.as_str(),
            (None, Some(_)) => "*",
            (None, None) => "-",
        };
        let scheme = self.scheme.as_deref().unwrap_or("-");

        write!(f, "{} {} {}", element, attribute, scheme)
    }
}

/// An ordered list of policy rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PolicyTable {
    /// The rules in order.
    pub rules: Vec<PolicyRule>,
}

/// Read one column, `*` and `-` are empty.
fn column(value: Option<&str>) -> Option<String> {
    match value {
        None | Some("*") | Some("-") => None,
        Some(value) => Some(value.to_ascii_lowercase()),
    }
}

impl PolicyTable {
    /// An empty table.
    pub fn new() -> Self {
        PolicyTable::default()
    }

    /// Append a rule.
    pub fn push(&mut self, rule: PolicyRule) {
        self.rules.push(rule);
    }

    /// Iterate the rules.
    pub fn iter(&self) -> std::slice::Iter<'_, PolicyRule> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// The table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parse the text form. Errors name the 1-based line of the bad row.
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = PolicyTable::new();

        for (index, line) in text.lines().enumerate() {
            let line = match line.find('#') {
                Some(comment) => &line[..comment],
                None => line,
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            let invalid = |reason: String| Error::InvalidPolicyTable {
                line: index + 1,
                reason,
            };

            let mut columns = line.split_whitespace();
            let rule = PolicyRule {
                element: column(columns.next()),
                attribute: column(columns.next()),
                scheme: column(columns.next()),
            };

            if columns.next().is_some() {
                return Err(invalid("expected at most 3 columns".into()));
            }

            rule.validate().map_err(invalid)?;
            table.push(rule);
        }

        Ok(table)
    }
}

impl FromStr for PolicyTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PolicyTable::parse(s)
    }
}

impl fmt::Display for PolicyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PolicyTable {
    type Item = &'a PolicyRule;
    type IntoIter = std::slice::Iter<'a, PolicyRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromIterator<PolicyRule> for PolicyTable {
    fn from_iter<I: IntoIterator<Item = PolicyRule>>(iter: I) -> Self {
        PolicyTable {
            rules: iter.into_iter().collect(),
        }
    }
}
