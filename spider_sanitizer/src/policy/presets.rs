use super::{Policy, PolicyBuilder};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIRECTION: Regex = Regex::new(r"(?i)rtl|ltr").unwrap();
    static ref LANGUAGE: Regex = Regex::new(r"[a-zA-Z]{2,20}(-[a-zA-Z0-9]{1,8})*").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"[a-zA-Z0-9:\-_.]+").unwrap();
    static ref SPACE_SEPARATED_TOKENS: Regex = Regex::new(r"[\s\p{L}\p{N}_\-]+").unwrap();
    static ref PARAGRAPH: Regex = Regex::new(r"[\p{L}\p{N}\s\-_',\[\]!./\\()]*").unwrap();
    static ref NUMBER: Regex = Regex::new(r"[0-9]+").unwrap();
    static ref NUMBER_OR_PERCENT: Regex = Regex::new(r"[0-9]+%?").unwrap();
    static ref ALIGN: Regex = Regex::new(r"(?i)center|justify|left|right|char").unwrap();
    static ref VALIGN: Regex = Regex::new(r"(?i)baseline|bottom|middle|top").unwrap();
    static ref SCOPE: Regex = Regex::new(r"(?i)row|col|rowgroup|colgroup").unwrap();
    static ref OPEN: Regex = Regex::new(r"(?i)open|").unwrap();
    static ref LIST_TYPE: Regex = Regex::new(r"(?i)circle|disc|square|a|A|i|I|1").unwrap();
    static ref DATETIME: Regex = Regex::new(
        r"[0-9]{4}(-[0-9]{2}(-[0-9]{2}([T ][0-9]{2}:[0-9]{2}(:[0-9]{2}(\.[0-9]+)?)?(Z|[+-][0-9]{2}:[0-9]{2})?)?)?)?"
    )
    .unwrap();

    /// Shared strict policy.
    static ref STRICT: Policy = PolicyBuilder::strict().build();
    /// Shared user generated content policy.
    static ref UGC: Policy = PolicyBuilder::ugc().build();
}

/// Text level and block elements safe for user content.
const UGC_ELEMENTS: &[&str] = &[
    "a", "abbr", "acronym", "b", "bdi", "bdo", "blockquote", "br", "caption", "cite", "code", "col",
    "colgroup", "dd", "del", "details", "dfn", "div", "dl", "dt", "em", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "ins", "kbd", "li", "mark", "ol", "p",
    "pre", "q", "rp", "rt", "ruby", "s", "samp", "small", "span", "strike", "strong", "sub",
    "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "tt", "u",
    "ul", "var", "wbr",
];

impl PolicyBuilder {
    /// A builder that allows nothing. Markup is removed and text is kept.
    pub fn strict() -> Self {
        PolicyBuilder::new()
    }

    /// A builder preloaded with an allow-list for user generated content:
    /// formatting, lists, tables, images and links with `rel="nofollow"`.
    pub fn ugc() -> Self {
        let mut builder = PolicyBuilder::new();

        builder
            .allow_elements(UGC_ELEMENTS)
            .allow_attributes_matching_globally(["dir"], &DIRECTION)
            .allow_attributes_matching_globally(["lang"], &LANGUAGE)
            .allow_attributes_matching_globally(["id"], &IDENTIFIER)
            .allow_attributes_matching_globally(["class"], &SPACE_SEPARATED_TOKENS)
            .allow_attributes_matching_globally(["title"], &PARAGRAPH)
            .allow_attributes_on(["a"], ["href"])
            .allow_attributes_on(["blockquote", "q", "del", "ins"], ["cite"])
            .allow_attributes_matching_on(["del", "ins", "time"], ["datetime"], &DATETIME)
            .allow_attributes_on(["img"], ["src", "srcset"])
            .allow_attributes_matching_on(["img"], ["alt"], &PARAGRAPH)
            .allow_attributes_matching_on(["img"], ["width", "height"], &NUMBER)
            .allow_attributes_matching_on(["ol"], ["start"], &NUMBER)
            .allow_attributes_matching_on(["ol", "ul"], ["type"], &LIST_TYPE)
            .allow_attributes_matching_on(["li"], ["value"], &NUMBER)
            .allow_attributes_matching_on(["abbr", "acronym", "dfn"], ["title"], &PARAGRAPH)
            .allow_attributes_matching_on(["details"], ["open"], &OPEN)
            .allow_attributes_matching_on(["col", "colgroup"], ["span"], &NUMBER)
            .allow_attributes_matching_on(["col", "colgroup", "table"], ["width"], &NUMBER_OR_PERCENT)
            .allow_attributes_matching_on(["td", "th"], ["colspan", "rowspan"], &NUMBER)
            .allow_attributes_matching_on(["th"], ["scope"], &SCOPE)
            .allow_attributes_matching_on(
                ["caption", "col", "colgroup", "div", "p", "table", "tbody", "td", "tfoot", "th", "thead", "tr"],
                ["align"],
                &ALIGN,
            )
            .allow_attributes_matching_on(
                ["col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr"],
                ["valign"],
                &VALIGN,
            )
            .allow_url_schemes(["http", "https", "mailto"])
            .allow_url_schemes_on("src", ["http", "https"])
            .allow_url_schemes_on("srcset", ["http", "https"])
            .require_nofollow_on_links(true)
            .require_parseable_urls(true);

        builder
    }
}

impl Policy {
    /// A policy that allows no markup at all. Only text survives.
    pub fn strict() -> Self {
        STRICT.clone()
    }

    /// A shared policy for user generated content. See [`PolicyBuilder::ugc`]
    /// to start from it and extend.
    pub fn ugc() -> Self {
        UGC.clone()
    }
}
