/// URL scheme extraction and classification.
pub mod url;

use phf::phf_set;

/// Elements that never have children or a closing tag.
pub static VOID_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr"
};

/// Elements whose content is taken verbatim up to the matching end tag.
pub static RAW_TEXT_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext"
};

/// Elements whose content is text with character references decoded.
pub static RCDATA_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "textarea", "title"
};

/// Start tags that close an open `p` in button scope.
pub static CLOSES_P: phf::Set<&'static str> = phf_set! {
    "address", "article", "aside", "blockquote", "center", "details", "dialog", "dir", "div",
    "dl", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hgroup", "hr", "li", "dd", "dt", "listing", "main", "menu", "nav", "ol",
    "p", "plaintext", "pre", "search", "section", "summary", "table", "ul", "xmp"
};

/// Boundaries for the default scope.
pub static SCOPE_BOUNDARIES: phf::Set<&'static str> = phf_set! {
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template"
};

/// Headings close each other when directly nested.
pub static HEADINGS: phf::Set<&'static str> = phf_set! {
    "h1", "h2", "h3", "h4", "h5", "h6"
};

/// Elements that may not be nested inside themselves.
pub static NO_SELF_NESTING: phf::Set<&'static str> = phf_set! {
    "a", "button", "form", "nobr"
};

/// Elements with structural meaning that stop implied `li`, `dd` and `dt` closing.
pub static SPECIAL_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "applet", "area", "article", "aside", "base", "basefont", "bgsound", "blockquote", "body",
    "br", "button", "caption", "center", "col", "colgroup", "dd", "details", "dir", "dl", "dt",
    "embed", "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset", "h1",
    "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "iframe", "img",
    "input", "keygen", "li", "link", "listing", "main", "marquee", "menu", "meta", "nav",
    "noembed", "noframes", "noscript", "object", "ol", "param", "plaintext", "pre", "script",
    "search", "section", "select", "source", "style", "summary", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "title", "tr", "track", "ul", "wbr", "xmp"
};

/// Document level tags that fragment parsing ignores.
pub static IGNORED_TAGS: phf::Set<&'static str> = phf_set! {
    "html", "head", "body"
};

/// Every element the HTML standard (and its obsolete parts) defines. Self-closing
/// syntax is only honored on names outside this set.
pub static HTML_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "a", "abbr", "acronym", "address", "applet", "area", "article", "aside", "audio", "b",
    "base", "basefont", "bdi", "bdo", "bgsound", "big", "blink", "blockquote", "body", "br",
    "button", "canvas", "caption", "center", "cite", "code", "col", "colgroup", "data",
    "datalist", "dd", "del", "details", "dfn", "dialog", "dir", "div", "dl", "dt", "em",
    "embed", "fieldset", "figcaption", "figure", "font", "footer", "form", "frame", "frameset",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "i", "iframe",
    "img", "input", "ins", "kbd", "keygen", "label", "legend", "li", "link", "listing", "main",
    "map", "mark", "marquee", "menu", "meta", "meter", "nav", "nobr", "noembed", "noframes",
    "noscript", "object", "ol", "optgroup", "option", "output", "p", "param", "picture",
    "plaintext", "pre", "progress", "q", "rp", "rt", "ruby", "s", "samp", "script", "search",
    "section", "select", "slot", "small", "source", "span", "strike", "strong", "style", "sub",
    "summary", "sup", "table", "tbody", "td", "template", "textarea", "tfoot", "th", "thead",
    "time", "title", "tr", "track", "tt", "u", "ul", "var", "video", "wbr", "xmp"
};

/// Roots of foreign (SVG and MathML) content, where raw text elements hold markup.
pub static FOREIGN_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "math", "svg"
};

/// Attributes whose value is a URL (or a list of them for `srcset`).
pub static URL_ATTRIBUTES: phf::Set<&'static str> = phf_set! {
    "action", "archive", "background", "cite", "classid", "codebase", "data", "formaction",
    "href", "icon", "longdesc", "manifest", "poster", "profile", "src", "srcset", "usemap"
};

/// Elements that carry navigable links subject to `rel`/`target` rules.
pub static LINK_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "a", "area", "link"
};

/// Is the element void.
#[cfg_attr(feature = "inline-more", inline)]
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(name)
}

/// Is the element content verbatim text.
#[cfg_attr(feature = "inline-more", inline)]
pub fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(name)
}

/// Does the element start foreign content.
#[cfg_attr(feature = "inline-more", inline)]
pub fn is_foreign(name: &str) -> bool {
    FOREIGN_ELEMENTS.contains(name)
}

/// Is the element content text only, raw or decoded.
pub fn is_text_only(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(name) || RCDATA_ELEMENTS.contains(name)
}

/// Is the attribute URL valued.
pub fn is_url_attribute(name: &str) -> bool {
    URL_ATTRIBUTES.contains(name)
}

/// A tag name the serializer can emit without breaking the markup.
pub fn is_valid_tag_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() => (),
        _ => return false,
    }
    bytes.all(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ' | b'/' | b'>' | 0))
}

/// An attribute name the serializer can emit without breaking the markup.
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            !c.is_control()
                && !c.is_whitespace()
                && !matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
        })
}
