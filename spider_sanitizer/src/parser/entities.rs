//! Character reference decoding.

use phf::{phf_map, phf_set};
use std::borrow::Cow;

/// Longest entity name we try to match.
const MAX_NAME_LEN: usize = 32;

/// Named character references.
static NAMED: phf::Map<&'static str, &'static str> = phf_map! {
    "amp" => "&", "lt" => "<", "gt" => ">", "quot" => "\"", "apos" => "'",
    "nbsp" => "\u{A0}", "copy" => "\u{A9}", "reg" => "\u{AE}", "trade" => "\u{2122}",
    "hellip" => "\u{2026}", "mdash" => "\u{2014}", "ndash" => "\u{2013}",
    "lsquo" => "\u{2018}", "rsquo" => "\u{2019}", "sbquo" => "\u{201A}",
    "ldquo" => "\u{201C}", "rdquo" => "\u{201D}", "bdquo" => "\u{201E}",
    "laquo" => "\u{AB}", "raquo" => "\u{BB}", "lsaquo" => "\u{2039}", "rsaquo" => "\u{203A}",
    "bull" => "\u{2022}", "middot" => "\u{B7}", "deg" => "\u{B0}", "plusmn" => "\u{B1}",
    "times" => "\u{D7}", "divide" => "\u{F7}", "para" => "\u{B6}", "sect" => "\u{A7}",
    "cent" => "\u{A2}", "pound" => "\u{A3}", "yen" => "\u{A5}", "euro" => "\u{20AC}",
    "curren" => "\u{A4}", "iexcl" => "\u{A1}", "iquest" => "\u{BF}", "shy" => "\u{AD}",
    "micro" => "\u{B5}", "frac12" => "\u{BD}", "frac14" => "\u{BC}", "frac34" => "\u{BE}",
    "sup1" => "\u{B9}", "sup2" => "\u{B2}", "sup3" => "\u{B3}", "acute" => "\u{B4}",
    "cedil" => "\u{B8}", "uml" => "\u{A8}", "macr" => "\u{AF}", "ordf" => "\u{AA}",
    "ordm" => "\u{BA}", "not" => "\u{AC}", "brvbar" => "\u{A6}", "dagger" => "\u{2020}",
    "Dagger" => "\u{2021}", "permil" => "\u{2030}", "prime" => "\u{2032}", "Prime" => "\u{2033}",
    "larr" => "\u{2190}", "uarr" => "\u{2191}", "rarr" => "\u{2192}", "darr" => "\u{2193}",
    "harr" => "\u{2194}", "hearts" => "\u{2665}", "spades" => "\u{2660}", "clubs" => "\u{2663}",
    "diams" => "\u{2666}", "infin" => "\u{221E}", "ne" => "\u{2260}", "le" => "\u{2264}",
    "ge" => "\u{2265}", "minus" => "\u{2212}", "ensp" => "\u{2002}", "emsp" => "\u{2003}",
    "thinsp" => "\u{2009}", "zwnj" => "\u{200C}", "zwj" => "\u{200D}", "lrm" => "\u{200E}",
    "rlm" => "\u{200F}",
    "Tab" => "\t", "NewLine" => "\n", "colon" => ":", "lpar" => "(", "rpar" => ")",
    "sol" => "/", "bsol" => "\\", "lowbar" => "_", "grave" => "`", "quest" => "?",
    "excl" => "!", "num" => "#", "dollar" => "$", "percnt" => "%", "ast" => "*",
    "plus" => "+", "comma" => ",", "period" => ".", "semi" => ";", "equals" => "=",
    "lsqb" => "[", "rsqb" => "]", "lcub" => "{", "rcub" => "}", "verbar" => "|",
    "vert" => "|", "Hat" => "^", "commat" => "@",
    "Agrave" => "\u{C0}", "Aacute" => "\u{C1}", "Acirc" => "\u{C2}", "Atilde" => "\u{C3}",
    "Auml" => "\u{C4}", "Aring" => "\u{C5}", "AElig" => "\u{C6}", "Ccedil" => "\u{C7}",
    "Egrave" => "\u{C8}", "Eacute" => "\u{C9}", "Ecirc" => "\u{CA}", "Euml" => "\u{CB}",
    "Igrave" => "\u{CC}", "Iacute" => "\u{CD}", "Icirc" => "\u{CE}", "Iuml" => "\u{CF}",
    "Ntilde" => "\u{D1}", "Ograve" => "\u{D2}", "Oacute" => "\u{D3}", "Ocirc" => "\u{D4}",
    "Otilde" => "\u{D5}", "Ouml" => "\u{D6}", "Oslash" => "\u{D8}", "Ugrave" => "\u{D9}",
    "Uacute" => "\u{DA}", "Ucirc" => "\u{DB}", "Uuml" => "\u{DC}", "Yacute" => "\u{DD}",
    "szlig" => "\u{DF}", "agrave" => "\u{E0}", "aacute" => "\u{E1}", "acirc" => "\u{E2}",
    "atilde" => "\u{E3}", "auml" => "\u{E4}", "aring" => "\u{E5}", "aelig" => "\u{E6}",
    "ccedil" => "\u{E7}", "egrave" => "\u{E8}", "eacute" => "\u{E9}", "ecirc" => "\u{EA}",
    "euml" => "\u{EB}", "igrave" => "\u{EC}", "iacute" => "\u{ED}", "icirc" => "\u{EE}",
    "iuml" => "\u{EF}", "ntilde" => "\u{F1}", "ograve" => "\u{F2}", "oacute" => "\u{F3}",
    "ocirc" => "\u{F4}", "otilde" => "\u{F5}", "ouml" => "\u{F6}", "oslash" => "\u{F8}",
    "ugrave" => "\u{F9}", "uacute" => "\u{FA}", "ucirc" => "\u{FB}", "uuml" => "\u{FC}",
    "yacute" => "\u{FD}", "yuml" => "\u{FF}",
};

/// Names browsers still decode without the trailing semicolon.
static LEGACY: phf::Set<&'static str> = phf_set! {
    "amp", "lt", "gt", "quot", "nbsp", "copy", "reg"
};

/// Windows-1252 remapping for numeric references in the C1 range.
static C1_REMAP: [u32; 32] = [
    0x20AC, 0x81, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160,
    0x2039, 0x0152, 0x8D, 0x017D, 0x8F, 0x90, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013,
    0x2014, 0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x9D, 0x017E, 0x0178,
];

/// Map a numeric reference to the character browsers produce.
fn numeric_char(code: u32) -> char {
    match code {
        0 => '\u{FFFD}',
        0x80..=0x9F => char::from_u32(C1_REMAP[(code - 0x80) as usize]).unwrap_or('\u{FFFD}'),
        _ => char::from_u32(code).unwrap_or('\u{FFFD}'),
    }
}

/// Decode a numeric reference starting after `&#`. Returns the char and bytes consumed.
fn decode_numeric(rest: &[u8]) -> Option<(char, usize)> {
    let (hex, start) = match rest.first() {
        Some(b'x' | b'X') => (true, 1),
        _ => (false, 0),
    };
    let mut i = start;
    let mut code: u32 = 0;

    while let Some(&b) = rest.get(i) {
        let digit = if hex {
            (b as char).to_digit(16)
        } else {
            (b as char).to_digit(10)
        };
        match digit {
            Some(d) => {
                code = code
                    .saturating_mul(if hex { 16 } else { 10 })
                    .saturating_add(d);
                i += 1;
            }
            None => break,
        }
    }

    if i == start {
        return None;
    }
    if rest.get(i) == Some(&b';') {
        i += 1;
    }

    Some((numeric_char(code), i))
}

/// Decode a named reference starting after `&`. Returns the replacement and bytes consumed.
fn decode_named(rest: &[u8], in_attribute: bool) -> Option<(&'static str, usize)> {
    let len = rest
        .iter()
        .take(MAX_NAME_LEN)
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();

    if len == 0 {
        return None;
    }

    // names are ascii alphanumeric so the slice is valid utf-8
    let name = std::str::from_utf8(&rest[..len]).ok()?;

    match rest.get(len) {
        Some(b';') => NAMED.get(name).map(|v| (*v, len + 1)),
        next if LEGACY.contains(name) => {
            if in_attribute && next == Some(&b'=') {
                None
            } else {
                NAMED.get(name).map(|v| (*v, len))
            }
        }
        _ => None,
    }
}

/// Decode character references in text or an attribute value.
pub fn decode(input: &str, in_attribute: bool) -> Cow<'_, str> {
    let bytes = input.as_bytes();

    let mut next = match memchr::memchr(b'&', bytes) {
        Some(p) => p,
        None => return Cow::Borrowed(input),
    };

    let mut out = String::with_capacity(input.len());
    let mut copied = 0;

    loop {
        out.push_str(&input[copied..next]);
        let rest = &bytes[next + 1..];

        let consumed = match rest.first() {
            Some(b'#') => match decode_numeric(&rest[1..]) {
                Some((c, used)) => {
                    out.push(c);
                    Some(used + 1)
                }
                None => None,
            },
            Some(_) => match decode_named(rest, in_attribute) {
                Some((value, used)) => {
                    out.push_str(value);
                    Some(used)
                }
                None => None,
            },
            None => None,
        };

        copied = match consumed {
            Some(used) => next + 1 + used,
            None => {
                out.push('&');
                next + 1
            }
        };

        match memchr::memchr(b'&', &bytes[copied..]) {
            Some(p) => next = copied + p,
            None => break,
        }
    }

    out.push_str(&input[copied..]);
    Cow::Owned(out)
}
