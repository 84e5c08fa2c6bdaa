//! Entity decoding and escaping for text and attribute values.

use html5ever::data::NAMED_ENTITIES;
use regex::Regex;
use std::sync::LazyLock;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z][a-zA-Z0-9]*);").expect("Invalid entity regex")
});

/// Decode character references.
///
/// Numeric references and every named reference of the HTML entity table are
/// decoded. Unknown names are kept as literal text and come back escaped on
/// output, which is how browsers display them.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    ENTITY
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or(body.strip_prefix("#X")) {
                Some(numeric_reference(u32::from_str_radix(hex, 16).ok()))
            } else if let Some(dec) = body.strip_prefix('#') {
                Some(numeric_reference(dec.parse::<u32>().ok()))
            } else {
                named_entity(body)
            };

            decoded.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Zero, out-of-range and surrogate code points decode to U+FFFD.
fn numeric_reference(code: Option<u32>) -> String {
    match code {
        Some(0) | None => '\u{fffd}',
        Some(code) => char::from_u32(code).unwrap_or('\u{fffd}'),
    }
    .to_string()
}

fn named_entity(name: &str) -> Option<String> {
    // The table also holds every prefix of every name, mapped to (0, 0).
    let &(first, second) = NAMED_ENTITIES.get(format!("{name};").as_str())?;
    if first == 0 {
        return None;
    }
    let mut out = String::new();
    out.extend(char::from_u32(first));
    if second != 0 {
        out.extend(char::from_u32(second));
    }
    Some(out)
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    escape(text, false)
}

/// Escape an attribute value for use inside double quotes.
pub fn escape_attr(value: &str) -> String {
    escape(value, true)
}

fn escape(input: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !in_attribute => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }

    out
}
