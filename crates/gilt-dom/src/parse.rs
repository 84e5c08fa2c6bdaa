//! HTML parsing via `tl`.

use indextree::NodeId;

use crate::escape::decode_entities;
use crate::tree::{Document, DomError};

impl Document {
    /// Parse an HTML document or fragment.
    ///
    /// A leading doctype is kept aside and re-emitted on serialization.
    /// Text and attribute values are entity-decoded, except inside
    /// `script` and `style`.
    pub fn parse(html: &str) -> Result<Self, DomError> {
        let (doctype, body) = split_doctype(html);

        let dom = tl::parse(body, tl::ParserOptions::default())
            .map_err(|e| DomError::Parse(e.to_string()))?;
        let parser = dom.parser();

        let mut doc = Document::new();
        doc.doctype = doctype;

        let root = doc.root();
        for handle in dom.children() {
            doc.convert(*handle, parser, root, false)?;
        }

        Ok(doc)
    }

    /// Convert a `tl` node and its subtree under `parent`.
    fn convert(
        &mut self,
        handle: tl::NodeHandle,
        parser: &tl::Parser<'_>,
        parent: NodeId,
        raw_text: bool,
    ) -> Result<(), DomError> {
        let Some(node) = handle.get(parser) else {
            return Ok(());
        };

        match node {
            tl::Node::Tag(tag) => {
                let name = tag.name().as_utf8_str().to_lowercase();
                let id = self.create_element(&name);

                let attrs = tag.attributes();
                let mut collected: Vec<(String, String)> = attrs
                    .iter()
                    .map(|(key, value)| {
                        let value = value.map(|v| decode_entities(&v)).unwrap_or_default();
                        (key.to_lowercase(), value)
                    })
                    .collect();
                // tl keeps id and class in dedicated slots
                for (key, value) in [("id", attrs.id()), ("class", attrs.class())] {
                    if let Some(value) = value {
                        if !collected.iter().any(|(k, _)| k == key) {
                            collected.push((key.to_string(), decode_entities(&value.as_utf8_str())));
                        }
                    }
                }

                // tl hands attributes back in hash order
                let order = attribute_order(&tag.raw().as_utf8_str());
                collected.sort_by_key(|(key, _)| {
                    order.iter().position(|n| n == key).unwrap_or(usize::MAX)
                });
                for (key, value) in &collected {
                    self.set_attr(id, key, value)?;
                }

                self.append(parent, id)?;

                let child_raw = matches!(name.as_str(), "script" | "style");
                for child in tag.children().top().iter() {
                    self.convert(*child, parser, id, child_raw)?;
                }
            }
            tl::Node::Raw(bytes) => {
                let text = bytes.as_utf8_str();
                let text = if raw_text {
                    text.to_string()
                } else {
                    decode_entities(&text)
                };
                let id = self.create_text(&text);
                self.append(parent, id)?;
            }
            tl::Node::Comment(bytes) => {
                let raw = bytes.as_utf8_str();
                let body = raw
                    .trim_start_matches("<!--")
                    .trim_end_matches("-->")
                    .to_string();
                let id = self.create_comment(&body);
                self.append(parent, id)?;
            }
        }

        Ok(())
    }

    /// Parse a fragment and return its top-level element nodes.
    pub fn parse_fragment(html: &str) -> Result<(Self, Vec<NodeId>), DomError> {
        let doc = Self::parse(html)?;
        let tops = doc.element_children(doc.root());
        Ok((doc, tops))
    }
}

/// Attribute names of the opening tag at the start of `raw`, lowercased and
/// in source order.
fn attribute_order(raw: &str) -> Vec<String> {
    let bytes = raw.as_bytes();
    let len = bytes.len();
    let is_space = |i: usize| i < len && bytes[i].is_ascii_whitespace();

    let mut names = Vec::new();
    let mut i = bytes
        .iter()
        .position(|b| b.is_ascii_whitespace() || matches!(b, b'/' | b'>'))
        .unwrap_or(len);

    while i < len {
        match bytes[i] {
            b'>' => break,
            b'/' => i += 1,
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < len && !is_space(i) && !matches!(bytes[i], b'=' | b'>' | b'/') {
                    i += 1;
                }
                names.push(raw[start..i].to_ascii_lowercase());

                while is_space(i) {
                    i += 1;
                }
                if i >= len || bytes[i] != b'=' {
                    continue;
                }
                i += 1;
                while is_space(i) {
                    i += 1;
                }
                match bytes.get(i) {
                    Some(&quote @ (b'"' | b'\'')) => {
                        i += 1;
                        while i < len && bytes[i] != quote {
                            i += 1;
                        }
                        i += 1;
                    }
                    _ => {
                        while i < len && !is_space(i) && bytes[i] != b'>' {
                            i += 1;
                        }
                    }
                }
            }
        }
    }

    names
}

/// Split a leading `<!DOCTYPE ...>` declaration from the markup.
fn split_doctype(html: &str) -> (Option<String>, &str) {
    let trimmed = html.trim_start();
    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));

    if !is_doctype {
        return (None, html);
    }

    match trimmed.find('>') {
        Some(end) => (Some(trimmed[..=end].to_string()), &trimmed[end + 1..]),
        None => (None, html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_block_markup() {
        let html = r#"<div class="cards block" data-block-name="cards"><div><div><picture><img src="/a.png"></picture></div><div><p><strong>Title</strong></p></div></div></div>"#;

        let (doc, tops) = Document::parse_fragment(html).unwrap();

        assert_eq!(tops.len(), 1);
        let block = tops[0];
        assert_eq!(doc.tag(block), Some("div"));
        assert_eq!(doc.attr(block, "data-block-name"), Some("cards"));
        assert!(doc.has_class(block, "block"));

        let items = doc.element_children(block);
        assert_eq!(items.len(), 1);
        assert_eq!(doc.element_children(items[0]).len(), 2);
        assert!(doc.find_tag(block, "img").is_some());
        assert_eq!(doc.text_content(block), "Title");
    }

    #[test]
    fn keeps_doctype_aside() {
        let doc = Document::parse("<!DOCTYPE html>\n<html><body></body></html>").unwrap();

        assert_eq!(doc.doctype(), Some("<!DOCTYPE html>"));
        let html = doc.element_children(doc.root());
        assert_eq!(html.len(), 1);
        assert_eq!(doc.tag(html[0]), Some("html"));
    }

    #[test]
    fn decodes_text_and_attributes() {
        let (doc, tops) =
            Document::parse_fragment(r#"<p title="Fish &amp; Chips">Salt &amp; vinegar</p>"#)
                .unwrap();

        assert_eq!(doc.attr(tops[0], "title"), Some("Fish & Chips"));
        assert_eq!(doc.text_content(tops[0]), "Salt & vinegar");
    }

    #[test]
    fn keeps_authored_attribute_order() {
        let html = r#"<img data-b="2" src="/a.png" alt="Team" data-a="1" id="hero" class="wide" loading="lazy" width="10">"#;

        let (doc, tops) = Document::parse_fragment(html).unwrap();

        let names: Vec<&str> = doc.element(tops[0]).unwrap().attrs().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            vec!["data-b", "src", "alt", "data-a", "id", "class", "loading", "width"]
        );
    }

    #[test]
    fn reads_attribute_names_in_source_order() {
        let names = attribute_order(r#"<a TITLE='a > b' href=/x/y hidden data-x = "1">text</a>"#);

        assert_eq!(names, vec!["title", "href", "hidden", "data-x"]);
    }
}
