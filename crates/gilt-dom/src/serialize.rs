//! Serialization back to HTML.

use std::fmt;

use indextree::NodeId;

use crate::escape::{escape_attr, escape_text};
use crate::node::NodeData;
use crate::tree::Document;

impl Document {
    /// Serialize the whole document, doctype included.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = &self.doctype {
            out.push_str(doctype);
            out.push('\n');
        }
        self.write_children(self.root, &mut out, false);
        out
    }

    /// Serialize a node including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out, false);
        out
    }

    /// Serialize only the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let raw = self.element(id).is_ok_and(|el| el.is_raw_text());
        let mut out = String::new();
        self.write_children(id, &mut out, raw);
        out
    }

    fn write_children(&self, id: NodeId, out: &mut String, raw: bool) {
        for child in self.children(id) {
            self.write_node(child, out, raw);
        }
    }

    fn write_node(&self, id: NodeId, out: &mut String, raw: bool) {
        let Ok(node) = self.node(id) else {
            return;
        };

        match node {
            NodeData::Root => self.write_children(id, out, false),
            NodeData::Text(text) if raw => out.push_str(text),
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in el.attrs() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');

                if el.is_void() {
                    return;
                }

                self.write_children(id, out, el.is_raw_text());
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_authored_markup() {
        let html = r#"<div class="hero"><picture><img alt="A &amp; B"></picture><p>Hello <em>world</em></p><!-- note --></div>"#;

        let doc = Document::parse(html).unwrap();

        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn round_trips_escaped_entity_names() {
        let html = "<p>Write &amp;copy; for the symbol, &amp;lt;b&amp;gt; for bold</p>";

        let doc = Document::parse(html).unwrap();

        assert_eq!(doc.to_html(), html);
        assert!(!doc.to_html().contains('\u{a9}'));
    }

    #[test]
    fn escapes_created_text() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let root = doc.root();
        doc.append(root, p).unwrap();
        doc.set_attr(p, "title", r#"5 > 3 "quoted""#).unwrap();
        doc.set_text(p, "<script>").unwrap();

        assert_eq!(
            doc.outer_html(p),
            r#"<p title="5 > 3 &quot;quoted&quot;">&lt;script&gt;</p>"#
        );
    }

    #[test]
    fn keeps_style_text_raw() {
        let html = "<style>.cards > div { color: red; }</style>";
        let doc = Document::parse(html).unwrap();

        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn emits_doctype_and_inner_html() {
        let doc = Document::parse("<!DOCTYPE html><html><body><p>x</p></body></html>").unwrap();
        let html = doc.element_children(doc.root())[0];

        assert!(doc.to_html().starts_with("<!DOCTYPE html>\n<html>"));
        assert_eq!(doc.inner_html(html), "<body><p>x</p></body>");
        assert_eq!(format!("{}", doc), doc.to_html());
    }
}
