//! Node payloads stored in the document arena.

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text content is emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Payload of a single tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// The synthetic root that owns top-level nodes
    Root,
    /// An element with its tag and attributes
    Element(ElementData),
    /// Decoded text content
    Text(String),
    /// Comment body (without the `<!--` / `-->` delimiters)
    Comment(String),
}

impl NodeData {
    /// Get the element payload if this node is an element.
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutable variant of [`NodeData::as_element`].
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// Tag name and attributes of an element.
///
/// Attribute order is preserved so serialized output stays close to the
/// authored markup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,

    attrs: Vec<(String, String)>,
}

impl ElementData {
    /// Create an element with no attributes.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute, replacing any existing value in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value.to_string(),
            None => self
                .attrs
                .push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).1)
    }

    /// Iterate attributes in document order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate the whitespace-separated class list.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class if it is not already present.
    pub fn add_class(&mut self, class: &str) {
        if class.is_empty() || self.has_class(class) {
            return;
        }

        let value = match self.attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr("class", &value);
    }

    /// Remove every occurrence of a class.
    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }

        let value = self
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr("class", &value);
    }

    /// Whether this element is a void element (`img`, `br`, ...).
    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    /// Whether text inside this element must not be escaped.
    pub fn is_raw_text(&self) -> bool {
        RAW_TEXT_ELEMENTS.contains(&self.tag.as_str())
    }

    /// Whether this is a heading element (`h1`-`h6`).
    pub fn is_heading(&self) -> bool {
        matches!(self.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_list_edits() {
        let mut el = ElementData::new("DIV");
        assert_eq!(el.tag, "div");

        el.add_class("card");
        el.add_class("card");
        el.add_class("card--visible");
        assert_eq!(el.attr("class"), Some("card card--visible"));

        el.remove_class("card");
        assert_eq!(el.attr("class"), Some("card--visible"));
        assert!(!el.has_class("card"));
    }

    #[test]
    fn attributes_replace_in_place() {
        let mut el = ElementData::new("img");
        el.set_attr("src", "a.png");
        el.set_attr("alt", "");
        el.set_attr("SRC", "b.png");

        let attrs: Vec<_> = el.attrs().collect();
        assert_eq!(attrs, vec![("src", "b.png"), ("alt", "")]);
        assert_eq!(el.remove_attr("alt"), Some(String::new()));
        assert!(!el.has_attr("alt"));
        assert!(el.is_void());
    }
}
