//! ARIA roles, labels and accessible-name guarantees.

use gilt_dom::{Document, DomError, NodeId};

use crate::config::{BlockOptions, ItemRole};

/// Annotate the block container and return its id.
///
/// An author-supplied `id` is kept; otherwise `{prefix}-{ordinal + 1}` is
/// assigned so generated ids stay unique per page.
pub fn annotate_block(
    doc: &mut Document,
    block: NodeId,
    ordinal: usize,
    options: &BlockOptions,
) -> Result<String, DomError> {
    doc.add_class(block, &options.class("container"))?;
    doc.set_attr(block, "role", &options.block_role)?;
    if doc.attr(block, "aria-label").is_none() {
        doc.set_attr(block, "aria-label", &options.block_label)?;
    }

    let id = match doc.attr(block, "id") {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => {
            let id = format!("{}-{}", options.class_prefix, ordinal + 1);
            doc.set_attr(block, "id", &id)?;
            id
        }
    };
    Ok(id)
}

/// Index-aware label of an item, e.g. `Card 3 of 7`.
pub fn item_label(options: &BlockOptions, index: usize, count: usize) -> String {
    format!("{} {} of {}", options.item_noun, index + 1, count)
}

/// Set the role, class and label of one item.
pub fn annotate_item(
    doc: &mut Document,
    item: NodeId,
    index: usize,
    count: usize,
    options: &BlockOptions,
) -> Result<(), DomError> {
    doc.add_class(item, &options.class("item"))?;
    doc.set_attr(item, "role", options.item_role.as_str())?;
    if options.item_role == ItemRole::Group {
        doc.set_attr(item, "aria-roledescription", "slide")?;
    }
    doc.set_attr(item, "aria-label", &item_label(options, index, count))?;
    Ok(())
}

/// Point the item's accessible name at its title.
pub fn link_title(
    doc: &mut Document,
    item: NodeId,
    title: NodeId,
    title_id: &str,
) -> Result<(), DomError> {
    let id = match doc.attr(title, "id") {
        Some(id) => id.to_string(),
        None => {
            doc.set_attr(title, "id", title_id)?;
            title_id.to_string()
        }
    };
    doc.set_attr(item, "aria-labelledby", &id)
}

/// Make the item reachable by keyboard.
pub fn make_focusable(doc: &mut Document, item: NodeId) -> Result<(), DomError> {
    if doc.attr(item, "tabindex").is_none() {
        doc.set_attr(item, "tabindex", "0")?;
    }
    Ok(())
}

fn has_accessible_name(doc: &Document, control: NodeId) -> bool {
    let named = |name: &str| doc.attr(control, name).is_some_and(|v| !v.trim().is_empty());
    if named("aria-label") || named("aria-labelledby") || named("title") {
        return true;
    }
    if !doc.text_content(control).trim().is_empty() {
        return true;
    }
    // An image inside a link names it through its alt text.
    doc.find(control, |el| {
        el.tag == "img" && el.attr("alt").is_some_and(|a| !a.trim().is_empty())
    })
    .is_some()
}

/// Guarantee a non-empty accessible name on every button and link in `scope`.
///
/// Returns how many names had to be generated.
pub fn ensure_accessible_names(
    doc: &mut Document,
    scope: NodeId,
    scope_label: &str,
    options: &BlockOptions,
) -> Result<usize, DomError> {
    let controls = doc.find_all(scope, |el| el.tag == "a" || el.tag == "button");

    let mut generated = 0;
    let (mut links, mut buttons) = (0, 0);
    for control in controls {
        let is_link = doc.tag(control) == Some("a");
        if is_link {
            links += 1;
        } else {
            buttons += 1;
        }
        if has_accessible_name(doc, control) {
            continue;
        }

        let label = match (is_link, &options.link_fallback_label) {
            (true, Some(fallback)) => fallback.clone(),
            (true, None) => format!("Link {links} in {scope_label}"),
            (false, _) => format!("Button {buttons} in {scope_label}"),
        };
        doc.set_attr(control, "aria-label", &label)?;
        generated += 1;
    }
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fragment(html: &str) -> (Document, NodeId) {
        let (doc, tops) = Document::parse_fragment(html).unwrap();
        (doc, tops[0])
    }

    #[test]
    fn block_gets_role_label_and_id() {
        let (mut doc, block) = fragment("<div class=\"cards\"></div>");

        let id = annotate_block(&mut doc, block, 0, &BlockOptions::default()).unwrap();

        assert_eq!(id, "cards-1");
        assert_eq!(doc.attr(block, "role"), Some("region"));
        assert_eq!(doc.attr(block, "aria-label"), Some("Feature Cards"));
        assert!(doc.has_class(block, "cards-container"));
    }

    #[test]
    fn author_id_and_label_are_kept() {
        let (mut doc, block) = fragment(r#"<div id="team" aria-label="Our team"></div>"#);

        let id = annotate_block(&mut doc, block, 4, &BlockOptions::default()).unwrap();

        assert_eq!(id, "team");
        assert_eq!(doc.attr(block, "aria-label"), Some("Our team"));
    }

    #[test]
    fn slides_get_a_role_description() {
        let (mut doc, item) = fragment("<div></div>");
        let options = BlockOptions {
            item_role: ItemRole::Group,
            item_noun: "Slide".to_string(),
            ..Default::default()
        };

        annotate_item(&mut doc, item, 1, 3, &options).unwrap();

        assert_eq!(doc.attr(item, "role"), Some("group"));
        assert_eq!(doc.attr(item, "aria-roledescription"), Some("slide"));
        assert_eq!(doc.attr(item, "aria-label"), Some("Slide 2 of 3"));
    }

    #[test]
    fn generates_missing_names_only() {
        let (mut doc, item) = fragment(
            r#"<div><a href="/a">Named</a><a href="/b"></a><button></button><a href="/c"><img src="x.png" alt="Logo"></a></div>"#,
        );

        let generated =
            ensure_accessible_names(&mut doc, item, "Card 1 of 2", &BlockOptions::default())
                .unwrap();

        assert_eq!(generated, 2);
        let anchors = doc.find_all(item, |el| el.tag == "a");
        assert_eq!(doc.attr(anchors[0], "aria-label"), None);
        assert_eq!(doc.attr(anchors[1], "aria-label"), Some("Link 2 in Card 1 of 2"));
        assert_eq!(doc.attr(anchors[2], "aria-label"), None);
        let button = doc.find_tag(item, "button").unwrap();
        assert_eq!(doc.attr(button, "aria-label"), Some("Button 1 in Card 1 of 2"));
    }

    #[test]
    fn preset_link_fallback_wins() {
        let (mut doc, item) = fragment(r#"<div><a href="/"></a></div>"#);
        let options = BlockOptions {
            link_fallback_label: Some("Hero section link".to_string()),
            ..Default::default()
        };

        ensure_accessible_names(&mut doc, item, "Section 1 of 1", &options).unwrap();

        let link = doc.find_tag(item, "a").unwrap();
        assert_eq!(doc.attr(link, "aria-label"), Some("Hero section link"));
    }
}
