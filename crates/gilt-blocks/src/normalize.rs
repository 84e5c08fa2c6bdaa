//! Positional classification of a block's items and regions.

use gilt_dom::{Document, NodeId};

/// The two semantic sub-areas of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Regions {
    /// First child element, unless it is blank
    pub media: Option<NodeId>,

    /// Second child element
    pub content: Option<NodeId>,

    /// Child elements beyond the second, which are left alone
    pub extra: usize,
}

/// One repeated entry of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub index: usize,
    pub node: NodeId,
    pub regions: Regions,
}

/// Extract the media/content pair of an item.
///
/// Policy, by number of child elements:
/// - 0: no regions
/// - 1: media only
/// - 2: media and content
/// - more: media and content from the first two, the rest counted in `extra`
///
/// A first child with no elements and only whitespace text is an empty media
/// cell and reads as a missing media region. Tag names are never consulted.
pub fn extract_regions(doc: &Document, item: NodeId) -> Regions {
    let children = doc.element_children(item);

    let media = children.first().copied().filter(|m| !doc.is_blank(*m));
    let content = children.get(1).copied();

    Regions {
        media,
        content,
        extra: children.len().saturating_sub(2),
    }
}

/// List the items of a block in document order with their regions.
pub fn normalize(doc: &Document, block: NodeId) -> Vec<Item> {
    doc.element_children(block)
        .into_iter()
        .enumerate()
        .map(|(index, node)| Item {
            index,
            node,
            regions: extract_regions(doc, node),
        })
        .collect()
}
