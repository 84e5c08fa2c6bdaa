//! Fire-once reveal of items entering the viewport.

use gilt_dom::{Document, DomError, NodeId};

use crate::host::IntersectionDetector;

/// One intersection change reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn entering(target: NodeId) -> Self {
        Self {
            target,
            is_intersecting: true,
        }
    }

    pub fn leaving(target: NodeId) -> Self {
        Self {
            target,
            is_intersecting: false,
        }
    }
}

/// Observes every item of a block through a single detector.
///
/// `revealed` only ever goes from false to true. Under reduced motion items
/// are still marked revealed but never receive the animation class.
pub struct RevealScheduler {
    detector: Option<Box<dyn IntersectionDetector>>,
    items: Vec<NodeId>,
    revealed: Vec<bool>,
    visible_class: String,
    reduced_motion: bool,
}

impl std::fmt::Debug for RevealScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealScheduler")
            .field("items", &self.items)
            .field("revealed", &self.revealed)
            .field("reduced_motion", &self.reduced_motion)
            .finish_non_exhaustive()
    }
}

impl RevealScheduler {
    pub fn new(
        detector: Option<Box<dyn IntersectionDetector>>,
        items: Vec<NodeId>,
        visible_class: String,
        reduced_motion: bool,
    ) -> Self {
        let revealed = vec![false; items.len()];
        Self {
            detector,
            items,
            revealed,
            visible_class,
            reduced_motion,
        }
    }

    /// Subscribe every item, or reveal everything at once when the host has
    /// no intersection support.
    pub fn start(&mut self, doc: &mut Document) -> Result<Vec<usize>, DomError> {
        if let Some(detector) = self.detector.as_mut() {
            for item in &self.items {
                detector.observe(*item);
            }
            return Ok(Vec::new());
        }

        let mut revealed = Vec::new();
        for index in 0..self.items.len() {
            if self.reveal(doc, index)? {
                revealed.push(index);
            }
        }
        Ok(revealed)
    }

    /// Apply a batch of entries in the order given.
    ///
    /// Returns the indices revealed by this batch, in reveal order.
    pub fn handle(
        &mut self,
        doc: &mut Document,
        entries: &[IntersectionEntry],
    ) -> Result<Vec<usize>, DomError> {
        let mut revealed = Vec::new();
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let Some(index) = self.items.iter().position(|i| *i == entry.target) else {
                continue;
            };
            if self.reveal(doc, index)? {
                revealed.push(index);
            }
        }
        Ok(revealed)
    }

    fn reveal(&mut self, doc: &mut Document, index: usize) -> Result<bool, DomError> {
        if self.revealed[index] {
            return Ok(false);
        }
        let item = self.items[index];

        doc.set_attr(item, "data-revealed", "true")?;
        if !self.reduced_motion {
            doc.add_class(item, &self.visible_class)?;
        }
        self.revealed[index] = true;

        if let Some(detector) = self.detector.as_mut() {
            detector.unobserve(item);
        }
        tracing::debug!(index, "Revealed item");
        Ok(true)
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.get(index).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RootMargin;
    use crate::host::Platform;
    use crate::recording::RecordingPlatform;
    use pretty_assertions::assert_eq;

    fn block(count: usize) -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let root = doc.root();
        let items = (0..count)
            .map(|_| {
                let item = doc.create_element("div");
                doc.append(root, item).unwrap();
                item
            })
            .collect();
        (doc, items)
    }

    fn scheduler(platform: &RecordingPlatform, items: &[NodeId]) -> RevealScheduler {
        RevealScheduler::new(
            platform.intersection_detector(&RootMargin::default()),
            items.to_vec(),
            "cards-visible".to_string(),
            platform.prefers_reduced_motion(),
        )
    }

    #[test]
    fn reveals_once_in_entry_order_and_unobserves() {
        let platform = RecordingPlatform::new();
        let (mut doc, items) = block(3);
        let mut reveal = scheduler(&platform, &items);

        reveal.start(&mut doc).unwrap();
        assert_eq!(platform.observed(), items);
        assert_eq!(platform.detectors_created(), 1);

        let first = reveal
            .handle(
                &mut doc,
                &[
                    IntersectionEntry::entering(items[2]),
                    IntersectionEntry::leaving(items[1]),
                    IntersectionEntry::entering(items[0]),
                ],
            )
            .unwrap();
        assert_eq!(first, vec![2, 0]);
        assert_eq!(platform.observed(), vec![items[1]]);

        let again = reveal
            .handle(&mut doc, &[IntersectionEntry::entering(items[2])])
            .unwrap();
        assert!(again.is_empty());
        assert!(doc.has_class(items[2], "cards-visible"));
        assert!(!reveal.is_revealed(1));
    }

    #[test]
    fn reduced_motion_marks_without_animating() {
        let platform = RecordingPlatform::new().with_reduced_motion(true);
        let (mut doc, items) = block(2);
        let mut reveal = scheduler(&platform, &items);
        reveal.start(&mut doc).unwrap();

        reveal
            .handle(
                &mut doc,
                &[
                    IntersectionEntry::entering(items[0]),
                    IntersectionEntry::entering(items[1]),
                ],
            )
            .unwrap();

        for item in &items {
            assert_eq!(doc.attr(*item, "data-revealed"), Some("true"));
            assert!(!doc.has_class(*item, "cards-visible"));
        }
    }

    #[test]
    fn reveals_everything_without_a_detector() {
        let platform = RecordingPlatform::new().without_intersection();
        let (mut doc, items) = block(3);
        let mut reveal = scheduler(&platform, &items);

        let revealed = reveal.start(&mut doc).unwrap();

        assert_eq!(revealed, vec![0, 1, 2]);
        assert!(items.iter().all(|i| doc.has_class(*i, "cards-visible")));
    }
}
