//! Image loading strategy, alt text and load/error recovery.

use gilt_dom::{Document, DomError, NodeId};

use crate::config::BlockOptions;

/// Inline placeholder shown in place of an image that failed to load.
pub const PLACEHOLDER_SRC: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='400' height='300' viewBox='0 0 400 300'%3E%3Crect width='400' height='300' fill='%23e5e7eb'/%3E%3Cpath d='M170 130h60v40h-60z' fill='%239ca3af'/%3E%3C/svg%3E";

/// Loading strategy of the image of item `index`.
pub fn loading_for(index: usize, threshold: usize) -> &'static str {
    if index < threshold {
        "eager"
    } else {
        "lazy"
    }
}

/// Load progress of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Loading,
    Loaded,
    Failed,
}

/// An optimized image awaiting its load or error event.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub item: NodeId,
    pub region: NodeId,
    pub img: NodeId,
    pub title: Option<String>,
    pub state: ImageState,
}

/// Derive a `srcset` for `src` at each of `widths`.
///
/// `hero.jpg` at 600 becomes `hero-600w.jpg 600w`. Returns `None` when the
/// source has no file extension.
pub fn derive_srcset(src: &str, widths: &[u32]) -> Option<String> {
    if widths.is_empty() {
        return None;
    }
    let path_end = src.find(['?', '#']).unwrap_or(src.len());
    let (path, suffix) = src.split_at(path_end);
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    let dot = path[file_start..].rfind('.').map(|i| file_start + i)?;
    if dot == file_start {
        return None;
    }
    let (base, ext) = path.split_at(dot);

    let candidates: Vec<String> = widths
        .iter()
        .map(|w| format!("{base}-{w}w{ext}{suffix} {w}w"))
        .collect();
    Some(candidates.join(", "))
}

/// `sizes` value matching [`derive_srcset`] for ascending `widths`.
pub fn derive_sizes(widths: &[u32]) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some((last, rest)) = widths.split_last() {
        for w in rest {
            parts.push(format!("(max-width: {w}px) {w}px"));
        }
        parts.push(format!("{last}px"));
    }
    parts.join(", ")
}

/// Optimize the first image of a media region.
///
/// Returns `None` when the region holds no image; nothing is created in that
/// case.
pub fn optimize(
    doc: &mut Document,
    item: NodeId,
    region: NodeId,
    index: usize,
    title: Option<&str>,
    options: &BlockOptions,
) -> Result<Option<ImageHandle>, DomError> {
    let Some(img) = doc.find_tag(region, "img") else {
        return Ok(None);
    };

    if let Some(picture) = doc.closest(img, |el| el.tag == "picture") {
        if doc.contains(region, picture) {
            doc.add_class(picture, &options.class("picture"))?;
        }
    }

    doc.set_attr(img, "loading", loading_for(index, options.lazy_load_threshold))?;
    doc.set_attr(img, "decoding", "async")?;

    if doc.attr(img, "alt").is_none() {
        let alt = title
            .map(str::to_string)
            .or_else(|| options.fallback_alt.clone())
            .unwrap_or_default();
        doc.set_attr(img, "alt", &alt)?;
    }

    if doc.attr(img, "srcset").is_none() {
        let srcset = doc
            .attr(img, "src")
            .and_then(|src| derive_srcset(src, &options.responsive_widths));
        if let Some(srcset) = srcset {
            doc.set_attr(img, "srcset", &srcset)?;
            doc.set_attr(img, "sizes", &derive_sizes(&options.responsive_widths))?;
        }
    }

    if options.overlay {
        let overlay = doc.create_element("div");
        doc.add_class(overlay, &options.class("overlay"))?;
        doc.set_attr(overlay, "aria-hidden", "true")?;
        doc.append(region, overlay)?;
    }

    doc.set_attr(item, "aria-busy", "true")?;
    doc.add_class(region, &options.class("loading"))?;

    Ok(Some(ImageHandle {
        item,
        region,
        img,
        title: title.map(str::to_string),
        state: ImageState::Loading,
    }))
}

impl ImageHandle {
    fn settle(&mut self, doc: &mut Document, options: &BlockOptions) -> Result<(), DomError> {
        doc.remove_class(self.region, &options.class("loading"))?;
        doc.remove_attr(self.item, "aria-busy")
    }

    /// The image loaded: drop the busy state. Returns whether anything changed.
    pub fn mark_loaded(
        &mut self,
        doc: &mut Document,
        options: &BlockOptions,
    ) -> Result<bool, DomError> {
        if self.state != ImageState::Loading {
            return Ok(false);
        }
        self.settle(doc, options)?;
        doc.add_class(self.region, &options.class("loaded"))?;
        self.state = ImageState::Loaded;
        Ok(true)
    }

    /// The image failed: swap in the placeholder and describe the failure.
    ///
    /// Returns the source that failed, or `None` when the failure was
    /// already handled (the placeholder itself never retriggers recovery).
    pub fn recover_failed(
        &mut self,
        doc: &mut Document,
        options: &BlockOptions,
    ) -> Result<Option<String>, DomError> {
        if self.state == ImageState::Failed {
            return Ok(None);
        }
        let failed_src = doc.attr(self.img, "src").unwrap_or_default().to_string();

        self.settle(doc, options)?;
        doc.set_attr(self.img, "src", PLACEHOLDER_SRC)?;
        doc.remove_attr(self.img, "srcset")?;
        doc.remove_attr(self.img, "sizes")?;
        if let Some(picture) = doc.closest(self.img, |el| el.tag == "picture") {
            for source in doc.find_all(picture, |el| el.tag == "source") {
                doc.remove_attr(source, "srcset")?;
            }
        }

        let alt = match &self.title {
            Some(title) => format!("Image unavailable: {title}"),
            None => "Image unavailable".to_string(),
        };
        doc.set_attr(self.img, "alt", &alt)?;
        doc.add_class(self.region, &options.class("image-error"))?;

        self.state = ImageState::Failed;
        Ok(Some(failed_src))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture(html: &str) -> (Document, NodeId, NodeId) {
        let (doc, tops) = Document::parse_fragment(html).unwrap();
        let item = tops[0];
        let region = doc.element_children(item)[0];
        (doc, item, region)
    }

    #[test]
    fn loading_follows_threshold() {
        assert_eq!(loading_for(0, 2), "eager");
        assert_eq!(loading_for(1, 2), "eager");
        assert_eq!(loading_for(2, 2), "lazy");
        assert_eq!(loading_for(0, 0), "lazy");
    }

    #[test]
    fn derives_responsive_variants() {
        assert_eq!(
            derive_srcset("/media/hero.jpg", &[600, 900]).as_deref(),
            Some("/media/hero-600w.jpg 600w, /media/hero-900w.jpg 900w")
        );
        assert_eq!(
            derive_srcset("/img/a.png?v=2", &[600]).as_deref(),
            Some("/img/a-600w.png?v=2 600w")
        );
        assert_eq!(derive_srcset("/assets.v1/hero", &[600]), None);
        assert_eq!(derive_srcset("/a.png", &[]), None);
        assert_eq!(
            derive_sizes(&[600, 900, 1200]),
            "(max-width: 600px) 600px, (max-width: 900px) 900px, 1200px"
        );
    }

    #[test]
    fn optimizes_image_and_enters_busy_state() {
        let (mut doc, item, region) =
            fixture(r#"<div><div><picture><img src="/a.png"></picture></div></div>"#);

        let handle = optimize(&mut doc, item, region, 3, Some("Speed"), &BlockOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(doc.attr(handle.img, "loading"), Some("lazy"));
        assert_eq!(doc.attr(handle.img, "decoding"), Some("async"));
        assert_eq!(doc.attr(handle.img, "alt"), Some("Speed"));
        assert_eq!(doc.attr(item, "aria-busy"), Some("true"));
        assert!(doc.has_class(region, "cards-loading"));
        assert!(doc.find_class(region, "cards-overlay").is_some());
        assert!(doc.find_class(region, "cards-picture").is_some());
    }

    #[test]
    fn author_alt_is_kept_and_fallbacks_apply() {
        let (mut doc, item_a, region_a) = fixture(r#"<div><div><img src="/a.png" alt=""></div></div>"#);
        let handle = optimize(&mut doc, item_a, region_a, 0, Some("T"), &BlockOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(doc.attr(handle.img, "alt"), Some(""));

        let (mut doc, item_b, region_b) = fixture(r#"<div><div><img src="/b.png"></div></div>"#);
        let hero = BlockOptions {
            fallback_alt: Some("Hero background image".to_string()),
            ..Default::default()
        };
        let handle = optimize(&mut doc, item_b, region_b, 0, None, &hero)
            .unwrap()
            .unwrap();
        assert_eq!(doc.attr(handle.img, "alt"), Some("Hero background image"));
    }

    #[test]
    fn region_without_image_creates_nothing() {
        let (mut doc, item, region) = fixture("<div><div><p>No picture</p></div></div>");
        let before = doc.outer_html(item);

        let handle = optimize(&mut doc, item, region, 0, None, &BlockOptions::default()).unwrap();

        assert!(handle.is_none());
        assert_eq!(doc.outer_html(item), before);
    }

    #[test]
    fn load_clears_busy_state_once() {
        let (mut doc, item, region) = fixture(r#"<div><div><img src="/a.png"></div></div>"#);
        let options = BlockOptions::default();
        let mut handle = optimize(&mut doc, item, region, 0, None, &options)
            .unwrap()
            .unwrap();

        assert!(handle.mark_loaded(&mut doc, &options).unwrap());
        assert!(!handle.mark_loaded(&mut doc, &options).unwrap());

        assert_eq!(doc.attr(item, "aria-busy"), None);
        assert!(!doc.has_class(region, "cards-loading"));
        assert!(doc.has_class(region, "cards-loaded"));
    }

    #[test]
    fn failure_swaps_in_placeholder() {
        let (mut doc, item, region) = fixture(
            r#"<div><div><picture><source srcset="/a.webp"><img src="/a.png" srcset="/a-2x.png 2x"></picture></div></div>"#,
        );
        let options = BlockOptions::default();
        let mut handle = optimize(&mut doc, item, region, 0, Some("Speed"), &options)
            .unwrap()
            .unwrap();

        let failed = handle.recover_failed(&mut doc, &options).unwrap();

        assert_eq!(failed.as_deref(), Some("/a.png"));
        assert_eq!(doc.attr(handle.img, "src"), Some(PLACEHOLDER_SRC));
        assert_eq!(doc.attr(handle.img, "srcset"), None);
        assert_eq!(doc.attr(handle.img, "alt"), Some("Image unavailable: Speed"));
        let source = doc.find_tag(region, "source").unwrap();
        assert_eq!(doc.attr(source, "srcset"), None);
        assert_eq!(doc.attr(item, "aria-busy"), None);
        assert!(doc.has_class(region, "cards-image-error"));

        assert_eq!(handle.recover_failed(&mut doc, &options).unwrap(), None);
    }
}
