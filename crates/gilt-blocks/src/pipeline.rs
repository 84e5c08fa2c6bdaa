//! The block enhancement pipeline.
//!
//! [`decorate`] runs the one-shot stages (normalize, annotate, optimize
//! media, bind interactions) and returns a [`DecoratedBlock`]. The host then
//! forwards intersection, image, pointer, keyboard, resize and timer events
//! to that block. Every event takes the document explicitly; the block holds
//! node ids and never the tree itself.

use std::rc::Rc;

use gilt_dom::{Document, DomError, NodeId};
use serde_json::json;

use crate::annotate::{
    annotate_block, annotate_item, ensure_accessible_names, item_label, link_title,
    make_focusable,
};
use crate::carousel::{CarouselError, CarouselView};
use crate::config::{BlockOptions, PrimaryAction};
use crate::content::{
    append_cta, append_embed, append_progress, append_toggle, promote_title, title_text,
    Progress,
};
use crate::host::{Platform, TimerToken};
use crate::interact::{Activation, ClickSource, InteractionBinder, Key};
use crate::layout::{apply_columns, columns_for};
use crate::media::{self, ImageHandle, ImageState};
use crate::normalize::{normalize, Item};
use crate::report::{BlockReport, ItemError, ItemOutcome, ItemReport, Reporter, Skipped};
use crate::reveal::{IntersectionEntry, RevealScheduler};

/// Errors raised while decorating a block or handling its events.
#[derive(Debug, thiserror::Error)]
pub enum DecorateError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Carousel(#[from] CarouselError),
}

/// Ephemeral per-item state derived from the decorated block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnhancementState {
    pub revealed: bool,
    pub busy: bool,
    pub expanded: bool,
}

/// A block after its one-shot enhancement, ready to receive host events.
pub struct DecoratedBlock {
    node: NodeId,
    id: String,
    options: BlockOptions,
    items: Vec<Item>,
    report: BlockReport,
    images: Vec<Option<ImageHandle>>,
    reveal: RevealScheduler,
    binder: InteractionBinder,
    carousel: Option<CarouselView>,
    reporter: Rc<dyn Reporter>,
}

impl std::fmt::Debug for DecoratedBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoratedBlock")
            .field("id", &self.id)
            .field("items", &self.items.len())
            .field("report", &self.report)
            .field("carousel", &self.carousel)
            .finish_non_exhaustive()
    }
}

/// Enhance `block` in place.
///
/// `ordinal` is the block's position among the page's blocks and only feeds
/// generated ids. Failures of individual items are recorded in the report and
/// never abort their siblings; only an invalid block node or an unusable
/// carousel fails the whole call.
pub fn decorate(
    doc: &mut Document,
    block: NodeId,
    ordinal: usize,
    options: BlockOptions,
    platform: &dyn Platform,
    reporter: Rc<dyn Reporter>,
) -> Result<DecoratedBlock, DecorateError> {
    doc.element(block)?;
    let id = annotate_block(doc, block, ordinal, &options)?;

    let items = normalize(doc, block);
    let count = items.len();
    let nodes: Vec<NodeId> = items.iter().map(|i| i.node).collect();

    let mut binder = InteractionBinder::new(options.class("expanded"));
    let mut images = Vec::with_capacity(count);
    let mut outcomes = Vec::with_capacity(count);

    for item in &items {
        let result = match enhance_item(doc, *item, count, &id, &options, &mut binder) {
            Ok((report, image)) => {
                images.push(image);
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(block = %id, index = item.index, error = %e, "Failed to enhance item");
                images.push(None);
                Err(e)
            }
        };
        outcomes.push(ItemOutcome {
            index: item.index,
            result,
        });
    }

    let mut report = BlockReport {
        items: outcomes,
        skipped: Vec::new(),
    };

    if options.embed {
        if let Some(skipped) = embed(doc, block, &items, &options)? {
            report.skipped.push(skipped);
        }
    }

    if !options.layout_breakpoints.is_empty() {
        let max = options.layout_breakpoints.len() + 1;
        apply_columns(doc, block, &options.class_prefix, count.clamp(1, max), max)?;
    }

    let carousel = if options.carousel {
        Some(CarouselView::build(doc, block, nodes.clone(), &options, platform)?)
    } else {
        None
    };

    let mut reveal = RevealScheduler::new(
        platform.intersection_detector(&options.observer_root_margin),
        nodes,
        options.class("visible"),
        platform.prefers_reduced_motion(),
    );
    reveal.start(doc)?;

    reporter.record(
        "block_decorated",
        &json!({ "block": id, "items": count, "enhanced": report.enhanced() }),
    );

    Ok(DecoratedBlock {
        node: block,
        id,
        options,
        items,
        report,
        images,
        reveal,
        binder,
        carousel,
        reporter,
    })
}

fn enhance_item(
    doc: &mut Document,
    item: Item,
    count: usize,
    block_id: &str,
    options: &BlockOptions,
    binder: &mut InteractionBinder,
) -> Result<(ItemReport, Option<ImageHandle>), ItemError> {
    let el = doc.element(item.node)?;
    if el.is_void() {
        return Err(ItemError::VoidElement(el.tag.clone()));
    }

    let mut report = ItemReport::default();
    annotate_item(doc, item.node, item.index, count, options)?;

    let regions = item.regions;
    if regions.extra > 0 {
        report.skipped.push(Skipped::ExtraRegions(regions.extra));
    }

    let title = match regions.content {
        Some(region) => {
            doc.add_class(region, &options.class("content"))?;
            promote_title(doc, region, options)?
        }
        None => {
            report.skipped.push(Skipped::Content);
            None
        }
    };
    let title_label = title_text(doc, title);
    match title {
        Some(title) => {
            let title_id = format!("{block_id}-title-{}", item.index);
            link_title(doc, item.node, title, &title_id)?;
        }
        None => report.skipped.push(Skipped::Title),
    }

    let image = match regions.media {
        Some(region) => {
            doc.add_class(region, &options.class("media"))?;
            let image = media::optimize(
                doc,
                item.node,
                region,
                item.index,
                title_label.as_deref(),
                options,
            )?;
            if image.is_none() {
                report.skipped.push(Skipped::Image);
            }
            image
        }
        None => {
            report.skipped.push(Skipped::Media);
            None
        }
    };

    if options.progress {
        match (Progress::from_item(doc, item.node), regions.content) {
            (Some(progress), Some(region)) => {
                append_progress(doc, region, progress, options)?;
            }
            _ => report.skipped.push(Skipped::Progress),
        }
    }

    match (options.primary_action, regions.content) {
        (PrimaryAction::Cta, Some(region)) => {
            let button = append_cta(doc, region, title_label.as_deref(), options)?;
            binder.bind_cta(item.index, item.node, button, title_label.clone());
            make_focusable(doc, item.node)?;
        }
        (PrimaryAction::Toggle, Some(region)) => {
            let content_id = format!("{block_id}-content-{}", item.index);
            let button = append_toggle(doc, region, &content_id, options)?;
            binder.bind_toggle(item.index, item.node, button);
            make_focusable(doc, item.node)?;
        }
        (PrimaryAction::Cta | PrimaryAction::Toggle, None) => {
            report.skipped.push(Skipped::Action);
        }
        (PrimaryAction::Link, _) => {
            binder.bind_link(item.index, item.node);
            make_focusable(doc, item.node)?;
        }
        (PrimaryAction::None, _) => {}
    }

    let label = item_label(options, item.index, count);
    report.generated_names = ensure_accessible_names(doc, item.node, &label, options)?;

    Ok((report, image))
}

/// Append the configured frame to the first item. Returns a skip reason when
/// there is nothing to embed or nowhere to put it.
fn embed(
    doc: &mut Document,
    block: NodeId,
    items: &[Item],
    options: &BlockOptions,
) -> Result<Option<Skipped>, DomError> {
    let src = doc
        .attr(block, "data-embed-src")
        .map(str::to_string)
        .or_else(|| options.embed_url.clone());
    let Some(src) = src else {
        tracing::warn!(block = %options.class_prefix, "Embed block has no source; skipping");
        return Ok(Some(Skipped::EmbedSource));
    };

    let target = items.first().and_then(|first| match first.regions.content {
        Some(region) => Some(region),
        None => doc
            .element(first.node)
            .is_ok_and(|el| !el.is_void())
            .then_some(first.node),
    });
    match target {
        Some(region) => {
            append_embed(doc, region, &src, options)?;
            Ok(None)
        }
        None => Ok(Some(Skipped::Content)),
    }
}

impl DecoratedBlock {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Id of the block element, author-supplied or generated.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn options(&self) -> &BlockOptions {
        &self.options
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn report(&self) -> &BlockReport {
        &self.report
    }

    pub fn carousel(&self) -> Option<&CarouselView> {
        self.carousel.as_ref()
    }

    /// Current enhancement state of the item at `index`.
    pub fn state(&self, index: usize) -> Option<EnhancementState> {
        if index >= self.items.len() {
            return None;
        }
        let busy = self
            .images
            .get(index)
            .and_then(Option::as_ref)
            .is_some_and(|image| image.state == ImageState::Loading);
        Some(EnhancementState {
            revealed: self.reveal.is_revealed(index),
            busy,
            expanded: self.binder.is_expanded(index),
        })
    }

    /// Intersection changes reported by the block's detector.
    pub fn intersect(
        &mut self,
        doc: &mut Document,
        entries: &[IntersectionEntry],
    ) -> Result<Vec<usize>, DecorateError> {
        let revealed = self.reveal.handle(doc, entries)?;
        for index in &revealed {
            self.reporter.record(
                "item_revealed",
                &json!({ "block": self.id, "index": index }),
            );
        }
        Ok(revealed)
    }

    /// The image of item `index` finished loading.
    pub fn image_loaded(&mut self, doc: &mut Document, index: usize) -> Result<bool, DecorateError> {
        let Some(Some(image)) = self.images.get_mut(index) else {
            return Ok(false);
        };
        Ok(image.mark_loaded(doc, &self.options)?)
    }

    /// The image of item `index` failed to load. Recovered locally; the
    /// failure is logged and reported but never returned as an error.
    pub fn image_failed(&mut self, doc: &mut Document, index: usize) -> Result<bool, DecorateError> {
        let Some(Some(image)) = self.images.get_mut(index) else {
            return Ok(false);
        };
        let Some(src) = image.recover_failed(doc, &self.options)? else {
            return Ok(false);
        };

        tracing::warn!(block = %self.id, index, src = %src, "Image failed to load, showing placeholder");
        self.reporter.record(
            "image_error",
            &json!({ "block": self.id, "index": index, "src": src }),
        );
        Ok(true)
    }

    /// A click on `target`, from a pointer or synthesized after a key press.
    pub fn click(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        source: ClickSource,
    ) -> Result<Option<Activation>, DecorateError> {
        if let Some(carousel) = self.carousel.as_mut() {
            if carousel.owns_control(doc, target) {
                carousel.click(doc, target)?;
                return Ok(None);
            }
        }

        let activation = self.binder.click(doc, target, source)?;
        self.record_activation(activation.as_ref());
        Ok(activation)
    }

    /// A key press while `target` has focus.
    pub fn key_down(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        key: Key,
    ) -> Result<Option<Activation>, DecorateError> {
        if let Some(carousel) = self.carousel.as_mut() {
            if matches!(key, Key::ArrowLeft | Key::ArrowRight) && doc.contains(self.node, target) {
                carousel.key_down(doc, key)?;
                return Ok(None);
            }
        }

        let activation = self.binder.key_down(doc, target, key)?;
        self.record_activation(activation.as_ref());
        Ok(activation)
    }

    fn record_activation(&self, activation: Option<&Activation>) {
        if let Some(activation) = activation {
            tracing::debug!(block = %self.id, index = activation.index, "Item activated");
            self.reporter.record(
                "item_activated",
                &json!({
                    "block": self.id,
                    "index": activation.index,
                    "action": activation.action,
                }),
            );
        }
    }

    /// The block's container was resized. Returns the new column count for
    /// blocks with layout breakpoints.
    pub fn resize(&mut self, doc: &mut Document, width: u32) -> Result<Option<usize>, DecorateError> {
        let breakpoints = &self.options.layout_breakpoints;
        if breakpoints.is_empty() {
            return Ok(None);
        }
        let columns = columns_for(width, breakpoints);
        apply_columns(
            doc,
            self.node,
            &self.options.class_prefix,
            columns,
            breakpoints.len() + 1,
        )?;
        Ok(Some(columns))
    }

    pub fn pointer_enter(&mut self) {
        if let Some(carousel) = self.carousel.as_mut() {
            carousel.pointer_enter();
        }
    }

    pub fn pointer_leave(&mut self) {
        if let Some(carousel) = self.carousel.as_mut() {
            carousel.pointer_leave();
        }
    }

    /// An interval timer armed by this block fired.
    pub fn timer_fired(
        &mut self,
        doc: &mut Document,
        token: TimerToken,
    ) -> Result<Option<usize>, DecorateError> {
        match self.carousel.as_mut() {
            Some(carousel) => Ok(carousel.timer_fired(doc, token)?),
            None => Ok(None),
        }
    }
}
