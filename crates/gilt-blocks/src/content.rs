//! Content region normalization and generated controls.
//!
//! Everything here appends to or rewrites the ContentRegion of one item:
//! title promotion, description classes, the call-to-action and toggle
//! buttons, the progress indicator and embedded frames.

use gilt_dom::{Document, DomError, NodeId};

use crate::config::BlockOptions;

/// Find or create the title of a content region.
///
/// An existing `h1`-`h6` is used as-is. Otherwise a first paragraph holding a
/// `<strong>` is replaced by a heading of `options.title_level` with the
/// strong text. Every other paragraph gets the description class.
pub fn promote_title(
    doc: &mut Document,
    region: NodeId,
    options: &BlockOptions,
) -> Result<Option<NodeId>, DomError> {
    let existing = doc.find(region, |el| el.is_heading());
    let paragraphs = doc.find_all(region, |el| el.tag == "p");

    let mut title = existing;
    for (position, p) in paragraphs.into_iter().enumerate() {
        if position == 0 && title.is_none() {
            if let Some(strong) = doc.find_tag(p, "strong") {
                let text = doc.text_content(strong).trim().to_string();
                let heading = doc.create_element(&format!("h{}", options.title_level));
                doc.set_text(heading, &text)?;
                doc.replace(p, heading)?;
                title = Some(heading);
                continue;
            }
        }
        doc.add_class(p, &options.class("description"))?;
    }

    if let Some(title) = title {
        doc.add_class(title, &options.class("title"))?;
    }
    Ok(title)
}

/// Trimmed text of a title element, `None` when it is empty.
pub fn title_text(doc: &Document, title: Option<NodeId>) -> Option<String> {
    let text = doc.text_content(title?);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Append the call-to-action button.
pub fn append_cta(
    doc: &mut Document,
    region: NodeId,
    title: Option<&str>,
    options: &BlockOptions,
) -> Result<NodeId, DomError> {
    let button = doc.create_element("button");
    doc.set_attr(button, "type", "button")?;
    doc.add_class(button, &options.class("cta"))?;
    doc.set_text(button, &options.cta_text)?;

    let label = match title {
        Some(title) => format!("{} about {}", options.cta_text, title),
        None => options.cta_text.clone(),
    };
    doc.set_attr(button, "aria-label", &label)?;

    doc.append(region, button)?;
    Ok(button)
}

/// Append a disclosure button controlling `region`.
///
/// The region receives `content_id` when it has no id of its own.
pub fn append_toggle(
    doc: &mut Document,
    region: NodeId,
    content_id: &str,
    options: &BlockOptions,
) -> Result<NodeId, DomError> {
    let controls = match doc.attr(region, "id") {
        Some(id) => id.to_string(),
        None => {
            doc.set_attr(region, "id", content_id)?;
            content_id.to_string()
        }
    };

    let button = doc.create_element("button");
    doc.set_attr(button, "type", "button")?;
    doc.add_class(button, &options.class("toggle"))?;
    doc.set_attr(button, "aria-expanded", "false")?;
    doc.set_attr(button, "aria-controls", &controls)?;
    doc.set_text(button, &options.cta_text)?;

    doc.append(region, button)?;
    Ok(button)
}

/// Application counts read from `data-applied` / `data-capacity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// May be negative; the bar clamps it to empty.
    pub applied: i64,
    pub capacity: u64,
}

impl Progress {
    /// Read the counts from an item. Missing, non-numeric or zero capacity
    /// yields `None`.
    pub fn from_item(doc: &Document, item: NodeId) -> Option<Self> {
        let applied: i64 = doc.attr(item, "data-applied")?.trim().parse().ok()?;
        let capacity: u64 = doc.attr(item, "data-capacity")?.trim().parse().ok()?;
        if capacity == 0 {
            return None;
        }
        Some(Self { applied, capacity })
    }

    /// Share of capacity used, clamped to 0..=100 and rounded.
    pub fn percent(&self) -> u64 {
        let ratio = self.applied as f64 / self.capacity as f64 * 100.0;
        ratio.clamp(0.0, 100.0).round() as u64
    }
}

/// Append the status summary and progress bar for `progress`.
pub fn append_progress(
    doc: &mut Document,
    region: NodeId,
    progress: Progress,
    options: &BlockOptions,
) -> Result<NodeId, DomError> {
    let percent = progress.percent().to_string();

    let stats = doc.create_element("div");
    doc.add_class(stats, &options.class("stats"))?;
    doc.set_attr(stats, "role", "status")?;
    doc.set_attr(stats, "aria-live", "polite")?;
    doc.set_text(
        stats,
        &format!("{} applied of {} capacity", progress.applied, progress.capacity),
    )?;
    doc.append(region, stats)?;

    let bar = doc.create_element("div");
    doc.add_class(bar, &options.class("progress"))?;
    doc.set_attr(bar, "role", "progressbar")?;
    doc.set_attr(bar, "aria-valuemin", "0")?;
    doc.set_attr(bar, "aria-valuemax", "100")?;
    doc.set_attr(bar, "aria-valuenow", &percent)?;
    doc.set_attr(bar, "aria-label", "Application progress")?;

    let fill = doc.create_element("div");
    doc.add_class(fill, &options.class("progress-fill"))?;
    doc.set_attr(fill, "style", &format!("width: {percent}%"))?;
    doc.append(bar, fill)?;

    doc.append(region, bar)?;
    Ok(bar)
}

/// Append an embedded frame for `src`.
pub fn append_embed(
    doc: &mut Document,
    region: NodeId,
    src: &str,
    options: &BlockOptions,
) -> Result<NodeId, DomError> {
    let frame = doc.create_element("iframe");
    doc.add_class(frame, &options.class("frame"))?;
    doc.set_attr(frame, "src", src)?;
    doc.set_attr(frame, "title", &options.block_label)?;
    doc.set_attr(frame, "loading", "lazy")?;
    doc.set_attr(frame, "width", "100%")?;
    doc.append(region, frame)?;
    Ok(frame)
}
