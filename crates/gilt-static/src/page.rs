//! Enhancement of a single HTML page and its manifest entry.

use std::rc::Rc;

use serde::Serialize;

use gilt_blocks::{
    decorate, BlockRegistry, ItemOutcome, PageBlock, Skipped, StaticPlatform, TracingReporter,
};
use gilt_dom::Document;

use crate::builder::BuildError;

/// Manifest entry for one item of a block.
#[derive(Debug, Clone, Serialize)]
pub struct ItemEntry {
    pub index: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ItemOutcome> for ItemEntry {
    fn from(outcome: &ItemOutcome) -> Self {
        match &outcome.result {
            Ok(report) => Self {
                index: outcome.index,
                ok: true,
                skipped: report.skipped.clone(),
                error: None,
            },
            Err(e) => Self {
                index: outcome.index,
                ok: false,
                skipped: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

/// Manifest entry for one block of a page.
#[derive(Debug, Clone, Serialize)]
pub struct BlockEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub items: Vec<ItemEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BlockEntry {
    fn from_page_block(block: &PageBlock) -> Self {
        match &block.result {
            Ok((kind, decorated)) => Self {
                name: block.name.clone(),
                kind: Some(kind.name().to_string()),
                id: Some(decorated.id().to_string()),
                items: decorated.report().items.iter().map(ItemEntry::from).collect(),
                skipped: decorated.report().skipped.clone(),
                error: None,
            },
            Err(e) => Self {
                name: block.name.clone(),
                kind: None,
                id: None,
                items: Vec::new(),
                skipped: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    /// Items enhanced without error.
    pub fn enhanced(&self) -> usize {
        self.items.iter().filter(|i| i.ok).count()
    }

    /// Items that failed, plus one for a block that could not be decorated.
    pub fn failures(&self) -> usize {
        let items = self.items.iter().filter(|i| !i.ok).count();
        items + usize::from(self.error.is_some())
    }
}

/// A page after enhancement.
#[derive(Debug, Clone)]
pub struct EnhancedPage {
    pub html: String,
    pub blocks: Vec<BlockEntry>,
}

/// Enhance every block of a full HTML page.
///
/// Pages are enhanced with the build-time platform: the emitted markup is the
/// state right after decoration, before any viewport or pointer event.
pub fn enhance_page(
    source: &str,
    path: &str,
    registry: &BlockRegistry,
) -> Result<EnhancedPage, BuildError> {
    let mut doc = Document::parse(source).map_err(|e| BuildError::ParseError {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    let decorated = registry.decorate_document(&mut doc, &StaticPlatform, Rc::new(TracingReporter));
    let blocks = decorated.iter().map(BlockEntry::from_page_block).collect();

    Ok(EnhancedPage {
        html: doc.to_html(),
        blocks,
    })
}

/// Enhance a fragment whose first element is a block of kind `name`.
///
/// Used for authored snippets that lack the `block` class and
/// `data-block-name` attribute.
pub fn enhance_fragment(
    source: &str,
    path: &str,
    name: &str,
    registry: &BlockRegistry,
) -> Result<EnhancedPage, BuildError> {
    let parse_error = |message: String| BuildError::ParseError {
        path: path.to_string(),
        message,
    };

    let (mut doc, tops) = Document::parse_fragment(source).map_err(|e| parse_error(e.to_string()))?;
    let node = tops
        .first()
        .copied()
        .ok_or_else(|| parse_error("Fragment contains no element".to_string()))?;

    let result = registry.resolve(name).and_then(|(kind, options)| {
        let block = decorate(
            &mut doc,
            node,
            0,
            options,
            &StaticPlatform,
            Rc::new(TracingReporter),
        )?;
        Ok((kind, block))
    });
    let entry = BlockEntry::from_page_block(&PageBlock {
        name: name.to_string(),
        result,
    });
    if let Some(error) = &entry.error {
        return Err(BuildError::ConfigError(format!("{path}: {error}")));
    }

    Ok(EnhancedPage {
        html: doc.to_html(),
        blocks: vec![entry],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Jobs</title></head><body>
<div class="columns block" data-block-name="columns">
<div data-applied="45" data-capacity="60"><div><img src="/logo.png" alt="Acme"></div><div><h2>UX Designer</h2><a href="/jobs/ux">View</a></div></div>
<hr>
</div>
</body></html>"#;

    #[test]
    fn enhances_blocks_and_reports_items() {
        let page = enhance_page(PAGE, "jobs.html", &BlockRegistry::new()).unwrap();

        assert!(page.html.starts_with("<!DOCTYPE html>"));
        assert!(page.html.contains(r#"role="progressbar""#));
        assert!(page.html.contains(r#"aria-valuenow="75""#));
        assert!(page.html.contains("columns-2-cols"));

        let block = &page.blocks[0];
        assert_eq!(block.kind.as_deref(), Some("columns"));
        assert_eq!(block.enhanced(), 1);
        assert_eq!(block.failures(), 1);
    }

    #[test]
    fn fragments_take_an_explicit_block_name() {
        let page = enhance_fragment(
            r#"<div><div><div><img src="/a.jpg"></div><div><p><strong>Hi</strong></p></div></div></div>"#,
            "snippet.html",
            "hero",
            &BlockRegistry::new(),
        )
        .unwrap();

        assert!(page.html.contains(r#"role="banner""#));
        assert!(page.html.contains("/a-600w.jpg 600w"));

        let unknown = enhance_fragment("<div></div>", "x.html", "tabs", &BlockRegistry::new());
        assert!(matches!(unknown, Err(BuildError::ConfigError(_))));
    }
}
