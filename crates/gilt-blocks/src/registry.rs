//! Block kinds, their presets and page-level discovery.
//!
//! Authored blocks are elements with the `block` class. Their name comes from
//! `data-block-name`, falling back to the first other class, and selects a
//! [`BlockKind`]. Options for a block are the kind's preset with any
//! configured overrides layered on top.

use std::collections::HashMap;
use std::rc::Rc;

use gilt_dom::{Document, NodeId};

use crate::config::{BlockOptions, ConfigError, ItemRole, OptionOverrides, PrimaryAction};
use crate::host::Platform;
use crate::pipeline::{decorate, DecorateError, DecoratedBlock};
use crate::report::Reporter;

/// Errors that can occur when resolving or decorating a named block.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Invalid options for block '{name}': {source}")]
    Config { name: String, source: ConfigError },

    #[error(transparent)]
    Decorate(#[from] DecorateError),
}

/// The decorator families one pipeline covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Cards,
    Columns,
    Hero,
    Carousel,
    Embed,
}

impl BlockKind {
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Cards,
        BlockKind::Columns,
        BlockKind::Hero,
        BlockKind::Carousel,
        BlockKind::Embed,
    ];

    /// Resolve a block name, including legacy aliases (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "cards" | "black-img-cards" => Some(BlockKind::Cards),
            "columns" => Some(BlockKind::Columns),
            "hero" => Some(BlockKind::Hero),
            "carousel" => Some(BlockKind::Carousel),
            "embed" | "quote" => Some(BlockKind::Embed),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Cards => "cards",
            BlockKind::Columns => "columns",
            BlockKind::Hero => "hero",
            BlockKind::Carousel => "carousel",
            BlockKind::Embed => "embed",
        }
    }

    /// Default options for this kind.
    pub fn preset(&self) -> BlockOptions {
        let base = BlockOptions::default();
        match self {
            BlockKind::Cards => base,
            BlockKind::Columns => BlockOptions {
                class_prefix: "columns".to_string(),
                block_label: "Columns".to_string(),
                item_noun: "Column".to_string(),
                primary_action: PrimaryAction::Link,
                title_level: 3,
                overlay: false,
                progress: true,
                layout_breakpoints: vec![600, 900, 1200],
                ..base
            },
            BlockKind::Hero => BlockOptions {
                class_prefix: "hero".to_string(),
                block_role: "banner".to_string(),
                block_label: "Hero Section".to_string(),
                item_noun: "Section".to_string(),
                lazy_load_threshold: 1,
                primary_action: PrimaryAction::None,
                title_level: 1,
                overlay: false,
                fallback_alt: Some("Hero background image".to_string()),
                responsive_widths: vec![600, 900, 1200],
                link_fallback_label: Some("Hero section link".to_string()),
                ..base
            },
            BlockKind::Carousel => BlockOptions {
                class_prefix: "carousel".to_string(),
                block_label: "Carousel".to_string(),
                item_role: ItemRole::Group,
                item_noun: "Slide".to_string(),
                lazy_load_threshold: 1,
                primary_action: PrimaryAction::None,
                overlay: false,
                carousel: true,
                autoplay_interval_ms: 5000,
                ..base
            },
            BlockKind::Embed => BlockOptions {
                class_prefix: "embed".to_string(),
                block_label: "Embedded content".to_string(),
                item_noun: "Item".to_string(),
                primary_action: PrimaryAction::None,
                overlay: false,
                embed: true,
                ..base
            },
        }
    }
}

/// Option overrides by block name, applied over each kind's preset.
#[derive(Debug, Default, Clone)]
pub struct BlockRegistry {
    /// Overrides keyed by lowercase block name or alias
    overrides: HashMap<String, OptionOverrides>,
}

impl BlockRegistry {
    /// Create a registry with presets only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from `[blocks.<name>]` tables.
    pub fn with_overrides(overrides: HashMap<String, OptionOverrides>) -> Self {
        let mut registry = Self::new();
        for (name, o) in overrides {
            registry.set_overrides(&name, o);
        }
        registry
    }

    pub fn set_overrides(&mut self, name: &str, overrides: OptionOverrides) {
        self.overrides.insert(name.trim().to_lowercase(), overrides);
    }

    /// Look up the overrides registered for a name.
    pub fn overrides(&self, name: &str) -> Option<&OptionOverrides> {
        self.overrides.get(&name.trim().to_lowercase())
    }

    /// Resolve a block name to its kind and fully merged options.
    ///
    /// Overrides for the canonical kind name apply first, overrides for the
    /// alias actually used apply on top.
    pub fn resolve(&self, name: &str) -> Result<(BlockKind, BlockOptions), RegistryError> {
        let kind =
            BlockKind::from_name(name).ok_or_else(|| RegistryError::UnknownBlock(name.to_string()))?;

        let mut layered = self.overrides(kind.name()).cloned().unwrap_or_default();
        if !name.trim().eq_ignore_ascii_case(kind.name()) {
            if let Some(alias) = self.overrides(name) {
                layered = layered.layered(alias);
            }
        }

        let options = kind
            .preset()
            .merged(&layered)
            .map_err(|source| RegistryError::Config {
                name: name.to_string(),
                source,
            })?;
        Ok((kind, options))
    }

    /// Name of an authored block element.
    pub fn block_name(doc: &Document, node: NodeId) -> Option<String> {
        let el = doc.element(node).ok()?;
        if let Some(name) = el.attr("data-block-name") {
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
        el.classes().find(|c| *c != "block").map(str::to_string)
    }

    /// All authored block elements, in document order.
    ///
    /// A block nested inside another block is decorated as part of its
    /// outer block's items and is not listed separately.
    pub fn discover(doc: &Document) -> Vec<NodeId> {
        let root = doc.root();
        let blocks = doc.find_all(root, |el| el.has_class("block"));
        blocks
            .iter()
            .copied()
            .filter(|b| {
                !blocks
                    .iter()
                    .any(|outer| outer != b && doc.contains(*outer, *b))
            })
            .collect()
    }

    /// Decorate every discovered block of a document.
    ///
    /// Each block is attempted independently; a block that fails leaves the
    /// rest of the page untouched by its failure.
    pub fn decorate_document(
        &self,
        doc: &mut Document,
        platform: &dyn Platform,
        reporter: Rc<dyn Reporter>,
    ) -> Vec<PageBlock> {
        let mut out = Vec::new();
        for (ordinal, node) in Self::discover(doc).into_iter().enumerate() {
            let name = Self::block_name(doc, node).unwrap_or_default();
            let result = self.resolve(&name).and_then(|(kind, options)| {
                let block = decorate(doc, node, ordinal, options, platform, Rc::clone(&reporter))?;
                Ok((kind, block))
            });
            if let Err(e) = &result {
                tracing::warn!(block = %name, error = %e, "Block left undecorated");
            }
            out.push(PageBlock { name, result });
        }
        out
    }
}

/// One discovered block of a page and what became of it.
#[derive(Debug)]
pub struct PageBlock {
    pub name: String,
    pub result: Result<(BlockKind, DecoratedBlock), RegistryError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingPlatform;
    use crate::report::NoopReporter;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_names_and_aliases() {
        assert_eq!(BlockKind::from_name("Cards"), Some(BlockKind::Cards));
        assert_eq!(BlockKind::from_name("black-img-cards"), Some(BlockKind::Cards));
        assert_eq!(BlockKind::from_name("quote"), Some(BlockKind::Embed));
        assert_eq!(BlockKind::from_name("tabs"), None);
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn presets_differ_per_kind() {
        let hero = BlockKind::Hero.preset();
        assert_eq!(hero.block_role, "banner");
        assert_eq!(hero.fallback_alt.as_deref(), Some("Hero background image"));

        let columns = BlockKind::Columns.preset();
        assert_eq!(columns.primary_action, PrimaryAction::Link);
        assert_eq!(columns.layout_breakpoints, vec![600, 900, 1200]);

        assert!(BlockKind::Carousel.preset().carousel);
        assert!(BlockKind::Embed.preset().embed);
    }

    #[test]
    fn overrides_layer_over_presets() {
        let mut registry = BlockRegistry::new();
        registry.set_overrides(
            "cards",
            OptionOverrides {
                lazy_load_threshold: Some(4),
                cta_text: Some("Read more".to_string()),
                ..Default::default()
            },
        );
        registry.set_overrides(
            "black-img-cards",
            OptionOverrides {
                cta_text: Some("Discover".to_string()),
                ..Default::default()
            },
        );

        let (_, cards) = registry.resolve("cards").unwrap();
        assert_eq!(cards.cta_text, "Read more");

        let (kind, alias) = registry.resolve("black-img-cards").unwrap();
        assert_eq!(kind, BlockKind::Cards);
        assert_eq!(alias.lazy_load_threshold, 4);
        assert_eq!(alias.cta_text, "Discover");
    }

    #[test]
    fn invalid_overrides_name_the_block() {
        let mut registry = BlockRegistry::new();
        registry.set_overrides(
            "hero",
            OptionOverrides {
                title_level: Some(9),
                ..Default::default()
            },
        );

        let err = registry.resolve("hero").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid options for block 'hero': Title level must be between 1 and 6, got 9"
        );
        assert!(matches!(
            registry.resolve("accordion"),
            Err(RegistryError::UnknownBlock(_))
        ));
    }

    #[test]
    fn discovers_and_decorates_page_blocks() {
        let mut doc = Document::parse(
            r#"<!DOCTYPE html><html><body><main>
<div class="cards-wrapper"><div class="cards block" data-block-name="cards"><div><div><img src="/a.png"></div><div><p><strong>A</strong></p></div></div></div></div>
<div class="hero block"><div><div><img src="/h.jpg"></div><div><h1>Welcome</h1><a href="/start"></a></div></div></div>
<div class="tabs block"><div><div>x</div></div></div>
</main></body></html>"#,
        )
        .unwrap();
        let platform = RecordingPlatform::new();

        let blocks = BlockRegistry::new().decorate_document(&mut doc, &platform, Rc::new(NoopReporter));

        let names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["cards", "hero", "tabs"]);
        assert!(blocks[0].result.is_ok());
        assert!(matches!(blocks[2].result, Err(RegistryError::UnknownBlock(_))));

        let (kind, hero) = blocks[1].result.as_ref().unwrap();
        assert_eq!(*kind, BlockKind::Hero);
        assert_eq!(hero.id(), "hero-2");
        let img = doc.find_tag(hero.node(), "img").unwrap();
        assert_eq!(
            doc.attr(img, "srcset"),
            Some("/h-600w.jpg 600w, /h-900w.jpg 900w, /h-1200w.jpg 1200w")
        );
        let link = doc.find_tag(hero.node(), "a").unwrap();
        assert_eq!(doc.attr(link, "aria-label"), Some("Hero section link"));
        assert_eq!(doc.attr(hero.node(), "role"), Some("banner"));
    }
}
