//! Block options: defaults, overrides and validation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Errors raised while merging or validating options.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid observer root margin '{0}': expected 1-4 lengths in px or %")]
    InvalidRootMargin(String),

    #[error("Layout breakpoints must be strictly ascending: {0:?}")]
    InvalidBreakpoints(Vec<u32>),

    #[error("Title level must be between 1 and 6, got {0}")]
    InvalidTitleLevel(u8),
}

/// Role given to each item of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemRole {
    #[default]
    Article,
    Listitem,
    /// Carousel slides: `role="group"` with a slide role description
    Group,
}

impl ItemRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemRole::Article => "article",
            ItemRole::Listitem => "listitem",
            ItemRole::Group => "group",
        }
    }
}

/// The single logical action an item exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryAction {
    /// A generated call-to-action button
    Cta,
    /// Follow the first link inside the item
    Link,
    /// Expand or collapse the item's content
    Toggle,
    #[default]
    None,
}

/// Intersection margin around the viewport, in CSS `rootMargin` syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMargin(String);

static LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:\d+|\d*\.\d+)(?:px|%)$|^0$").expect("Invalid length regex")
});

impl RootMargin {
    /// Parse and validate a margin such as `50px` or `10px 0px`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        if parts.is_empty() || parts.len() > 4 || !parts.iter().all(|p| LENGTH.is_match(p)) {
            return Err(ConfigError::InvalidRootMargin(raw.to_string()));
        }
        Ok(Self(parts.join(" ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self("50px".to_string())
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully merged options for one block. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOptions {
    /// Prefix for every generated class (`cards` -> `cards-item`)
    pub class_prefix: String,

    /// ARIA role of the block container
    pub block_role: String,

    /// Accessible label of the block container
    pub block_label: String,

    /// Role of each item
    pub item_role: ItemRole,

    /// Noun used in index labels ("Card 3 of 7")
    pub item_noun: String,

    /// Items with an index below this load eagerly
    pub lazy_load_threshold: usize,

    /// Margin used to pre-trigger reveal before viewport entry
    pub observer_root_margin: RootMargin,

    /// Label of the generated call-to-action / toggle control
    pub cta_text: String,

    pub primary_action: PrimaryAction,

    /// Heading level for promoted titles
    pub title_level: u8,

    /// Add an overlay element over item images
    pub overlay: bool,

    /// Alt text used when an image has none and the item has no title
    pub fallback_alt: Option<String>,

    /// Widths used to derive a `srcset` when the author supplied none
    pub responsive_widths: Vec<u32>,

    /// Container widths at which the column count steps up
    pub layout_breakpoints: Vec<u32>,

    /// Render a progress indicator from `data-applied` / `data-capacity`
    pub progress: bool,

    /// Turn the block into a carousel of its items
    pub carousel: bool,

    /// Auto-advance period for carousels, 0 disables autoplay
    pub autoplay_interval_ms: u64,

    /// Embed an iframe into the block
    pub embed: bool,

    /// Embed source used when the block has no `data-embed-src`
    pub embed_url: Option<String>,

    /// Accessible name for links that have none
    pub link_fallback_label: Option<String>,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            class_prefix: "cards".to_string(),
            block_role: "region".to_string(),
            block_label: "Feature Cards".to_string(),
            item_role: ItemRole::Article,
            item_noun: "Card".to_string(),
            lazy_load_threshold: 2,
            observer_root_margin: RootMargin::default(),
            cta_text: "Learn more".to_string(),
            primary_action: PrimaryAction::Cta,
            title_level: 2,
            overlay: true,
            fallback_alt: None,
            responsive_widths: Vec::new(),
            layout_breakpoints: Vec::new(),
            progress: false,
            carousel: false,
            autoplay_interval_ms: 0,
            embed: false,
            embed_url: None,
            link_fallback_label: None,
        }
    }
}

impl BlockOptions {
    /// Build a generated class name from the block prefix.
    pub fn class(&self, part: &str) -> String {
        format!("{}-{}", self.class_prefix, part)
    }

    /// Apply overrides on top of these options and validate the result.
    pub fn merged(mut self, overrides: &OptionOverrides) -> Result<Self, ConfigError> {
        let o = overrides.clone();

        if let Some(v) = o.class_prefix {
            self.class_prefix = v;
        }
        if let Some(v) = o.block_role {
            self.block_role = v;
        }
        if let Some(v) = o.block_label {
            self.block_label = v;
        }
        if let Some(v) = o.item_role {
            self.item_role = v;
        }
        if let Some(v) = o.item_noun {
            self.item_noun = v;
        }
        if let Some(v) = o.lazy_load_threshold {
            self.lazy_load_threshold = v;
        }
        if let Some(v) = o.observer_root_margin {
            self.observer_root_margin = RootMargin::parse(&v)?;
        }
        if let Some(v) = o.cta_text {
            self.cta_text = v;
        }
        if let Some(v) = o.primary_action {
            self.primary_action = v;
        }
        if let Some(v) = o.title_level {
            self.title_level = v;
        }
        if let Some(v) = o.overlay {
            self.overlay = v;
        }
        if o.fallback_alt.is_some() {
            self.fallback_alt = o.fallback_alt;
        }
        if let Some(v) = o.responsive_widths {
            self.responsive_widths = v;
        }
        if let Some(v) = o.layout_breakpoints {
            self.layout_breakpoints = v;
        }
        if let Some(v) = o.progress {
            self.progress = v;
        }
        if let Some(v) = o.carousel {
            self.carousel = v;
        }
        if let Some(v) = o.autoplay_interval_ms {
            self.autoplay_interval_ms = v;
        }
        if let Some(v) = o.embed {
            self.embed = v;
        }
        if o.embed_url.is_some() {
            self.embed_url = o.embed_url;
        }
        if o.link_fallback_label.is_some() {
            self.link_fallback_label = o.link_fallback_label;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=6).contains(&self.title_level) {
            return Err(ConfigError::InvalidTitleLevel(self.title_level));
        }
        if self.layout_breakpoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::InvalidBreakpoints(
                self.layout_breakpoints.clone(),
            ));
        }
        Ok(())
    }
}

/// Caller-supplied overrides, typically one `[blocks.<name>]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionOverrides {
    pub class_prefix: Option<String>,
    pub block_role: Option<String>,
    pub block_label: Option<String>,
    pub item_role: Option<ItemRole>,
    pub item_noun: Option<String>,
    pub lazy_load_threshold: Option<usize>,
    pub observer_root_margin: Option<String>,
    pub cta_text: Option<String>,
    pub primary_action: Option<PrimaryAction>,
    pub title_level: Option<u8>,
    pub overlay: Option<bool>,
    pub fallback_alt: Option<String>,
    pub responsive_widths: Option<Vec<u32>>,
    pub layout_breakpoints: Option<Vec<u32>>,
    pub progress: Option<bool>,
    pub carousel: Option<bool>,
    pub autoplay_interval_ms: Option<u64>,
    pub embed: Option<bool>,
    pub embed_url: Option<String>,
    pub link_fallback_label: Option<String>,
}

impl OptionOverrides {
    /// Layer `top` over `self`; fields set in `top` win.
    pub fn layered(&self, top: &OptionOverrides) -> OptionOverrides {
        let top = top.clone();
        let base = self.clone();
        OptionOverrides {
            class_prefix: top.class_prefix.or(base.class_prefix),
            block_role: top.block_role.or(base.block_role),
            block_label: top.block_label.or(base.block_label),
            item_role: top.item_role.or(base.item_role),
            item_noun: top.item_noun.or(base.item_noun),
            lazy_load_threshold: top.lazy_load_threshold.or(base.lazy_load_threshold),
            observer_root_margin: top.observer_root_margin.or(base.observer_root_margin),
            cta_text: top.cta_text.or(base.cta_text),
            primary_action: top.primary_action.or(base.primary_action),
            title_level: top.title_level.or(base.title_level),
            overlay: top.overlay.or(base.overlay),
            fallback_alt: top.fallback_alt.or(base.fallback_alt),
            responsive_widths: top.responsive_widths.or(base.responsive_widths),
            layout_breakpoints: top.layout_breakpoints.or(base.layout_breakpoints),
            progress: top.progress.or(base.progress),
            carousel: top.carousel.or(base.carousel),
            autoplay_interval_ms: top.autoplay_interval_ms.or(base.autoplay_interval_ms),
            embed: top.embed.or(base.embed),
            embed_url: top.embed_url.or(base.embed_url),
            link_fallback_label: top.link_fallback_label.or(base.link_fallback_label),
        }
    }
}
