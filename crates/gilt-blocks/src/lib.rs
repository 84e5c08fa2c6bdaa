//! Progressive enhancement of authored content blocks.
//!
//! A block is a server-rendered container whose children are items (cards,
//! columns, slides). [`decorate`] turns one block into an accessible,
//! lazily-loaded, interactive component; the [`BlockRegistry`] finds the
//! blocks of a page and picks the preset for each.

pub mod annotate;
pub mod carousel;
pub mod config;
pub mod content;
pub mod host;
pub mod interact;
pub mod layout;
pub mod media;
pub mod normalize;
pub mod pipeline;
pub mod recording;
pub mod registry;
pub mod report;
pub mod reveal;

pub use carousel::{Carousel, CarouselError, CarouselView};
pub use config::{BlockOptions, ConfigError, ItemRole, OptionOverrides, PrimaryAction, RootMargin};
pub use host::{IntersectionDetector, IntervalTimer, Platform, StaticPlatform, TimerToken};
pub use interact::{Action, Activation, ClickSource, Key};
pub use normalize::{extract_regions, normalize, Item, Regions};
pub use pipeline::{decorate, DecorateError, DecoratedBlock, EnhancementState};
pub use recording::RecordingPlatform;
pub use registry::{BlockKind, BlockRegistry, PageBlock, RegistryError};
pub use report::{
    BlockReport, ItemError, ItemOutcome, ItemReport, NoopReporter, Reporter, Skipped,
    TracingReporter,
};
pub use reveal::IntersectionEntry;
