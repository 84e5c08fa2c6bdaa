//! Batch enhancement of rendered HTML pages.
//!
//! Walks a directory of server-rendered pages, decorates every authored block
//! with the build-time platform and writes the enhanced pages plus a block
//! manifest.

pub mod builder;
pub mod page;

pub use builder::{BuildConfig, BuildError, BuildResult, PageBuilder, MANIFEST_FILE};
pub use page::{enhance_fragment, enhance_page, BlockEntry, EnhancedPage, ItemEntry};
