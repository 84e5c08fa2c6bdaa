//! Batch enhancement command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use gilt_blocks::OptionOverrides;
use gilt_static::{BuildConfig, PageBuilder};

use crate::config::{load_config, with_cli_overrides};

/// Run the build command.
pub async fn run(
    config_path: &Path,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    flags: OptionOverrides,
) -> Result<()> {
    tracing::info!("Enhancing pages...");

    let file_config = load_config(config_path)?;

    let config = BuildConfig {
        input_dir: input.unwrap_or_else(|| PathBuf::from(&file_config.site.input)),
        output_dir: output.unwrap_or_else(|| PathBuf::from(&file_config.site.output)),
        blocks: with_cli_overrides(file_config.blocks, &flags),
    };

    let result = PageBuilder::new(config).build().await?;

    tracing::info!(
        "Enhanced {} items in {} blocks across {} pages in {}ms",
        result.items,
        result.blocks,
        result.pages,
        result.duration_ms
    );
    if result.failures > 0 {
        tracing::warn!("{} items or blocks could not be enhanced", result.failures);
    }
    if result.copied > 0 {
        tracing::debug!("Copied {} other files", result.copied);
    }

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
