//! Single page enhancement command.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gilt_blocks::{BlockRegistry, OptionOverrides};
use gilt_static::{enhance_fragment, enhance_page, EnhancedPage};

use crate::config::{load_config, with_cli_overrides};

/// Run the enhance command.
pub async fn run(
    config_path: &Path,
    file: &Path,
    block: Option<String>,
    output: Option<PathBuf>,
    flags: OptionOverrides,
) -> Result<()> {
    let file_config = load_config(config_path)?;
    let registry = BlockRegistry::with_overrides(with_cli_overrides(file_config.blocks, &flags));

    let page = enhance_file(file, block.as_deref(), &registry)?;

    for entry in &page.blocks {
        match &entry.error {
            Some(error) => tracing::warn!("Block '{}' left undecorated: {}", entry.name, error),
            None => tracing::info!(
                "Block '{}': {} items enhanced, {} failed",
                entry.name,
                entry.enhanced(),
                entry.failures()
            ),
        }
    }

    match output {
        Some(path) => {
            fs::write(&path, &page.html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Output: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(page.html.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn enhance_file(file: &Path, block: Option<&str>, registry: &BlockRegistry) -> Result<EnhancedPage> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let path = file.display().to_string();

    let page = match block {
        Some(name) => enhance_fragment(&source, &path, name, registry)?,
        None => enhance_page(&source, &path, registry)?,
    };
    Ok(page)
}
