//! Create a starter project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command in `root`.
pub async fn run(root: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing gilt...");

    let pages_dir = root.join("pages");

    if pages_dir.exists() {
        if !yes {
            tracing::warn!("pages/ directory already exists. Use --yes to overwrite.");
            return Ok(());
        }
    } else {
        fs::create_dir_all(&pages_dir).context("Failed to create pages directory")?;
    }

    let config_path = root.join("gilt.toml");
    if !config_path.exists() || yes {
        fs::write(&config_path, DEFAULT_CONFIG).context("Failed to write gilt.toml")?;
        tracing::info!("Created gilt.toml");
    }

    let index_path = pages_dir.join("index.html");
    if !index_path.exists() || yes {
        fs::write(&index_path, DEFAULT_INDEX).context("Failed to write index.html")?;
        tracing::info!("Created pages/index.html");
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'gilt build' to enhance the pages into dist/.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# gilt configuration

[site]
# Server-rendered pages to enhance
input = "pages"

# Output directory for enhanced pages
output = "dist"

# Per-block option overrides, keyed by block name.
[blocks.cards]
lazy_load_threshold = 2
cta_text = "Learn more"

[blocks.columns]
layout_breakpoints = [600, 900, 1200]
"#;

const DEFAULT_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Open Roles</title>
</head>
<body>
<main>
  <div class="cards block" data-block-name="cards">
    <div>
      <div><img src="/media/remote.jpg" alt="Remote team"></div>
      <div><p><strong>Remote first</strong></p><p>Work from wherever you do your best work.</p></div>
    </div>
    <div>
      <div><img src="/media/growth.jpg"></div>
      <div><p><strong>Room to grow</strong></p><p>A yearly learning budget for every role.</p></div>
    </div>
    <div>
      <div><img src="/media/team.jpg"></div>
      <div><p><strong>Small teams</strong></p><p>Ship with five people, not fifty.</p></div>
    </div>
  </div>

  <div class="columns block" data-block-name="columns">
    <div data-applied="45" data-capacity="60">
      <div><img src="/media/design.png" alt="Design"></div>
      <div><h3>Product Designer</h3><p>Shape the tools our customers use every day.</p><a href="/jobs/product-designer">View role</a></div>
    </div>
    <div data-applied="12" data-capacity="40">
      <div><img src="/media/backend.png" alt="Backend"></div>
      <div><h3>Backend Engineer</h3><p>Own the services behind every page.</p><a href="/jobs/backend-engineer">View role</a></div>
    </div>
    <div data-applied="30" data-capacity="30">
      <div><img src="/media/support.png" alt="Support"></div>
      <div><h3>Support Lead</h3><p>Help customers get unstuck.</p><a href="/jobs/support-lead">View role</a></div>
    </div>
  </div>
</main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use gilt_blocks::BlockRegistry;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_config_and_sample_page() {
        let temp = tempdir().unwrap();

        run(temp.path(), false).await.unwrap();

        let config = crate::config::load_config(&temp.path().join("gilt.toml")).unwrap();
        assert_eq!(config.site.input, "pages");
        assert!(config.blocks.contains_key("columns"));

        let source = fs::read_to_string(temp.path().join("pages/index.html")).unwrap();
        let page =
            gilt_static::enhance_page(&source, "index.html", &BlockRegistry::with_overrides(config.blocks))
                .unwrap();
        assert_eq!(page.blocks.len(), 2);
        assert!(page.blocks.iter().all(|b| b.failures() == 0));
    }

    #[tokio::test]
    async fn keeps_existing_pages_without_yes() {
        let temp = tempdir().unwrap();
        let pages = temp.path().join("pages");
        fs::create_dir_all(&pages).unwrap();
        fs::write(pages.join("index.html"), "mine").unwrap();

        run(temp.path(), false).await.unwrap();
        assert_eq!(fs::read_to_string(pages.join("index.html")).unwrap(), "mine");
        assert!(!temp.path().join("gilt.toml").exists());

        run(temp.path(), true).await.unwrap();
        assert!(fs::read_to_string(pages.join("index.html")).unwrap().contains("Open Roles"));
    }
}
