//! Batch page enhancer.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use gilt_blocks::{BlockRegistry, OptionOverrides};

use crate::page::{enhance_page, BlockEntry};

/// Name of the manifest written next to the enhanced pages.
pub const MANIFEST_FILE: &str = "blocks-manifest.json";

/// Configuration for enhancing a directory of pages.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Rendered pages directory
    pub input_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Option overrides by block name
    pub blocks: HashMap<String, OptionOverrides>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("pages"),
            output_dir: PathBuf::from("dist"),
            blocks: HashMap::new(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages enhanced
    pub pages: usize,

    /// Number of blocks found across all pages
    pub blocks: usize,

    /// Number of items enhanced without error
    pub items: usize,

    /// Failed items and undecorated blocks
    pub failures: usize,

    /// Number of non-HTML files copied unchanged
    pub copied: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read input: {0}")]
    ReadError(String),

    #[error("Failed to parse HTML: {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid block configuration: {0}")]
    ConfigError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// A file found under the input directory.
#[derive(Debug)]
struct SourceFile {
    source_path: PathBuf,
    relative_path: PathBuf,
    output_path: PathBuf,
}

impl SourceFile {
    fn is_html(&self) -> bool {
        matches!(
            self.source_path.extension().and_then(|e| e.to_str()),
            Some("html" | "htm")
        )
    }
}

#[derive(Debug, Serialize)]
struct PageManifest {
    path: String,
    blocks: Vec<BlockEntry>,
}

/// Enhances every HTML page of a directory tree.
pub struct PageBuilder {
    config: BuildConfig,
    registry: BlockRegistry,
}

impl PageBuilder {
    /// Create a new page builder.
    pub fn new(config: BuildConfig) -> Self {
        let registry = BlockRegistry::with_overrides(config.blocks.clone());
        Self { config, registry }
    }

    /// Enhance the pages and write the manifest.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        self.validate_overrides()?;

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let files = self.discover_files()?;
        let (pages, assets): (Vec<_>, Vec<_>) = files.into_iter().partition(|f| f.is_html());

        tracing::info!("Enhancing {} pages from {}", pages.len(), self.config.input_dir.display());

        let results: Vec<Result<PageManifest, BuildError>> =
            pages.par_iter().map(|page| self.build_page(page)).collect();

        let mut manifest = Vec::with_capacity(results.len());
        for result in results {
            manifest.push(result?);
        }

        for asset in &assets {
            self.copy_asset(asset)?;
        }

        self.write_manifest(&manifest)?;

        let blocks: Vec<&BlockEntry> = manifest.iter().flat_map(|p| &p.blocks).collect();
        let duration = start.elapsed();

        Ok(BuildResult {
            pages: manifest.len(),
            blocks: blocks.len(),
            items: blocks.iter().map(|b| b.enhanced()).sum(),
            failures: blocks.iter().map(|b| b.failures()).sum(),
            copied: assets.len(),
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Fail fast on overrides that can never produce valid options.
    fn validate_overrides(&self) -> Result<(), BuildError> {
        let mut names: Vec<&String> = self.config.blocks.keys().collect();
        names.sort();
        for name in names {
            self.registry
                .resolve(name)
                .map_err(|e| BuildError::ConfigError(e.to_string()))?;
        }
        Ok(())
    }

    /// Discover every file under the input directory, sorted by path.
    fn discover_files(&self) -> Result<Vec<SourceFile>, BuildError> {
        if !self.config.input_dir.exists() {
            return Err(BuildError::ReadError(format!(
                "Input directory not found: {}",
                self.config.input_dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.config.input_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative_path = path
                .strip_prefix(&self.config.input_dir)
                .unwrap_or(path)
                .to_path_buf();
            let output_path = self.config.output_dir.join(&relative_path);

            files.push(SourceFile {
                source_path: path.to_path_buf(),
                relative_path,
                output_path,
            });
        }

        Ok(files)
    }

    /// Enhance a single page.
    fn build_page(&self, page: &SourceFile) -> Result<PageManifest, BuildError> {
        let source = fs::read_to_string(&page.source_path)
            .map_err(|e| BuildError::ReadError(format!("{}: {}", page.source_path.display(), e)))?;

        let display_path = url_path(&page.relative_path);
        let enhanced = enhance_page(&source, &display_path, &self.registry)?;

        for block in &enhanced.blocks {
            if let Some(error) = &block.error {
                tracing::warn!("Block '{}' in {} left undecorated: {}", block.name, display_path, error);
            }
        }
        tracing::debug!("Enhanced {} ({} blocks)", display_path, enhanced.blocks.len());

        write_file(&page.output_path, enhanced.html.as_bytes())?;

        Ok(PageManifest {
            path: display_path,
            blocks: enhanced.blocks,
        })
    }

    fn copy_asset(&self, asset: &SourceFile) -> Result<(), BuildError> {
        let bytes = fs::read(&asset.source_path)
            .map_err(|e| BuildError::ReadError(format!("{}: {}", asset.source_path.display(), e)))?;
        write_file(&asset.output_path, &bytes)
    }

    fn write_manifest(&self, pages: &[PageManifest]) -> Result<(), BuildError> {
        let json = serde_json::to_string_pretty(&serde_json::json!({ "pages": pages }))
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        fs::write(self.config.output_dir.join(MANIFEST_FILE), json)
            .map_err(|e| BuildError::WriteError(e.to_string()))
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
    }
    fs::write(path, contents).map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))
}

/// Forward-slash path used in logs and the manifest.
fn url_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CARDS_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div class="cards block" data-block-name="cards">
  <div><div><img src="/a.png"></div><div><p><strong>Fast</strong></p><p>Builds in seconds</p></div></div>
  <div><div><img src="/b.png"></div><div><p><strong>Safe</strong></p></div></div>
  <div><div><img src="/c.png"></div><div><p><strong>Small</strong></p></div></div>
</div>
</body></html>"#;

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let temp = tempdir().unwrap();
        let input = temp.path().join("pages");
        let out = temp.path().join("dist");
        fs::create_dir_all(input.join("features")).unwrap();
        (temp, input, out)
    }

    #[tokio::test]
    async fn enhances_pages_and_copies_assets() {
        let (_temp, input, out) = setup();
        fs::write(input.join("index.html"), CARDS_PAGE).unwrap();
        fs::write(input.join("features/more.html"), CARDS_PAGE).unwrap();
        fs::write(input.join("style.css"), "body { margin: 0 }").unwrap();

        let builder = PageBuilder::new(BuildConfig {
            input_dir: input,
            output_dir: out.clone(),
            ..Default::default()
        });
        let result = builder.build().await.unwrap();

        assert_eq!(result.pages, 2);
        assert_eq!(result.blocks, 2);
        assert_eq!(result.items, 6);
        assert_eq!(result.failures, 0);
        assert_eq!(result.copied, 1);

        let html = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(html.contains(r#"aria-label="Card 3 of 3""#));
        assert!(html.contains(r#"loading="lazy""#));
        assert!(out.join("features/more.html").exists());
        assert!(out.join("style.css").exists());
    }

    #[tokio::test]
    async fn writes_block_manifest() {
        let (_temp, input, out) = setup();
        fs::write(input.join("index.html"), CARDS_PAGE).unwrap();

        let mut blocks = HashMap::new();
        blocks.insert(
            "cards".to_string(),
            OptionOverrides {
                cta_text: Some("Read more".to_string()),
                ..Default::default()
            },
        );
        let builder = PageBuilder::new(BuildConfig {
            input_dir: input,
            output_dir: out.clone(),
            blocks,
        });
        builder.build().await.unwrap();

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(MANIFEST_FILE)).unwrap()).unwrap();
        let block = &manifest["pages"][0]["blocks"][0];
        assert_eq!(manifest["pages"][0]["path"], "index.html");
        assert_eq!(block["kind"], "cards");
        assert_eq!(block["id"], "cards-1");
        assert_eq!(block["items"].as_array().map(Vec::len), Some(3));

        let html = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(html.contains("Read more about Fast"));
    }

    #[tokio::test]
    async fn rejects_invalid_overrides_before_writing() {
        let (_temp, input, out) = setup();
        fs::write(input.join("index.html"), CARDS_PAGE).unwrap();

        let mut blocks = HashMap::new();
        blocks.insert(
            "cards".to_string(),
            OptionOverrides {
                observer_root_margin: Some("soon".to_string()),
                ..Default::default()
            },
        );
        let builder = PageBuilder::new(BuildConfig {
            input_dir: input,
            output_dir: out.clone(),
            blocks,
        });

        let err = builder.build().await.unwrap_err();
        assert!(matches!(err, BuildError::ConfigError(_)));
        assert!(!out.join("index.html").exists());
    }

    #[tokio::test]
    async fn missing_input_is_an_error() {
        let temp = tempdir().unwrap();
        let builder = PageBuilder::new(BuildConfig {
            input_dir: temp.path().join("nope"),
            output_dir: temp.path().join("dist"),
            ..Default::default()
        });

        assert!(matches!(
            builder.build().await,
            Err(BuildError::ReadError(_))
        ));
    }
}
