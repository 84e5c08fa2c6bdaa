//! gilt.toml loading and option precedence.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use gilt_blocks::{BlockKind, OptionOverrides};
use serde::Deserialize;

/// Configuration file structure (gilt.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,

    /// `[blocks.<name>]` tables
    #[serde(default)]
    pub blocks: HashMap<String, OptionOverrides>,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
        }
    }
}

fn default_input() -> String {
    "pages".to_string()
}
fn default_output() -> String {
    "dist".to_string()
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

/// Layer command-line overrides over every configured block and every
/// block kind, so flags win over file values for all blocks.
pub fn with_cli_overrides(
    mut blocks: HashMap<String, OptionOverrides>,
    cli: &OptionOverrides,
) -> HashMap<String, OptionOverrides> {
    if *cli == OptionOverrides::default() {
        return blocks;
    }
    for kind in BlockKind::ALL {
        blocks.entry(kind.name().to_string()).or_default();
    }
    for overrides in blocks.values_mut() {
        *overrides = overrides.layered(cli);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use gilt_blocks::BlockRegistry;
    use tempfile::tempdir;

    #[test]
    fn missing_file_means_defaults() {
        let temp = tempdir().unwrap();

        let config = load_config(&temp.path().join("gilt.toml")).unwrap();

        assert_eq!(config.site.input, "pages");
        assert_eq!(config.site.output, "dist");
        assert!(config.blocks.is_empty());
    }

    #[test]
    fn parses_site_and_block_tables() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gilt.toml");
        fs::write(
            &path,
            r#"
[site]
input = "public"

[blocks.cards]
lazy_load_threshold = 3
cta_text = "Read more"

[blocks.quote]
embed_url = "https://example.com/quote"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.site.input, "public");
        assert_eq!(config.site.output, "dist");
        assert_eq!(config.blocks["cards"].lazy_load_threshold, Some(3));
        assert_eq!(
            config.blocks["quote"].embed_url.as_deref(),
            Some("https://example.com/quote")
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gilt.toml");
        fs::write(&path, "[blocks.cards]\nlazy_threshold = 3\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn flags_beat_file_beats_preset() {
        let mut file = HashMap::new();
        file.insert(
            "cards".to_string(),
            OptionOverrides {
                lazy_load_threshold: Some(3),
                cta_text: Some("From file".to_string()),
                ..Default::default()
            },
        );
        let cli = OptionOverrides {
            lazy_load_threshold: Some(1),
            ..Default::default()
        };

        let registry = BlockRegistry::with_overrides(with_cli_overrides(file, &cli));

        let (_, cards) = registry.resolve("cards").unwrap();
        assert_eq!(cards.lazy_load_threshold, 1);
        assert_eq!(cards.cta_text, "From file");

        let (_, hero) = registry.resolve("hero").unwrap();
        assert_eq!(hero.lazy_load_threshold, 1);
        assert_eq!(hero.block_role, "banner");
    }
}
