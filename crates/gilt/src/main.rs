//! gilt CLI - progressive enhancement for server-rendered content blocks.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gilt_blocks::OptionOverrides;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "gilt")]
#[command(about = "Progressive enhancement for server-rendered content blocks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to gilt.toml config file
    #[arg(short, long, default_value = "gilt.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter gilt.toml and sample page
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Enhance every page of a directory
    Build {
        /// Rendered pages directory (defaults to config or "pages")
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: BlockFlags,
    },

    /// Enhance a single page or block fragment
    Enhance {
        /// HTML file to enhance
        file: PathBuf,

        /// Treat the file as a bare fragment of this block kind
        #[arg(short, long)]
        block: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: BlockFlags,
    },
}

/// Options applied to every block, over gilt.toml values.
#[derive(Args, Debug, Default)]
struct BlockFlags {
    /// Items at or past this index load lazily
    #[arg(long)]
    lazy_load_threshold: Option<usize>,

    /// Viewport margin used for reveal detection, e.g. "50px"
    #[arg(long)]
    root_margin: Option<String>,

    /// Call-to-action button text
    #[arg(long)]
    cta_text: Option<String>,

    /// Carousel autoplay interval, 0 disables
    #[arg(long)]
    autoplay_interval_ms: Option<u64>,
}

impl From<BlockFlags> for OptionOverrides {
    fn from(flags: BlockFlags) -> Self {
        OptionOverrides {
            lazy_load_threshold: flags.lazy_load_threshold,
            observer_root_margin: flags.root_margin,
            cta_text: flags.cta_text,
            autoplay_interval_ms: flags.autoplay_interval_ms,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stdout carries enhanced HTML
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&std::env::current_dir()?, yes).await?;
        }
        Commands::Build {
            input,
            output,
            options,
        } => {
            commands::build::run(&cli.config, input, output, options.into()).await?;
        }
        Commands::Enhance {
            file,
            block,
            output,
            options,
        } => {
            commands::enhance::run(&cli.config, &file, block, output, options.into()).await?;
        }
    }

    Ok(())
}
