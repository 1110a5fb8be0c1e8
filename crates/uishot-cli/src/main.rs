//! uishot CLI - capture visible buttons and links from web pages
//!
//! Usage:
//!   uishot --url https://example.com                 All categories
//!   uishot --url button,link:https://example.com     Only buttons and text links
//!   uishot --url a.test --url b.test --manifest out.json
//!   uishot --write-config                            Write .uishot/config.toml

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uishot_browser::BrowserSession;
use uishot_core::config::DEFAULT_CONFIG_PATH;
use uishot_core::{TargetSpec, UishotConfig};
use uishot_harvest::{BatchOrchestrator, ImageDirectorySink};

#[derive(Parser, Debug)]
#[command(name = "uishot")]
#[command(author, version, about = "Capture visible buttons and links in normal and hover state")]
struct Cli {
    /// Target URL, optionally prefixed with a category filter
    /// (e.g. "button,link:https://example.com"). Repeatable.
    #[arg(
        long = "url",
        value_name = "TARGET",
        value_parser = parse_target,
        required_unless_present = "write_config"
    )]
    urls: Vec<TargetSpec>,

    /// Configuration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Output directory (overrides output.dir)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Skip hover captures for every category
    #[arg(long)]
    no_hover: bool,

    /// Write the result set as JSON
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Write the default configuration to --config and exit
    #[arg(long)]
    write_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_target(s: &str) -> std::result::Result<TargetSpec, String> {
    TargetSpec::parse(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration
    fn apply(&self, config: &mut UishotConfig) {
        if let Some(ref dir) = self.out_dir {
            config.output.dir = dir.clone();
        }
        if self.headful {
            config.browser.headless = false;
        }
        if self.no_hover {
            config.capture.hover_categories.clear();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if cli.write_config {
        UishotConfig::write_default(&cli.config)
            .with_context(|| format!("Failed to write {}", cli.config.display()))?;
        println!("Wrote default configuration to {}", cli.config.display());
        return Ok(());
    }

    let mut config = UishotConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    cli.apply(&mut config);

    let sink = ImageDirectorySink::new(&config.output);
    sink.prepare().await.context("Failed to prepare output directory")?;
    info!("Writing captures to {}", sink.base_dir().display());

    let browser = BrowserSession::launch_with_config(config.browser.clone())
        .await
        .context("Failed to launch browser")?;

    let orchestrator = BatchOrchestrator::new(browser, sink, &config.capture);
    let results = orchestrator.run(&cli.urls).await;
    orchestrator.into_source().close().await?;

    if let Some(ref path) = cli.manifest {
        results
            .write_manifest(path)
            .await
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        info!("Manifest written to {}", path.display());
    }

    for outcome in results.outcomes.iter().filter(|o| !o.is_failed()) {
        info!("{}: {}", outcome.url, outcome.summary_line());
    }
    println!("{}", results.summary());

    Ok(())
}
