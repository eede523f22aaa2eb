//! docs-mirror main entry point
//!
//! This is the command-line interface for the docs-mirror site crawler.

use anyhow::Context;
use clap::Parser;
use docs_mirror::config::{parse_config_file, validate, Config, Engine};
use docs_mirror::crawler::run_crawl;
use docs_mirror::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// docs-mirror: a resumable documentation site mirror
///
/// docs-mirror walks one host/path-prefix subtree of a documentation site,
/// renders each page in headless Chrome and writes the rendered HTML under
/// the output directory. Interrupted runs resume where they stopped.
#[derive(Parser, Debug)]
#[command(name = "docs-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Mirror rendered documentation pages to disk", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Seed URL
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Delay between page fetches in seconds
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// Start fresh instead of skipping previously mirrored pages
    #[arg(long)]
    no_resume: bool,

    /// Show the browser window
    #[arg(long)]
    no_headless: bool,

    /// Page rendering engine
    #[arg(long, value_enum)]
    engine: Option<Engine>,

    /// Attempts per URL before a timeout becomes a failure
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of a file or default config
    fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }
        if let Some(start_url) = &self.start_url {
            config.scope.start_url = start_url.clone();
        }
        if let Some(delay) = self.delay {
            config.crawler.rate_limit_delay = delay;
        }
        if self.no_resume {
            config.crawler.resume = false;
        }
        if self.no_headless {
            config.browser.headless = false;
        }
        if let Some(engine) = self.engine {
            config.browser.engine = engine;
        }
        if let Some(max_retries) = self.max_retries {
            config.crawler.max_retries = max_retries;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            parse_config_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docs_mirror=info,warn"),
            1 => EnvFilter::new("docs_mirror=debug,info"),
            2 => EnvFilter::new("docs_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_banner(config: &Config) {
    let engine = match config.browser.engine {
        Engine::Chromium if config.browser.headless => "chromium (headless)",
        Engine::Chromium => "chromium (visible)",
        Engine::Http => "http",
    };

    println!("Docs Mirror");
    println!("{}", "=".repeat(80));
    println!("Start URL: {}", config.scope.start_url);
    println!("Scope: {}", config.scope());
    println!("Output directory: {}", config.output.directory.display());
    println!("Rate limit delay: {}s", config.crawler.rate_limit_delay);
    println!("Max retries: {}", config.crawler.max_retries);
    println!("Resume: {}", config.crawler.resume);
    println!("Engine: {}", engine);
    println!("{}", "=".repeat(80));
    println!();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    print_banner(config);

    let visited = if config.crawler.resume {
        let store = docs_mirror::storage::JsonManifest::new(&config.output.directory);
        docs_mirror::storage::load_or_empty(&store).len()
    } else {
        0
    };

    println!("✓ Configuration is valid");
    println!("✓ Would start crawling from {}", config.scope.start_url);
    if visited > 0 {
        println!("✓ {} URLs already visited would be skipped", visited);
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    print_banner(&config);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let outcome = match run_crawl(&config, shutdown).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if outcome.cancelled {
        println!("\nInterrupted; progress saved. Run again to resume.");
    }
    if let Some(message) = &outcome.aborted {
        tracing::error!("Crawl stopped early: {}", message);
    }
    if !outcome.state_saved {
        tracing::warn!("Resume state was not saved; the next run will start over");
    }

    print_summary(&outcome.stats, &config.output.directory);

    Ok(())
}
