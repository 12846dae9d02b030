//! docmapper main entry point
//!
//! This is the command-line interface for the docmapper documentation-site mapper.

use clap::Parser;
use docmapper::config::{
    compute_config_hash, read_config, validate, Config, OutputFormat, OutputLayout,
};
use docmapper::crawler::crawl_with_deadline;
use docmapper::output::{print_statistics, write_output, CrawlOutput};
use docmapper::tree::TreeBuilder;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// docmapper: a polite documentation-site mapper
///
/// docmapper crawls a documentation site from a single root URL, skips
/// duplicate and low-value pages, and writes the accepted pages either in
/// crawl order or as a hierarchy that mirrors the site's URL structure.
#[derive(Parser, Debug)]
#[command(name = "docmapper")]
#[command(version)]
#[command(about = "A polite documentation-site mapper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Stop dispatching new pages after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Root URL of the documentation site (overrides the config file)
    #[arg(long)]
    root_url: Option<String>,

    /// Maximum number of hops from the root URL
    #[arg(long)]
    max_depth: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    output_format: Option<OutputFormat>,

    /// Output file layout
    #[arg(long, value_enum)]
    output_layout: Option<OutputLayout>,

    /// Directory receiving the generated files
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Arrange output as a page hierarchy instead of crawl order
    #[arg(long)]
    hierarchical: bool,

    /// Disable URL deduplication
    #[arg(long)]
    no_dedupe: bool,

    /// Disable content quality filtering
    #[arg(long)]
    no_quality: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(root_url) = &self.root_url {
            config.crawler.root_url = root_url.clone();
        }
        if let Some(max_depth) = self.max_depth {
            config.crawler.max_depth = max_depth;
        }
        if let Some(format) = self.output_format {
            config.output.format = format;
        }
        if let Some(layout) = self.output_layout {
            config.output.layout = layout;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if self.hierarchical {
            config.tree.enabled = true;
        }
        if self.no_dedupe {
            config.deduplication.enabled = false;
        }
        if self.no_quality {
            config.quality.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match load(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    cli.apply_overrides(&mut config);
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.timeout);
        return Ok(());
    }

    handle_crawl(config, &config_hash, cli.timeout).await
}

/// Reads the configuration file, or falls back to defaults when none is given
fn load(cli: &Cli) -> Result<(Config, String), Box<dyn std::error::Error>> {
    match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = read_config(path)?;
            let hash = compute_config_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok((config, hash))
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Ok((Config::default(), "default".to_string()))
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docmapper=info,warn"),
            1 => EnvFilter::new("docmapper=debug,info"),
            2 => EnvFilter::new("docmapper=trace,debug"),
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

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, timeout: Option<u64>) {
    println!("=== docmapper Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Root URL: {}", config.crawler.root_url);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!(
        "  Delay: {}-{}ms",
        config.crawler.min_delay, config.crawler.max_delay
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Respect robots.txt: {}", on_off(config.crawler.respect_robots));
    match timeout {
        Some(secs) => println!("  Deadline: {}s", secs),
        None => println!("  Deadline: none"),
    }

    println!("\nUser Agent:");
    println!("  Robots name: {}", config.user_agent.robots_name);
    println!("  Rotating agents: {}", config.user_agent.agents.len());
    println!("  Proxies: {}", config.user_agent.proxies.len());

    println!("\nDeduplication: {}", on_off(config.deduplication.enabled));
    if config.deduplication.enabled {
        let dedup = &config.deduplication;
        println!("  Strip fragment: {}", on_off(dedup.strip_fragment));
        println!("  Strip query: {}", on_off(dedup.strip_query));
        println!("  Lowercase: {}", on_off(dedup.lowercase));
        println!("  Strip www: {}", on_off(dedup.strip_www));
        println!("  Strip trailing slash: {}", on_off(dedup.strip_trailing_slash));
        println!("  Sort query params: {}", on_off(dedup.sort_query_params));
    }

    println!("\nQuality Filter: {}", on_off(config.quality.enabled));
    if config.quality.enabled {
        println!("  Min word count: {}", config.quality.min_word_count);
        println!("  Require title: {}", on_off(config.quality.require_title));
        println!("  Require content: {}", on_off(config.quality.require_content));
        println!(
            "  Skip navigation pages: {}",
            on_off(config.quality.skip_navigation_pages)
        );
        println!(
            "  Blacklist patterns: {}",
            config.quality.blacklist_patterns.join(", ")
        );
    }

    println!("\nTree: {}", on_off(config.tree.enabled));
    if config.tree.enabled {
        println!("  Fallback to root: {}", on_off(config.tree.fallback_to_root));
        if config.tree.sort_children {
            println!("  Sort children by: {:?}", config.tree.sort_by);
        }
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Format: {:?}", config.output.format);
    println!("  Layout: {:?}", config.output.layout);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", config.crawler.root_url);
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    timeout: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Mapping {} (max depth {}, concurrency {})",
        config.crawler.root_url,
        config.crawler.max_depth,
        config.crawler.concurrency
    );

    let report = match crawl_with_deadline(config.clone(), timeout.map(Duration::from_secs)).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let tree = config
        .tree
        .enabled
        .then(|| TreeBuilder::new(config.tree.clone()).build(&report.pages));

    let output = CrawlOutput::new(&report.root_url, &report.pages, tree.as_ref());
    let files = write_output(&config, &output, config_hash)?;

    print_statistics(&report, tree.as_ref().map(|tree| tree.total_nodes()));
    println!("\n✓ Wrote {} file(s) to {}", files.len(), config.output.directory);

    Ok(())
}
