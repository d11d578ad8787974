//! Manga-Capture main entry point
//!
//! This is the command-line interface for the Manga-Capture page capturer.

use anyhow::Context;
use clap::Parser;
use manga_capture::address::{next_address, parse_address};
use manga_capture::browser::ChromeRenderer;
use manga_capture::config::{
    load_config_with_hash, resolve_seed, Config, SeedInput, SeedOverrides, EXTENSION_ENV_VAR,
};
use manga_capture::crawler::{capture_series, AbortOnFatal, ConsolePrompt, OperatorPrompt};
use manga_capture::output::{print_summary, SequenceRun};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Manga-Capture: a sequential chapter/volume page capturer
///
/// Manga-Capture opens a chapter or volume in a browser, screenshots every
/// page into a numbered folder, and moves on to the next one until the
/// series runs out.
#[derive(Parser, Debug)]
#[command(name = "manga-capture")]
#[command(version)]
#[command(about = "A sequential chapter/volume page capturer", long_about = None)]
struct Cli {
    /// Address of the first chapter or volume (overrides seed.address)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Root folder for captured units (default: ./manga)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Browser window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Browser window height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Unpacked ad-block extension directory to load
    #[arg(long, value_name = "PATH")]
    extension: Option<PathBuf>,

    /// Ask on the console whether to continue when a page cannot be captured
    #[arg(long)]
    interactive: bool,

    /// Validate input and show what would be captured without opening a browser
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };
    apply_browser_overrides(&mut config, &cli);

    let seed = resolve_seed(
        &config,
        SeedOverrides {
            address: cli.url.clone(),
            destination_root: cli.output.clone(),
            window_width: cli.width,
            window_height: cli.height,
        },
    )
    .context("Invalid seed input")?;

    if cli.dry_run {
        return handle_dry_run(&seed, &config);
    }

    handle_capture(seed, config, cli.interactive).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("manga_capture=info,warn"),
            1 => EnvFilter::new("manga_capture=debug,info"),
            2 => EnvFilter::new("manga_capture=trace,debug"),
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

/// Command-line browser flags win over the file; the extension falls back to the environment
fn apply_browser_overrides(config: &mut Config, cli: &Cli) {
    if cli.headless {
        config.browser.headless = true;
    }

    if let Some(path) = &cli.extension {
        config.browser.extension_path = Some(path.clone());
    } else if config.browser.extension_path.is_none() {
        if let Some(path) = std::env::var_os(EXTENSION_ENV_VAR) {
            config.browser.extension_path = Some(PathBuf::from(path));
        }
    }

    if let Some(path) = &config.browser.extension_path {
        if !path.exists() {
            tracing::warn!(
                "Extension {} does not exist, continuing without it",
                path.display()
            );
            config.browser.extension_path = None;
        }
    }
}

/// Handles the --dry-run mode: shows what would be captured
fn handle_dry_run(seed: &SeedInput, config: &Config) -> anyhow::Result<()> {
    let unit = parse_address(&seed.address).context("Seed does not name a chapter or volume")?;

    println!("=== Manga-Capture Dry Run ===\n");

    println!("Seed:");
    println!("  Address: {}", seed.address);
    println!("  Unit: {}", unit);
    println!("  Destination: {}", unit.destination(&seed.destination_root).display());
    match next_address(unit.base(), unit.kind(), unit.sequence_number()) {
        Ok(next) => println!("  Next address: {}", next),
        Err(e) => println!("  Next address: none ({})", e),
    }

    println!("\nBrowser:");
    println!("  Window: {}x{}", seed.window_width, seed.window_height);
    println!("  Headless: {}", config.browser.headless);
    match &config.browser.extension_path {
        Some(path) => println!("  Extension: {}", path.display()),
        None => println!("  Extension: none"),
    }

    println!("\nRetry:");
    println!("  Max attempts per page: {}", config.retry.max_attempts);
    println!("  Stall window: {}", config.retry.stall_window);

    println!("\n✓ Input is valid");

    Ok(())
}

/// Handles the capture session
///
/// The session blocks on the browser, so it runs on a blocking worker while
/// the runtime watches for Ctrl-C.
async fn handle_capture(seed: SeedInput, config: Config, interactive: bool) -> anyhow::Result<()> {
    let seed_address = seed.address.clone();
    tracing::info!(
        "Capturing from {} into {}",
        seed.address,
        seed.destination_root.display()
    );

    let session = tokio::task::spawn_blocking(move || run_session(seed, config, interactive));

    tokio::select! {
        joined = session => {
            let run = joined.context("Capture worker panicked")??;
            print_summary(&run);
            if !run.ended_cleanly() {
                anyhow::bail!("Capture stopped on an error");
            }
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; resume from {} or a later unit", seed_address);
            std::process::exit(130);
        }
    }
}

fn run_session(seed: SeedInput, config: Config, interactive: bool) -> anyhow::Result<SequenceRun> {
    let mut renderer =
        ChromeRenderer::launch(&seed, &config).context("Failed to start the browser")?;

    let prompt: Box<dyn OperatorPrompt> = if interactive {
        Box::new(ConsolePrompt::stdio())
    } else {
        Box::new(AbortOnFatal)
    };

    let run = capture_series(seed, &config, &mut renderer, prompt)?;
    Ok(run)
}
