//! CLI entry point for the xcompat analyzer.
//!
//! This binary scans a JavaScript/TypeScript frontend (the usage side) and,
//! optionally, the server that declares its routes (the declaration side),
//! then reports how well the two agree.
//!
//! # Usage
//!
//! ```bash
//! xcompat [OPTIONS] <COMMAND>
//!
//! # Match a frontend against its backend, human-readable
//! xcompat analyze --usage ./web --declaration ./server --format text
//!
//! # Full JSON report to a file
//! xcompat analyze --usage ./web --output report.json
//!
//! # Show what a component reaches
//! xcompat tree --usage ./web OrderPage
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{WrapErr, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use xc_analysis::{AnalysisReport, Analyzer};
use xc_core::Config;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Cross-codebase API compatibility analyzer.
///
/// Extracts endpoint calls, data models and components from a frontend and
/// matches them against the routes and models a backend declares.
#[derive(Parser)]
#[command(name = "xcompat", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file.
    ///
    /// Flags given on the command line override values from the file.
    #[arg(short, long, global = true, env = "XC_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Follow symbolic links while walking source trees.
    #[arg(long, global = true)]
    follow_links: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan one or two codebases and report findings and compatibility.
    Analyze {
        /// Root of the codebase that calls the API.
        #[arg(short, long, env = "XC_USAGE")]
        usage: Utf8PathBuf,

        /// Root of the codebase that declares the API.
        #[arg(short, long, env = "XC_DECLARATION")]
        declaration: Option<Utf8PathBuf>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, env = "XC_FORMAT")]
        format: OutputFormat,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the components, endpoints and models reachable from a component.
    Tree {
        /// Root of the codebase that calls the API.
        #[arg(short, long, env = "XC_USAGE")]
        usage: Utf8PathBuf,

        /// Component name to start from.
        component: String,

        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Analyzer settings that override the configuration file.
#[derive(clap::Args)]
struct Overrides {
    /// Process files sequentially.
    #[arg(long, env = "XC_NO_PARALLEL")]
    no_parallel: bool,

    /// Neither read nor write the extraction cache.
    #[arg(long, env = "XC_NO_CACHE")]
    no_cache: bool,

    /// Directory for the extraction cache.
    #[arg(long, env = "XC_CACHE_DIR")]
    cache_dir: Option<Utf8PathBuf>,

    /// Upper bound on worker threads.
    #[arg(long, env = "XC_MAX_WORKERS")]
    max_workers: Option<usize>,

    /// Use the text fallback extractor for every file.
    #[arg(long, env = "XC_TEXT_ONLY")]
    text_only: bool,

    /// Include test files in the scan.
    #[arg(long, env = "XC_INCLUDE_TESTS")]
    include_tests: bool,
}

/// Report output format.
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Full report as pretty-printed JSON.
    Json,
    /// Short human-readable summary.
    Text,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default. Logs go
/// to stderr so that reports on stdout stay machine-readable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},ignore=warn,globset=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the optional file and the command-line overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the result is invalid.
fn build_config(path: Option<&Utf8Path>, overrides: &Overrides) -> color_eyre::Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_json_file(path)
            .wrap_err_with(|| format!("Failed to load config from {path}"))?,
        None => Config::default(),
    };

    let analyzer = &mut config.analyzer;
    if overrides.no_parallel {
        analyzer.parallel = false;
    }
    if overrides.no_cache {
        analyzer.cache_enabled = false;
    }
    if overrides.text_only {
        analyzer.use_structured_parse = false;
    }
    if overrides.include_tests {
        analyzer.include_tests = true;
    }
    if let Some(dir) = &overrides.cache_dir {
        analyzer.cache_dir.clone_from(dir);
    }
    if let Some(workers) = overrides.max_workers {
        analyzer.max_workers = workers;
    }

    Ok(config)
}

/// Creates an [`Analyzer`], validating the configuration.
fn create_analyzer(cli: &Cli, overrides: &Overrides) -> color_eyre::Result<Analyzer> {
    let config = build_config(cli.config.as_deref(), overrides)?;
    Analyzer::new(config)
        .map(|analyzer| analyzer.with_follow_links(cli.follow_links))
        .map_err(|e| eyre!("Invalid configuration: {e}"))
}

/// Ensures a scan root is an existing directory.
fn validate_dir(path: &Utf8Path, label: &str) -> color_eyre::Result<()> {
    if !path.exists() {
        return Err(eyre!("{label} path does not exist: {path}"));
    }
    if !path.is_dir() {
        return Err(eyre!("{label} path is not a directory: {path}"));
    }
    Ok(())
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs a full analysis and writes the report.
///
/// # Errors
///
/// Returns an error if scanning, serialization or writing fails.
fn run_analyze(
    analyzer: &Analyzer,
    usage: &Utf8Path,
    declaration: Option<&Utf8Path>,
    format: OutputFormat,
    output: Option<&Utf8Path>,
) -> color_eyre::Result<()> {
    validate_dir(usage, "usage")?;
    if let Some(declaration) = declaration {
        validate_dir(declaration, "declaration")?;
    }
    info!(%usage, declaration = ?declaration, "Starting analysis");

    let report = analyzer.analyze(usage, declaration)?;
    let content = render(&report, format)?;
    write_output(&content, output)
}

/// Renders the subtree below one component to stdout.
///
/// # Errors
///
/// Returns an error if the scan fails or the component is unknown.
fn run_tree(analyzer: &Analyzer, usage: &Utf8Path, component: &str) -> color_eyre::Result<()> {
    validate_dir(usage, "usage")?;
    let tree = analyzer.tree(usage, component)?;
    write_output(&tree, None)
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Serializes the report in the requested format.
fn render(report: &AnalysisReport, format: OutputFormat) -> color_eyre::Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(report)
                .map_err(|e| eyre!("Failed to serialize JSON: {e}"))?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Text => Ok(report.render_text()),
    }
}

/// Writes `content` to `output`, or to stdout when no file is given.
fn write_output(content: &str, output: Option<&Utf8Path>) -> color_eyre::Result<()> {
    if let Some(path) = output {
        std::fs::write(path.as_std_path(), content)
            .wrap_err_with(|| format!("Failed to write {path}"))?;
        info!(%path, "Report written");
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{content}")?;
    }
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Route to appropriate command
    match &cli.command {
        Commands::Analyze {
            usage,
            declaration,
            format,
            output,
            overrides,
        } => {
            let analyzer = create_analyzer(&cli, overrides)?;
            run_analyze(
                &analyzer,
                usage,
                declaration.as_deref(),
                *format,
                output.as_deref(),
            )
        }
        Commands::Tree {
            usage,
            component,
            overrides,
        } => {
            let analyzer = create_analyzer(&cli, overrides)?;
            run_tree(&analyzer, usage, component)
        }
    }
}
