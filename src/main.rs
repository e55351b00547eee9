//! Folio CLI - static blog builder
//!
//! Usage: folio <COMMAND>
//!
//! Commands:
//!   build  Render the site into the output directory
//!   serve  Build, serve locally and rebuild on changes
//!   clean  Remove everything the last build produced

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folio::{
    BuildEventSink, Config, FolioError, JsonEventSink, LocalFs, LogEventSink, ServeOptions, Site,
};

/// Folio - static blog builder
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit NDJSON events on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the site into the output directory
    Build {
        /// Site source directory
        #[arg(short, long, default_value = ".")]
        source: PathBuf,

        /// Output directory (overrides folio.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build, serve locally and rebuild on changes
    Serve {
        /// Site source directory
        #[arg(short, long, default_value = ".")]
        source: PathBuf,

        /// Output directory (overrides folio.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Address to bind (overrides folio.toml)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides folio.toml)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not rebuild when sources change
        #[arg(long)]
        no_watch: bool,
    },

    /// Remove everything the last build produced
    Clean {
        /// Site source directory
        #[arg(short, long, default_value = ".")]
        source: PathBuf,

        /// Output directory (overrides folio.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Build { source, output } => cmd_build(&source, output, cli.json),
        Commands::Serve {
            source,
            output,
            host,
            port,
            no_watch,
        } => cmd_serve(&source, output, host, port, !no_watch, cli.json),
        Commands::Clean { source, output } => cmd_clean(&source, output, cli.json),
    };

    if let Err(e) = &result {
        if cli.json {
            print_error_event(e);
        }
    }
    result
}

/// RUST_LOG wins, then -v/-vv, then info. Logs go to stderr.
fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn event_sink(json: bool) -> Box<dyn BuildEventSink> {
    if json {
        Box::new(JsonEventSink::stdout())
    } else {
        Box::new(LogEventSink)
    }
}

fn print_error_event(error: &anyhow::Error) {
    let kind = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<FolioError>())
        .map(|e| format!("{:?}", e.kind()).to_lowercase());
    let event = serde_json::json!({
        "event": "error",
        "kind": kind,
        "message": format!("{:#}", error),
    });
    println!("{}", event);
}

/// Load config for `source`, apply CLI overrides, and log config warnings.
fn load_site(source: &Path, output: Option<PathBuf>) -> Result<Site> {
    let (mut config, warnings) = Config::for_source(source)
        .with_context(|| format!("failed to load configuration from {}", source.display()))?;

    for warning in warnings {
        tracing::warn!(
            key = %warning.key,
            file = %warning.file.display(),
            line = warning.line,
            suggestion = warning.suggestion.as_deref(),
            "unknown configuration key"
        );
    }

    if let Some(output) = output {
        // CLI paths are relative to the working directory, not the source
        config.build.output = std::env::current_dir()?.join(output);
    }

    Ok(Site::new(source, config))
}

fn cmd_build(source: &Path, output: Option<PathBuf>, json: bool) -> Result<()> {
    let site = load_site(source, output)?;
    let sink = event_sink(json);

    let report = site
        .build(&LocalFs::new(), sink.as_ref())
        .with_context(|| format!("build of {} failed", source.display()))?;

    tracing::debug!(
        documents = report.documents,
        indexes = report.indexes,
        assets = report.assets,
        output = %site.output_dir().display(),
        "site built"
    );
    Ok(())
}

fn cmd_serve(
    source: &Path,
    output: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    watch: bool,
    json: bool,
) -> Result<()> {
    let site = load_site(source, output)?;
    let serve_config = &site.config().serve;
    let options = ServeOptions {
        host: host.unwrap_or_else(|| serve_config.host.clone()),
        port: port.unwrap_or(serve_config.port),
        watch,
    };

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("failed to install Ctrl+C handler")?;

    let sink = event_sink(json);
    folio::serve(&site, &options, &LocalFs::new(), sink.as_ref(), running)
        .with_context(|| format!("serving {} failed", source.display()))?;
    Ok(())
}

fn cmd_clean(source: &Path, output: Option<PathBuf>, json: bool) -> Result<()> {
    let site = load_site(source, output)?;
    let sink = event_sink(json);

    site.clean(&LocalFs::new(), sink.as_ref())
        .with_context(|| format!("clean of {} failed", site.output_dir().display()))?;
    Ok(())
}
