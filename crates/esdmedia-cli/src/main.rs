mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_NO_MATCHES};
use esdmedia_catalog::{RecordFilter, ResolveRequest, CATALOG_URL};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "esdmedia",
    version,
    about = "Resolve vendor ESD catalogs and build bootable installation media"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the vendor catalog into matching installer packages.
    Catalog {
        /// Re-download the catalog even when a local copy is present.
        #[arg(short, long, default_value_t = false)]
        refresh: bool,
        /// Print bare download URLs, one per line.
        #[arg(short, long = "urls", default_value_t = false)]
        urls_only: bool,
        /// Only business-edition packages.
        #[arg(short, long, default_value_t = false)]
        business: bool,
        /// Exact language filter (e.g. "en-US").
        #[arg(short, long)]
        language: Option<String>,
        /// Exact architecture filter (e.g. "x64").
        #[arg(short, long = "arch")]
        architecture: Option<String>,
        /// Working directory for the catalog document.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Catalog endpoint override.
        #[arg(long, default_value = CATALOG_URL)]
        endpoint: String,
    },
    /// Build bootable installation media from a downloaded container.
    Media {
        /// Source ESD container path.
        source: PathBuf,
        /// Target media directory (must not exist yet).
        target: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ESDMEDIA_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    if matches!(cli.command, Commands::Media { .. })
        && std::env::var("ESDMEDIA_SKIP_PREREQS").as_deref() != Ok("1")
    {
        let missing = esdmedia_wim::check_media_prereqs();
        if !missing.is_empty() {
            eprintln!("error: {}", esdmedia_wim::format_missing(&missing));
            return ExitCode::from(EXIT_FAILURE);
        }
    }

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Catalog {
            refresh,
            urls_only,
            business,
            language,
            architecture,
            dir,
            endpoint,
        } => {
            let request = ResolveRequest {
                refresh,
                filter: RecordFilter {
                    language,
                    architecture,
                    business_only: business,
                },
                work_dir: dir,
                endpoint,
            };
            commands::catalog::run(&request, urls_only, json_output)
        }
        Commands::Media { source, target } => commands::media::run(&source, &target),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("no catalog entries match") {
                EXIT_NO_MATCHES
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
