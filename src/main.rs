use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use media_query_manager::config::Settings;
use media_query_manager::{Extractor, MediaQueryEntry};

#[derive(Parser)]
#[command(name = "mqm", version)]
#[command(about = "Media query manager: list, filter and jump to CSS @media blocks")]
struct Cli {
    /// Config file (default: ./mqm.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at info level (MQM_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the @media blocks of a CSS file
    List {
        /// Input CSS file
        file: PathBuf,

        /// Keep only entries whose label contains this text (case-insensitive)
        #[arg(long)]
        filter: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Watch a CSS file and filter/jump interactively from the terminal
    Watch {
        /// Input CSS file
        file: PathBuf,
    },

    /// Serve the media query panel for a CSS file in the browser
    Serve {
        /// Input CSS file
        file: PathBuf,

        /// Server port (default from config, 3434)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Output format for the list command.
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One `label` per line
    Text,
    /// JSON array of entries
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match Settings::discover(cli.config.as_deref(), Path::new(".")) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let extractor = Extractor::new(settings.extractor.clone());

    match cli.command {
        Commands::List {
            file,
            filter,
            format,
        } => {
            let doc = match media_query_manager::load_document(&file) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            };
            let entries = media_query_manager::extract_filtered(
                &extractor,
                media_query_manager::TextDocument::text(&doc),
                filter.as_deref().unwrap_or(""),
            );
            match format {
                OutputFormat::Text => print_entries(&entries),
                OutputFormat::Json => match serde_json::to_string_pretty(&entries) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("error: cannot serialize entries: {e}");
                        process::exit(1);
                    }
                },
            }
        }

        Commands::Watch { file } => {
            if let Err(e) = media_query_manager::terminal::run_watch(file, extractor) {
                eprintln!("error: watch failed: {e}");
                process::exit(1);
            }
        }

        Commands::Serve { file, port } => {
            let port = port.unwrap_or(settings.serve.port);
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("error: cannot start tokio runtime: {e}");
                    process::exit(1);
                }
            };
            rt.block_on(async {
                if let Err(e) =
                    media_query_manager::server::run_panel_server(file, port, extractor).await
                {
                    eprintln!("error: panel server failed: {e:#}");
                    process::exit(1);
                }
            });
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("MQM_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_entries(entries: &[MediaQueryEntry]) {
    if entries.is_empty() {
        eprintln!("no media queries");
        return;
    }
    for entry in entries {
        println!("{}", entry.label);
    }
}
