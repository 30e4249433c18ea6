//! Schema Alternatives CLI
//!
//! Command-line interface for flattening conditional descriptions.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use schema_alternatives::{load_description_auto, variant_count, ConvertOptions, Document};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-alternatives")]
#[command(about = "Flatten conditional validation descriptions into oneOf variants")]
#[command(version)]
struct Cli {
    /// Log conversion steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a description document into an OpenAPI schema
    Convert {
        /// Description source: file path or URL (http:// or https://)
        source: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Allow unknown keys on objects that do not say otherwise
        #[arg(long)]
        allow_unknown: bool,

        /// Extension type tag, as NAME=BASE (repeatable)
        #[arg(long = "alias", value_name = "NAME=BASE", value_parser = parse_alias)]
        aliases: Vec<(String, String)>,
    },

    /// Convert a description and report how many variants it yields
    Check {
        /// Description source: file path or URL (http:// or https://)
        source: String,

        /// Extension type tag, as NAME=BASE (repeatable)
        #[arg(long = "alias", value_name = "NAME=BASE", value_parser = parse_alias)]
        aliases: Vec<(String, String)>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            source,
            output,
            pretty,
            allow_unknown,
            aliases,
        } => {
            let options = build_options(allow_unknown, aliases);
            run_convert(&source, &options, output, pretty)
        }
        Commands::Check { source, aliases } => {
            let options = build_options(false, aliases);
            run_check(&source, &options)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr so stdout stays clean JSON. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_alias(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, base)) if !name.is_empty() && !base.is_empty() => {
            Ok((name.to_string(), base.to_string()))
        }
        _ => Err(format!("expected NAME=BASE, got \"{}\"", raw)),
    }
}

fn build_options(allow_unknown: bool, aliases: Vec<(String, String)>) -> ConvertOptions {
    aliases
        .into_iter()
        .fold(ConvertOptions::new().allow_unknown(allow_unknown), |options, (name, base)| {
            options.alias(name, base)
        })
}

fn load_and_convert(source: &str, options: &ConvertOptions) -> Result<Document, u8> {
    let document = load_description_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    debug!(source, "loaded description");

    Document::convert(&document, options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_convert(
    source: &str,
    options: &ConvertOptions,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let converted = load_and_convert(source, options)?.to_value(&options.component_prefix);

    let json_output = if pretty {
        serde_json::to_string_pretty(&converted)
    } else {
        serde_json::to_string(&converted)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_check(source: &str, options: &ConvertOptions) -> Result<(), u8> {
    let document = load_and_convert(source, options)?;
    println!("ok: {} variant(s)", variant_count(&document.schema));
    Ok(())
}
