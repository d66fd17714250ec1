//! API description converter CLI
//!
//! Command-line interface for decoding OpenAPI and API Blueprint documents
//! into a single OpenAPI-shaped model.

use anyhow::{bail, Context, Result};
use apiconv_common::Document;
use apiconv_parser::{BlueprintParser, OpenApiParser, ParseOptions, TabPolicy};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apiconv")]
#[command(version, about = "Decode OpenAPI and API Blueprint documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Count each leading tab as this many columns of indentation
    #[arg(long, global = true, value_name = "N", conflicts_with = "reject_tabs")]
    tab_width: Option<usize>,

    /// Fail on tab characters in indentation
    #[arg(long, global = true)]
    reject_tabs: bool,

    /// Fail on malformed flow collections instead of reading them as strings
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and display a summary
    #[command(after_help = "EXAMPLES:\n  \
        # Parse an OpenAPI document\n  \
        apiconv parse --spec petstore.yaml\n\n  \
        # Parse an API Blueprint\n  \
        apiconv parse --spec notes.apib --format blueprint")]
    Parse {
        /// Path to the document
        #[arg(short, long)]
        spec: PathBuf,

        /// Document format (detected from the file extension if not specified)
        #[arg(short, long)]
        format: Option<SpecFormat>,
    },

    /// Print the decoded document as JSON
    #[command(after_help = "EXAMPLES:\n  \
        # Convert a Blueprint to OpenAPI JSON\n  \
        apiconv dump --spec notes.apib > openapi.json\n\n  \
        # Show the generic value tree of a YAML file\n  \
        apiconv dump --spec petstore.yaml --value")]
    Dump {
        /// Path to the document
        #[arg(short, long)]
        spec: PathBuf,

        /// Document format (detected from the file extension if not specified)
        #[arg(short, long)]
        format: Option<SpecFormat>,

        /// Print the generic value tree instead of the bound document
        #[arg(long)]
        value: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SpecFormat {
    /// OpenAPI 3 in YAML or JSON
    Openapi,
    /// API Blueprint (markdown)
    Blueprint,
}

impl std::fmt::Display for SpecFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecFormat::Openapi => write!(f, "OpenAPI"),
            SpecFormat::Blueprint => write!(f, "API Blueprint"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let options = parse_options(&cli);
    debug!(?options, "parse options");

    match cli.command {
        Commands::Parse { spec, format } => {
            parse_command(spec.as_path(), format, &options, cli.verbose)?;
        }
        Commands::Dump {
            spec,
            format,
            value,
        } => {
            dump_command(spec.as_path(), format, &options, value)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` directives when set, otherwise `warn` (`debug` when verbose)
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}

fn parse_options(cli: &Cli) -> ParseOptions {
    let tab_policy = if cli.reject_tabs {
        TabPolicy::Reject
    } else if let Some(width) = cli.tab_width {
        TabPolicy::Expand(width)
    } else {
        TabPolicy::Literal
    };

    ParseOptions::new()
        .with_tab_policy(tab_policy)
        .with_strict_flow(cli.strict)
}

fn load_document(path: &Path, format: SpecFormat, options: &ParseOptions) -> Result<Document> {
    let document = match format {
        SpecFormat::Openapi => {
            let parser = OpenApiParser::from_file(path, options)
                .context("Failed to load OpenAPI document")?;
            parser.parse().context("Failed to bind OpenAPI document")?
        }
        SpecFormat::Blueprint => {
            let parser = BlueprintParser::from_file(path, options)
                .context("Failed to load API Blueprint")?;
            parser.parse().context("Failed to parse API Blueprint")?
        }
    };
    Ok(document)
}

fn parse_command(
    spec_path: &Path,
    format: Option<SpecFormat>,
    options: &ParseOptions,
    verbose: bool,
) -> Result<()> {
    println!("{} Parsing document: {}", "→".cyan(), spec_path.display());

    let format = format.unwrap_or_else(|| {
        let detected = detect_format(spec_path);
        println!(
            "{} Detected format: {}",
            "→".cyan(),
            detected.to_string().yellow()
        );
        detected
    });

    let document = load_document(spec_path, format, options)?;

    println!("\n{}", "✓ Parse successful!".green().bold());
    println!("\n{}", "Document:".bold());
    println!("  Title: {}", document.title().yellow());
    println!("  Version: {}", document.info.version.yellow());
    for server in &document.servers {
        println!("  Server: {}", server.url);
    }
    println!("  Paths: {}", document.paths.len());
    println!("  Operations: {}", document.operation_count());
    let schema_count = document.named_schemas().map_or(0, |s| s.len());
    println!("  Schemas: {}", schema_count);

    if verbose {
        println!("\n{}", "Operations:".bold());
        for (path, item) in &document.paths {
            for (method, operation) in item.operations() {
                let statuses: Vec<&str> = operation.responses.keys().map(String::as_str).collect();
                println!(
                    "  • {} {} [{}]",
                    method.as_str().cyan(),
                    path,
                    statuses.join(", ")
                );
                if let Some(summary) = &operation.summary {
                    println!("    {}", summary.dimmed());
                }
            }
        }

        if let Some(schemas) = document.named_schemas() {
            println!("\n{}", "Schemas:".bold());
            for (name, schema) in schemas {
                println!(
                    "  • {} ({} properties)",
                    name.cyan(),
                    schema.properties.len()
                );
            }
        }
    }

    Ok(())
}

fn dump_command(
    spec_path: &Path,
    format: Option<SpecFormat>,
    options: &ParseOptions,
    value: bool,
) -> Result<()> {
    let format = format.unwrap_or_else(|| detect_format(spec_path));

    let json = if value {
        if format != SpecFormat::Openapi {
            bail!("--value is only available for OpenAPI documents");
        }
        let text = fs::read_to_string(spec_path)
            .with_context(|| format!("Failed to read {}", spec_path.display()))?;
        let tree = apiconv_parser::parse_document_with(&text, options)
            .context("Failed to decode value tree")?;
        serde_json::to_string_pretty(&tree.to_json())?
    } else {
        let document = load_document(spec_path, format, options)?;
        serde_json::to_string_pretty(&document)?
    };

    println!("{}", json);
    Ok(())
}

/// Pick the decoder from the file extension
fn detect_format(path: &Path) -> SpecFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("apib") | Some("md") => SpecFormat::Blueprint,
        _ => SpecFormat::Openapi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("notes.apib")), SpecFormat::Blueprint);
        assert_eq!(detect_format(Path::new("API.MD")), SpecFormat::Blueprint);
        assert_eq!(detect_format(Path::new("petstore.yaml")), SpecFormat::Openapi);
        assert_eq!(detect_format(Path::new("petstore.json")), SpecFormat::Openapi);
        assert_eq!(detect_format(Path::new("README")), SpecFormat::Openapi);
    }

    #[test]
    fn test_parse_options_from_flags() {
        let cli = Cli::parse_from(["apiconv", "--tab-width", "4", "--strict", "parse", "-s", "a.yaml"]);
        let options = parse_options(&cli);
        assert_eq!(options.tab_policy, TabPolicy::Expand(4));
        assert!(options.strict_flow);

        let cli = Cli::parse_from(["apiconv", "parse", "--spec", "a.apib", "--reject-tabs"]);
        assert_eq!(parse_options(&cli).tab_policy, TabPolicy::Reject);
    }

    #[test]
    fn test_log_filter_prefers_rust_log() {
        let from_env = log_filter(Some("debug"), false).to_string();
        assert!(from_env.eq_ignore_ascii_case("debug"));

        let quiet = log_filter(None, false).to_string();
        assert!(quiet.eq_ignore_ascii_case("warn"));

        let verbose = log_filter(None, true).to_string();
        assert!(verbose.eq_ignore_ascii_case("debug"));
    }
}
