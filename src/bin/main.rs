//! HAL Document CLI
//!
//! Command-line tool for converting HAL documents between JSON and XML and
//! for inspecting their relations.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hal_document::{Document, Format, HalError};

#[derive(Parser)]
#[command(name = "hal-document")]
#[command(about = "Convert and inspect HAL hypermedia documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document between HAL+JSON and HAL+XML
    Convert(ConvertArgs),
    /// List relations, or resolve one (CURIE-aware)
    Links(LinksArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Xml,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Format::Json,
            FormatArg::Xml => Format::Xml,
        }
    }
}

#[derive(Args)]
struct ConvertArgs {
    /// Input file, or "-" for stdin
    source: String,

    /// Input format (default: from extension, then content)
    #[arg(long, value_enum)]
    from: Option<FormatArg>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    to: FormatArg,

    /// Levels of embedded resources to expand
    #[arg(short, long, default_value_t = 0)]
    depth: usize,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct LinksArgs {
    /// Input file, or "-" for stdin
    source: String,

    /// Relation to resolve; lists every relation when omitted
    rel: Option<String>,

    /// Input format (default: from extension, then content)
    #[arg(long, value_enum)]
    from: Option<FormatArg>,
}

/// Read the source text from a file or stdin
fn read_source(source: &str) -> Result<String, HalError> {
    if source == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(fs::read_to_string(source)?)
    }
}

/// Explicit format, then extension, then content sniffing
fn resolve_format(explicit: Option<FormatArg>, source: &str, text: &str) -> Format {
    explicit
        .map(Format::from)
        .or_else(|| Format::from_path(Path::new(source)))
        .unwrap_or_else(|| Format::sniff(text))
}

fn load(source: &str, from: Option<FormatArg>, depth: usize) -> Result<Document, HalError> {
    let text = read_source(source)?;
    let format = resolve_format(from, source, &text);
    info!("Decoding {} as {} (depth {})", source, format, depth);
    format.decode(&text, depth)
}

/// Write output to file or stdout
fn write_output(content: &str, output: Option<&PathBuf>) -> Result<(), HalError> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            info!("Wrote document to {}", path.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

fn run_convert(args: ConvertArgs) -> Result<(), HalError> {
    let document = load(&args.source, args.from, args.depth)?;

    info!(
        "Loaded {} relations, {} embedded relations",
        document.links().len(),
        document.resources().len()
    );

    let output = Format::from(args.to).render(&document, args.pretty)?;
    write_output(&output, args.output.as_ref())
}

fn run_links(args: LinksArgs) -> Result<bool, HalError> {
    let document = load(&args.source, args.from, 0)?;

    match args.rel {
        Some(rel) => match document.link(&rel) {
            Some(links) => {
                for link in links.iter() {
                    println!("{}", link);
                }
                Ok(true)
            }
            None => {
                eprintln!("Relation '{}' not found", rel);
                Ok(false)
            }
        },
        None => {
            if let Some(uri) = document.uri() {
                println!("self\t{}", uri);
            }
            for (rel, links) in document.links().iter() {
                for link in links {
                    println!("{}\t{}", rel, link);
                }
            }
            Ok(true)
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args).map(|_| true),
        Commands::Links(args) => run_links(args),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
