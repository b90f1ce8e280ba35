use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use xmlbind::{Document, ParserConfig, RenderConfig, Renderer};

#[derive(Debug, Parser)]
#[command(
    name = "xmlbind",
    version,
    about = "Check and format XML documents"
)]
struct Cli {
    /// Log parser activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a document and report its root element
    Check {
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
    },
    /// Parse a document and write it back in canonical form
    Fmt {
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
        /// Spaces per nesting level; 0 writes compact output
        #[arg(long, default_value_t = 0)]
        indent: usize,
        /// Start the output with an XML declaration
        #[arg(long)]
        declaration: bool,
        /// Drop whitespace-only text between elements
        #[arg(long)]
        trim: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("xmlbind=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Command::Check { input } => {
            let document = load(&input, ParserConfig::default())?;
            println!("ok: <{}>", document.root.name);
        }
        Command::Fmt {
            input,
            output,
            indent,
            declaration,
            trim,
        } => {
            let config = if trim {
                ParserConfig::default().trimmed()
            } else {
                ParserConfig::default()
            };
            let document = load(&input, config)?;

            let render = RenderConfig {
                indent,
                declaration,
            };
            let mut text = Renderer::with_config(render).render(&document.root);
            if !text.ends_with('\n') {
                text.push('\n');
            }
            write_output(&output, text.as_bytes())?;
        }
    }
    Ok(())
}

fn load(path: &Option<PathBuf>, config: ParserConfig) -> Result<Document> {
    let bytes = read_input(path)?;
    let source = path
        .as_ref()
        .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string());
    info!(source = %source, bytes = bytes.len(), "parsing");

    let document = xmlbind::Parser::with_config(&bytes, config)
        .parse()
        .with_context(|| format!("failed to parse {source}"))?;
    debug!(root = %document.root.name, "parsed");
    Ok(document)
}

fn read_input(path: &Option<PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.iter().all(u8::is_ascii_whitespace) {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
