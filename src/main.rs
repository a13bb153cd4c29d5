use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use molextract::inspect::inspect_document;
use molextract::{Document, ExtractionConfig, Lexicon};

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Inspect chemical drawing documents.",
    arg_required_else_help = true
)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// Enable debug logging for every component
    #[clap(long, global = true)]
    pub verbose: bool,

    /// Directory for a log file, in addition to stderr
    #[clap(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report fragments, R-groups and reaction roles without identity services
    Inspect {
        /// JSON-serialised document
        document: PathBuf,

        /// Pretty print the report
        #[clap(short, long)]
        pretty: bool,

        /// Extraction config overrides (JSON)
        #[clap(long)]
        config: Option<PathBuf>,

        /// Directory holding the lookup tables; built-in tables otherwise
        #[clap(long)]
        lexicon: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = match args.log_dir {
        Some(log_dir) => molextract::logging::init_logging_with_dir(args.verbose, log_dir)
            .context("failed to open log directory")?,
        None => molextract::logging::init_logging(args.verbose),
    };

    match args.command {
        Command::Inspect {
            document,
            pretty,
            config,
            lexicon,
        } => {
            let config = match config {
                Some(path) => ExtractionConfig::from_path(&path)?,
                None => ExtractionConfig::default(),
            };
            let lexicon = match lexicon {
                Some(dir) => Lexicon::load(&dir)?,
                None => Lexicon::builtin()?,
            };

            let json = fs::read_to_string(&document)
                .with_context(|| format!("failed to read {}", document.display()))?;
            let document = Document::from_json_str(&json).context("malformed document")?;
            info!(pages = document.pages.len(), "Loaded document");

            let report = inspect_document(&document, &config, &lexicon);
            let out = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", out);
        }
    }

    Ok(())
}
