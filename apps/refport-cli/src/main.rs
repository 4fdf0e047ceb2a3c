//! refport - bibliographic interchange on the command line
//!
//! Detect, convert, import into and export from a JSON library file.
//! Set `RUST_LOG=debug` for per-record detail.

mod library;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use refport_core::csv::detect_delimiter;
use refport_core::{
    export_references, handler_for, EmphasisMode, ExportOptions, ExportPayload, Exporter, Format,
    ImportOptions, ImportReport, Importer, InterchangeError, ParseOptions, RecordId,
    ReferenceFormat, RefportConfig,
};

use library::Library;

#[derive(Parser)]
#[command(name = "refport")]
#[command(version, about = "Bibliographic interchange: RIS, BibTeX, CSV and CSL-JSON", long_about = None)]
struct Cli {
    /// TOML or JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected format of a file
    Detect {
        input: PathBuf,
    },

    /// Convert a file from one format to another
    Convert {
        input: PathBuf,

        /// Source format (detected when omitted)
        #[arg(long)]
        from: Option<Format>,

        /// Target format
        #[arg(short = 't', long)]
        to: Format,

        /// Write to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Keep LaTeX emphasis as Markdown
        #[arg(long)]
        markdown_emphasis: bool,
    },

    /// Import a file into a library
    Import {
        input: PathBuf,

        /// Library file (created when missing)
        #[arg(short = 'l', long)]
        library: PathBuf,

        /// Source format (detected when omitted)
        #[arg(long)]
        from: Option<Format>,

        /// Merge duplicates into the existing record
        #[arg(long)]
        update_existing: bool,

        #[arg(long)]
        batch_size: Option<usize>,

        /// Keep LaTeX emphasis as Markdown
        #[arg(long)]
        markdown_emphasis: bool,
    },

    /// Export records from a library
    Export {
        /// Library file
        #[arg(short = 'l', long)]
        library: PathBuf,

        /// Target format
        #[arg(short = 't', long)]
        to: Format,

        /// Record ids (default: all)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<RecordId>,

        /// Output file, or a directory to write a timestamped file into
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        #[arg(long)]
        no_abstracts: bool,

        #[arg(long)]
        no_keywords: bool,

        #[arg(long)]
        no_urls: bool,

        /// Include unmapped passthrough fields
        #[arg(long)]
        extra_fields: bool,

        /// Add a usage count column (CSV only)
        #[arg(long)]
        usage_count: bool,
    },

    /// Print the most likely delimiter of a delimited text file
    Delimiter {
        input: PathBuf,
    },
}

fn read(path: &Path) -> Result<String, InterchangeError> {
    fs::read_to_string(path).map_err(|e| InterchangeError::Io {
        message: format!("{}: {}", path.display(), e),
    })
}

fn write_output(output: Option<&Path>, default_name: &str, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) if path.is_dir() => {
            let path = path.join(default_name);
            fs::write(&path, content)?;
            info!(path = %path.display(), "wrote export");
        }
        Some(path) => {
            fs::write(path, content)?;
            info!(path = %path.display(), "wrote export");
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn print_import_summary(report: &ImportReport) {
    let stats = &report.statistics;
    println!(
        "{}: {} processed, {} created, {} updated, {} skipped, {} failed",
        stats.format.map_or("unknown", |f| f.name()),
        stats.total,
        stats.created,
        stats.updated,
        stats.skipped,
        stats.failed.len()
    );
    for failure in &stats.failed {
        eprintln!("  {}", failure);
    }
}

/// Parse `content` as `from` and serialize the readable records as `to`
fn convert(
    content: &str,
    from: Format,
    to: Format,
    config: &RefportConfig,
) -> Result<ExportPayload, Box<dyn std::error::Error>> {
    config.validate()?;
    let parsed = handler_for(from).parse_records(content, &ParseOptions::from(&config.import))?;

    let mut references = Vec::with_capacity(parsed.len());
    for record in parsed {
        match record {
            Ok(reference) => references.push(reference),
            Err(e) => warn!(record = %e.identifier, error = %e.error, "skipped record"),
        }
    }

    let payload = export_references(&references, to, &ExportOptions::from(&config.export))?;
    info!(%from, %to, records = references.len(), "converted");
    Ok(payload)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => RefportConfig::load(path)?,
        None => RefportConfig::default(),
    };

    match cli.command {
        Commands::Detect { input } => {
            let content = read(&input)?;
            let format = Format::resolve(None, input.to_str(), &content)?;
            println!("{}", format);
        }

        Commands::Convert {
            input,
            from,
            to,
            output,
            markdown_emphasis,
        } => {
            if markdown_emphasis {
                config.import.emphasis = EmphasisMode::Markdown;
            }
            let content = read(&input)?;
            let from = Format::resolve(from, input.to_str(), &content)?;
            let payload = convert(&content, from, to, &config)?;
            write_output(output.as_deref(), &payload.filename, &payload.content)?;
        }

        Commands::Import {
            input,
            library,
            from,
            update_existing,
            batch_size,
            markdown_emphasis,
        } => {
            if update_existing {
                config.import.update_existing = true;
            }
            if let Some(size) = batch_size {
                config.import.batch_size = size;
            }
            if markdown_emphasis {
                config.import.emphasis = EmphasisMode::Markdown;
            }
            config.validate()?;

            let mut library = Library::open(library)?;
            let mut options = ImportOptions::from(&config.import);
            options.format = from;
            let report = Importer::new(&mut library.store, options).import_file(&input)?;
            library.save()?;
            print_import_summary(&report);
        }

        Commands::Export {
            library,
            to,
            ids,
            output,
            no_abstracts,
            no_keywords,
            no_urls,
            extra_fields,
            usage_count,
        } => {
            let export = &mut config.export;
            export.include_abstracts &= !no_abstracts;
            export.include_keywords &= !no_keywords;
            export.include_urls &= !no_urls;
            export.include_extra_fields |= extra_fields;
            export.include_usage_count |= usage_count;
            config.validate()?;

            let library = Library::open(library)?;
            let ids = if ids.is_empty() {
                library.store.ids()
            } else {
                ids
            };

            let payload = Exporter::new(&library.store, ExportOptions::from(&config.export))
                .export_ids(&ids, to)?;
            for failure in &payload.statistics.failed {
                eprintln!("  {}", failure);
            }
            write_output(output.as_deref(), &payload.filename, &payload.content)?;
        }

        Commands::Delimiter { input } => {
            let content = read(&input)?;
            let name = match detect_delimiter(&content) {
                '\t' => "tab".to_string(),
                other => other.to_string(),
            };
            println!("{}", name);
        }
    }

    Ok(())
}
