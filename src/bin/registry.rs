//! Capability Registry CLI
//!
//! Ingests, validates, converts, and searches capability documents.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use enact_registry::{
    embedding, ingest, parse, transform, CapabilityStore, DocumentFormat, FileStore,
    FormatVersion, RegistryConfig, RegistryError, SchemaRegistry,
};

#[derive(Parser)]
#[command(name = "enact-registry")]
#[command(about = "Capability registry for Enact protocol documents")]
struct Cli {
    /// Path to a config file (defaults to enact.toml discovery)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the store path from config
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one or more capability files (YAML or JSON)
    Ingest {
        files: Vec<PathBuf>,
        /// Reject documents with validation errors
        #[arg(long)]
        strict: bool,
        /// Store under this format version instead of the document's own
        #[arg(long)]
        format: Option<String>,
    },

    /// Print a stored capability
    Get {
        id: String,
        /// Convert to this format version
        #[arg(long)]
        format: Option<String>,
    },

    /// List stored capabilities
    List {
        /// Convert listed content to this format version
        #[arg(long)]
        format: Option<String>,
    },

    /// Search capabilities by fuzzy match on id, name, and description
    Search {
        query: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Validate a capability file without storing it
    Validate {
        file: PathBuf,
        #[arg(long)]
        strict: bool,
    },

    /// Convert a capability file between format versions
    Convert {
        file: PathBuf,
        /// Source version (defaults to the document's enact field)
        #[arg(long)]
        from: Option<String>,
        /// Target version
        #[arg(long)]
        to: String,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a stored capability
    Delete { id: String },

    /// List registered schema versions
    Schemas,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = RegistryConfig::load_from(cli.config.as_deref())?;
    if let Some(store_path) = cli.store {
        config.store.path = store_path;
    }

    let mut schemas = SchemaRegistry::new();
    if let Some(dir) = &config.schemas.dir {
        let loaded = schemas.load_dir(dir)?;
        println!("Loaded {loaded} schema(s) from {}", dir.display());
    }

    let mut store = FileStore::open(config.store_path())?;

    match cli.command {
        Commands::Ingest {
            files,
            strict,
            format,
        } => {
            let strict = strict || config.validation.strict;
            let target = format.map(|f| FormatVersion::parse(&f)).transpose()?;
            let mut failures = 0;

            for file in &files {
                match ingest_one(&mut store, &schemas, file, strict, target.as_ref()) {
                    Ok(warnings) => {
                        println!("✓ {}", file.display());
                        for warning in warnings {
                            println!("  warning: {warning}");
                        }
                    }
                    // One bad file must not abort the batch
                    Err(e) => {
                        failures += 1;
                        eprintln!("✗ {}: {e}", file.display());
                    }
                }
            }

            println!("Ingested {} of {} file(s)", files.len() - failures, files.len());
            if failures > 0 {
                return Err(format!("{failures} file(s) failed").into());
            }
        }

        Commands::Get { id, format } => {
            let target = format.map(|f| FormatVersion::parse(&f)).transpose()?;
            match store.get_by_id(&id, target.as_ref())? {
                Some(content) => println!("{content}"),
                None => return Err(Box::new(RegistryError::NotFound(id))),
            }
        }

        Commands::List { format } => {
            let target = format.map(|f| FormatVersion::parse(&f)).transpose()?;
            let records = store.list_all(target.as_ref())?;
            if records.is_empty() {
                println!("No capabilities stored");
            }
            for record in records {
                println!(
                    "{}  {}  {}  [{}]  {}",
                    record.id,
                    record.version,
                    record.capability_type,
                    record.format_version,
                    record.description
                );
            }
        }

        Commands::Search { query, limit } => {
            let records = store.list_all(None)?;
            let hits = embedding::search(&records, &query, None, limit)?;
            if hits.is_empty() {
                println!("No matches for '{query}'");
            }
            for hit in hits {
                println!("{:>8.2}  {}  {}", hit.score, hit.id, hit.description);
            }
        }

        Commands::Validate { file, strict } => {
            let content = std::fs::read_to_string(&file)?;
            let document = parse::parse_document(&content)?;
            let report = schemas.validate_document(&document, strict, None);

            for warning in &report.warnings {
                println!("warning: {warning}");
            }
            for error in &report.errors {
                println!("error: {error}");
            }
            if report.valid {
                println!("✓ {} is valid", file.display());
            } else {
                return Err(Box::new(RegistryError::Validation(report.errors)));
            }
        }

        Commands::Convert {
            file,
            from,
            to,
            output,
        } => {
            let content = std::fs::read_to_string(&file)?;
            let serialization = DocumentFormat::detect(&content);
            let document = parse::parse_document(&content)?;

            let source = match from {
                Some(f) => FormatVersion::parse(&f)?,
                None => match document.get("enact").and_then(|v| v.as_str()) {
                    Some(s) => FormatVersion::parse(s)?,
                    None => FormatVersion::parse(&config.format.default_version)?,
                },
            };
            let target = FormatVersion::parse(&to)?;

            let converted = transform::transform(&document, &source, &target);
            let rendered = parse::serialize_document(&converted, serialization)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Wrote {} ({source} → {target})", path.display());
                }
                None => println!("{rendered}"),
            }
        }

        Commands::Delete { id } => {
            store.delete(&id)?;
            println!("Deleted {id}");
        }

        Commands::Schemas => {
            for version in schemas.versions() {
                println!("{version}");
            }
        }
    }

    Ok(())
}

/// Ingest one file through the library pipeline. Returns validation
/// warnings on success.
fn ingest_one(
    store: &mut FileStore,
    schemas: &SchemaRegistry,
    file: &PathBuf,
    strict: bool,
    target: Option<&FormatVersion>,
) -> Result<Vec<String>, RegistryError> {
    let content = std::fs::read_to_string(file)?;
    let (_, warnings) = ingest::ingest(store, schemas, &content, strict, target, None)?;
    Ok(warnings)
}
