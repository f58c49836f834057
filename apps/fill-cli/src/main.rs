//! Template Fill CLI
//!
//! Runs the fill engine against JSON documents of the form
//! `{ "controls": [...] }`. Results go to stdout as JSON; logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use fill_engine::host::memory::DocumentFile;
use fill_engine::{
    DatasetStore, DatasetValidator, EngineConfig, FillEngine, FillOptions, FillStatus, JsonDirStore,
    ListOptions, MemoryDocument, SchemaValidator,
};
use serde::Serialize;
use shared_types::{DatePattern, Dataset, Schema};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "template-fill")]
#[command(version, about = "Fill document templates from structured datasets")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

/// Overrides for settings that are otherwise read from TEMPLATE_FILL_* variables
#[derive(Args, Debug, Default)]
struct EngineArgs {
    /// Scan cache lifetime in milliseconds
    #[arg(long, global = true)]
    scan_ttl_ms: Option<u64>,

    /// Number of undo levels kept
    #[arg(long, global = true)]
    max_undo_depth: Option<usize>,

    /// Default date pattern: long, long_ordinal, day_month_year, us, eu or iso
    #[arg(long, global = true)]
    date_pattern: Option<String>,

    /// Default currency symbol
    #[arg(long, global = true)]
    currency_symbol: Option<String>,

    /// Extra text that marks a control as unfilled (repeatable)
    #[arg(long = "unfilled-marker", global = true)]
    unfilled_markers: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the controls found in a document
    Scan {
        #[arg(short, long)]
        document: PathBuf,
    },
    /// Match a schema's fields against a document's controls
    Map {
        #[arg(short, long)]
        document: PathBuf,
        #[arg(short, long)]
        schema: PathBuf,
    },
    /// Validate a dataset against a schema; exits non-zero when invalid
    Validate {
        #[arg(short, long)]
        schema: PathBuf,
        #[arg(long)]
        dataset: PathBuf,
    },
    /// Fill a document and write it back
    Fill {
        #[arg(short, long)]
        document: PathBuf,
        #[arg(short, long)]
        schema: PathBuf,
        /// Dataset JSON file
        #[arg(long, conflicts_with = "dataset_id")]
        dataset: Option<PathBuf>,
        /// Id of a dataset saved with `datasets save`
        #[arg(long, requires = "store_dir")]
        dataset_id: Option<String>,
        /// Dataset store directory
        #[arg(long)]
        store_dir: Option<PathBuf>,
        /// Write the filled document here instead of overwriting the input
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Fill even if validation reports blocking errors
        #[arg(long)]
        no_validate: bool,
        /// Mark controls left without a value
        #[arg(long)]
        highlight_unfilled: bool,
    },
    /// Manage saved datasets
    Datasets {
        /// Dataset store directory
        #[arg(long)]
        store_dir: PathBuf,
        #[command(subcommand)]
        action: DatasetAction,
    },
}

#[derive(Subcommand, Debug)]
enum DatasetAction {
    /// Save a dataset file into the store
    Save { file: PathBuf },
    /// List saved datasets
    List {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "0")]
        offset: usize,
        #[arg(long)]
        search: Option<String>,
    },
    /// Delete a saved dataset
    Delete { id: String },
}

fn engine_config(args: &EngineArgs) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_env()?;
    if let Some(ms) = args.scan_ttl_ms {
        config.scan_ttl = Duration::from_millis(ms);
    }
    if let Some(depth) = args.max_undo_depth {
        config.max_undo_depth = depth;
    }
    if let Some(name) = &args.date_pattern {
        config.date_pattern = match DatePattern::from_name(name) {
            Some(pattern) => pattern,
            None => bail!("Unknown date pattern: {}", name),
        };
    }
    if let Some(symbol) = &args.currency_symbol {
        config.currency_symbol = symbol.clone();
    }
    config
        .unfilled_markers
        .extend(args.unfilled_markers.iter().cloned());
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} from {}", what, path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid {} JSON in {}", what, path.display()))
}

fn read_schema(path: &Path) -> Result<Schema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema from {}", path.display()))?;
    Schema::from_json(&text).with_context(|| format!("Invalid schema in {}", path.display()))
}

fn load_engine(document: &Path, config: EngineConfig) -> Result<FillEngine<MemoryDocument>> {
    let file: DocumentFile = read_json(document, "document")?;
    Ok(FillEngine::new(MemoryDocument::from_file(file), config))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = engine_config(&cli.engine)?;

    match cli.command {
        Command::Scan { document } => {
            let mut engine = load_engine(&document, config)?;
            let outcome = engine.scan_content_controls(true).await;
            if let Some(error) = outcome.error() {
                bail!("Scan failed: {}", error);
            }
            print_json(&outcome.controls())?;
        }

        Command::Map { document, schema } => {
            let schema = read_schema(&schema)?;
            let mut engine = load_engine(&document, config)?;
            print_json(&engine.map_controls_to_schema(&schema).await)?;
        }

        Command::Validate { schema, dataset } => {
            let schema = read_schema(&schema)?;
            let dataset: Dataset = read_json(&dataset, "dataset")?;
            let report = SchemaValidator::new().validate_dataset(&schema, &dataset);
            print_json(&report)?;
            if !report.is_valid {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Fill {
            document,
            schema,
            dataset,
            dataset_id,
            store_dir,
            out,
            no_validate,
            highlight_unfilled,
        } => {
            let schema = read_schema(&schema)?;
            let mut engine = load_engine(&document, config)?;
            let options = FillOptions {
                validate_first: !no_validate,
                highlight_unfilled,
            };

            let filled = match (dataset, dataset_id, store_dir) {
                (Some(path), _, _) => {
                    let dataset: Dataset = read_json(&path, "dataset")?;
                    engine.fill_template(&schema, &dataset, options).await
                }
                (None, Some(id), Some(dir)) => {
                    let store = JsonDirStore::open(dir).await?;
                    engine.fill_from_store(&store, &schema, &id, options).await
                }
                _ => bail!("Provide --dataset or --dataset-id with --store-dir"),
            };
            let result = match filled {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Fill failed");
                    bail!(e.user_message());
                }
            };
            print_json(&result)?;

            if result.status == FillStatus::ValidationFailed {
                return Ok(ExitCode::from(2));
            }

            let target = out.unwrap_or(document);
            let json = serde_json::to_string_pretty(&engine.host().to_file())?;
            std::fs::write(&target, json)
                .with_context(|| format!("Failed to write document to {}", target.display()))?;
            tracing::info!(path = %target.display(), "Document written");
        }

        Command::Datasets { store_dir, action } => {
            let store = JsonDirStore::open(&store_dir)
                .await
                .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;
            match action {
                DatasetAction::Save { file } => {
                    let dataset: Dataset = read_json(&file, "dataset")?;
                    print_json(&store.save(dataset).await?)?;
                }
                DatasetAction::List {
                    limit,
                    offset,
                    search,
                } => {
                    let options = ListOptions {
                        limit,
                        offset,
                        search,
                    };
                    print_json(&store.list(&options).await?)?;
                }
                DatasetAction::Delete { id } => {
                    if !store.delete(&id).await? {
                        bail!("Dataset not found: {}", id);
                    }
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // stdout carries JSON only
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "template-fill",
            "--date-pattern",
            "iso",
            "--unfilled-marker",
            "TBD",
            "scan",
            "--document",
            "doc.json",
        ])
        .unwrap();
        let config = engine_config(&cli.engine).unwrap();

        assert_eq!(config.date_pattern, DatePattern::Iso);
        assert!(config.unfilled_markers.iter().any(|m| m == "TBD"));
    }

    #[test]
    fn test_unknown_date_pattern_is_rejected() {
        let args = EngineArgs {
            date_pattern: Some("lunar".into()),
            ..Default::default()
        };
        assert!(engine_config(&args).is_err());
    }

    #[test]
    fn test_dataset_id_requires_store() {
        let parsed = Cli::try_parse_from([
            "template-fill",
            "fill",
            "-d",
            "doc.json",
            "-s",
            "schema.json",
            "--dataset-id",
            "abc",
        ]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_fill_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("doc.json");
        let schema = dir.path().join("schema.json");
        let dataset = dir.path().join("data.json");
        std::fs::write(
            &document,
            r#"{"controls": [{"id": "c1", "tag": "tenant", "text": ""}]}"#,
        )
        .unwrap();
        std::fs::write(&schema, r#"{"fields": [{"id": "tenant", "type": "text"}]}"#).unwrap();
        std::fs::write(&dataset, r#"{"values": {"tenant": "Jane Doe"}}"#).unwrap();

        let cli = Cli::try_parse_from([
            "template-fill",
            "fill",
            "-d",
            document.to_str().unwrap(),
            "-s",
            schema.to_str().unwrap(),
            "--dataset",
            dataset.to_str().unwrap(),
        ])
        .unwrap();
        run(cli).await.unwrap();

        let written: DocumentFile =
            serde_json::from_str(&std::fs::read_to_string(&document).unwrap()).unwrap();
        assert_eq!(written.controls[0].text, "Jane Doe");
    }
}
