//! Nameless Loader CLI - Load CSV event exports into BigQuery
//!
//! # Commands
//!
//! ```bash
//! nameless-loader load events.csv --project my-project --dataset analytics
//! nameless-loader preview events.csv -o documents.json   # Dry run, no network
//! nameless-loader columns --variant compact              # Accepted CSV columns
//! ```
//!
//! `--project`, `--dataset` and `--credentials` also read `NAMELESS_PROJECT_ID`,
//! `NAMELESS_DATASET_ID` and `NAMELESS_CREDENTIALS` (a `.env` file is honoured).

use clap::{Parser, Subcommand};
use nameless_loader::config::{DEFAULT_LOG_TABLE, DEFAULT_TABLE, DEFAULT_TIMEOUT_SECS};
use nameless_loader::warehouse::DEFAULT_API_BASE_URL;
use nameless_loader::{prepare, run, Destination, LoaderConfig, SchemaVariant};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nameless-loader")]
#[command(about = "Load CSV event exports into BigQuery as nested event documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a CSV file and append it to the events table as one batch
    Load {
        /// Input CSV file
        input: PathBuf,

        /// Google Cloud project id
        #[arg(long, env = "NAMELESS_PROJECT_ID")]
        project: String,

        /// BigQuery dataset id
        #[arg(long, env = "NAMELESS_DATASET_ID")]
        dataset: String,

        /// Events table
        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,

        /// Audit log table
        #[arg(long, default_value = DEFAULT_LOG_TABLE)]
        log_table: String,

        /// Table layout of the destination
        #[arg(long, value_enum, default_value_t = SchemaVariant::Standard)]
        variant: SchemaVariant,

        /// Service-account key or access token file (default: BIGQUERY_ACCESS_TOKEN)
        #[arg(long, env = "NAMELESS_CREDENTIALS")]
        credentials: Option<PathBuf>,

        /// CSV delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// BigQuery REST endpoint
        #[arg(long, default_value = DEFAULT_API_BASE_URL)]
        api_url: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
    },

    /// Transform a CSV file and print the event documents without uploading
    Preview {
        /// Input CSV file
        input: PathBuf,

        /// Table layout to build
        #[arg(long, value_enum, default_value_t = SchemaVariant::Standard)]
        variant: SchemaVariant,

        /// CSV delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the columns a CSV may carry for a table layout
    Columns {
        /// Table layout to describe
        #[arg(long, value_enum, default_value_t = SchemaVariant::Standard)]
        variant: SchemaVariant,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Load {
            input,
            project,
            dataset,
            table,
            log_table,
            variant,
            credentials,
            delimiter,
            api_url,
            timeout,
        } => {
            let mut config = LoaderConfig::new(input, Destination::new(project, dataset).with_tables(table, log_table));
            config.variant = variant;
            config.delimiter = delimiter;
            config.credentials_path = credentials;
            config.api_base_url = api_url;
            config.timeout_secs = timeout;
            cmd_load(&config).await
        }

        Commands::Preview {
            input,
            variant,
            delimiter,
            output,
        } => cmd_preview(&input, variant, delimiter, output.as_deref()),

        Commands::Columns { variant } => cmd_columns(variant),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_load(config: &LoaderConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("NAMELESS ANALYTICS");
    println!("BATCH DATA LOADER");
    println!();

    let delivery = run(config).await?;

    println!();
    println!(
        "✨ Done! {} rows, job {}",
        delivery.outcome.rows_inserted, delivery.job_id
    );
    Ok(())
}

fn cmd_preview(
    input: &Path,
    variant: SchemaVariant,
    delimiter: char,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Only the source path matters for a dry run
    let mut config = LoaderConfig::new(input, Destination::new("preview", "preview"));
    config.variant = variant;
    config.delimiter = delimiter;
    config.validate()?;

    let batch = prepare(&config)?;
    eprintln!("   Columns: {}", batch.headers.join(", "));

    let json = serde_json::to_string_pretty(&batch.documents)?;
    write_output(&json, output)?;
    Ok(())
}

fn cmd_columns(variant: SchemaVariant) -> Result<(), Box<dyn std::error::Error>> {
    let schema = variant.descriptor();

    println!("📋 {} layout\n", variant);
    println!("Scalar columns:");
    for field in schema.scalars {
        let flag = if field.required { "required" } else { "optional" };
        println!("  {:<16} {}", field.name, flag);
    }

    println!("\nGroup prefixes:");
    for group in schema.groups {
        println!("  {}.<field>", group.name());
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
