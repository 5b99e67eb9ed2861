//! @ai:module:intent CLI for resolving benchmark definitions into run sets
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use benchplan::{
    benchmark::{Benchmark, SqlQueryLoader},
    config::LoaderConfig,
    loader::BenchmarkLoader,
    resource::FileReader,
    service::{OfflineResultsService, ResultsServiceClient, ResultsServiceTrait},
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_FILE: &str = "benchplan.toml";

#[derive(Parser)]
#[command(name = "benchplan")]
#[command(about = "Expand declarative benchmark files into the list of benchmarks to run")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the benchmarks to run for a sequence
    Resolve {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Sequence identifier (defaults to the current timestamp)
        #[arg(long)]
        sequence_id: Option<String>,

        /// Skip the recently-tested check
        #[arg(long)]
        no_frequency_check: bool,

        /// Use an offline results service instead of calling the configured one
        #[arg(long)]
        dry_run: bool,

        /// Print the resolved benchmarks as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every benchmark the definitions expand to, without filtering by variables
    List {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Check that every benchmark file loads
    Validate {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct SelectionArgs {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Benchmarks directory location (overrides config)
    #[arg(long)]
    benchmarks_dir: Option<String>,

    /// SQL directory location (overrides config)
    #[arg(long)]
    sql_dir: Option<String>,

    /// Benchmark names to keep (comma-separated)
    #[arg(long)]
    active_benchmarks: Option<String>,

    /// Variable filter, e.g. "format=orc|txt,size=1GB"
    #[arg(long)]
    active_variables: Option<String>,
}

impl SelectionArgs {
    /// @ai:intent Load configuration and apply command-line overrides
    /// @ai:effects fs:read
    fn into_config(self) -> Result<LoaderConfig> {
        let mut config = load_or_default_config(self.config)?;

        if let Some(dir) = self.benchmarks_dir {
            config.benchmarks_dir = dir;
        }
        if let Some(dir) = self.sql_dir {
            config.sql_dir = dir;
        }
        if let Some(names) = self.active_benchmarks {
            config.active_benchmarks = Some(
                names
                    .split(',')
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect(),
            );
        }
        if self.active_variables.is_some() {
            config.active_variables = self.active_variables;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("benchplan=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            selection,
            sequence_id,
            no_frequency_check,
            dry_run,
            json,
        } => {
            let mut config = selection.into_config()?;
            if no_frequency_check {
                config.frequency_check_enabled = false;
            }
            let sequence_id = sequence_id
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string());

            if dry_run {
                tracing::info!("Dry run: results service is not contacted");
                resolve(config, OfflineResultsService::new(), &sequence_id, json).await
            } else {
                let service = ResultsServiceClient::new(&config.service)?;
                resolve(config, service, &sequence_id, json).await
            }
        }
        Commands::List { selection } => list_benchmarks(selection.into_config()?),
        Commands::Validate { selection } => validate(selection.into_config()?),
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Load the run set and print it
/// @ai:effects fs:read, network, io
async fn resolve<S: ResultsServiceTrait>(
    config: LoaderConfig,
    service: S,
    sequence_id: &str,
    json: bool,
) -> Result<()> {
    let loader = create_loader(config, service);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling benchmark loading");
            on_interrupt.cancel();
        }
    });

    let benchmarks = loader
        .load(sequence_id, &cancel)
        .await
        .context("Could not load benchmarks")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&benchmarks)?);
    } else {
        print_benchmarks(&benchmarks);
    }

    Ok(())
}

fn create_loader<S: ResultsServiceTrait>(config: LoaderConfig, service: S) -> BenchmarkLoader<S, SqlQueryLoader> {
    let query_loader = SqlQueryLoader::new(
        FileReader::new(config.classpath_roots.clone()),
        config.sql_dir.clone(),
    );
    BenchmarkLoader::new(config, service, query_loader)
}

fn print_benchmarks(benchmarks: &[Benchmark]) {
    println!("Benchmarks ({}):", benchmarks.len());
    println!();
    println!(
        "{:<40} {:<15} {:<6} {:<9} {:<12} {:<10}",
        "Name", "Data Source", "Runs", "Prewarms", "Concurrency", "Queries"
    );
    println!("{}", "-".repeat(96));

    for benchmark in benchmarks {
        println!(
            "{:<40} {:<15} {:<6} {:<9} {:<12} {:<10}",
            benchmark.unique_name().unwrap_or(benchmark.name()),
            benchmark.data_source(),
            benchmark.runs(),
            benchmark.prewarm_runs(),
            benchmark.concurrency(),
            benchmark.queries().len()
        );
    }
}

fn list_benchmarks(config: LoaderConfig) -> Result<()> {
    let loader = create_loader(config, OfflineResultsService::new());
    let benchmarks = loader
        .load_all_benchmarks("list")
        .context("Could not load benchmarks")?;

    print_benchmarks(&benchmarks);
    Ok(())
}

fn validate(config: LoaderConfig) -> Result<()> {
    let loader = create_loader(config, OfflineResultsService::new());
    let (dir, files) = loader.find_benchmark_files()?;
    let benchmarks = loader
        .load_benchmark_files(&dir, &files, "validate")
        .context("Benchmark validation failed")?;

    println!("Benchmark validation passed!");
    println!("Total files: {}", files.len());
    println!("Total benchmarks: {}", benchmarks.len());

    for benchmark in &benchmarks {
        println!("  - {} ({})", benchmark.name(), benchmark.data_source());
    }

    Ok(())
}

fn init_config(output: PathBuf) -> Result<()> {
    let config = LoaderConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

fn load_or_default_config(path: Option<PathBuf>) -> Result<LoaderConfig> {
    match path {
        Some(p) => LoaderConfig::load(&p).with_context(|| format!("Failed to load {}", p.display())),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);

            if default_path.exists() {
                LoaderConfig::load(&default_path)
            } else {
                Ok(LoaderConfig::default())
            }
        }
    }
}
