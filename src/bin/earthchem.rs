//! earthchem - compositional transforms for geochemical tables
//!
//! Command-line interface over the earthchem transform library.

use clap::{Parser, Subcommand, ValueEnum};
use earthchem::data::{delimiter_for_path, tidy_columns, CompositionTable};
use earthchem::error::{EarthchemError, Result};
use earthchem::pipeline::{Pipeline, PipelineConfig};
use earthchem::transform::{
    basis_matrix, close_table, Alr, Barycentric, BaseFeature, Clr, Ilr, ReversibleTransform,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CLI-friendly transform enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    /// Centered log-ratio
    Clr,
    /// Additive log-ratio (see --base)
    Alr,
    /// Isometric log-ratio
    Ilr,
    /// Ternary projection of 3-part data (no inverse)
    Barycentric,
}

/// Compositional data transforms for geochemical tables
#[derive(Parser)]
#[command(name = "earthchem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a log-ratio or barycentric transform to a table
    Transform {
        /// Transform to apply
        #[arg(short, long, value_enum)]
        method: Method,

        /// Apply the inverse transform instead
        #[arg(long)]
        inverse: bool,

        /// ALR reference part: a zero-based index or 'last'
        #[arg(short, long, default_value = "0", value_parser = parse_base)]
        base: BaseFeature,

        /// Path to input table (CSV, or TSV for .tsv/.txt)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Close every sample to a fixed total
    Close {
        /// Path to input table
        #[arg(short, long)]
        input: PathBuf,

        /// Total each sample should sum to (1 for fractions, 100 for wt%)
        #[arg(short, long, default_value = "1.0")]
        total: f64,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the ILR basis matrix for a number of parts
    Basis {
        /// Number of parts (at least 2)
        #[arg(short = 'd', long)]
        parts: usize,
    },

    /// Normalise headers and order columns (others, majors, traces)
    Tidy {
        /// Path to input table
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to input table
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_base(s: &str) -> std::result::Result<BaseFeature, String> {
    s.parse::<BaseFeature>().map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform {
            method,
            inverse,
            base,
            input,
            output,
        } => cmd_transform(method, inverse, base, &input, output.as_deref()),
        Commands::Close {
            input,
            total,
            output,
        } => cmd_close(&input, total, output.as_deref()),
        Commands::Basis { parts } => cmd_basis(parts),
        Commands::Tidy { input, output } => cmd_tidy(&input, output.as_deref()),
        Commands::Run {
            config,
            input,
            output,
        } => cmd_run(&config, &input, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load(input: &Path) -> Result<CompositionTable> {
    let table = CompositionTable::from_path(input)?;
    info!(
        "Loaded {} samples x {} parts from {:?}",
        table.n_samples(),
        table.n_parts(),
        input
    );
    Ok(table)
}

/// Write to `output`, or to stdout using the input's delimiter.
fn write(table: &CompositionTable, input: &Path, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            table.to_path(path)?;
            info!("Wrote {} samples x {} parts to {:?}", table.n_samples(), table.n_parts(), path);
            Ok(())
        }
        None => table.to_writer(std::io::stdout().lock(), delimiter_for_path(input)),
    }
}

fn cmd_transform(
    method: Method,
    inverse: bool,
    base: BaseFeature,
    input: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let table = load(input)?;

    let result = match (method, inverse) {
        (Method::Clr, false) => table.transform(&Clr),
        (Method::Clr, true) => table.inverse_transform(&Clr),
        (Method::Alr, false) => table.transform(&Alr::new(base)),
        (Method::Alr, true) => table.inverse_transform(&Alr::new(base)),
        (Method::Ilr, false) => table.transform(&Ilr),
        (Method::Ilr, true) => table.inverse_transform(&Ilr),
        (Method::Barycentric, false) => table.transform(&Barycentric),
        (Method::Barycentric, true) => Err(EarthchemError::InvalidParameter(
            "Barycentric projection has no inverse".to_string(),
        )),
    }?;

    info!("Applied {:?}{}", method, if inverse { " inverse" } else { "" });
    write(&result, input, output)
}

fn cmd_close(input: &Path, total: f64, output: Option<&Path>) -> Result<()> {
    let table = load(input)?;
    let closed = close_table(&table, total)?;
    write(&closed, input, output)
}

fn cmd_basis(parts: usize) -> Result<()> {
    let psi = basis_matrix(parts)?;
    let coords: Vec<String> = (1..parts).map(|i| format!("ilr_{}", i)).collect();
    let table = CompositionTable::new(psi, Ilr.backward_labels(&coords), coords)?
        .with_index_label("coordinate");
    table.to_writer(std::io::stdout().lock(), b',')
}

fn cmd_tidy(input: &Path, output: Option<&Path>) -> Result<()> {
    let table = load(input)?;
    let tidy = tidy_columns(&table)?;
    write(&tidy, input, output)
}

fn cmd_run(config_path: &Path, input: &Path, output: Option<&Path>) -> Result<()> {
    info!("Loading pipeline configuration from {:?}", config_path);
    let config_str = std::fs::read_to_string(config_path)?;
    let config = PipelineConfig::from_yaml(&config_str)?;

    let table = load(input)?;
    let result = Pipeline::from_config(&config).run(&table)?;

    info!("Pipeline '{}' done: {} steps", config.name, config.steps.len());
    write(&result, input, output)
}
