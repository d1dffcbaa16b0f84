mod analysis;
mod common;
mod config;
mod parsing;
mod stats;

use std::io;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use analysis::{generate_asymptotic_analysis, generate_overview, generate_tables};
use config::AnalysisConfig;
use parsing::{parse_records, read_input_path};

/// Errors that can occur during analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Parsing error: {0}")]
    Parsing(#[from] parsing::ParsingError),

    #[error("Asymptotic analysis error: {0}")]
    Asymptotic(#[from] analysis::asymptotic::AsymptoticError),

    #[error("Table generation error: {0}")]
    Tables(#[from] analysis::tables::TableError),

    #[error("Overview error: {0}")]
    Overview(#[from] analysis::overview::OverviewError),
}

type Result<T> = core::result::Result<T, AnalysisError>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // The results file path arrives on stdin
    let input_file = read_input_path(io::stdin().lock())?;
    let records = parse_records(&input_file)?;

    let config = AnalysisConfig::default();

    // Model charts and ranking
    generate_asymptotic_analysis(&records, &config)?;

    // LaTeX tables, also echoed to stdout
    generate_tables(&records, &config)?;

    // Exploratory overview
    generate_overview(&records, &config)?;

    Ok(())
}
