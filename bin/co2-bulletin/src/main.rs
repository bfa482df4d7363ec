//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Command line entrypoint for the daily CO2 bulletin."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use co2_calc_engine::analyze_generation;
use co2_calc_engine::emissions::EmissionFactorMap;
use co2_calc_engine::io::load_generation_table_from_file;
use co2_calc_engine::reports::{Language, ReportComposer};
use co2_common::config::AppConfig;
use co2_common::init_tracing;
use co2_core::{current_window, BulletinPipeline, RunOutcome};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Daily CO2 bulletin for the Brazilian interconnected grid",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", global = true, help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Fetch the latest window, compose the bulletin and publish it")]
    Run {
        #[arg(long, value_name = "YYYY-MM-DD", help = "Reference date of the run (default today)")]
        reference_date: Option<NaiveDate>,
        #[arg(long, value_name = "N", help = "Days fetched: trailing window plus the reported day")]
        offset: Option<usize>,
        #[arg(long, help = "Compose the bulletin without publishing it")]
        dry_run: bool,
    },
    #[command(about = "Compute the bulletin offline from a JSON or CSV generation table")]
    Compute {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        #[arg(long, help = "Use the [factors] table of the configuration instead of the built-in one")]
        factors_from_config: bool,
        #[arg(long, value_enum, help = "Override the bulletin language")]
        language: Option<CliLanguage>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLanguage {
    PtBr,
    En,
}

impl From<CliLanguage> for Language {
    fn from(value: CliLanguage) -> Self {
        match value {
            CliLanguage::PtBr => Language::PtBr,
            CliLanguage::En => Language::En,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/bulletin.toml"));
    candidates.push(PathBuf::from("configs/bulletin.example.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    init_tracing("co2-bulletin", &config.logging)?;
    match &loaded.source {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found, running with defaults"),
    }

    match cli.command {
        Commands::Run {
            reference_date,
            offset,
            dry_run,
        } => {
            if let Some(date) = reference_date {
                config.run.reference_date = Some(date);
            }
            if let Some(offset) = offset {
                config.run.offset = offset;
            }
            config.run.dry_run |= dry_run;
            run(&config).await
        }
        Commands::Compute {
            input,
            factors_from_config,
            language,
        } => {
            if let Some(language) = language {
                config.report.language = language.into();
            }
            compute(&config, &input, factors_from_config)
        }
    }
}

async fn run(config: &AppConfig) -> Result<()> {
    let pipeline = BulletinPipeline::from_config(config)?;
    let window = current_window(config);
    match pipeline.run_once(window).await? {
        RunOutcome::Published { .. } => {
            info!(last_day = %window.last_day(), "bulletin published");
        }
        RunOutcome::DryRun { report, .. } => println!("{report}"),
        RunOutcome::Skipped { reason } => info!(%reason, "bulletin skipped"),
    }
    Ok(())
}

fn compute(config: &AppConfig, input: &Path, factors_from_config: bool) -> Result<()> {
    let table = load_generation_table_from_file(input)
        .with_context(|| format!("loading generation table from {}", input.display()))?;
    let factors = if factors_from_config {
        config.factor_map()?
    } else {
        EmissionFactorMap::canonical()
    };
    let summary = analyze_generation(&table, &factors).with_context(|| {
        format!(
            "analyzing generation for {}..{}",
            table.first_date(),
            table.last_date()
        )
    })?;
    if let Some(directory) = &config.export.directory {
        summary.exporter().export(directory)?;
    }
    println!("{}", summary.compose(&ReportComposer::new(config.report)));
    Ok(())
}
