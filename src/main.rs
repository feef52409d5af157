//! BRR Movement CLI
//!
//! Corrects a regulatory asset base to a reference date, depreciates it up to
//! a horizon and checks the movement against the financing rate.
//! Every flag can also be given through its `BRR_*` environment variable.

use anyhow::{bail, Context, Result};
use brr_movement::dates::parse_date;
use brr_movement::eligibility::load_register;
use brr_movement::export::{export_run, RunDigest};
use brr_movement::index::load_index;
use brr_movement::ledger::load_ledger;
use brr_movement::movement::{MovementConfig, MovementEngine, DEFAULT_FINANCING_RATE};
use brr_movement::report::render_summary;
use chrono::NaiveDate;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "brr_movement")]
#[command(about = "Move a regulatory asset base (BRR) to a horizon date and reconcile it")]
struct Args {
    /// Asset ledger CSV
    #[arg(long, env = "BRR_LEDGER")]
    ledger: PathBuf,

    /// Price index CSV (columns ano,mes,indice)
    #[arg(long, env = "BRR_INDEX")]
    index: PathBuf,

    /// Eligibility events CSV (columns iu,data,elegibilidade)
    #[arg(long, env = "BRR_EVENTS")]
    events: Option<PathBuf>,

    /// Prices every value is restated at (dd/mm/yyyy or yyyy-mm-dd)
    #[arg(long, env = "BRR_REFERENCE_DATE", value_parser = parse_date_arg)]
    reference_date: Option<NaiveDate>,

    /// Last evaluation date (dd/mm/yyyy or yyyy-mm-dd)
    #[arg(long, env = "BRR_HORIZON_DATE", value_parser = parse_date_arg)]
    horizon_date: Option<NaiveDate>,

    /// Annual financing rate as a fraction (0.1182768 = 11.82768%)
    #[arg(long, env = "BRR_FINANCING_RATE")]
    financing_rate: Option<f64>,

    /// JSON run configuration; flags take precedence over its values
    #[arg(long, env = "BRR_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the exported CSV files
    #[arg(long, env = "BRR_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Print the run as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

/// Run configuration as read from a JSON file; every field optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    monetary_reference_date: Option<NaiveDate>,
    horizon_date: Option<NaiveDate>,
    financing_rate: Option<f64>,
}

fn parse_date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn resolve_config(args: &Args) -> Result<MovementConfig> {
    let file = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str::<ConfigFile>(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ConfigFile::default(),
    };

    let Some(reference) = args.reference_date.or(file.monetary_reference_date) else {
        bail!("A monetary reference date is required (--reference-date or config file)");
    };
    let Some(horizon) = args.horizon_date.or(file.horizon_date) else {
        bail!("A horizon date is required (--horizon-date or config file)");
    };
    let rate = args
        .financing_rate
        .or(file.financing_rate)
        .unwrap_or(DEFAULT_FINANCING_RATE);

    Ok(MovementConfig::new(reference, horizon).with_financing_rate(rate))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    let start = Instant::now();

    let ledger = load_ledger(&args.ledger)
        .with_context(|| format!("Failed to load ledger {}", args.ledger.display()))?;
    let index = load_index(&args.index)
        .with_context(|| format!("Failed to load index {}", args.index.display()))?;
    let register = args
        .events
        .as_ref()
        .map(|path| {
            load_register(path)
                .with_context(|| format!("Failed to load eligibility events {}", path.display()))
        })
        .transpose()?;

    let rtp = ledger.tariff_review_cycle();
    let engine = MovementEngine::new(index, register, config);
    let result = engine.run(&ledger).context("Movement failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&RunDigest::new(&result))?);
    } else {
        print!("{}", render_summary(&result));
        println!("Completed in {:?}", start.elapsed());
    }

    if let Some(dir) = &args.output_dir {
        let paths = export_run(&result, rtp, dir)
            .with_context(|| format!("Failed to export to {}", dir.display()))?;
        if !args.json {
            for path in paths {
                println!("Exported {}", path.display());
            }
        }
    }

    Ok(())
}
