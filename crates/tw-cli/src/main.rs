//! tagweight CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tw_core::{Category, Variation};
use tw_engine::ScaleFactorEngine;

mod config;
mod events;

#[derive(Parser)]
#[command(name = "tagweight")]
#[command(about = "tagweight - flavour-tagging scale factors and event weights")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute per-event weights for a file of events
    Weights {
        /// Tool settings (JSON or YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Events JSON (`{"events": [{"jets": [...], "fat_jets": [...]}]}`)
        #[arg(short, long)]
        input: PathBuf,

        /// Systematic shift in units of the calibration uncertainty
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        sigma: f64,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Threads (0 = auto).
        #[arg(long, default_value = "0")]
        threads: usize,
    },

    /// Evaluate the scale factor and weights of a single object
    ScaleFactor {
        /// Tool settings (JSON or YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Hadron flavour code (5 = b, 4/15 = c, else light)
        #[arg(long, allow_hyphen_values = true)]
        flavour: i32,

        /// Transverse momentum (GeV)
        #[arg(long)]
        pt: f64,

        /// Pseudorapidity
        #[arg(long, allow_hyphen_values = true)]
        eta: f64,

        /// Systematic shift in units of the calibration uncertainty
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        sigma: f64,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize the calibration tables a configuration selects
    Inspect {
        /// Tool settings (JSON or YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Weights { config, input, sigma, output, threads } => {
            cmd_weights(&config, &input, sigma, output.as_ref(), threads)
        }
        Commands::ScaleFactor { config, flavour, pt, eta, sigma, output } => {
            cmd_scale_factor(&config, flavour, pt, eta, sigma, output.as_ref())
        }
        Commands::Inspect { config, output } => cmd_inspect(&config, output.as_ref()),
    }
}

fn cmd_weights(
    config: &PathBuf,
    input: &PathBuf,
    sigma: f64,
    output: Option<&PathBuf>,
    threads: usize,
) -> Result<()> {
    if threads > 0 {
        // Best-effort; if a global pool already exists, keep going.
        let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
    }

    let tool = config::load_tool(config)?;
    let file = events::read_events(input)?;
    let weights = events::event_weights(tool.engine()?, &file.events, sigma)?;
    tracing::info!(events = weights.len(), sigma, "weights computed");

    write_json(
        output,
        serde_json::json!({
            "sigma": sigma,
            "n_events": weights.len(),
            "weights": weights,
        }),
    )
}

fn cmd_scale_factor(
    config: &PathBuf,
    flavour: i32,
    pt: f64,
    eta: f64,
    sigma: f64,
    output: Option<&PathBuf>,
) -> Result<()> {
    let tool = config::load_tool(config)?;
    let engine = tool.engine()?;
    let category = ScaleFactorEngine::classify(flavour);

    let context = || format!("{category} object at pt={pt}, eta={eta}, sigma={sigma}");
    let scale_factor = engine.scale_factor(category, eta, pt, sigma).with_context(context)?;
    let weight_tagged = engine.category_weight(category, eta, pt, true, sigma).with_context(context)?;
    let weight_untagged =
        engine.category_weight(category, eta, pt, false, sigma).with_context(context)?;

    write_json(
        output,
        serde_json::json!({
            "category": category,
            "scale_factor": scale_factor,
            "weight_tagged": weight_tagged,
            "weight_untagged": weight_untagged,
        }),
    )
}

fn cmd_inspect(config: &PathBuf, output: Option<&PathBuf>) -> Result<()> {
    let tool = config::load_tool(config)?;
    let engine = tool.engine()?;

    let tables: Vec<serde_json::Value> = Variation::ALL
        .iter()
        .map(|&variation| {
            let table = engine.table(variation);
            let categories: Vec<serde_json::Value> = Category::ALL
                .iter()
                .map(|&category| {
                    serde_json::json!({
                        "category": category,
                        "entries": table.entries(category).len(),
                        "eta_domain": table.eta_domain(category),
                        "folds_eta": table.folds_eta(category),
                        "pt_range_at_eta0": table.valid_pt_range(category, 0.0).ok(),
                    })
                })
                .collect();
            serde_json::json!({
                "variation": variation,
                "entries": table.len(),
                "categories": categories,
            })
        })
        .collect();

    write_json(
        output,
        serde_json::json!({
            "working_point": engine.config(),
            "efficiency": engine.efficiency_provider().name(),
            "tables": tables,
        }),
    )
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
