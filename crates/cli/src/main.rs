//! fcost - serverless migration cost comparison
//!
//! Prices a cluster snapshot as it runs today, as a direct move onto
//! serverless pods, and under each resource sizing strategy.

mod commands;
mod config;
mod output;
mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{compare, tier};
use cost_lib::{Architecture, ChargeType, ResourceVector};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Serverless cost comparison CLI
#[derive(Parser)]
#[command(name = "fcost")]
#[command(author, version, about = "Compare serverful and serverless cluster costs", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ~/.config/fcost/config.toml)
    #[arg(long, env = "FCOST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare the cost of a cluster snapshot across platforms and strategies
    Compare {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Cluster id used in report names
        #[arg(long)]
        cluster_id: Option<String>,

        /// Time span in seconds the costs cover
        #[arg(long)]
        time_span: Option<u64>,

        /// Discount factor applied to every price
        #[arg(long)]
        discount: Option<f64>,

        /// Where reports go
        #[arg(long)]
        output_mode: Option<output::OutputMode>,

        /// Directory for csv reports
        #[arg(long)]
        data_path: Option<PathBuf>,

        /// Blocking workers for the recommender pass
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Inspect serverless resource tiers
    #[command(subcommand)]
    Tier(TierCommands),
}

#[derive(Subcommand)]
pub enum TierCommands {
    /// Quantize a demand to its serverless tier
    Match {
        /// CPU cores
        cpu: f64,

        /// Memory in GiB
        mem: f64,

        /// GPU count
        #[arg(long, default_value_t = 0.0)]
        gpu: f64,

        /// Architecture (intel, amd, v100, t4, 2080ti)
        #[arg(long, default_value = "intel")]
        arch: Architecture,

        /// Force a charge type (prepaid, postpaid)
        #[arg(long)]
        charge_type: Option<ChargeType>,
    },

    /// List the tiers of one table
    List {
        /// Architecture (intel, amd, v100, t4, 2080ti)
        #[arg(long, default_value = "intel")]
        arch: Architecture,

        /// Charge type (prepaid, postpaid)
        #[arg(long, default_value = "postpaid")]
        charge_type: ChargeType,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("FCOST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    if std::env::var_os("FCOST_LOG_JSON").is_some() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Compare {
            snapshot,
            cluster_id,
            time_span,
            discount,
            output_mode,
            data_path,
            workers,
        } => {
            if cluster_id.is_some() {
                config.cluster_id = cluster_id;
            }
            if let Some(seconds) = time_span {
                config.time_span_seconds = seconds;
            }
            if discount.is_some() {
                config.discount = discount;
            }
            if let Some(mode) = output_mode {
                config.output_mode = mode;
            }
            if let Some(path) = data_path {
                config.data_path = path;
            }
            if let Some(n) = workers {
                config.workers = n;
            }
            compare::run_compare(&snapshot, &config, cli.format).await?;
        }
        Commands::Tier(cmd) => match cmd {
            TierCommands::Match {
                cpu,
                mem,
                gpu,
                arch,
                charge_type,
            } => {
                let demand = ResourceVector::new(cpu, mem).with_gpu(gpu);
                tier::match_tier(demand, arch, charge_type, cli.format)?;
            }
            TierCommands::List { arch, charge_type } => {
                tier::list_tiers(arch, charge_type, cli.format)?;
            }
        },
    }

    Ok(())
}
