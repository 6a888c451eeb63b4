//! Cost comparison command

use anyhow::{Context, Result};
use colored::Colorize;
use cost_lib::{ClusterSnapshot, Comparator, LocalPricer, SizingStrategy};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::output::{
    color_savings, format_cost, format_timestamp, print_info, print_json, print_success,
    print_warning, OutputFormat,
};
use crate::report::ReportWriter;

/// Load a cluster snapshot from its JSON document
pub fn load_snapshot(path: &Path) -> Result<ClusterSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    ClusterSnapshot::from_json(&content)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

/// Run a comparison and render it
pub async fn run_compare(snapshot_path: &Path, config: &Config, format: OutputFormat) -> Result<()> {
    let mut snapshot = load_snapshot(snapshot_path)?;
    if let Some(cluster_id) = &config.cluster_id {
        snapshot.cluster_id = cluster_id.clone();
    }
    if snapshot.cluster_id.is_empty() {
        snapshot.cluster_id = "cluster".to_string();
    }
    if snapshot.is_empty() {
        print_warning("Snapshot contains no nodes or workloads");
    }

    let mut pricer = LocalPricer::builtin()?.with_rates(config.rates.clone());
    if let Some(discount) = config.discount {
        pricer = pricer.with_discount(discount);
    }

    let comparator = Comparator::builder()
        .pricer(Arc::new(pricer))
        .snapshot(snapshot)
        .time_span_seconds(config.time_span_seconds)
        .workers(config.workers)
        .build()?;

    let report = if config.workers > 1 {
        comparator.run_concurrent().await?
    } else {
        comparator.run()
    };
    info!(cluster_id = %report.cluster_id, "Comparison finished");

    if let OutputFormat::Json = format {
        return print_json(&report.document());
    }

    let stdout = config.output_mode.stdout();
    let csv_dir = config.output_mode.csv().then_some(config.data_path.as_path());

    if stdout {
        println!("{}", "Cost Comparison".bold());
        println!("{}", "=".repeat(60));
        println!("Cluster:     {}", report.cluster_id.cyan());
        println!("Time span:   {}s", report.time_span_seconds);
        println!("Generated:   {}", format_timestamp(&report.generated_at).dimmed());
        println!();
    }

    let mut writer = ReportWriter::new(&report.cluster_id, stdout, csv_dir);
    writer.emit_all(&report)?;

    if stdout {
        let baseline = report.recommended.baseline();
        if let Some((strategy, cost)) = report.recommended.cheapest() {
            if strategy != SizingStrategy::Direct {
                println!(
                    "{} {} at {} ({})",
                    "Cheapest strategy:".bold(),
                    strategy.label().green(),
                    format_cost(cost.total_cost),
                    color_savings(cost.savings_percent(&baseline))
                );
            } else {
                print_info("Migrating without resizing is already the cheapest option");
            }
        }
    }

    for path in writer.written() {
        print_success(&format!("Wrote {}", path.display()));
    }

    Ok(())
}
