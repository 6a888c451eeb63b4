//! Tier inspection commands

use anyhow::Result;
use colored::Colorize;
use cost_lib::tier::{builtin_matcher, MatchOutcome};
use cost_lib::{Architecture, ChargeType, ResourceVector};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{format_quantity, print_json, print_table, OutputFormat};

/// Row for the tier list table
#[derive(Tabled, Serialize)]
struct TierRow {
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory (GiB)")]
    mem: String,
    #[tabled(rename = "GPU")]
    gpu: String,
}

/// Quantize one demand and explain the decision
pub fn match_tier(
    demand: ResourceVector,
    architecture: Architecture,
    charge_type: Option<ChargeType>,
    format: OutputFormat,
) -> Result<()> {
    let matcher = builtin_matcher()?;
    let matched = matcher.match_demand(&demand, charge_type, architecture);
    let exclusive = matcher.exclusive_architecture(matched.tier.cpu, matched.tier.mem);

    match format {
        OutputFormat::Json => print_json(&matched)?,
        OutputFormat::Table => {
            println!("{}", "Tier Match".bold());
            println!("{}", "=".repeat(50));
            println!(
                "Demand:       {} cores, {} GiB, {} GPU",
                format_quantity(demand.cpu),
                format_quantity(demand.mem),
                format_quantity(demand.gpu)
            );
            println!("Architecture: {}", matched.architecture.to_string().cyan());
            println!("Charge type:  {}", matched.charge_type.to_string().cyan());
            if charge_type.is_none() && !matched.architecture.is_gpu() {
                println!(
                    "              prepaid needs 1 to {} cores and more than 1 core per 4 GiB",
                    format_quantity(matcher.selector().prepaid_cpu_ceiling())
                );
            }
            println!(
                "Tier:         {} cores, {} GiB{}",
                format_quantity(matched.tier.cpu).green().bold(),
                format_quantity(matched.tier.mem).green().bold(),
                if matched.architecture.is_gpu() {
                    format!(", {} GPU", format_quantity(matched.tier.gpu))
                } else {
                    String::new()
                }
            );
            let outcome = match matched.outcome {
                MatchOutcome::Fitted => "smallest enclosing tier".normal(),
                MatchOutcome::Floor => "no demand given, floor tier".yellow(),
                MatchOutcome::Ceiling => "exceeds every tier, saturated at ceiling".red(),
            };
            println!("Outcome:      {}", outcome);
            if let Some(arch) = exclusive {
                println!("Exclusive to: {}", arch);
            }
        }
    }
    Ok(())
}

/// List the tiers of one table
pub fn list_tiers(
    architecture: Architecture,
    charge_type: ChargeType,
    format: OutputFormat,
) -> Result<()> {
    let matcher = builtin_matcher()?;
    let table = matcher.catalog().table(architecture, charge_type);

    let rows: Vec<TierRow> = table
        .aggregates()
        .iter()
        .map(|a| TierRow {
            cpu: format_quantity(a.cpu),
            mem: format_quantity(a.mem),
            gpu: format_quantity(a.gpu),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&table.aggregates())?,
        OutputFormat::Table => {
            let billing = table
                .charge_type()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "any charge type".to_string());
            let title = format!(
                "{} tiers, {} ({} total, ceiling {} cores / {} GiB)",
                table.architecture(),
                billing,
                rows.len(),
                format_quantity(table.ceiling().cpu),
                format_quantity(table.ceiling().mem)
            );
            print_table(&title, &rows);
        }
    }
    Ok(())
}
