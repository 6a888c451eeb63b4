//! Output formatting utilities

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Destination of comparison reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Print tables to stdout (default)
    #[default]
    Stdout,
    /// Write tab-separated files under the data path
    Csv,
    /// Both stdout and csv files
    Both,
}

impl OutputMode {
    pub fn stdout(&self) -> bool {
        matches!(self, OutputMode::Stdout | OutputMode::Both)
    }

    pub fn csv(&self) -> bool {
        matches!(self, OutputMode::Csv | OutputMode::Both)
    }
}

/// Print a titled table from a list of items
pub fn print_table<T: Tabled>(title: &str, items: &[T]) {
    println!("{}", title.bold());
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        println!();
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
    println!();
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a cost with fixed precision
pub fn format_cost(amount: f64) -> String {
    format!("{:.4}", amount)
}

/// Format a resource quantity, trimming trailing zeros
pub fn format_quantity(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Format a savings percentage
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// Color a savings percentage by sign
pub fn color_savings(percent: f64) -> String {
    let formatted = format_percent(percent);
    if percent > 0.0 {
        formatted.green().to_string()
    } else if percent < 0.0 {
        formatted.red().to_string()
    } else {
        formatted
    }
}

/// Format a report timestamp for display
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(1.0), "1");
        assert_eq!(format_quantity(0.25), "0.25");
        assert_eq!(format_quantity(3.5), "3.5");
        assert_eq!(format_quantity(0.0), "0");
    }

    #[test]
    fn test_output_mode_targets() {
        assert!(OutputMode::Stdout.stdout() && !OutputMode::Stdout.csv());
        assert!(!OutputMode::Csv.stdout() && OutputMode::Csv.csv());
        assert!(OutputMode::Both.stdout() && OutputMode::Both.csv());
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(1.23456), "1.2346");
        assert_eq!(format_percent(37.5), "37.5%");
    }
}
