//! Output formatting utilities

use applier_lib::apply::{BatchReport, ItemStatus};
use clap::ValueEnum;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for the batch report
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for the report table
#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Print the batch report
pub fn print_report(report: &BatchReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Table => {
            if report.items.is_empty() {
                print_warning("No recommendations applied");
                return Ok(());
            }

            let rows: Vec<OutcomeRow> = report
                .items
                .iter()
                .map(|item| OutcomeRow {
                    namespace: item.namespace.clone(),
                    pod: display_or_dash(&item.pod_name),
                    container: display_or_dash(&item.container_name),
                    status: color_status(&item.status),
                    detail: match &item.status {
                        ItemStatus::Failed { message, .. } => message.clone(),
                        _ => String::new(),
                    },
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);

            let summary = format!(
                "{} applied, {} failed in {}ms",
                report.applied(),
                report.failed(),
                report.elapsed_ms()
            );
            if report.has_failures() {
                print_error(&summary);
            } else {
                print_success(&summary);
            }
        }
    }

    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Color status based on outcome
fn color_status(status: &ItemStatus) -> String {
    match status {
        ItemStatus::Applied => status.label().green().to_string(),
        ItemStatus::DryRun => status.label().blue().to_string(),
        ItemStatus::Failed { reason, .. } => format!("{} ({})", status.label(), reason)
            .red()
            .to_string(),
    }
}

fn display_or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_or_dash() {
        assert_eq!(display_or_dash(""), "-");
        assert_eq!(display_or_dash("app"), "app");
    }

    #[test]
    fn test_color_status_includes_reason() {
        colored::control::set_override(false);
        let status = ItemStatus::Failed {
            reason: "no_owner".to_string(),
            message: String::new(),
        };
        assert_eq!(color_status(&status), "failed (no_owner)");
        assert_eq!(color_status(&ItemStatus::DryRun), "dry_run");
    }
}
