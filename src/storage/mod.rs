//! Results persistence module

use crate::anonymize::metrics::summarize;
use crate::anonymize::AnonymizationReport;
use crate::model::Table;
use anyhow::{Context, Result};
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Save the anonymized table and the run summary to the specified directory
pub fn save_results(table: &Table, report: &AnonymizationReport, output_dir: &str) -> Result<()> {
    log::info!("Saving {} rows to {}", table.len(), output_dir);

    // Ensure output directory exists
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir))?;

    save_table(table, output_dir)?;
    save_summary(report, output_dir)?;
    save_groups(report, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;
    Ok(())
}

/// Column names plus every row rendered as partition strings
fn save_table(table: &Table, output_dir: &str) -> Result<()> {
    log::info!("Saving anonymized table");

    let columns: Vec<&str> = table.schema().columns().iter().map(|c| c.name()).collect();
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.data.iter().map(|p| p.to_string()).collect())
        .collect();

    let document = json!({
        "columns": columns,
        "rows": rows,
    });

    write_json(&Path::new(output_dir).join("anonymized.json"), &document)
}

fn save_summary(report: &AnonymizationReport, output_dir: &str) -> Result<()> {
    log::info!("Saving summary information");

    let summary = summarize(report);
    let document = json!({
        "k": report.k,
        "splits": report.splits,
        "summary": summary,
    });

    write_json(&Path::new(output_dir).join("summary.json"), &document)
}

fn save_groups(report: &AnonymizationReport, output_dir: &str) -> Result<()> {
    log::info!("Saving {} row groups", report.groups.len());

    let document = json!({ "groups": report.groups });
    write_json(&Path::new(output_dir).join("groups.json"), &document)
}
