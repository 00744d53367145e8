//! Writes the normalized sheets of a processed statement to disk.
//!
//! Each non-empty dataset becomes its own CSV file with the same columns as
//! the workbook sheets, and the whole result is written as JSON next to them.

use super::ui;
use crate::core::{CurrencyMode, ProcessedStatement, StatementSource, process_statement};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HOLDINGS_FILE: &str = "holdings.csv";
const TRANSACTIONS_FILE: &str = "transactions.csv";
const CASH_MOVEMENTS_FILE: &str = "cash_movements.csv";
const RESULT_FILE: &str = "result.json";

fn optional(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn limited<T>(rows: &[T], limit: Option<usize>) -> &[T] {
    match limit {
        Some(n) if n < rows.len() => &rows[..n],
        _ => rows,
    }
}

fn write_sheet(
    path: &Path,
    header: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer
        .write_record(header)
        .with_context(|| format!("Failed to write header to {}", path.display()))?;
    for row in rows {
        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Writes the sheets of `statement` into `out_dir` and returns the files written.
///
/// Empty datasets are skipped, and sheets left in `out_dir` by an earlier
/// export are removed so the directory only describes this statement. With a
/// `limit`, each sheet keeps only its first rows.
pub fn export_statement(
    statement: &ProcessedStatement,
    out_dir: &Path,
    limit: Option<usize>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory: {}", out_dir.display()))?;
    for sheet in [HOLDINGS_FILE, TRANSACTIONS_FILE, CASH_MOVEMENTS_FILE] {
        let path = out_dir.join(sheet);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            debug!("Removed previous {}", path.display());
        }
    }
    let mut written = Vec::new();

    let holdings = limited(&statement.holdings, limit);
    if !holdings.is_empty() {
        let path = out_dir.join(HOLDINGS_FILE);
        write_sheet(
            &path,
            &[
                "Asset Name",
                "Asset Type",
                "Quantity",
                "Unit Price",
                "Currency",
                "Market Value",
                "As of Date",
            ],
            holdings.iter().map(|h| {
                vec![
                    h.asset_name.clone(),
                    h.asset_type.to_string(),
                    optional(h.quantity),
                    optional(h.unit_price),
                    h.currency.clone(),
                    optional(h.market_value),
                    h.as_of_date.clone(),
                ]
            }),
        )?;
        written.push(path);
    }

    let transactions = limited(&statement.transactions, limit);
    if !transactions.is_empty() {
        let path = out_dir.join(TRANSACTIONS_FILE);
        write_sheet(
            &path,
            &[
                "Date",
                "Asset Name",
                "Transaction Type",
                "Quantity",
                "Price",
                "Amount",
                "Currency",
            ],
            transactions.iter().map(|t| {
                vec![
                    t.date.clone(),
                    t.asset_name.clone(),
                    t.transaction_type.to_string(),
                    optional(t.quantity),
                    optional(t.price),
                    t.amount.to_string(),
                    t.currency.clone(),
                ]
            }),
        )?;
        written.push(path);
    }

    let cash_movements = limited(&statement.cash_movements, limit);
    if !cash_movements.is_empty() {
        let path = out_dir.join(CASH_MOVEMENTS_FILE);
        write_sheet(
            &path,
            &[
                "Date",
                "Type",
                "Amount",
                "Currency",
                "Running Balance",
                "Description",
            ],
            cash_movements.iter().map(|m| {
                vec![
                    m.date.clone(),
                    m.kind.to_string(),
                    m.amount.to_string(),
                    m.currency.clone(),
                    ui::format_balance(&m.currency, m.running_balance),
                    m.description.clone(),
                ]
            }),
        )?;
        written.push(path);
    }

    let result_path = out_dir.join(RESULT_FILE);
    let file = fs::File::create(&result_path)
        .with_context(|| format!("Failed to create {}", result_path.display()))?;
    let json_result = if limit.is_some() {
        let preview = ProcessedStatement {
            holdings: holdings.to_vec(),
            transactions: transactions.to_vec(),
            cash_movements: cash_movements.to_vec(),
            ..statement.clone()
        };
        serde_json::to_writer_pretty(file, &preview)
    } else {
        serde_json::to_writer_pretty(file, statement)
    };
    json_result.with_context(|| format!("Failed to write {}", result_path.display()))?;
    written.push(result_path);

    debug!("Exported {} files to {}", written.len(), out_dir.display());
    Ok(written)
}

pub async fn run(
    statement_id: &str,
    source: &(dyn StatementSource + Send + Sync),
    mode: CurrencyMode,
    out_dir: &Path,
    limit: Option<usize>,
) -> Result<()> {
    let statement = process_statement(source, statement_id, mode).await?;
    let written = export_statement(&statement, out_dir, limit)?;

    info!("Exported {statement_id} to {}", out_dir.display());
    println!(
        "Exported {}:",
        ui::style_text(&statement.name, ui::StyleType::Title)
    );
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}
