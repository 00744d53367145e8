use super::{Processing, ui};
use crate::core::{ProcessedStatement, StatementSource};
use anyhow::{Result, anyhow};
use comfy_table::Cell;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::error;

#[derive(Debug, Clone, PartialEq)]
struct CurrencySummary {
    currency: String,
    movements: usize,
    inflow: Decimal,
    outflow: Decimal,
    closing: Decimal,
}

/// Inflows, outflows and closing balance per currency, ordered by currency code.
///
/// The closing balance is the one the statement reports, so it matches the
/// last running balance shown in the ledger view.
fn summarize(statement: &ProcessedStatement) -> Vec<CurrencySummary> {
    let mut by_currency: BTreeMap<&str, CurrencySummary> = statement
        .balances
        .iter()
        .map(|(currency, closing)| {
            (
                currency.as_str(),
                CurrencySummary {
                    currency: currency.clone(),
                    movements: 0,
                    inflow: Decimal::ZERO,
                    outflow: Decimal::ZERO,
                    closing: *closing,
                },
            )
        })
        .collect();

    for movement in &statement.cash_movements {
        let Some(summary) = by_currency.get_mut(movement.currency.as_str()) else {
            continue;
        };
        summary.movements += 1;
        if movement.amount >= Decimal::ZERO {
            summary.inflow = summary.inflow.saturating_add(movement.amount);
        } else {
            summary.outflow = summary.outflow.saturating_add(movement.amount);
        }
    }
    by_currency.into_values().collect()
}

fn display_summaries(statement: &ProcessedStatement) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Movements"),
        ui::header_cell("Inflow"),
        ui::header_cell("Outflow"),
        ui::header_cell("Closing Balance"),
    ]);

    for summary in summarize(statement) {
        table.add_row(vec![
            Cell::new(&summary.currency),
            ui::format_optional_cell(Some(summary.movements), |n| n.to_string()),
            ui::amount_cell(summary.inflow),
            ui::amount_cell(summary.outflow),
            ui::balance_cell(&summary.currency, summary.closing),
        ]);
    }

    format!(
        "Statement: {}\n\n{table}",
        ui::style_text(&statement.name, ui::StyleType::Title)
    )
}

pub async fn run(
    statements: &[String],
    source: &(dyn StatementSource + Send + Sync),
    processing: Processing,
) -> Result<()> {
    let results = super::process_all(statements, source, processing).await;

    let mut failures = 0;
    let count = results.len();
    for (i, (id, result)) in results.into_iter().enumerate() {
        match result {
            Ok(statement) => println!("{}", display_summaries(&statement)),
            Err(e) => {
                failures += 1;
                error!("Failed to process {id}: {e:#}");
                println!(
                    "{}",
                    ui::style_text(&format!("{id}: {e:#}"), ui::StyleType::Error)
                );
            }
        }
        if i < count - 1 {
            ui::print_separator();
        }
    }

    if failures > 0 {
        return Err(anyhow!("{failures} of {count} statements failed to process"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CashMovement, CashMovementType, ExtractedMovement, ExtractionResult};

    fn movement(amount: i64, currency: &str, running_balance: Option<i64>) -> ExtractedMovement {
        ExtractedMovement {
            date: "2024-01-01".to_string(),
            kind: CashMovementType::Other,
            amount: Some(Decimal::from(amount)),
            currency: currency.to_string(),
            running_balance: running_balance.map(Decimal::from),
            description: String::new(),
        }
    }

    fn stored(movements: Vec<ExtractedMovement>) -> ProcessedStatement {
        ProcessedStatement::from_stored(
            "stored.json",
            ExtractionResult {
                cash_movements: movements,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_summarize_per_currency() {
        let statement = stored(vec![
            movement(1000, "USD", None),
            movement(-250, "USD", None),
            movement(5000, "HKD", None),
            movement(0, "USD", None),
            movement(-40, "HKD", None),
        ]);

        let summaries = summarize(&statement);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].currency, "HKD");
        assert_eq!(summaries[0].movements, 2);
        assert_eq!(summaries[0].inflow, Decimal::from(5000));
        assert_eq!(summaries[0].outflow, Decimal::from(-40));
        assert_eq!(summaries[0].closing, Decimal::from(4960));

        assert_eq!(summaries[1].currency, "USD");
        assert_eq!(summaries[1].movements, 3);
        assert_eq!(summaries[1].closing, Decimal::from(750));
    }

    #[test]
    fn test_closing_balance_matches_ledger_view() {
        let statement = stored(vec![
            movement(1000, "USD", Some(26000)),
            movement(-250, "USD", None),
        ]);
        let last: &CashMovement = &statement.cash_movements[1];

        let summaries = summarize(&statement);
        assert_eq!(summaries[0].closing, last.running_balance);
        assert_eq!(summaries[0].closing, Decimal::from(750));
        assert_eq!(summaries[0].inflow, Decimal::from(1000));

        let carried = stored(vec![
            movement(-250, "USD", None),
            movement(1000, "USD", Some(26000)),
        ]);
        assert_eq!(summarize(&carried)[0].closing, Decimal::from(26000));
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&stored(vec![])).is_empty());
    }
}
