use super::{Processing, ui};
use crate::core::{ProcessedStatement, StatementSource};
use anyhow::{Result, anyhow};
use comfy_table::Cell;
use tracing::error;

impl ProcessedStatement {
    /// Renders the cash movements as a table, optionally limited to the first
    /// `limit` rows.
    pub fn display_as_table(&self, limit: Option<usize>) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Date"),
            ui::header_cell("Type"),
            ui::header_cell("Amount"),
            ui::header_cell("Currency"),
            ui::header_cell("Running Balance"),
            ui::header_cell("Description"),
        ]);

        let total = self.cash_movements.len();
        let shown = limit.map_or(total, |n| n.min(total));
        for movement in &self.cash_movements[..shown] {
            table.add_row(vec![
                Cell::new(&movement.date),
                Cell::new(movement.kind.to_string()),
                ui::amount_cell(movement.amount),
                Cell::new(&movement.currency),
                ui::balance_cell(&movement.currency, movement.running_balance),
                Cell::new(&movement.description),
            ]);
        }

        let mut output = format!(
            "Statement: {}\n\n",
            ui::style_text(&self.name, ui::StyleType::Title)
        );

        if total == 0 {
            output.push_str(&ui::style_text(
                "No cash movements found.",
                ui::StyleType::Subtle,
            ));
            return output;
        }

        output.push_str(&table.to_string());

        if shown < total {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!("Showing {shown} of {total} cash movements."),
                    ui::StyleType::Subtle
                )
            ));
        }

        for (currency, balance) in &self.balances {
            output.push_str(&format!(
                "\n\nClosing Balance ({}): {}",
                ui::style_text(currency, ui::StyleType::TotalLabel),
                ui::style_text(&format!("{balance:.2}"), ui::StyleType::TotalValue)
            ));
        }

        output
    }
}

pub async fn run(
    statements: &[String],
    source: &(dyn StatementSource + Send + Sync),
    processing: Processing,
    preview_rows: Option<usize>,
) -> Result<()> {
    let results = super::process_all(statements, source, processing).await;

    let mut failures = 0;
    let count = results.len();
    for (i, (id, result)) in results.into_iter().enumerate() {
        match result {
            Ok(statement) => println!("{}", statement.display_as_table(preview_rows)),
            Err(e) => {
                failures += 1;
                error!("Failed to process {id}: {e:#}");
                println!(
                    "Statement: {}\n\n{}",
                    ui::style_text(&id, ui::StyleType::Title),
                    ui::style_text(&format!("Error: {e:#}"), ui::StyleType::Error)
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
    use crate::core::{
        CurrencyMode, ExtractionResult, ProcessedStatement, Transaction, TransactionType,
    };
    use rust_decimal::Decimal;

    fn statement(rows: usize) -> ProcessedStatement {
        let transactions = (0..rows)
            .map(|i| Transaction {
                date: format!("2024-01-{:02}", i + 1),
                asset_name: format!("Fund {i}"),
                transaction_type: TransactionType::Dividend,
                quantity: None,
                price: None,
                amount: Decimal::from(10),
                currency: "USD".to_string(),
            })
            .collect();
        ProcessedStatement::from_extraction(
            "sample.json",
            ExtractionResult {
                transactions,
                ..Default::default()
            },
            CurrencyMode::Partition,
        )
        .unwrap()
    }

    #[test]
    fn test_table_lists_every_movement() {
        let output = statement(3).display_as_table(None);
        assert!(output.contains("sample.json"));
        assert!(output.contains("Running Balance"));
        assert!(output.contains("Dividend from Fund 2"));
        assert!(output.contains("USD 30.00"));
        assert!(!output.contains("Showing"));
    }

    #[test]
    fn test_preview_limits_rows() {
        let output = statement(8).display_as_table(Some(5));
        assert!(output.contains("Dividend from Fund 4"));
        assert!(!output.contains("Dividend from Fund 5"));
        assert!(output.contains("Showing 5 of 8 cash movements."));
    }

    #[test]
    fn test_empty_statement() {
        let output = statement(0).display_as_table(Some(5));
        assert!(output.contains("No cash movements found."));
    }
}
