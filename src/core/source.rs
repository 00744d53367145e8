//! Loading extracted statements and turning them into ledgers

use crate::core::ledger::{self, CurrencyMode, Ledger};
use crate::core::model::{CashMovement, ExtractionResult, Holding, Transaction};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Supplies extraction results for a statement identifier.
#[async_trait]
pub trait StatementSource: Send + Sync {
    async fn load(&self, id: &str) -> Result<ExtractionResult>;
}

/// Reads extraction results stored as JSON documents on disk.
pub struct JsonFileSource {
    root: Option<PathBuf>,
}

impl JsonFileSource {
    /// Relative identifiers are resolved against `root` when one is given.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, id: &str) -> PathBuf {
        let path = PathBuf::from(id);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

#[async_trait]
impl StatementSource for JsonFileSource {
    async fn load(&self, id: &str) -> Result<ExtractionResult> {
        let path = self.resolve(id);
        debug!("Reading statement from {}", path.display());
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read statement: {}", path.display()))?;
        let result: ExtractionResult = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse statement: {}", path.display()))?;
        debug!(
            holdings = result.holdings.len(),
            transactions = result.transactions.len(),
            cash_movements = result.cash_movements.len(),
            "Loaded statement"
        );
        Ok(result)
    }
}

/// An extraction result whose cash movements have been rebuilt.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedStatement {
    pub name: String,
    pub holdings: Vec<Holding>,
    pub transactions: Vec<Transaction>,
    #[serde(rename = "cashMovements")]
    pub cash_movements: Vec<CashMovement>,
    #[serde(skip)]
    pub balances: BTreeMap<String, Decimal>,
}

impl ProcessedStatement {
    /// Replaces the extracted cash movements with ones rebuilt from the
    /// transactions. A document without transactions ends up with no cash
    /// movements.
    pub fn from_extraction(
        name: &str,
        result: ExtractionResult,
        mode: CurrencyMode,
    ) -> Result<Self> {
        if !result.cash_movements.is_empty() {
            debug!(
                "Discarding {} extracted cash movements for {name}",
                result.cash_movements.len()
            );
        }
        let ledger = Ledger::build(&result.transactions, mode)
            .with_context(|| format!("Failed to build cash ledger for {name}"))?;
        let balances = ledger.balances().clone();

        Ok(Self {
            name: name.to_string(),
            holdings: result.holdings,
            transactions: result.transactions,
            cash_movements: ledger.into_movements(),
            balances,
        })
    }

    /// Shows a previously stored result as it is, without rebuilding.
    ///
    /// Stored movements that predate running balances get them filled in per
    /// currency, and the closing balances are the last balance shown for each
    /// currency.
    pub fn from_stored(name: &str, result: ExtractionResult) -> Self {
        let cash_movements = ledger::fill_missing_balances(&result.cash_movements);
        let balances = ledger::closing_balances(&cash_movements);
        Self {
            name: name.to_string(),
            holdings: result.holdings,
            transactions: result.transactions,
            cash_movements,
            balances,
        }
    }
}

pub async fn process_statement(
    source: &(dyn StatementSource + Send + Sync),
    id: &str,
    mode: CurrencyMode,
) -> Result<ProcessedStatement> {
    let result = source.load(id).await?;
    let statement = ProcessedStatement::from_extraction(id, result, mode)?;
    info!(
        "Processed {id}: {} cash movements",
        statement.cash_movements.len()
    );
    Ok(statement)
}

/// Loads a stored result for display, keeping its cash movements.
pub async fn load_stored(
    source: &(dyn StatementSource + Send + Sync),
    id: &str,
) -> Result<ProcessedStatement> {
    let result = source.load(id).await?;
    let statement = ProcessedStatement::from_stored(id, result);
    info!(
        "Loaded stored {id}: {} cash movements",
        statement.cash_movements.len()
    );
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{CashMovementType, ExtractedMovement, TransactionType};
    use anyhow::anyhow;
    use std::collections::HashMap;

    struct MockSource {
        results: HashMap<String, ExtractionResult>,
    }

    #[async_trait]
    impl StatementSource for MockSource {
        async fn load(&self, id: &str) -> Result<ExtractionResult> {
            self.results
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow!("Statement not found: {id}"))
        }
    }

    fn transaction(date: &str, kind: TransactionType, amount: i64) -> Transaction {
        Transaction {
            date: date.to_string(),
            asset_name: "Vanguard S&P 500 ETF".to_string(),
            transaction_type: kind,
            quantity: None,
            price: None,
            amount: Decimal::from(amount),
            currency: "USD".to_string(),
        }
    }

    fn extracted(amount: i64) -> ExtractedMovement {
        extracted_in(amount, "USD")
    }

    fn extracted_in(amount: i64, currency: &str) -> ExtractedMovement {
        ExtractedMovement {
            date: "2024-01-01".to_string(),
            kind: CashMovementType::Deposit,
            amount: Some(Decimal::from(amount)),
            currency: currency.to_string(),
            running_balance: None,
            description: "Wire in".to_string(),
        }
    }

    #[tokio::test]
    async fn test_transactions_replace_extracted_movements() {
        let result = ExtractionResult {
            holdings: vec![],
            transactions: vec![
                transaction("2024-02-01", TransactionType::Dividend, 40),
                transaction("2024-01-15", TransactionType::Buy, 1000),
            ],
            cash_movements: vec![extracted(99999)],
        };
        let source = MockSource {
            results: HashMap::from([("jan.json".to_string(), result)]),
        };

        let statement = process_statement(&source, "jan.json", CurrencyMode::Partition)
            .await
            .unwrap();

        assert_eq!(statement.name, "jan.json");
        assert_eq!(statement.transactions.len(), 2);
        assert_eq!(statement.cash_movements.len(), 2);
        assert_eq!(statement.cash_movements[0].date, "2024-01-15");
        assert_eq!(statement.cash_movements[1].running_balance, Decimal::from(-960));
        assert_eq!(statement.balances["USD"], Decimal::from(-960));
    }

    #[tokio::test]
    async fn test_document_without_transactions_has_no_movements() {
        let result = ExtractionResult {
            holdings: vec![],
            transactions: vec![],
            cash_movements: vec![extracted_in(100, "USD"), extracted_in(50, "HKD")],
        };
        let source = MockSource {
            results: HashMap::from([("old.json".to_string(), result)]),
        };

        for mode in [CurrencyMode::Partition, CurrencyMode::RequireSingle] {
            let statement = process_statement(&source, "old.json", mode).await.unwrap();
            assert!(statement.cash_movements.is_empty());
            assert!(statement.balances.is_empty());
        }
    }

    #[tokio::test]
    async fn test_stored_result_keeps_its_movements() {
        let mut carried = extracted_in(-30, "USD");
        carried.running_balance = Some(Decimal::from(1070));
        let result = ExtractionResult {
            holdings: vec![],
            transactions: vec![transaction("2024-01-15", TransactionType::Buy, 1000)],
            cash_movements: vec![
                extracted_in(100, "USD"),
                extracted_in(50, "HKD"),
                carried,
                extracted_in(-20, "HKD"),
            ],
        };
        let source = MockSource {
            results: HashMap::from([("stored.json".to_string(), result)]),
        };

        let statement = load_stored(&source, "stored.json").await.unwrap();

        let balances: Vec<Decimal> = statement
            .cash_movements
            .iter()
            .map(|m| m.running_balance)
            .collect();
        assert_eq!(
            balances,
            vec![
                Decimal::from(100),
                Decimal::from(50),
                Decimal::from(1070),
                Decimal::from(30),
            ]
        );
        assert_eq!(statement.balances["USD"], Decimal::from(1070));
        assert_eq!(statement.balances["HKD"], Decimal::from(30));
        assert_eq!(statement.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_carry_statement_context() {
        let mut bad = transaction("2024-13-01", TransactionType::Buy, 10);
        bad.asset_name = "Bad".to_string();
        let source = MockSource {
            results: HashMap::from([(
                "bad.json".to_string(),
                ExtractionResult {
                    transactions: vec![bad],
                    ..Default::default()
                },
            )]),
        };

        let err = process_statement(&source, "bad.json", CurrencyMode::Partition)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad.json"));
        assert!(format!("{err:#}").contains("Invalid date '2024-13-01'"));

        let missing = process_statement(&source, "nope.json", CurrencyMode::Partition).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_json_file_source_resolves_relative_paths() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        std::fs::write(
            dir.path().join("statement.json"),
            r#"{"transactions": [{"date": "2024-01-05", "asset_name": "Cash",
                "transaction_type": "Other", "quantity": null, "price": null,
                "amount": 35000, "currency": "USD"}]}"#,
        )?;

        let source = JsonFileSource::new(Some(dir.path().to_path_buf()));
        let result = source.load("statement.json").await?;
        assert_eq!(result.transactions.len(), 1);

        let absolute = dir.path().join("statement.json");
        let unrooted = JsonFileSource::new(None);
        assert!(unrooted.load(absolute.to_str().unwrap()).await.is_ok());
        assert!(unrooted.load("definitely-missing.json").await.is_err());
        Ok(())
    }
}
