//! Rebuilds the cash movement ledger from an unordered transaction list.
//!
//! Every transaction yields exactly one [`CashMovement`]. Rows are ordered by
//! date with ties kept in input order, the cash direction is derived from the
//! transaction type, and each row carries the balance of its currency after
//! the row has been applied.
use crate::core::model::{
    CashMovement, CashMovementType, ExtractedMovement, Transaction, TransactionType,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Data-quality failures detected while building a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid date '{date}' in transaction #{index}")]
    InvalidDate { index: usize, date: String },

    #[error("Expected a single currency but found: {}", .currencies.join(", "))]
    MixedCurrencies { currencies: Vec<String> },

    #[error("Running {currency} balance overflowed at transaction #{index}")]
    BalanceOverflow { index: usize, currency: String },
}

/// How rows in different currencies are balanced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyMode {
    /// One chronological stream, with an independent running balance per currency.
    #[default]
    Partition,
    /// Reject input that mixes currencies.
    RequireSingle,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    movements: Vec<CashMovement>,
    balances: BTreeMap<String, Decimal>,
}

impl Ledger {
    /// Builds the ledger for `transactions` without modifying them.
    ///
    /// All dates are validated up front, so a bad row fails the whole call
    /// before any movement is produced.
    pub fn build(transactions: &[Transaction], mode: CurrencyMode) -> Result<Self, LedgerError> {
        let mut dated = transactions
            .iter()
            .enumerate()
            .map(|(index, tx)| {
                parse_date(&tx.date)
                    .map(|at| (at, index, tx))
                    .ok_or_else(|| LedgerError::InvalidDate {
                        index,
                        date: tx.date.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if mode == CurrencyMode::RequireSingle {
            let currencies: BTreeSet<&str> =
                transactions.iter().map(|tx| tx.currency.as_str()).collect();
            if currencies.len() > 1 {
                return Err(LedgerError::MixedCurrencies {
                    currencies: currencies.into_iter().map(str::to_string).collect(),
                });
            }
        }

        // sort_by_key is stable, same-day rows stay in input order
        dated.sort_by_key(|(at, _, _)| *at);

        let mut balances: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut movements = Vec::with_capacity(dated.len());
        for (_, index, tx) in dated {
            let (amount, kind, description) = classify(tx);
            let balance = balances.entry(tx.currency.clone()).or_default();
            *balance = balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::BalanceOverflow {
                    index,
                    currency: tx.currency.clone(),
                })?;
            movements.push(CashMovement {
                date: tx.date.clone(),
                kind,
                amount,
                currency: tx.currency.clone(),
                running_balance: *balance,
                description,
            });
        }

        debug!(
            "Built ledger with {} movements across {} currencies",
            movements.len(),
            balances.len()
        );
        Ok(Self {
            movements,
            balances,
        })
    }

    pub fn movements(&self) -> &[CashMovement] {
        &self.movements
    }

    pub fn into_movements(self) -> Vec<CashMovement> {
        self.movements
    }

    /// Closing balance per currency, ordered by currency code.
    pub fn balances(&self) -> &BTreeMap<String, Decimal> {
        &self.balances
    }

    pub fn closing_balance(&self, currency: &str) -> Option<Decimal> {
        self.balances.get(currency).copied()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.balances.keys().map(String::as_str)
    }

    /// Splits the movements into one chronological stream per currency.
    pub fn partition_by_currency(&self) -> BTreeMap<String, Vec<CashMovement>> {
        let mut streams: BTreeMap<String, Vec<CashMovement>> = BTreeMap::new();
        for movement in &self.movements {
            streams
                .entry(movement.currency.clone())
                .or_default()
                .push(movement.clone());
        }
        streams
    }
}

/// Rebuilds the cash movements for `transactions` with per-currency balances.
pub fn reconstruct(transactions: &[Transaction]) -> Result<Vec<CashMovement>, LedgerError> {
    Ledger::build(transactions, CurrencyMode::Partition).map(Ledger::into_movements)
}

/// Signed amount, movement category and description for one transaction.
fn classify(tx: &Transaction) -> (Decimal, CashMovementType, String) {
    let name = &tx.asset_name;
    match &tx.transaction_type {
        TransactionType::Buy => (
            outflow(tx.amount),
            CashMovementType::Withdrawal,
            format!("Purchase {name}"),
        ),
        TransactionType::Sell => (
            tx.amount.abs(),
            CashMovementType::Deposit,
            format!("Sale of {name}"),
        ),
        TransactionType::Dividend => (
            tx.amount.abs(),
            CashMovementType::Distribution,
            format!("Dividend from {name}"),
        ),
        TransactionType::Interest => (
            tx.amount.abs(),
            CashMovementType::Interest,
            format!("Interest from {name}"),
        ),
        TransactionType::Fee => (
            outflow(tx.amount),
            CashMovementType::Other,
            format!("Fee: {name}"),
        ),
        // The source sign is kept.
        TransactionType::Other | TransactionType::Unrecognized(_) => {
            let kind = if tx.amount >= Decimal::ZERO {
                CashMovementType::Deposit
            } else {
                CashMovementType::Withdrawal
            };
            (tx.amount, kind, format!("{}: {name}", tx.transaction_type))
        }
    }
}

fn outflow(amount: Decimal) -> Decimal {
    if amount.is_zero() {
        Decimal::ZERO
    } else {
        -amount.abs()
    }
}

/// Parses a statement date into a sortable timestamp.
///
/// Accepts plain `YYYY-MM-DD` dates, RFC 3339 timestamps and naive
/// `YYYY-MM-DDTHH:MM:SS` timestamps. Plain dates sort as midnight.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Completes stored movements that lack a running balance, for display.
///
/// A missing balance becomes the sum of the amounts of the same currency up
/// to and including the row, in list order; missing amounts count as zero.
/// Rows that already carry a balance keep it. Sums saturate instead of
/// failing since the rows are shown as stored.
pub fn fill_missing_balances(extracted: &[ExtractedMovement]) -> Vec<CashMovement> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    extracted
        .iter()
        .map(|m| {
            let amount = m.amount.unwrap_or_default();
            let total = totals.entry(m.currency.as_str()).or_default();
            *total = total.saturating_add(amount);
            CashMovement {
                date: m.date.clone(),
                kind: m.kind,
                amount,
                currency: m.currency.clone(),
                running_balance: m.running_balance.unwrap_or(*total),
                description: m.description.clone(),
            }
        })
        .collect()
}

/// Last running balance shown for each currency.
pub fn closing_balances(movements: &[CashMovement]) -> BTreeMap<String, Decimal> {
    movements
        .iter()
        .map(|m| (m.currency.clone(), m.running_balance))
        .collect()
}
