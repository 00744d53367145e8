//! Records exchanged with the extraction pipeline and the export layer.
//!
//! Field names follow the extractor's JSON schema so documents produced
//! upstream deserialize without a mapping step.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum AssetType {
    Equity,
    Fund,
    Bond,
    #[serde(rename = "Private Investment")]
    PrivateInvestment,
    Cash,
    Other,
}

impl From<&str> for AssetType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "equity" => AssetType::Equity,
            "fund" => AssetType::Fund,
            "bond" => AssetType::Bond,
            "private investment" => AssetType::PrivateInvestment,
            "cash" => AssetType::Cash,
            _ => AssetType::Other,
        }
    }
}

impl From<String> for AssetType {
    fn from(s: String) -> Self {
        AssetType::from(s.as_str())
    }
}

impl Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AssetType::Equity => "Equity",
            AssetType::Fund => "Fund",
            AssetType::Bond => "Bond",
            AssetType::PrivateInvestment => "Private Investment",
            AssetType::Cash => "Cash",
            AssetType::Other => "Other",
        })
    }
}

/// Kind of a dated financial event as labelled by the extractor.
///
/// Labels outside the schema are kept verbatim in `Unrecognized` and are
/// balanced like `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Interest,
    Fee,
    Other,
    Unrecognized(String),
}

impl From<&str> for TransactionType {
    fn from(s: &str) -> Self {
        let label = s.trim();
        match label.to_lowercase().as_str() {
            "buy" => TransactionType::Buy,
            "sell" => TransactionType::Sell,
            "dividend" => TransactionType::Dividend,
            "interest" => TransactionType::Interest,
            "fee" => TransactionType::Fee,
            "other" => TransactionType::Other,
            _ => {
                debug!("Unrecognized transaction type '{label}', balancing it as Other");
                TransactionType::Unrecognized(label.to_string())
            }
        }
    }
}

impl From<String> for TransactionType {
    fn from(s: String) -> Self {
        TransactionType::from(s.as_str())
    }
}

impl From<TransactionType> for String {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Unrecognized(label) => label,
            known => known.to_string(),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TransactionType::Buy => "Buy",
            TransactionType::Sell => "Sell",
            TransactionType::Dividend => "Dividend",
            TransactionType::Interest => "Interest",
            TransactionType::Fee => "Fee",
            TransactionType::Other => "Other",
            TransactionType::Unrecognized(label) => label.as_str(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum CashMovementType {
    Deposit,
    Withdrawal,
    Distribution,
    #[serde(rename = "Capital Call")]
    CapitalCall,
    Interest,
    Other,
}

impl From<&str> for CashMovementType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "deposit" => CashMovementType::Deposit,
            "withdrawal" => CashMovementType::Withdrawal,
            "distribution" => CashMovementType::Distribution,
            "capital call" => CashMovementType::CapitalCall,
            "interest" => CashMovementType::Interest,
            _ => CashMovementType::Other,
        }
    }
}

impl From<String> for CashMovementType {
    fn from(s: String) -> Self {
        CashMovementType::from(s.as_str())
    }
}

impl Display for CashMovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CashMovementType::Deposit => "Deposit",
            CashMovementType::Withdrawal => "Withdrawal",
            CashMovementType::Distribution => "Distribution",
            CashMovementType::CapitalCall => "Capital Call",
            CashMovementType::Interest => "Interest",
            CashMovementType::Other => "Other",
        })
    }
}

/// A snapshot of an owned position at `as_of_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub asset_name: String,
    pub asset_type: AssetType,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    pub currency: String,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub market_value: Option<Decimal>,
    pub as_of_date: String,
}

/// A dated event affecting holdings or cash.
///
/// `amount` is always present but its sign is whatever the source document
/// used; the ledger decides the cash direction from `transaction_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: String,
    pub asset_name: String,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub amount: Decimal,
    pub currency: String,
}

/// A ledger entry with the net cash effect of one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashMovement {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: CashMovementType,
    /// Positive is an inflow, negative an outflow.
    pub amount: Decimal,
    pub currency: String,
    pub running_balance: Decimal,
    pub description: String,
}

/// A cash movement as the extractor (or an older pipeline run) reported it.
///
/// Documents written before running balances existed omit
/// `running_balance`, and the model sometimes leaves `amount` out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMovement {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: CashMovementType,
    #[serde(default)]
    pub amount: Option<Decimal>,
    pub currency: String,
    #[serde(default)]
    pub running_balance: Option<Decimal>,
    #[serde(default)]
    pub description: String,
}

/// The three datasets extracted from a single statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default, rename = "cashMovements", alias = "cash_movements")]
    pub cash_movements: Vec<ExtractedMovement>,
}
