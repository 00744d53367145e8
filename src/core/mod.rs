//! Core business logic abstractions

pub mod config;
pub mod ledger;
pub mod log;
pub mod model;
pub mod source;

// Re-export main types for cleaner imports
pub use ledger::{CurrencyMode, Ledger, LedgerError, reconstruct};
pub use model::{
    AssetType, CashMovement, CashMovementType, ExtractedMovement, ExtractionResult, Holding,
    Transaction, TransactionType,
};
pub use source::{
    JsonFileSource, ProcessedStatement, StatementSource, load_stored, process_statement,
};
