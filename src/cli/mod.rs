pub mod balances;
pub mod export;
pub mod ledger;
pub mod setup;
pub mod ui;

use crate::core::{
    CurrencyMode, ProcessedStatement, StatementSource, load_stored, process_statement,
};
use anyhow::Result;
use futures::future::join_all;

/// Where the cash movements shown by a command come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processing {
    /// Rebuild them from the transactions.
    Rebuild(CurrencyMode),
    /// Show the movements stored in the document.
    Stored,
}

/// Processes every statement concurrently, keeping results in input order.
pub(crate) async fn process_all(
    ids: &[String],
    source: &(dyn StatementSource + Send + Sync),
    processing: Processing,
) -> Vec<(String, Result<ProcessedStatement>)> {
    let pb = ui::new_progress_bar(ids.len() as u64, true);
    pb.set_message("Processing statements...");

    let futures = ids.iter().map(|id| {
        let pb_clone = pb.clone();
        async move {
            let res = match processing {
                Processing::Rebuild(mode) => process_statement(source, id, mode).await,
                Processing::Stored => load_stored(source, id).await,
            };
            pb_clone.inc(1);
            (id.clone(), res)
        }
    });

    let results = join_all(futures).await;
    pb.finish_and_clear();
    results
}
