pub mod cli;
pub mod core;

use crate::cli::Processing;
use crate::core::{JsonFileSource, config::AppConfig};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    /// Show the cash movements of each statement, rebuilt unless `stored`
    Ledger {
        statements: Vec<String>,
        preview: bool,
        stored: bool,
    },
    /// Show closing balances per currency for each statement
    Balances { statements: Vec<String>, stored: bool },
    /// Write the normalized sheets of a statement to a directory
    Export {
        statement: String,
        out_dir: Option<String>,
        preview: bool,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("stmtx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    debug!("Loaded config: {config:#?}");

    let source = JsonFileSource::new(config.input_dir.as_ref().map(PathBuf::from));
    let mode = config.ledger.currency_mode;
    let preview_rows = |preview: bool| preview.then_some(config.export.preview_rows);
    let processing = |stored: bool| {
        if stored {
            Processing::Stored
        } else {
            Processing::Rebuild(mode)
        }
    };

    match command {
        AppCommand::Ledger {
            statements,
            preview,
            stored,
        } => {
            cli::ledger::run(
                &statements,
                &source,
                processing(stored),
                preview_rows(preview),
            )
            .await
        }
        AppCommand::Balances { statements, stored } => {
            cli::balances::run(&statements, &source, processing(stored)).await
        }
        AppCommand::Export {
            statement,
            out_dir,
            preview,
        } => {
            let out_dir = out_dir.map_or_else(|| config.output_dir(), PathBuf::from);
            cli::export::run(&statement, &source, mode, &out_dir, preview_rows(preview)).await
        }
    }
}
