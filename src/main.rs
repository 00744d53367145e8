use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use stmtx::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for stmtx::AppCommand {
    fn from(cmd: Commands) -> stmtx::AppCommand {
        match cmd {
            Commands::Ledger {
                statements,
                preview,
                stored,
            } => stmtx::AppCommand::Ledger {
                statements,
                preview,
                stored,
            },
            Commands::Balances { statements, stored } => {
                stmtx::AppCommand::Balances { statements, stored }
            }
            Commands::Export {
                statement,
                out,
                preview,
            } => stmtx::AppCommand::Export {
                statement,
                out_dir: out,
                preview,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the cash movement ledger of extracted statements
    Ledger {
        /// Extraction result files (JSON)
        #[arg(required = true)]
        statements: Vec<String>,

        /// Only show the first rows of each ledger
        #[arg(short, long)]
        preview: bool,

        /// Show the cash movements stored in the files instead of rebuilding them
        #[arg(short, long)]
        stored: bool,
    },
    /// Display closing balances per currency
    Balances {
        /// Extraction result files (JSON)
        #[arg(required = true)]
        statements: Vec<String>,

        /// Use the cash movements stored in the files instead of rebuilding them
        #[arg(short, long)]
        stored: bool,
    },
    /// Export holdings, transactions and cash movements as CSV sheets
    Export {
        /// Extraction result file (JSON)
        statement: String,

        /// Output directory, defaults to the configured export directory
        #[arg(short, long)]
        out: Option<String>,

        /// Only export the first rows of each sheet
        #[arg(short, long)]
        preview: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => stmtx::cli::setup::setup(),
        Some(cmd) => stmtx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
