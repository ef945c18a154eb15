use crate::commands::{
    run_analysis, run_reconcile, run_summarize, AnalyzeArgs, ReconcileArgs, SummarizeArgs,
};
use clap::{Parser, Subcommand};
use rental_choice::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "rental-choice",
    about = "Compare short-term and long-term rental revenue for every listing",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full analysis and write the bundle as JSON
    Run(AnalyzeArgs),
    /// Summarize the booking ledger only
    Summarize(SummarizeArgs),
    /// Reconcile long-term snapshots into canonical properties
    Reconcile(ReconcileArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run_analysis(args),
        Command::Summarize(args) => run_summarize(args),
        Command::Reconcile(args) => run_reconcile(args),
    }
}
