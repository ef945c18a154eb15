use crate::infra::{bootstrap, write_json, ConfigOverrides, OutputArgs};
use clap::Args;
use rental_choice::analysis::calendar::{self, ObservationWindow, PropertySummary};
use rental_choice::analysis::reconcile::{self, Reconciliation};
use rental_choice::analysis::{self, AnalysisBundle, AnalysisInputs};
use rental_choice::error::AppError;
use rental_choice::ingest::{IngestReport, LedgerImporter, ListingImporter, SnapshotImporter};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Daily booking ledger CSV
    #[arg(long)]
    pub(crate) ledger: PathBuf,
    /// Short-term listing attributes CSV
    #[arg(long)]
    pub(crate) listings: PathBuf,
    /// Long-term advert snapshots CSV
    #[arg(long)]
    pub(crate) snapshots: PathBuf,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
    #[command(flatten)]
    pub(crate) overrides: ConfigOverrides,
}

#[derive(Args, Debug)]
pub(crate) struct SummarizeArgs {
    /// Daily booking ledger CSV
    #[arg(long)]
    pub(crate) ledger: PathBuf,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
    #[command(flatten)]
    pub(crate) overrides: ConfigOverrides,
}

#[derive(Args, Debug)]
pub(crate) struct ReconcileArgs {
    /// Long-term advert snapshots CSV
    #[arg(long)]
    pub(crate) snapshots: PathBuf,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
    #[command(flatten)]
    pub(crate) overrides: ConfigOverrides,
}

#[derive(Serialize)]
struct AnalysisOutput {
    ingest: Vec<IngestReport>,
    #[serde(flatten)]
    bundle: AnalysisBundle,
}

#[derive(Serialize)]
struct SummaryOutput {
    ingest: IngestReport,
    summaries: Vec<PropertySummary>,
}

#[derive(Serialize)]
struct ReconcileOutput {
    ingest: IngestReport,
    #[serde(flatten)]
    reconciliation: Reconciliation,
}

pub(crate) fn run_analysis(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        ledger,
        listings,
        snapshots,
        output,
        overrides,
    } = args;
    let config = bootstrap(&overrides)?;

    let ledger = LedgerImporter::from_path(&ledger)?;
    let listings = ListingImporter::from_path(&listings)?;
    let snapshots = SnapshotImporter::from_path(&snapshots)?;

    let inputs = AnalysisInputs {
        observations: ledger.records,
        listings: listings.records,
        snapshots: snapshots.records,
    };
    let bundle = analysis::run(inputs, &config);
    info!(properties = bundle.properties.len(), "writing analysis bundle");

    let result = AnalysisOutput {
        ingest: vec![ledger.report, listings.report, snapshots.report],
        bundle,
    };
    write_json(&result, output.output.as_deref(), output.pretty)
}

pub(crate) fn run_summarize(args: SummarizeArgs) -> Result<(), AppError> {
    let config = bootstrap(&args.overrides)?;
    let ledger = LedgerImporter::from_path(&args.ledger)?;

    let window = ObservationWindow::new(config.window_start, config.window_days);
    let summaries = calendar::summarize(ledger.records, &window, config.shards);

    let result = SummaryOutput {
        ingest: ledger.report,
        summaries,
    };
    write_json(&result, args.output.output.as_deref(), args.output.pretty)
}

pub(crate) fn run_reconcile(args: ReconcileArgs) -> Result<(), AppError> {
    bootstrap(&args.overrides)?;
    let snapshots = SnapshotImporter::from_path(&args.snapshots)?;
    let reconciliation = reconcile::reconcile(snapshots.records);

    let result = ReconcileOutput {
        ingest: snapshots.report,
        reconciliation,
    };
    write_json(&result, args.output.output.as_deref(), args.output.pretty)
}
