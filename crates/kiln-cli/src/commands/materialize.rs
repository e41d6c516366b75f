//! `kiln materialize`: create a new project from a batch, all or nothing.

use tracing::{info, instrument};

use kiln_adapters::LocalFilesystem;
use kiln_core::application::{AtomicWriter, MaterializeReport, Promotion};

use crate::{
    cli::MaterializeArgs,
    commands::{interrupt_token, read_batch},
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(target = %args.target.display()))]
pub fn execute(args: MaterializeArgs, output: OutputManager) -> CliResult<()> {
    let batch = read_batch(&args.from)?;
    let warnings = batch.warnings();
    info!(files = batch.files.len(), "Materializing batch");

    let writer =
        AtomicWriter::new(Box::new(LocalFilesystem::new())).with_cancellation(interrupt_token());
    let report = writer.materialize(&args.target, batch.files)?;

    report_created(&output, &report, &warnings)
}

/// Shared by `materialize` and `stream` in create mode.
pub(crate) fn report_created(
    output: &OutputManager,
    report: &MaterializeReport,
    warnings: &[String],
) -> CliResult<()> {
    if output.is_json() {
        output.json(&serde_json::json!({
            "mode": "create",
            "target": report.target,
            "written": report.written,
            "skipped_binary": report.skipped_binary,
            "promotion": match report.promotion {
                Promotion::Renamed => "renamed",
                Promotion::Copied => "copied",
            },
            "warnings": warnings,
        }))?;
        return Ok(());
    }

    output.success(&format!(
        "Created {} with {} file(s)",
        report.target.display(),
        report.written.len()
    ))?;
    if report.promotion == Promotion::Copied {
        output.info("Target is on another filesystem; files were copied into place")?;
    }
    for path in &report.skipped_binary {
        output.warning(&format!("Skipped binary asset {path}; add it manually"))?;
    }
    for warning in warnings {
        output.warning(warning)?;
    }
    Ok(())
}
