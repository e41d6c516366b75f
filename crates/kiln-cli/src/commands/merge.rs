//! `kiln merge`: layer a batch onto an existing project.

use tracing::{info, instrument};

use kiln_adapters::LocalFilesystem;
use kiln_core::application::{MergeReport, MergeWriter};

use crate::{
    cli::MergeArgs,
    commands::read_batch,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(target = %args.target.display()))]
pub fn execute(args: MergeArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let batch = read_batch(&args.from)?;
    let warnings = batch.warnings();
    info!(files = batch.files.len(), deps = args.deps.len(), "Merging batch");

    let report = writer(&config).merge_into(&args.target, batch.files, &args.deps)?;

    report_merged(&output, &report, &warnings)
}

pub(crate) fn writer(config: &AppConfig) -> MergeWriter {
    MergeWriter::new(Box::new(LocalFilesystem::new()))
        .with_manifest_path(config.writer.manifest_path.clone())
        .with_placeholder_version(config.writer.placeholder_version.clone())
}

pub(crate) fn report_merged(
    output: &OutputManager,
    report: &MergeReport,
    warnings: &[String],
) -> CliResult<()> {
    if output.is_json() {
        output.json(&serde_json::json!({
            "mode": "merge",
            "target": report.target,
            "written": report.written,
            "skipped_binary": report.skipped_binary,
            "added_dependencies": report.added_dependencies,
            "warnings": warnings,
        }))?;
        return Ok(());
    }

    output.success(&format!(
        "Merged {} file(s) into {}",
        report.written.len(),
        report.target.display()
    ))?;
    if !report.added_dependencies.is_empty() {
        output.info(&format!(
            "Added dependencies: {}",
            report.added_dependencies.join(", ")
        ))?;
        output.detail("Run your package manager's install to fetch them")?;
    }
    for path in &report.skipped_binary {
        output.warning(&format!("Skipped binary asset {path}; add it manually"))?;
    }
    for warning in warnings {
        output.warning(warning)?;
    }
    Ok(())
}
