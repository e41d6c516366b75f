//! `kiln collect`: print an existing project tree as a JSON batch.
//!
//! The output is the context a generator needs to layer features onto a
//! freshly scaffolded project, and it round-trips into `kiln merge`.

use tracing::instrument;

use kiln_adapters::ScaffoldCollector;
use kiln_core::domain::GenerationBatch;

use crate::{cli::CollectArgs, error::CliResult, output::OutputManager};

#[instrument(skip_all, fields(dir = %args.dir.display()))]
pub fn execute(args: CollectArgs, output: OutputManager) -> CliResult<()> {
    let files = ScaffoldCollector::new().collect(&args.dir)?;

    let batch = GenerationBatch {
        project_name: args
            .dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())),
        files,
        metadata: None,
    };

    output.json(&batch)?;
    Ok(())
}
