//! `kiln stream`: replay a generation stream, answer its followups and
//! write the resulting files.

use std::io::{self, IsTerminal};

use tracing::{debug, info, instrument, warn};

use kiln_adapters::{
    CachedResponder, CommandFormatter, JsonAnswerCache, LocalFilesystem, NdjsonReplaySource,
};
use kiln_core::application::{AtomicWriter, GenerationSession, ports::FollowupResponder};

use crate::{
    cli::StreamArgs,
    commands::{interrupt_token, materialize::report_created, merge},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
    responders::DefaultsResponder,
};

#[instrument(skip_all, fields(target = %args.target.display(), rounds = args.from.len()))]
pub fn execute(args: StreamArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let spinner = output.spinner("Waiting for generated files...");

    let mut session = GenerationSession::new()
        .with_max_rounds(args.max_rounds.unwrap_or(config.stream.max_rounds))
        .with_max_retries(config.stream.max_retries)
        .on_file({
            let spinner = spinner.clone();
            move |entry| spinner.set_message(format!("Received {}", entry.path))
        });
    if config.formatter.enabled && !args.no_format {
        session = session.with_formatter(Box::new(CommandFormatter::default()));
    }

    let mut source = NdjsonReplaySource::new(args.from.clone());
    let mut responder = build_responder(&args, &config, &output, &spinner);

    let outcome = session.run(&mut source, &mut responder);
    spinner.finish_and_clear();
    let outcome = outcome?;
    info!(
        rounds = outcome.rounds,
        files = outcome.entries.len(),
        "Generation finished"
    );

    if args.merge {
        let report = merge::writer(&config).merge_into(
            &args.target,
            outcome.entries,
            &outcome.new_dependencies,
        )?;
        merge::report_merged(&output, &report, &outcome.warnings)
    } else {
        if !outcome.new_dependencies.is_empty() {
            output.warning(&format!(
                "Generator requested dependencies ({}); they are only applied with --merge",
                outcome.new_dependencies.join(", ")
            ))?;
        }
        let writer = AtomicWriter::new(Box::new(LocalFilesystem::new()))
            .with_cancellation(interrupt_token());
        let report = writer.materialize(&args.target, outcome.entries)?;
        report_created(&output, &report, &outcome.warnings)
    }
}

fn build_responder(
    args: &StreamArgs,
    config: &AppConfig,
    output: &OutputManager,
    spinner: &indicatif::ProgressBar,
) -> Box<dyn FollowupResponder> {
    let interactive = !args.accept_defaults
        && !output.is_json()
        && io::stdin().is_terminal()
        && io::stderr().is_terminal();
    let inner = prompt_or_defaults(interactive, spinner);

    let cache = match &config.cache.path {
        Some(path) => Some(JsonAnswerCache::new(path.clone())),
        None => JsonAnswerCache::default_location()
            .map_err(|e| warn!(error = %e, "Answer cache disabled"))
            .ok(),
    };

    match cache {
        Some(cache) => {
            debug!(path = %cache.path().display(), "Using answer cache");
            Box::new(CachedResponder::new(inner, cache))
        }
        None => inner,
    }
}

#[cfg(feature = "interactive")]
fn prompt_or_defaults(interactive: bool, spinner: &indicatif::ProgressBar) -> Box<dyn FollowupResponder> {
    if interactive {
        Box::new(crate::responders::PromptResponder::new(spinner.clone()))
    } else {
        Box::new(DefaultsResponder)
    }
}

#[cfg(not(feature = "interactive"))]
fn prompt_or_defaults(interactive: bool, _spinner: &indicatif::ProgressBar) -> Box<dyn FollowupResponder> {
    if interactive {
        debug!("Built without prompts; answering followups with defaults");
    }
    Box::new(DefaultsResponder)
}
