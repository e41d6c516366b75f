//! # Kiln CLI
//!
//! Turns generator output into project directories on disk.
//!
//! ## Startup sequence
//!
//! 1. Load `.env`, then parse arguments (clap exits early for `--help`).
//! 2. Install the tracing subscriber.
//! 3. Load configuration (defaults, file, `KILN_*` environment).
//! 4. Dispatch to a command handler.
//! 5. Turn any [`CliError`] into a message and an exit code.
//!
//! ## Exit codes
//!
//! | Code | Meaning                            |
//! |------|------------------------------------|
//! |  0   | Success                            |
//! |  1   | Internal, I/O or generator failure |
//! |  2   | Invalid input or target conflict   |
//! |  3   | Resource not found                 |
//! |  4   | Configuration error                |

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};

use crate::{
    cli::{Cli, Commands, GlobalArgs, OutputFormat},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;
mod responders;

fn main() -> ExitCode {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version arrive here too and exit 0.
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { 2 } else { 0 });
        }
    };

    if let Err(e) = init_logging(&cli.global) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::from(1);
    }
    debug!(
        verbose = cli.global.verbose,
        quiet = cli.global.quiet,
        "CLI started"
    );

    let verbose = cli.global.verbose > 0;
    let json = cli.global.output_format == OutputFormat::Json;

    match run(cli) {
        Ok(()) => {
            info!("kiln finished");
            ExitCode::SUCCESS
        }
        Err(e) => handle_error(e, verbose, json),
    }
}

#[instrument(skip_all)]
fn run(cli: Cli) -> CliResult<()> {
    let Cli { global, command } = cli;

    // These never read the config file, so a broken one cannot block them.
    match command {
        Commands::Completions(args) => commands::completions::execute(args),
        Commands::Init(args) => {
            let output = OutputManager::new(&global, &AppConfig::default());
            commands::init::execute(args, global.config.clone(), output)
        }
        other => run_configured(global, other),
    }
}

fn run_configured(global: GlobalArgs, command: Commands) -> CliResult<()> {
    let config = AppConfig::load(global.config.as_ref()).map_err(|e| CliError::ConfigError {
        message: format!("{e:#}"),
        source: None,
    })?;
    let output = OutputManager::new(&global, &config);

    match command {
        Commands::Materialize(args) => commands::materialize::execute(args, output),
        Commands::Stream(args) => commands::stream::execute(args, config, output),
        Commands::Merge(args) => commands::merge::execute(args, config, output),
        Commands::Collect(args) => commands::collect::execute(args, output),
        Commands::Config(cmd) => commands::config::execute(cmd, global.config, config, output),
        Commands::Completions(args) => commands::completions::execute(args),
        Commands::Init(args) => commands::init::execute(args, global.config, output),
    }
}

/// Log the error, show it, and pick the exit code.
fn handle_error(err: CliError, verbose: bool, json: bool) -> ExitCode {
    err.log();

    if json {
        println!("{}", err.to_json());
    } else if std::io::stderr().is_terminal() {
        eprint!("{}", err.format_colored(verbose));
    } else {
        eprint!("{}", err.format_plain(verbose));
    }

    ExitCode::from(err.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_version_matches_cargo() {
        assert_eq!(Cli::command().get_version(), Some(env!("CARGO_PKG_VERSION")));
    }
}
