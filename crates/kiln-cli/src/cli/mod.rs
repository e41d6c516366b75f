//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "kiln",
    bin_name = "kiln",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{1f525} Safe materialization of generated project trees",
    long_about = "Kiln turns generator output (batches or NDJSON streams) into \
                  project directories: atomically for new projects, file by file \
                  for merges into existing ones.",
    after_help = "EXAMPLES:\n\
        \x20 kiln materialize ./my-app --from batch.json\n\
        \x20 kiln stream ./my-app --from round1.ndjson --from round2.ndjson\n\
        \x20 kiln merge ./my-app --from extra.json --dep zod\n\
        \x20 kiln collect ./scaffolded-app > context.json",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new project directory from a file batch.
    #[command(
        visible_alias = "m",
        about = "Create a new project atomically from a batch",
        after_help = "EXAMPLES:\n\
            \x20 kiln materialize ./my-app --from batch.json\n\
            \x20 generator | kiln materialize ./my-app --from -"
    )]
    Materialize(MaterializeArgs),

    /// Replay a recorded generation stream and write the result.
    #[command(
        visible_alias = "s",
        about = "Run a generation stream and write its files",
        after_help = "EXAMPLES:\n\
            \x20 kiln stream ./my-app --from events.ndjson\n\
            \x20 kiln stream ./my-app --from r1.ndjson --from r2.ndjson --merge"
    )]
    Stream(StreamArgs),

    /// Layer a batch onto an existing project.
    #[command(
        about = "Merge a batch into an existing project",
        after_help = "EXAMPLES:\n\
            \x20 kiln merge ./my-app --from extra.json\n\
            \x20 kiln merge ./my-app --from extra.json --dep zod --dep @tanstack/react-query"
    )]
    Merge(MergeArgs),

    /// Collect an existing project tree as a batch.
    #[command(
        about = "Print a project tree as a JSON batch",
        after_help = "EXAMPLES:\n\
            \x20 kiln collect ./scaffolded-app > context.json"
    )]
    Collect(CollectArgs),

    /// Initialise a Kiln configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 kiln init           # default location\n\
            \x20 kiln init --force   # overwrite an existing file"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 kiln completions bash > ~/.local/share/bash-completion/completions/kiln\n\
            \x20 kiln completions zsh  > ~/.zfunc/_kiln\n\
            \x20 kiln completions fish > ~/.config/fish/completions/kiln.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Kiln configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 kiln config get stream.max_rounds\n\
            \x20 kiln config list\n\
            \x20 kiln config path"
    )]
    Config(ConfigCommands),
}

// ── materialize ───────────────────────────────────────────────────────────────

/// Arguments for `kiln materialize`.
#[derive(Debug, Args)]
pub struct MaterializeArgs {
    /// Directory to create.  Must not exist yet.
    #[arg(value_name = "TARGET", help = "Project directory to create")]
    pub target: PathBuf,

    /// Batch file (`{"files": [...]}` or a bare array), or `-` for stdin.
    #[arg(
        short = 'f',
        long = "from",
        value_name = "FILE",
        default_value = "-",
        help = "Batch JSON file, or - for stdin"
    )]
    pub from: String,
}

// ── stream ────────────────────────────────────────────────────────────────────

/// Arguments for `kiln stream`.
#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Directory to write into.
    #[arg(value_name = "TARGET", help = "Project directory")]
    pub target: PathBuf,

    /// One NDJSON transcript per round, in order.
    #[arg(
        short = 'f',
        long = "from",
        value_name = "FILE",
        required = true,
        help = "NDJSON event file for the next round (repeatable, - for stdin)"
    )]
    pub from: Vec<String>,

    /// Merge into an existing directory instead of creating it.
    #[arg(long = "merge", help = "Merge into an existing project")]
    pub merge: bool,

    /// Skip the external formatter.
    #[arg(long = "no-format", help = "Do not run formatters on generated files")]
    pub no_format: bool,

    /// Answer followups with cached answers or their defaults, never prompt.
    #[arg(
        short = 'y',
        long = "accept-defaults",
        help = "Answer followups from cache or defaults without prompting"
    )]
    pub accept_defaults: bool,

    /// Override `stream.max_rounds`.
    #[arg(long = "max-rounds", value_name = "N", help = "Maximum followup rounds")]
    pub max_rounds: Option<u32>,
}

// ── merge ─────────────────────────────────────────────────────────────────────

/// Arguments for `kiln merge`.
#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Existing project directory.
    #[arg(value_name = "TARGET", help = "Existing project directory")]
    pub target: PathBuf,

    /// Batch file, or `-` for stdin.
    #[arg(
        short = 'f',
        long = "from",
        value_name = "FILE",
        default_value = "-",
        help = "Batch JSON file, or - for stdin"
    )]
    pub from: String,

    /// Dependency to add to the manifest.
    #[arg(
        short = 'd',
        long = "dep",
        value_name = "NAME",
        help = "Dependency to add to the manifest (repeatable)"
    )]
    pub deps: Vec<String>,
}

// ── collect ───────────────────────────────────────────────────────────────────

/// Arguments for `kiln collect`.
#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Project root to walk.
    #[arg(value_name = "DIR", help = "Project directory to collect")]
    pub dir: PathBuf,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `kiln init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `kiln completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `kiln config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `stream.max_rounds`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
