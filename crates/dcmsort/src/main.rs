//! dcmsort - sort DICOM study directories with declarative rule collections
//!
//! Commands:
//! - `run`: scan a directory, match files against every rule collection and
//!   apply the actions of collections whose requirements hold
//! - `rules`: show the loaded rule collections
//! - `inspect`: show the metadata record of one file
//! - `config`: show the resolved configuration

use clap::{Parser, Subcommand};
use dcmsort_logging::{init_logging, init_stderr_logging, LogConfig};
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "dcmsort", version, about = "Rule-driven sorting of DICOM study directories")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sort a directory tree with the configured rule collections
    Run(cli::run::RunArgs),

    /// List rule collections and their rules, or why they failed to load
    Rules(cli::rules::RulesArgs),

    /// Show the metadata (fileinfo, studyinfo, header) rules see for one file
    Inspect(cli::inspect::InspectArgs),

    /// Show configuration paths and values
    Config(cli::config::ConfigArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Run(args) => args.json,
        Commands::Rules(args) => args.json,
        Commands::Inspect(args) => args.json,
        Commands::Config(args) => args.json,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    if let Err(err) = init_logging(LogConfig {
        app_name: "dcmsort",
        verbose: cli.verbose,
    }) {
        init_stderr_logging(cli.verbose);
        tracing::warn!("File logging disabled: {:#}", err);
    }

    let result = match cli.command {
        Commands::Run(args) => cli::run::run(args),
        Commands::Rules(args) => cli::rules::run(args),
        Commands::Inspect(args) => cli::inspect::run(args),
        Commands::Config(args) => cli::config::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else if let Some(helpful) = err.downcast_ref::<cli::error::HelpfulError>() {
                eprint!("{}", helpful);
            } else {
                eprintln!("ERROR: {:#}", err);
            }
            ExitCode::from(1)
        }
    }
}
