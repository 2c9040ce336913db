//! `dcmsort config` and config resolution shared by the other commands.
//!
//! All paths are under `DCMSORT_HOME` (default `~/.dcmsort`).

use crate::cli::error::HelpfulError;
use crate::cli::output::print_json;
use clap::Args;
use dcmsort::config::{config_path, SorterConfig};
use dcmsort_logging::{dcmsort_home, logs_dir};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ConfigOutput {
    home: PathBuf,
    config_file: PathBuf,
    config_file_exists: bool,
    logs_dir: PathBuf,
    #[serde(flatten)]
    config: SorterConfig,
}

/// Load `<home>/config.toml`, or defaults when it does not exist.
pub fn load_config() -> anyhow::Result<SorterConfig> {
    let path = config_path();
    SorterConfig::load_or_default(&path)
        .map_err(|e| HelpfulError::invalid_config(&path, &e.to_string()).into())
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let config_file = config_path();
    let output = ConfigOutput {
        home: dcmsort_home(),
        config_file_exists: config_file.exists(),
        config_file,
        logs_dir: logs_dir(),
        config: load_config()?,
    };

    if args.json {
        return print_json(&output);
    }

    println!("dcmsort configuration");
    println!();
    println!("  Home:             {}", output.home.display());
    println!(
        "  Config file:      {}{}",
        output.config_file.display(),
        if output.config_file_exists { "" } else { " (not found, using defaults)" }
    );
    println!("  Logs:             {}", output.logs_dir.display());
    println!();
    println!("  rules_dir:        {}", output.config.rules_dir.display());
    println!("  studyinfo_file:   {}", output.config.studyinfo_file);
    println!("  parallel_extract: {}", output.config.parallel_extract);
    println!("  extract_threads:  {}", output.config.extract_threads);
    Ok(())
}
