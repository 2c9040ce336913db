//! `dcmsort run` - sort a directory tree with the configured rule collections

use crate::cli::config::load_config;
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_table_colored, status_label, truncate_start};
use clap::Args;
use comfy_table::Color;
use dcmsort::sort::scan_path::expand_path;
use dcmsort::sort::{
    load_rules_dir, resolve_scan_root, ActionKind, CollectionReport, CollectionStatus, ExtractProgress,
    RunReport, ScanPathError, Sorter,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::info;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory to sort
    pub input: PathBuf,

    /// Output root for move, copy and link destinations
    pub output: PathBuf,

    /// Rules directory (overrides rules_dir from the config file)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Study info file name in the input directory
    #[arg(long)]
    pub studyinfo: Option<String>,

    /// Report what would happen without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Number of header extraction threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Extract headers on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Only print the summary table
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config()?;

    let input = resolve_scan_root(&args.input).map_err(scan_path_error)?;
    let output = expand_path(&args.output);

    let rules_dir = expand_path(args.rules.as_deref().unwrap_or(config.rules_dir.as_path()));
    let collections = load_rules_dir(&rules_dir)
        .map_err(|e| HelpfulError::rules_dir_unavailable(&rules_dir, &e.to_string()))?;

    let mut options = config.sort_options(args.dry_run);
    if let Some(name) = args.studyinfo {
        options.studyinfo_file = name;
    }
    if let Some(threads) = args.threads {
        options.extract_threads = threads;
    }
    if args.sequential {
        options.parallel_extract = false;
    }

    info!(
        input = %input.display(),
        output = %output.display(),
        rules = %rules_dir.display(),
        collections = collections.len(),
        dry_run = args.dry_run,
        "Starting sort run"
    );

    let show_progress = !args.json && !args.quiet;
    let (progress_tx, progress_thread) = if show_progress {
        let (tx, rx) = mpsc::channel::<ExtractProgress>();
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template("Reading headers {bar:40.cyan/blue} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        let handle = std::thread::spawn(move || {
            for update in rx {
                bar.set_length(update.total as u64);
                bar.set_position(update.done as u64);
            }
            bar.finish_and_clear();
        });
        (Some(tx), Some(handle))
    } else {
        (None, None)
    };

    let report = Sorter::new(options).run(&input, &output, &collections, progress_tx);
    if let Some(handle) = progress_thread {
        let _ = handle.join();
    }
    let report = report?;

    if args.json {
        return print_json(&report);
    }

    if !args.quiet {
        print_actions(&report);
    }
    print_summary(&report, &rules_dir);
    Ok(())
}

fn scan_path_error(err: ScanPathError) -> anyhow::Error {
    match err {
        ScanPathError::NotFound(path) => HelpfulError::path_not_found(&path).into(),
        ScanPathError::NotDirectory(path) => HelpfulError::not_a_directory(&path).into(),
        ScanPathError::NotReadable(path) => HelpfulError::directory_not_readable(&path).into(),
    }
}

fn print_actions(report: &RunReport) {
    for collection in &report.collections {
        for action in &collection.actions {
            match &action.error {
                None if action.action == ActionKind::Report => {
                    println!("{} -> {}", action.source, action.destination);
                }
                None => println!(
                    "{:<6} {} -> {}",
                    action.action.as_str().to_uppercase(),
                    action.source,
                    action.destination
                ),
                Some(err) => eprintln!(
                    "FAILED {} {} -> {}: {}",
                    action.action, action.source, action.destination, err
                ),
            }
        }
    }
}

fn print_summary(report: &RunReport, rules_dir: &Path) {
    println!();
    println!(
        "Scanned {} files ({} DICOM) in {}",
        report.files_scanned, report.files_recognized, report.scan_root
    );
    if report.scan_issues > 0 {
        println!("  {} entries could not be read (see log)", report.scan_issues);
    }
    if report.collections.is_empty() {
        println!("No rule collections found in {}", rules_dir.display());
        return;
    }
    if report.dry_run {
        println!("Dry run: no files were changed");
    }
    println!();

    let rows = report
        .collections
        .iter()
        .map(|c| {
            let (label, color) = status_label(c.status);
            let failed = c.actions.iter().filter(|a| !a.succeeded()).count();
            vec![
                (truncate_start(&c.name, 40), None),
                (label.to_string(), Some(color)),
                (c.matched.to_string(), None),
                (c.unmatched.to_string(), None),
                ((c.actions.len() - failed).to_string(), None),
                (failed.to_string(), if failed > 0 { Some(Color::Red) } else { None }),
                (detail(c), None),
            ]
        })
        .collect();

    print_table_colored(
        &["Collection", "Status", "Matched", "Unmatched", "Applied", "Failed", "Detail"],
        rows,
    );
}

fn detail(collection: &CollectionReport) -> String {
    match collection.status {
        CollectionStatus::Failed => collection.error.clone().unwrap_or_default(),
        CollectionStatus::HeldBack => collection
            .unmet()
            .map(|r| {
                format!(
                    "{}: {} matches, needs {}",
                    r.rule,
                    r.matches,
                    r.requirement.as_deref().unwrap_or("-")
                )
            })
            .collect::<Vec<_>>()
            .join("; "),
        CollectionStatus::Committed => String::new(),
    }
}
