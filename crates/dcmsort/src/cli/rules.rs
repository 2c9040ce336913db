//! `dcmsort rules` - load the rule collections and show what they contain

use crate::cli::config::load_config;
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_table};
use clap::Args;
use dcmsort::sort::scan_path::expand_path;
use dcmsort::sort::{load_rules_dir, CollectionLoad, Rule};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Rules directory (overrides rules_dir from the config file)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RulesOutput {
    rules_dir: PathBuf,
    collections: Vec<CollectionSummary>,
}

#[derive(Debug, Serialize)]
struct CollectionSummary {
    name: String,
    path: PathBuf,
    loaded: bool,
    error: Option<String>,
    rules: Vec<RuleSummary>,
}

#[derive(Debug, Serialize)]
struct RuleSummary {
    name: String,
    action: String,
    destination: String,
    tests: Vec<String>,
    requirement: Option<String>,
}

impl From<&Rule> for RuleSummary {
    fn from(rule: &Rule) -> Self {
        Self {
            name: rule.name().to_string(),
            action: rule.action().to_string(),
            destination: rule.destination().as_str().to_string(),
            tests: rule.tests().iter().map(|t| t.descriptor().to_string()).collect(),
            requirement: rule.requirement().map(|r| r.to_string()),
        }
    }
}

pub fn run(args: RulesArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let rules_dir = expand_path(args.rules.as_deref().unwrap_or(config.rules_dir.as_path()));
    let loads = load_rules_dir(&rules_dir)
        .map_err(|e| HelpfulError::rules_dir_unavailable(&rules_dir, &e.to_string()))?;

    let collections = loads
        .iter()
        .map(|load| match load {
            CollectionLoad::Loaded { path, ruleset } => CollectionSummary {
                name: ruleset.name().to_string(),
                path: path.clone(),
                loaded: true,
                error: None,
                rules: ruleset.rules().iter().map(RuleSummary::from).collect(),
            },
            CollectionLoad::Failed { path, name, error } => CollectionSummary {
                name: name.clone(),
                path: path.clone(),
                loaded: false,
                error: Some(error.to_string()),
                rules: Vec::new(),
            },
        })
        .collect();

    let output = RulesOutput {
        rules_dir,
        collections,
    };

    if args.json {
        return print_json(&output);
    }

    if output.collections.is_empty() {
        println!("No rule files (*.json, *.toml) in {}", output.rules_dir.display());
        return Ok(());
    }

    for collection in &output.collections {
        println!("{}", collection.name);
        if let Some(error) = &collection.error {
            println!("  ERROR: {}", error);
            println!();
            continue;
        }

        let rows = collection
            .rules
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.action.clone(),
                    r.destination.clone(),
                    r.tests.join("\n"),
                    r.requirement.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        print_table(&["Rule", "Action", "Destination", "Tests", "Requirement"], rows);
        println!();
    }
    Ok(())
}
