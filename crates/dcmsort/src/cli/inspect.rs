//! `dcmsort inspect` - show the metadata record rules see for one file

use crate::cli::config::load_config;
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_table};
use clap::Args;
use dcmsort::sort::extractor::run_timestamp;
use dcmsort::sort::scan_path::expand_path;
use dcmsort::sort::{load_study_info, Extractor};
use dcmsort_header::keyword_for_tag;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// File to inspect
    pub file: PathBuf,

    /// Scan root the file would be sorted from (default: the file's directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Study info file name in the scan root (default: from the config file)
    #[arg(long)]
    pub studyinfo: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct InspectOutput {
    path: String,
    recognized: bool,
    fileinfo: BTreeMap<String, String>,
    studyinfo: BTreeMap<String, String>,
    header: Vec<HeaderField>,
}

#[derive(Debug, Serialize)]
struct HeaderField {
    tag: String,
    keyword: Option<&'static str>,
    value: String,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let file = expand_path(&args.file);
    if !file.is_file() {
        return Err(HelpfulError::file_not_found(&file).into());
    }
    let file = file.canonicalize()?;

    let root = match &args.root {
        Some(root) => {
            let root = expand_path(root);
            if !root.is_dir() {
                return Err(HelpfulError::not_a_directory(&root).into());
            }
            root.canonicalize()?
        }
        None => file
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/")),
    };
    if !file.starts_with(&root) {
        return Err(HelpfulError::outside_root(&file, &root).into());
    }

    let studyinfo_file = match args.studyinfo {
        Some(name) => name,
        None => load_config()?.studyinfo_file,
    };
    let study = load_study_info(&root, &studyinfo_file);
    let record = Extractor::new(&root, study, run_timestamp()).extract(&file);

    let output = InspectOutput {
        path: file.display().to_string(),
        recognized: record.recognized,
        fileinfo: record.fileinfo.clone(),
        studyinfo: (*record.studyinfo).clone(),
        header: record
            .header
            .iter()
            .map(|(tag, value)| HeaderField {
                tag: format!("{:04X},{:04X}", tag.group, tag.element),
                keyword: keyword_for_tag(*tag),
                value: value.clone(),
            })
            .collect(),
    };

    if args.json {
        return print_json(&output);
    }

    println!("{}", output.path);
    println!(
        "  {}",
        if output.recognized {
            "DICOM header read"
        } else {
            "Not a readable DICOM file: header tests see empty values"
        }
    );
    println!();

    let pairs = |map: &BTreeMap<String, String>| -> Vec<Vec<String>> {
        map.iter().map(|(k, v)| vec![k.clone(), v.clone()]).collect()
    };
    print_table(&["fileinfo", "Value"], pairs(&output.fileinfo));
    if !output.studyinfo.is_empty() {
        print_table(&["studyinfo", "Value"], pairs(&output.studyinfo));
    }
    if !output.header.is_empty() {
        let rows = output
            .header
            .iter()
            .map(|h| vec![h.tag.clone(), h.keyword.unwrap_or("").to_string(), h.value.clone()])
            .collect();
        print_table(&["Tag", "Keyword", "Value"], rows);
    }
    Ok(())
}
