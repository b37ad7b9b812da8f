use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{DocumentError, EditorConfig, EditorDocument, DEFAULT_CONFIG_NAME};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document .json file or directory of documents
    pub input: PathBuf,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    path: String,
    blocks: Option<usize>,
    code: Option<&'static str>,
    message: Option<String>,
}

pub fn validate(args: ValidateArgs, config: &EditorConfig) -> Result<()> {
    let files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        find_documents(&args.input)
    } else {
        return Err(anyhow!(
            "Input path does not exist: {}",
            args.input.display()
        ));
    };

    let reports: Vec<FileReport> = files
        .iter()
        .map(|path| check_file(path, &config.root_id))
        .collect::<Result<_>>()?;
    let failed = reports.iter().filter(|r| r.code.is_some()).count();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_report(&reports);
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} documents are invalid", failed, reports.len()));
    }
    Ok(())
}

fn check_file(path: &Path, root_id: &str) -> Result<FileReport> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;

    let checked = EditorDocument::from_json_with_root_id(&content, root_id).and_then(|doc| {
        doc.check_invariants()?;
        Ok::<_, DocumentError>(doc.size())
    });

    let path = path.display().to_string();
    debug!(%path, valid = checked.is_ok(), "document checked");
    Ok(match checked {
        Ok(size) => FileReport {
            path,
            blocks: Some(size - 1),
            code: None,
            message: None,
        },
        Err(e) => FileReport {
            path,
            blocks: None,
            code: Some(e.code()),
            message: Some(e.to_string()),
        },
    })
}

fn print_report(reports: &[FileReport]) {
    for report in reports {
        match (report.blocks, report.code) {
            (Some(blocks), _) => println!(
                "  {} {} ({} blocks)",
                "✓".green(),
                report.path,
                blocks
            ),
            (None, code) => eprintln!(
                "  {} {} - {} {}",
                "✗".red(),
                report.path,
                code.unwrap_or_default().red().bold(),
                report.message.as_deref().unwrap_or_default().red()
            ),
        }
    }

    println!();
    println!("   Documents checked: {}", reports.len());
}

fn find_documents(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p.extension().is_some_and(|ext| ext == "json")
                && p.file_name().is_some_and(|name| name != DEFAULT_CONFIG_NAME)
        })
        .collect();
    files.sort();
    files
}
