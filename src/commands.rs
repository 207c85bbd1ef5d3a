//! Core CLI commands for islc: validate, resolve, build, order, check, info.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::builder::{self, BuildPlan};
use crate::config;
use crate::error;
use crate::freshness::{self, CheckResult};
use crate::parser;
use crate::resolver;
use crate::validator;

/// Exit code for a build that completed with per-document failures.
const PARTIAL_FAILURE: u8 = 1;

/// Build every document in dependency order and write the manifest.
///
/// # Errors
///
/// Returns errors from config loading, planning, or manifest writing.
pub fn build() -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let summary = builder::build(&root, &config)?;

    for failure in &summary.failures {
        println!("FAILED  {} ({})", failure.source_path, failure.reason);
    }

    let built = summary.manifest.entries.len();
    let manifest = display_relative(&summary.manifest_path);
    if summary.failures.is_empty() {
        println!("Built {built} documents, manifest: {manifest}");
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    println!("{} failed, {built} built, manifest: {manifest}", summary.failures.len());
    return Ok(ExitCode::from(PARTIAL_FAILURE));
}

/// Recompute every build context and compare it with the last manifest.
///
/// # Errors
///
/// Returns errors from config loading, planning, or manifest reading.
pub fn check(json: bool) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let statuses = freshness::check(&root, &config)?;
    let changed = statuses.iter().filter(|s| return s.status != CheckResult::Fresh).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        for status in statuses.iter().filter(|s| return s.status != CheckResult::Fresh) {
            println!("{:<8}{}", status.status.to_string(), status.source_path);
        }
        if changed == 0 {
            println!("All {} documents fresh", statuses.len());
        } else {
            println!();
            println!("{changed} of {} documents need a rebuild", statuses.len());
        }
    }

    if changed == 0 {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::from(1));
}

/// Show a path relative to the working directory when possible.
fn display_relative(path: &Path) -> String {
    let cwd = std::env::current_dir().unwrap_or_default();
    return path.strip_prefix(&cwd).unwrap_or(path).display().to_string();
}

/// Output the islc reference document.
pub fn info(json: bool) {
    return crate::info::run(json);
}

/// Print the build order grouped into independent levels.
///
/// # Errors
///
/// Returns errors from config loading or planning.
pub fn order(json: bool) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let plan = BuildPlan::new(&root, &config)?;
    let levels: Vec<Vec<String>> = plan
        .graph
        .levels(&plan.order)
        .iter()
        .map(|level| return level.iter().map(|p| return plan.relative_slash(p)).collect())
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&levels)?);
        return Ok(());
    }

    for (idx, level) in levels.iter().enumerate() {
        if idx > 0 {
            println!();
        }
        println!("## Level {idx}");
        println!();
        for document in level {
            println!("- {document}");
        }
    }
    return Ok(());
}

/// Resolve one document with its references inlined and print it.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the document doesn't exist,
/// or config loading errors.
pub fn resolve(path: &Path, depth: Option<usize>) -> Result<(), error::Error> {
    if !path.is_file() {
        return Err(error::Error::FileNotFound { path: path.to_path_buf() });
    }
    let config = config::Config::load(Path::new("."))?;
    let max_depth = depth.unwrap_or(config.max_depth);

    let mut seen = Vec::new();
    let text = resolver::resolve(path, max_depth, &mut seen);
    tracing::info!(files = seen.len(), max_depth, "resolved");
    println!("{text}");
    return Ok(());
}

/// Validate one document and print the report.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the document doesn't exist,
/// `Error::Io` if it cannot be read, or config loading errors.
pub fn validate(path: &Path, json: bool, strict: bool) -> Result<ExitCode, error::Error> {
    let content = match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(error::Error::FileNotFound { path: path.to_path_buf() });
        },
        Err(e) => return Err(error::Error::Io(e)),
        Ok(c) => c,
    };
    let config = config::Config::load(Path::new("."))?;

    let sections = parser::parse(&content);
    let mut report = validator::validate(&sections);
    if strict || config.strict {
        report = report.into_strict();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", crate::diagnostics::render_report(path, &report));
    }

    if report.valid {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::from(1));
}
