use std::fmt::Write as _;
use std::path::Path;

use crate::error::Error;
use crate::types::Diagnostic;
use crate::validator::ValidationReport;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Append one diagnostic group to a report, skipping empty groups.
fn push_group(out: &mut String, heading: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let _ = write!(out, "\n## {heading} ({})\n\n", diagnostics.len());
    for d in diagnostics {
        let location = d.line.map(|l| return format!(" (line {l})")).unwrap_or_default();
        let _ = writeln!(out, "- `{}` **{}**{location}: {}", d.rule, d.section, d.message);
    }
}

/// Render a dependency cycle with the documents that form it.
fn render_dependency_cycle(chain: &[std::path::PathBuf]) -> String {
    let chain_str = chain
        .iter()
        .map(|p| return p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ");

    return format!(
        "\
# Error: Dependency Cycle Detected

Documents reference each other in a loop: {chain_str}

No artifacts or manifest were written.

## Fix

Remove one `> **Reference**:` line from a document in the chain, or move the
shared definitions into a separate document both can reference.
"
    );
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::DependencyCycle { chain } => render_dependency_cycle(chain),
        Error::FileNotFound { path } => format!(
            "\
# Error: File Not Found

`{}` does not exist.
",
            path.display()
        ),
        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        Error::Json(e) => format!(
            "\
# Error: Invalid JSON

{e}
"
        ),
        Error::ManifestCorrupt { reason } => format!(
            "\
# Error: Manifest Corrupt

{reason}

## Fix

Regenerate the manifest:

    islc build
"
        ),
        Error::ManifestNotFound { path } => format!(
            "\
# Error: Manifest Not Found

`{}` does not exist.

## Fix

Run a build first:

    islc build
",
            path.display()
        ),
        Error::NoDocuments { root, suffix } => format!(
            "\
# Error: No Documents

No `*{suffix}` files under `{}`.

## Fix

Check the `suffix`, `include`, and `exclude` keys in `.islc.toml`, or run
the command from the project root.
",
            root.display()
        ),
        Error::TomlDe(e) => format!(
            "\
# Error: Invalid TOML

{e}

## Fix

Check `.islc.toml`. Allowed keys: `suffix`, `output`, `max_depth`, `strict`,
`include`, `exclude`.
"
        ),
        Error::Watch { reason } => format!(
            "\
# Error: Watch Failed

{reason}
"
        ),
    };
}

/// Render a validation report as markdown: stats, grouped findings, verdict.
pub fn render_report(path: &Path, report: &ValidationReport) -> String {
    let stats = &report.stats;
    let mut out = format!("# Validation: `{}`\n\n", path.display());
    let _ = writeln!(out, "- Components: {}", stats.components);
    let _ = writeln!(out, "- Capabilities: {}", stats.capabilities);
    let _ = writeln!(out, "- Domain concepts: {}", stats.domain_concepts);
    let _ = writeln!(out, "- Constraints: {}", stats.constraints);
    let _ = writeln!(out, "- Test scenarios: {}", stats.test_scenarios);

    push_group(&mut out, "Errors", &report.errors);
    push_group(&mut out, "Warnings", &report.warnings);
    push_group(&mut out, "Info", &report.info);

    let verdict = if report.valid { "PASSED" } else { "FAILED" };
    let _ = write!(
        out,
        "\n**{verdict}**: {} errors, {} warnings\n",
        report.errors.len(),
        report.warnings.len()
    );
    return out;
}
