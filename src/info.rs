use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config;
use crate::manifest::{MANIFEST_FILE, Manifest};

/// Exit codes shared by every command, with their meaning.
const EXIT_CODES: [(u8, &str); 3] = [
    (0, "Success / document valid / all documents fresh"),
    (1, "Document invalid / a document failed to build / rebuild needed"),
    (2, "Fatal error (cycle, no documents, I/O, bad config or manifest)"),
];

/// Validation rules: code, severity, meaning.
const RULES: [(&str, &str, &str); 18] = [
    ("ISL-001", "error", "Missing project header (# Project: Name)"),
    ("ISL-002", "warning", "Project title does not follow \"Project: Name\""),
    ("ISL-003", "warning", "Project description shorter than 20 characters"),
    ("ISL-010", "warning", "No Domain Concepts section"),
    ("ISL-011", "warning", "Domain entity without an Identity field"),
    ("ISL-012", "warning", "Domain entity without a Properties field"),
    ("ISL-INFO", "info", "Summary of registered domain entities"),
    ("ISL-020", "error", "No components defined"),
    ("ISL-021", "error", "Component without a Role section"),
    ("ISL-022", "error", "Role is neither Presentation nor Backend"),
    ("ISL-023", "warning", "Component without a capabilities section"),
    ("ISL-024", "warning", "Unrecognized section emoji"),
    ("ISL-030", "error", "Capability without a Contract"),
    ("ISL-031", "info", "Capability without a Signature"),
    ("ISL-032", "warning", "Flow without Test Scenarios"),
    ("ISL-033", "warning", "Constraint without an RFC 2119 keyword"),
    ("ISL-034", "warning", "Signature references an undefined domain entity"),
    ("ISL-040", "warning", "Semantic section outside any component"),
];

/// Project state shown at the end of the reference.
struct CurrentState {
    /// Whether `.islc.toml` exists.
    config_found: bool,
    /// Entry count of the last manifest, if one could be read.
    manifest_entries: Option<usize>,
    /// Manifest location relative to the root.
    manifest_path: PathBuf,
}

/// One exit code in the JSON output.
#[derive(Serialize)]
struct ExitCodeInfo {
    /// Process exit code.
    code: u8,
    /// What the code means.
    meaning: String,
}

/// Top-level JSON document.
#[derive(Serialize)]
struct InfoJson {
    /// Current project state.
    current_state: StateJson,
    /// Exit code table.
    exit_codes: Vec<ExitCodeInfo>,
    /// Validation rule table.
    rules: Vec<RuleInfo>,
    /// Crate version.
    version: String,
}

/// One validation rule in the JSON output.
#[derive(Serialize)]
struct RuleInfo {
    /// Stable rule code.
    code: String,
    /// What the rule checks.
    meaning: String,
    /// `error`, `warning`, or `info`.
    severity: String,
}

/// Project state in the JSON output.
#[derive(Serialize)]
struct StateJson {
    /// Whether `.islc.toml` exists.
    config_found: bool,
    /// Entry count of the last manifest.
    manifest_entries: Option<usize>,
    /// Manifest location relative to the root.
    manifest_path: String,
}

/// Inspect config and manifest under `root`. Unreadable files count as absent.
fn gather_state(root: &Path) -> CurrentState {
    let config_found = root.join(config::CONFIG_FILE).exists();
    let output = config::Config::load(root).map_or_else(|_err| return "build".to_string(), |c| return c.output);
    let manifest_path = PathBuf::from(output).join(MANIFEST_FILE);
    let manifest_entries = Manifest::read(&root.join(&manifest_path))
        .ok()
        .map(|m| return m.entries.len());

    return CurrentState {
        config_found,
        manifest_entries,
        manifest_path,
    };
}

/// Print the reference as pretty JSON.
fn print_json(state: &CurrentState) {
    let info = InfoJson {
        current_state: StateJson {
            config_found: state.config_found,
            manifest_entries: state.manifest_entries,
            manifest_path: state.manifest_path.display().to_string(),
        },
        exit_codes: EXIT_CODES
            .iter()
            .map(|(code, meaning)| return ExitCodeInfo { code: *code, meaning: (*meaning).to_string() })
            .collect(),
        rules: RULES
            .iter()
            .map(|(code, severity, meaning)| {
                return RuleInfo {
                    code: (*code).to_string(),
                    meaning: (*meaning).to_string(),
                    severity: (*severity).to_string(),
                };
            })
            .collect(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    // Plain structs of strings and integers always serialize.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
}

/// Print the reference as markdown.
fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_rules();
    println!();
    print_markdown_exit_codes();
    println!();
    print_markdown_state(state);
}

/// Exit code table.
fn print_markdown_exit_codes() {
    println!("## Exit Codes\n");
    println!("| Code | Meaning |");
    println!("|------|---------|");
    for (code, meaning) in EXIT_CODES {
        println!("| {code}    | {meaning} |");
    }
}

/// Document syntax, workflow, and configuration.
fn print_markdown_header(version: &str) {
    print!(
        "\
# islc {version}

Validator and incremental build orchestrator for ISL specification documents.

## Document Syntax

    # Project: Name                         project header and description
    ## Domain Concepts                      entity registry (### Entity, **Identity**, **Properties**)
    ## Component: Name                      one component per level-2 heading
    ### Role: Presentation | Backend        component role
    ### ⚡ Capabilities                      capability group (#### name per capability)
    **Contract**: / **Signature**: / **Flow**:   capability fields
    > **Reference**: [label](other.isl.md)  dependency on another document
    **Implementation**: src/file.js          target implementation path

Section markers: ⚡ capabilities, 🔍 appearance, 🚨 constraints, 📦 content,
🧪 tests, 💡 hints, ✅ acceptance.

## Workflow

    islc validate <file>              Check one document (exit 0/1)
    islc resolve <file>               Print a document with references inlined
    islc build                        Write .ref.md/.build.md artifacts and the manifest
    islc order                        Show the build order by level
    islc check                        Compare documents with the last build (exit 0/1)
    islc watch                        Rebuild when documents change

## Configuration (.islc.toml)

    suffix = \".isl.md\"                 # document file suffix
    output = \"build\"                   # artifact directory
    max_depth = 3                      # resolver recursion bound
    strict = false                     # treat warnings as errors
    include = [\"specs/\"]               # only scan these paths
    exclude = [\"specs/drafts/\"]        # skip these paths

"
    );
}

/// Validation rule table.
fn print_markdown_rules() {
    println!("## Validation Rules\n");
    println!("| Code | Severity | Meaning |");
    println!("|------|----------|---------|");
    for (code, severity, meaning) in RULES {
        println!("| {code} | {severity} | {meaning} |");
    }
}

/// Config and manifest presence.
fn print_markdown_state(state: &CurrentState) {
    println!("## Current State\n");
    if state.config_found {
        println!("Config:   {} (found)", config::CONFIG_FILE);
    } else {
        println!("Config:   {} (not found)", config::CONFIG_FILE);
    }

    let manifest = state.manifest_path.display();
    match state.manifest_entries {
        Some(n) => println!("Manifest: {manifest} ({n} documents)"),
        None => println!("Manifest: {manifest} (not found)"),
    }
}

/// Output the islc reference document for the current directory.
pub fn run(json: bool) {
    let state = gather_state(Path::new("."));

    if json {
        print_json(&state);
    } else {
        print_markdown(&state);
    }
}
