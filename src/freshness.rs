//! Freshness checking of a previous build against the current documents.
//!
//! Every build context is recomputed in memory in dependency order and its
//! hash is compared with the one recorded in the manifest. Nothing is written.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::BuildPlan;
use crate::config::Config;
use crate::error::Error;
use crate::manifest::Manifest;

/// Result of checking one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckResult {
    /// The recorded hash matches the recomputed build context.
    Fresh,
    /// The document has no manifest entry yet.
    New,
    /// The manifest lists a document that no longer exists.
    Removed,
    /// The recomputed build context differs from the recorded one.
    Stale,
}

impl fmt::Display for CheckResult {
    /// Uppercase label used in check reports.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckResult::Fresh => "FRESH",
            CheckResult::New => "NEW",
            CheckResult::Removed => "REMOVED",
            CheckResult::Stale => "STALE",
        };
        return f.write_str(label);
    }
}

/// Check outcome for one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    /// Source document, relative to the root.
    pub source_path: String,
    /// How the document compares to the manifest.
    pub status: CheckResult,
}

/// Compare every document against the manifest of the last build.
///
/// Documents are reported in build order, followed by removed ones in
/// manifest order. An unreadable document is reported as stale.
///
/// # Errors
///
/// Returns planning errors (`NoDocuments`, `DependencyCycle`), or
/// `ManifestNotFound`/`ManifestCorrupt`/`Json` if the manifest cannot be used.
pub fn check(root: &Path, config: &Config) -> Result<Vec<DocumentStatus>, Error> {
    let plan = BuildPlan::new(root, config)?;
    let manifest = Manifest::read(&plan.manifest_path())?;

    let mut interfaces: BTreeMap<PathBuf, String> = BTreeMap::new();
    let mut statuses = Vec::with_capacity(plan.order.len());
    let mut current: BTreeSet<String> = BTreeSet::new();

    for document in &plan.order {
        let source_path = plan.relative_slash(document);
        let status = match plan.render(document, |dependency| return interfaces.get(dependency).cloned()) {
            Err(e) => {
                tracing::warn!(document = %source_path, error = %e, "cannot render document");
                CheckResult::Stale
            },
            Ok(rendered) => {
                let status = match manifest.entry(&source_path) {
                    None => CheckResult::New,
                    Some(entry) if entry.content_hash == rendered.entry.content_hash => CheckResult::Fresh,
                    Some(_) => CheckResult::Stale,
                };
                interfaces.insert(document.clone(), rendered.interface);
                status
            },
        };
        current.insert(source_path.clone());
        statuses.push(DocumentStatus { source_path, status });
    }

    for entry in &manifest.entries {
        if !current.contains(&entry.source_path) {
            statuses.push(DocumentStatus {
                source_path: entry.source_path.clone(),
                status: CheckResult::Removed,
            });
        }
    }

    return Ok(statuses);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::builder::build;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn status_of(statuses: &[DocumentStatus], source: &str) -> CheckResult {
        return statuses
            .iter()
            .find(|s| return s.source_path == source)
            .map(|s| return s.status)
            .unwrap();
    }

    #[test]
    fn fresh_after_build() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.isl.md", "# A");
        write(dir.path(), "b.isl.md", "# B\n> **Reference**: [a](a.isl.md)");
        build(dir.path(), &Config::default()).unwrap();

        let statuses = check(dir.path(), &Config::default()).unwrap();
        assert!(statuses.iter().all(|s| return s.status == CheckResult::Fresh));
    }

    #[test]
    fn dependency_change_makes_dependent_stale() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.isl.md", "# A");
        write(dir.path(), "b.isl.md", "# B\n> **Reference**: [a](a.isl.md)");
        write(dir.path(), "c.isl.md", "# C");
        build(dir.path(), &Config::default()).unwrap();

        write(dir.path(), "a.isl.md", "# A changed");
        let statuses = check(dir.path(), &Config::default()).unwrap();
        assert_eq!(status_of(&statuses, "a.isl.md"), CheckResult::Stale);
        assert_eq!(status_of(&statuses, "b.isl.md"), CheckResult::Stale);
        assert_eq!(status_of(&statuses, "c.isl.md"), CheckResult::Fresh);
    }

    #[test]
    fn flow_only_change_keeps_dependents_fresh() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.isl.md", "# A\n**Flow**:\n  1. one\n---\n");
        write(dir.path(), "b.isl.md", "# B\n> **Reference**: [a](a.isl.md)");
        build(dir.path(), &Config::default()).unwrap();

        write(dir.path(), "a.isl.md", "# A\n**Flow**:\n  1. two\n---\n");
        let statuses = check(dir.path(), &Config::default()).unwrap();
        assert_eq!(status_of(&statuses, "a.isl.md"), CheckResult::Stale);
        assert_eq!(status_of(&statuses, "b.isl.md"), CheckResult::Fresh);
    }

    #[test]
    fn new_and_removed_documents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.isl.md", "# A");
        write(dir.path(), "old.isl.md", "# Old");
        build(dir.path(), &Config::default()).unwrap();

        std::fs::remove_file(dir.path().join("old.isl.md")).unwrap();
        write(dir.path(), "new.isl.md", "# New");
        let statuses = check(dir.path(), &Config::default()).unwrap();
        assert_eq!(status_of(&statuses, "new.isl.md"), CheckResult::New);
        assert_eq!(status_of(&statuses, "old.isl.md"), CheckResult::Removed);
        assert_eq!(status_of(&statuses, "a.isl.md"), CheckResult::Fresh);
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.isl.md", "# A");
        let result = check(dir.path(), &Config::default());
        assert!(matches!(result, Err(Error::ManifestNotFound { .. })));
    }
}
