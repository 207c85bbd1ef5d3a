//! Build manifest persistence: parsing, serialization, and integrity checks.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::ContentHash;

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "build-manifest.json";

/// The manifest as a whole, a JSON array of entries in build order.
/// Every `sourcePath` appears at most once.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    /// Entries in the order the documents were built.
    pub entries: Vec<ManifestEntry>,
}

/// One built document. Paths are relative to the project root with `/`
/// separators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// The build-context artifact for this document.
    pub build_artifact_path: String,
    /// SHA-256 of the build-context text.
    pub content_hash: ContentHash,
    /// Target file declared by the document's `**Implementation**:` line.
    pub implementation_path: Option<String>,
    /// The interface artifact for this document.
    pub interface_artifact_path: String,
    /// The source document.
    pub source_path: String,
}

impl Manifest {
    /// Entry recorded for a source document, if any.
    pub fn entry(&self, source_path: &str) -> Option<&ManifestEntry> {
        return self.entries.iter().find(|e| return e.source_path == source_path);
    }

    /// Parse a manifest from JSON content.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the content is not a valid manifest,
    /// or `Error::ManifestCorrupt` if a source path is listed twice.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let manifest: Self = serde_json::from_str(content)?;
        enforce_unique_sources(&manifest.entries)?;
        return Ok(manifest);
    }

    /// Append an entry, replacing any earlier entry for the same source.
    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.retain(|e| return e.source_path != entry.source_path);
        self.entries.push(entry);
    }

    /// Read and parse a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::ManifestNotFound` if the file doesn't exist,
    /// `Error::Io` for other read failures,
    /// `Error::Json` if the content is invalid,
    /// or `Error::ManifestCorrupt` if a source path is listed twice.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ManifestNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn serialize(&self) -> Result<String, Error> {
        return Ok(serde_json::to_string_pretty(self)?);
    }

    /// Write the manifest to disk, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails,
    /// or `Error::Io` if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let content = self.serialize()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        return Ok(());
    }
}

/// Validate that no source path is recorded twice.
///
/// # Errors
///
/// Returns `Error::ManifestCorrupt` naming the first duplicate.
fn enforce_unique_sources(entries: &[ManifestEntry]) -> Result<(), Error> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for entry in entries {
        if !seen.insert(entry.source_path.as_str()) {
            return Err(Error::ManifestCorrupt {
                reason: format!("duplicate entry for {}", entry.source_path),
            });
        }
    }
    return Ok(());
}
