/// Crate-level error types for islc.
use std::path::PathBuf;

/// All fatal errors in islc carry enough context to produce a useful diagnostic
/// without a debugger. Validation findings are never errors; they are diagnostics.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Document references form a cycle, so no build order exists.
    #[error("dependency cycle detected: {}", chain.iter().map(|p| return p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    DependencyCycle {
        /// Ordered chain of documents forming the cycle; first and last are equal.
        chain: Vec<PathBuf>,
    },

    /// A document named on the command line does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// Manifest exists but is structurally inconsistent.
    #[error("manifest corrupt: {reason}")]
    ManifestCorrupt {
        /// Description of the corruption.
        reason: String,
    },

    /// Expected manifest does not exist on disk.
    #[error("manifest not found: {}", path.display())]
    ManifestNotFound {
        /// Path to the missing manifest.
        path: PathBuf,
    },

    /// The project directory contains no documents with the configured suffix.
    #[error("no {suffix} documents found in {}", root.display())]
    NoDocuments {
        /// Project root that was scanned.
        root: PathBuf,
        /// Document suffix that was searched for.
        suffix: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// Filesystem watcher could not be set up.
    #[error("watch: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}
