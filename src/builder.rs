//! Whole-project build: discovery, ordering, per-document artifacts, manifest.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Error;
use crate::graph::{DependencyGraph, discover};
use crate::hasher::hash_text;
use crate::interface::{DependencyInterface, compose_build_context, project_interface};
use crate::manifest::{MANIFEST_FILE, Manifest, ManifestEntry};
use crate::reference::{resolve_against, slash_path};

/// Where a document's two artifacts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Absolute path of the build-context artifact.
    pub build: PathBuf,
    /// Absolute path of the interface artifact.
    pub interface: PathBuf,
}

/// A document whose build step failed. The rest of the build continues.
#[derive(Debug)]
pub struct BuildFailure {
    /// Why the step failed.
    pub reason: String,
    /// Source document, relative to the root.
    pub source_path: String,
}

/// Everything `build` needs before the first artifact is written.
#[derive(Debug)]
pub struct BuildPlan {
    /// Project settings the plan was made with.
    pub config: Config,
    /// Dependency graph over every discovered document.
    pub graph: DependencyGraph,
    /// Topological build order, absolute paths.
    pub order: Vec<PathBuf>,
}

/// Outcome of a completed build pass.
#[derive(Debug)]
pub struct BuildSummary {
    /// Documents whose step failed, in build order.
    pub failures: Vec<BuildFailure>,
    /// Manifest that was written, one entry per successful document.
    pub manifest: Manifest,
    /// Absolute path the manifest was written to.
    pub manifest_path: PathBuf,
}

/// Both artifacts of one document, rendered but not yet written.
#[derive(Debug)]
pub struct RenderedDocument {
    /// Build-context text.
    pub build_context: String,
    /// Manifest entry describing the artifacts.
    pub entry: ManifestEntry,
    /// Interface projection text.
    pub interface: String,
    /// Where both artifacts belong.
    pub paths: ArtifactPaths,
}

impl BuildPlan {
    /// Artifact locations for a document: its path below the root, mirrored
    /// below the output directory, with the document suffix replaced.
    pub fn artifact_paths(&self, document: &Path) -> ArtifactPaths {
        let relative = self.graph.relative(document);
        let output = self.output_dir();
        let dir = relative.parent().map_or_else(|| return output.clone(), |p| return output.join(p));
        let file_name = relative
            .file_name()
            .map(|n| return n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file_name.strip_suffix(self.config.suffix.as_str()).unwrap_or(&file_name);

        return ArtifactPaths {
            build: dir.join(format!("{stem}.build.md")),
            interface: dir.join(format!("{stem}.ref.md")),
        };
    }

    /// Absolute path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        return self.output_dir().join(MANIFEST_FILE);
    }

    /// Discover every document, build the dependency graph, and order it.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoDocuments` if nothing matches the configured suffix,
    /// or `Error::DependencyCycle` if the documents reference each other in a loop.
    pub fn new(root: &Path, config: &Config) -> Result<Self, Error> {
        let documents = discover(root, config);
        if documents.is_empty() {
            return Err(Error::NoDocuments {
                root: root.to_path_buf(),
                suffix: config.suffix.clone(),
            });
        }
        tracing::debug!(count = documents.len(), "discovered documents");

        let graph = DependencyGraph::from_documents(root, &documents);
        let order = graph.build_order()?;
        return Ok(Self {
            config: config.clone(),
            graph,
            order,
        });
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        return self.graph.root().join(&self.config.output);
    }

    /// A path relative to the root with `/` separators.
    pub fn relative_slash(&self, path: &Path) -> String {
        return slash_path(&self.graph.relative(path));
    }

    /// Render both artifacts of one document.
    ///
    /// `interface_of` returns the interface text of an already-built
    /// dependency, given its absolute path. A dependency without one is
    /// left out of the build context with a warning.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the document cannot be read.
    pub fn render(
        &self,
        document: &Path,
        interface_of: impl Fn(&Path) -> Option<String>,
    ) -> Result<RenderedDocument, Error> {
        let content = std::fs::read_to_string(document)?;
        let paths = self.artifact_paths(document);
        let file_name = document
            .file_name()
            .map(|n| return n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let interface = project_interface(&file_name, &content);
        let context = compose_build_context(&file_name, &content, |target| {
            let dependency = resolve_against(document, target);
            if !self.graph.contains(&dependency) {
                tracing::debug!(reference = target, "reference is not a project document");
                return None;
            }
            let dependency_paths = self.artifact_paths(&dependency);
            let name = dependency_paths
                .interface
                .file_name()
                .map(|n| return n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let Some(text) = interface_of(&dependency) else {
                tracing::warn!(
                    document = %file_name,
                    dependency = %dependency_paths.interface.display(),
                    "dependency interface missing, skipped"
                );
                return None;
            };
            return Some(DependencyInterface { name, text });
        });

        if context.implementation_path.is_none() {
            tracing::warn!(document = %file_name, "no **Implementation**: line, implementationPath is null");
        }

        let entry = ManifestEntry {
            build_artifact_path: self.relative_slash(&paths.build),
            content_hash: hash_text(&context.text),
            implementation_path: context.implementation_path,
            interface_artifact_path: self.relative_slash(&paths.interface),
            source_path: self.relative_slash(document),
        };

        return Ok(RenderedDocument {
            build_context: context.text,
            entry,
            interface,
            paths,
        });
    }
}

/// Build every document under `root` in dependency order and write the manifest.
///
/// Cycles and empty projects abort before anything is written. A document
/// that cannot be read or written is recorded as a failure, gets no manifest
/// entry, and the pass moves on.
///
/// # Errors
///
/// Returns `Error::NoDocuments` or `Error::DependencyCycle` from planning,
/// or `Error::Io`/`Error::Json` if the manifest cannot be written.
pub fn build(root: &Path, config: &Config) -> Result<BuildSummary, Error> {
    let plan = BuildPlan::new(root, config)?;
    tracing::info!(documents = plan.graph.len(), "build order computed");

    let mut manifest = Manifest::default();
    let mut failures = Vec::new();

    for document in &plan.order {
        let source_path = plan.relative_slash(document);
        let outcome = plan
            .render(document, |dependency| {
                return std::fs::read_to_string(plan.artifact_paths(dependency).interface).ok();
            })
            .and_then(|rendered| {
                write_artifacts(&rendered)?;
                return Ok(rendered);
            });

        match outcome {
            Ok(rendered) => {
                tracing::info!(document = %source_path, "built");
                manifest.push(rendered.entry);
            },
            Err(e) => {
                tracing::warn!(document = %source_path, error = %e, "build step failed");
                remove_stale_interface(&plan.artifact_paths(document).interface);
                failures.push(BuildFailure {
                    reason: e.to_string(),
                    source_path,
                });
            },
        }
    }

    let manifest_path = plan.manifest_path();
    manifest.write(&manifest_path)?;
    tracing::info!(entries = manifest.entries.len(), path = %manifest_path.display(), "manifest written");

    return Ok(BuildSummary {
        failures,
        manifest,
        manifest_path,
    });
}

/// Drop an interface artifact left by an earlier build so dependents of a
/// failed document do not inline outdated text.
fn remove_stale_interface(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "cannot remove stale interface");
    }
}

/// Write both artifacts, creating the mirrored directory.
///
/// # Errors
///
/// Returns `Error::Io` if a directory or file cannot be written.
fn write_artifacts(rendered: &RenderedDocument) -> Result<(), Error> {
    if let Some(parent) = rendered.paths.interface.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&rendered.paths.interface, &rendered.interface)?;
    std::fs::write(&rendered.paths.build, &rendered.build_context)?;
    return Ok(());
}
