use std::path::Path;

use crate::error::Error;

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE: &str = ".islc.toml";

/// Project configuration loaded from `.islc.toml`.
/// Include/exclude patterns are path prefixes applied to document paths
/// relative to the project root.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefixes that remove documents from the scan.
    exclude: Vec<String>,
    /// Prefixes that restrict the scan; empty means everything.
    include: Vec<String>,
    /// Recursion bound for the reference resolver.
    pub max_depth: usize,
    /// Output directory for artifacts, relative to the project root.
    pub output: String,
    /// Promote validation warnings to errors.
    pub strict: bool,
    /// File-name suffix that identifies a document.
    pub suffix: String,
}

/// Raw TOML structure for `.islc.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct IslcTomlConfig {
    /// See [`Config::exclude`].
    #[serde(default)]
    exclude: Vec<String>,
    /// See [`Config::include`].
    #[serde(default)]
    include: Vec<String>,
    /// See [`Config::max_depth`].
    max_depth: Option<usize>,
    /// See [`Config::output`].
    output: Option<String>,
    /// See [`Config::strict`].
    #[serde(default)]
    strict: bool,
    /// See [`Config::suffix`].
    suffix: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            exclude: Vec::new(),
            include: Vec::new(),
            max_depth: 3,
            output: "build".to_string(),
            strict: false,
            suffix: ".isl.md".to_string(),
        };
    }
}

impl Config {
    /// Load config from `.islc.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist.
    /// A config file that exists but is malformed is an error, not a fallback
    /// to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        return Self::parse(&content);
    }

    /// Parse config from TOML content, filling unset keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: IslcTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        return Ok(Self {
            exclude: raw.exclude,
            include: raw.include,
            max_depth: raw.max_depth.unwrap_or(defaults.max_depth),
            output: raw.output.unwrap_or(defaults.output),
            strict: raw.strict,
            suffix: raw.suffix.unwrap_or(defaults.suffix),
        });
    }

    /// Check whether a document path (relative to the root) should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern
    /// or lies inside the output directory.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        let output_prefix = format!("{}/", self.output.trim_end_matches('/'));
        if relative_path.starts_with(&output_prefix) {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test assertions")]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.suffix, ".isl.md");
        assert_eq!(config.output, "build");
        assert_eq!(config.max_depth, 3);
        assert!(!config.strict);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "suffix = [").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("sufix = \".md\"").is_err());
    }

    #[test]
    fn include_exclude_and_output_filtering() {
        let config = Config::parse("include = [\"specs/\"]\nexclude = [\"specs/drafts/\"]\noutput = \"out\"").unwrap();
        assert!(config.should_scan("specs/cart.isl.md"));
        assert!(!config.should_scan("specs/drafts/wip.isl.md"));
        assert!(!config.should_scan("notes/readme.isl.md"));

        let everything = Config::default();
        assert!(everything.should_scan("a/b.isl.md"));
        assert!(!everything.should_scan("build/a.isl.md"));
    }
}
