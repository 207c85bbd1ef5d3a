//! Recursive single-document reference inlining.
//!
//! Each reference line is kept and followed by the resolved text of the
//! document it names. Files already inlined are suppressed on later visits,
//! which also breaks cycles. Missing files become inline error markers.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::parser::strip_bom;
use crate::reference::{absolute, collapse_blank_lines, parse_reference_line, resolve_against};

/// Resolve a document and everything it references, prefixed with a context map.
///
/// `seen` collects the absolute paths of every file that was inlined, in visit
/// order. Paths already present are not inlined again below the top level.
pub fn resolve(path: &Path, max_depth: usize, seen: &mut Vec<PathBuf>) -> String {
    let body = resolve_at(&absolute(path), 0, max_depth, seen);
    let map = render_context_map(seen);
    return collapse_blank_lines(&format!("{map}\n{body}"));
}

/// Resolve one file at a given recursion depth.
fn resolve_at(path: &Path, depth: usize, max_depth: usize, seen: &mut Vec<PathBuf>) -> String {
    if depth > max_depth {
        tracing::debug!(path = %path.display(), depth, "recursion bound reached");
        return format!(
            "<!-- Max recursion depth ({max_depth}) reached for {} -->",
            path.display()
        );
    }

    if depth > 0 && seen.iter().any(|p| return p == path) {
        return String::new();
    }

    let content = match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "referenced file not found");
            return format!("[ERROR: File not found: {}]", path.display());
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "referenced file unreadable");
            return format!("[ERROR: Could not read file {}: {e}]", path.display());
        },
        Ok(c) => c,
    };
    if !seen.iter().any(|p| return p == path) {
        seen.push(path.to_path_buf());
    }

    let mut out: Vec<String> = Vec::new();
    for line in strip_bom(&content).lines() {
        out.push(line.to_string());
        let Some(target) = parse_reference_line(line) else {
            continue;
        };

        let dependency = resolve_against(path, target);
        let inlined = resolve_at(&dependency, depth.saturating_add(1), max_depth, seen);
        out.push(String::new());
        out.push(format!("<!-- START EXTERNAL CONTEXT: {target} -->"));
        out.push(inlined);
        out.push("<!-- END EXTERNAL CONTEXT -->".to_string());
        out.push(String::new());
    }

    return collapse_blank_lines(&out.join("\n"));
}

/// List every inlined file by base name.
fn render_context_map(seen: &[PathBuf]) -> String {
    let mut map = String::from("<!-- CONTEXT MAP\nIncluded files:\n");
    for path in seen {
        let name = path.file_name().map_or_else(
            || return path.display().to_string(),
            |n| return n.to_string_lossy().into_owned(),
        );
        let _ = writeln!(map, "- {name}");
    }
    map.push_str("-->\n");
    return map;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test assertions")]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        return path;
    }

    #[test]
    fn inlines_references_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = write(dir.path(), "ui/cart.isl.md", "# Cart\n> **Reference**: [domain](../domain.isl.md)\ntail");
        write(dir.path(), "domain.isl.md", "# Domain\n> **Reference**: `shared/types.isl.md`\n");
        write(dir.path(), "shared/types.isl.md", "# Types\nOrder");

        let mut seen = Vec::new();
        let out = resolve(&root, 3, &mut seen);

        assert!(out.starts_with("<!-- CONTEXT MAP"));
        assert!(out.contains("- cart.isl.md\n- domain.isl.md\n- types.isl.md"));
        assert!(out.contains("<!-- START EXTERNAL CONTEXT: ../domain.isl.md -->"));
        assert!(out.contains("<!-- START EXTERNAL CONTEXT: shared/types.isl.md -->"));
        assert!(out.contains("# Types\nOrder"));
        assert!(out.contains("tail"));
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn cycles_are_suppressed_after_first_visit() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.isl.md", "# A\n> **Reference**: [b](b.isl.md)");
        write(dir.path(), "b.isl.md", "# B\n> **Reference**: [a](a.isl.md)");

        let mut seen = Vec::new();
        let out = resolve(&a, 5, &mut seen);
        assert_eq!(out.matches("# A").count(), 1);
        assert_eq!(out.matches("# B").count(), 1);
    }

    #[test]
    fn shared_dependency_is_inlined_once() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "a.isl.md",
            "# A\n> **Reference**: [b](b.isl.md)\n> **Reference**: [c](c.isl.md)",
        );
        write(dir.path(), "b.isl.md", "# B\n> **Reference**: [d](d.isl.md)");
        write(dir.path(), "c.isl.md", "# C\n> **Reference**: [d](d.isl.md)");
        write(dir.path(), "d.isl.md", "# D body");

        let out = resolve(&a, 5, &mut Vec::new());
        assert_eq!(out.matches("# D body").count(), 1);
    }

    #[test]
    fn missing_reference_is_an_inline_marker() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "a.isl.md",
            "# A\n> **Reference**: [gone](gone.isl.md)\n> **Reference**: [b](b.isl.md)",
        );
        write(dir.path(), "b.isl.md", "# B");

        let out = resolve(&a, 3, &mut Vec::new());
        assert!(out.contains("[ERROR: File not found: "));
        assert!(out.contains("# B"));
    }

    #[test]
    fn depth_bound_emits_marker() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.isl.md", "> **Reference**: [b](b.isl.md)");
        write(dir.path(), "b.isl.md", "> **Reference**: [c](c.isl.md)");
        write(dir.path(), "c.isl.md", "# C");

        let out = resolve(&a, 1, &mut Vec::new());
        assert!(out.contains("<!-- Max recursion depth (1) reached for "));
        assert!(!out.contains("# C"));
    }

    #[test]
    fn blank_runs_are_collapsed_and_bom_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.isl.md", "\u{FEFF}# A\n\n\n\n\nend");

        let out = resolve(&a, 3, &mut Vec::new());
        assert!(out.contains("# A\n\nend"));
        assert!(!out.contains('\u{FEFF}'));
    }
}
