//! The reference-line sub-grammar and the small path/text helpers shared by
//! the resolver and the build orchestrator.
//!
//! A reference line is a block quote that opens with `**Reference**` and names
//! its target either as a markdown link or as a backtick-quoted path:
//!
//! ```text
//! > **Reference**: uses `Order` from [domain](./domain.isl.md)
//! > **Reference**: see `../shared/auth.isl.md`
//! ```

use std::path::{Component, Path, PathBuf};

/// Literal that opens a reference after the block-quote marker.
const REFERENCE_PREFIX: &str = "**Reference**";

/// Literal that opens the implementation-path metadata line.
const IMPLEMENTATION_PREFIX: &str = "**Implementation**";

/// Make a path absolute against the working directory and normalize it lexically.
pub fn absolute(path: &Path) -> PathBuf {
    let joined = std::path::absolute(path).unwrap_or_else(|_err| return path.to_path_buf());
    return normalize_path(&joined);
}

/// Collapse every run of three or more line breaks into exactly two,
/// leaving at most one empty line between blocks of text.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0_usize;
    for ch in text.chars() {
        if ch == '\n' {
            newlines = newlines.saturating_add(1);
            if newlines <= 2 {
                out.push(ch);
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }
    return out;
}

/// Last closed, non-empty backtick span in `text`.
fn last_backtick_span(text: &str) -> Option<&str> {
    let parts: Vec<&str> = text.split('`').collect();
    // Odd-indexed parts sit between backticks; the final part is only
    // enclosed when another part follows it.
    return parts
        .iter()
        .enumerate()
        .filter(|(idx, part)| {
            return idx % 2 == 1 && idx.saturating_add(1) < parts.len() && !part.trim().is_empty();
        })
        .map(|(_, part)| return part.trim())
        .next_back();
}

/// Last well-formed `[text](target)` link target in `text`.
/// An optional quoted link title after the target is allowed.
fn last_link_target(text: &str) -> Option<&str> {
    let mut found = None;
    for (idx, _) in text.match_indices("](") {
        let before = text.get(..idx).unwrap_or("");
        if !before.contains('[') {
            continue;
        }
        let after = text.get(idx.saturating_add(2)..).unwrap_or("");
        let end = after
            .find(|c: char| return c.is_whitespace() || c == '"' || c == ')')
            .unwrap_or(after.len());
        let (target, tail) = after.split_at(end);
        if target.is_empty() || !tail.contains(')') {
            continue;
        }
        found = Some(target);
    }
    return found;
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Extract the implementation path from a `**Implementation**: <path>` line.
/// Surrounding backticks on the value are dropped.
pub fn parse_implementation_line(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix(IMPLEMENTATION_PREFIX)?;
    let value = rest.trim_start().strip_prefix(':')?.trim();
    let value = value.trim_matches('`').trim();
    if value.is_empty() {
        return None;
    }
    return Some(value);
}

/// Extract the relative target path from a reference line.
///
/// Link targets win over backtick spans on the same line. External
/// `http(s)://` links are not references.
pub fn parse_reference_line(line: &str) -> Option<&str> {
    let rest = line
        .trim_start()
        .strip_prefix('>')?
        .trim_start()
        .strip_prefix(REFERENCE_PREFIX)?;

    let target = last_link_target(rest).or_else(|| return last_backtick_span(rest))?;
    if target.starts_with("http://") || target.starts_with("https://") {
        return None;
    }
    return Some(target);
}

/// Handle a single path component during normalization.
/// Pops the last component for `..` when possible, preserves it otherwise.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => {
            let can_pop = matches!(
                components.last(),
                Some(c) if matches!(c, Component::Normal(_))
            );
            if can_pop {
                components.pop();
            } else if !matches!(components.last(), Some(Component::RootDir | Component::Prefix(_))) {
                components.push(component);
            }
        },
        other => components.push(other),
    }
}

/// Resolve a reference target against the directory of the referencing file.
pub fn resolve_against(referencing_file: &Path, target: &str) -> PathBuf {
    let dir = referencing_file.parent().unwrap_or(Path::new(""));
    return normalize_path(&dir.join(target));
}

/// Render a relative path with `/` separators on every platform.
pub fn slash_path(path: &Path) -> String {
    return path
        .components()
        .map(|c| return c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test assertions")]
mod tests {
    use super::*;

    #[test]
    fn link_target_is_extracted() {
        let line = "> **Reference**: uses `Order` from [domain](./domain.isl.md)";
        assert_eq!(parse_reference_line(line), Some("./domain.isl.md"));
    }

    #[test]
    fn link_wins_over_later_backtick_span() {
        let line = "> **Reference**: [x](a.isl.md) uses `Order`";
        assert_eq!(parse_reference_line(line), Some("a.isl.md"));
    }

    #[test]
    fn link_title_is_ignored() {
        let line = r#"> **Reference**: [auth](../auth.isl.md "Auth spec")"#;
        assert_eq!(parse_reference_line(line), Some("../auth.isl.md"));
    }

    #[test]
    fn backtick_path_is_extracted() {
        let line = "> **Reference**: see `shared/types.isl.md`";
        assert_eq!(parse_reference_line(line), Some("shared/types.isl.md"));
    }

    #[test]
    fn unclosed_backtick_is_not_a_target() {
        assert_eq!(parse_reference_line("> **Reference**: see `broken"), None);
    }

    #[test]
    fn plain_lines_are_not_references() {
        assert_eq!(parse_reference_line("**Reference**: [a](a.isl.md)"), None);
        assert_eq!(parse_reference_line("> Reference: [a](a.isl.md)"), None);
        assert_eq!(parse_reference_line("> **Reference**: nothing here"), None);
    }

    #[test]
    fn external_links_are_not_references() {
        assert_eq!(parse_reference_line("> **Reference**: [rfc](https://example.com/x)"), None);
    }

    #[test]
    fn implementation_line_is_parsed() {
        assert_eq!(parse_implementation_line("**Implementation**: src/cart.js"), Some("src/cart.js"));
        assert_eq!(parse_implementation_line("  **Implementation** : `src/a.ts` "), Some("src/a.ts"));
        assert_eq!(parse_implementation_line("**Implementation**:"), None);
        assert_eq!(parse_implementation_line("Implementation: x"), None);
    }

    #[test]
    fn resolves_relative_to_referencing_file() {
        let resolved = resolve_against(Path::new("/p/specs/ui/cart.isl.md"), "../domain.isl.md");
        assert_eq!(resolved, PathBuf::from("/p/specs/domain.isl.md"));
    }

    #[test]
    fn normalize_keeps_leading_parent() {
        assert_eq!(normalize_path(Path::new("../a/./b/../c")), PathBuf::from("../a/c"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn collapses_runs_of_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb\n\nc\nd"), "a\n\nb\n\nc\nd");
    }

    #[test]
    fn slash_path_joins_components() {
        assert_eq!(slash_path(Path::new("specs/ui/cart.isl.md")), "specs/ui/cart.isl.md");
    }
}
