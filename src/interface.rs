//! Pure renderers for the two per-document build artifacts.
//!
//! The interface projection is the document with implementation-only Flow
//! blocks removed. The build context inlines the interfaces of a document's
//! dependencies ahead of its full source.

use crate::parser::{heading, strip_bom};
use crate::reference::{collapse_blank_lines, parse_implementation_line, parse_reference_line};

/// A finished build context and the target path declared by its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Value of the document's first `**Implementation**:` line.
    pub implementation_path: Option<String>,
    /// Composed artifact text.
    pub text: String,
}

/// An already-rendered interface of one dependency.
#[derive(Debug, Clone)]
pub struct DependencyInterface {
    /// File name of the interface artifact, used in markers.
    pub name: String,
    /// Full interface text.
    pub text: String,
}

/// Compose the build context of one document.
///
/// `lookup` receives each reference target in document order and returns the
/// dependency's interface, or `None` to leave it out.
pub fn compose_build_context(
    file_name: &str,
    content: &str,
    mut lookup: impl FnMut(&str) -> Option<DependencyInterface>,
) -> BuildContext {
    let content = strip_bom(content);
    let implementation_path = content.lines().find_map(parse_implementation_line).map(str::to_string);

    let mut out: Vec<String> = vec![format!("<!-- BUILD CONTEXT FOR: {file_name} -->")];
    if let Some(path) = &implementation_path {
        out.push(format!("<!-- TARGET IMPLEMENTATION PATH: {path} -->"));
    }
    out.push("<!-- Dependencies are included as Interfaces (.ref.md) -->".to_string());
    out.push(String::new());

    for target in content.lines().filter_map(parse_reference_line) {
        let Some(dependency) = lookup(target) else {
            continue;
        };
        out.push(String::new());
        out.push(format!("<!-- START DEPENDENCY INTERFACE: {} -->", dependency.name));
        out.push(dependency.text);
        out.push("<!-- END DEPENDENCY INTERFACE -->".to_string());
        out.push(String::new());
    }

    out.push(String::new());
    out.push("<!-- SOURCE FILE TO IMPLEMENT -->".to_string());
    out.push(content.to_string());

    return BuildContext {
        implementation_path,
        text: collapse_blank_lines(&out.join("\n")),
    };
}

/// Whether a line ends a Flow block: a `---` separator, a level-4 heading, or
/// a level-2 heading. Level-3 headings stay inside the block.
fn ends_flow(line: &str) -> bool {
    let trimmed = line.trim_start();
    return trimmed.starts_with("---")
        || trimmed.starts_with("####")
        || heading(trimmed).is_some_and(|(level, _)| return level == 2);
}

/// Whether a line opens a Flow block.
fn opens_flow(line: &str) -> bool {
    let trimmed = line.trim_start();
    return trimmed.starts_with("**Flow**:") || trimmed.starts_with("**Flow:**");
}

/// Project a document onto its public interface.
///
/// Flow blocks are dropped from their opening line up to, not including, the
/// next separator, level-4 heading, or level-2 heading. Implementation paths are surfaced as leading
/// marker comments and also stay in the body.
pub fn project_interface(file_name: &str, content: &str) -> String {
    let content = strip_bom(content);
    let mut out: Vec<String> = vec![format!("<!-- INTERFACE (REF) FOR: {file_name} -->")];
    for path in content.lines().filter_map(parse_implementation_line) {
        out.push(format!("<!-- IMPLEMENTATION PATH: {path} -->"));
    }

    let mut in_flow = false;
    for line in content.lines() {
        if opens_flow(line) {
            in_flow = true;
            continue;
        }
        if in_flow {
            if !ends_flow(line) {
                continue;
            }
            in_flow = false;
        }
        out.push(line.to_string());
    }

    return collapse_blank_lines(&out.join("\n"));
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test assertions")]
mod tests {
    use super::*;

    const CART: &str = "\
# Project: Cart
**Implementation**: src/cart.js

#### addItem
**Contract**: Adds an item.
**Flow:**
  1. load the cart
  2. append the item
  3. save the cart
---
#### removeItem
**Contract**: Removes an item.
**Flow**:
  1. drop it
## Component: Totals
- totals MUST stay positive
";

    #[test]
    fn flow_blocks_are_removed() {
        let out = project_interface("cart.isl.md", CART);
        assert!(!out.contains("**Flow"));
        assert!(!out.contains("load the cart"));
        assert!(!out.contains("drop it"));
        assert!(out.contains("**Contract**: Adds an item.\n---\n#### removeItem"));
        assert!(out.contains("## Component: Totals\n- totals MUST stay positive"));
    }

    #[test]
    fn level_three_heading_stays_inside_flow() {
        let source = "#### pay\n**Flow**:\n  1. charge\n### 🚨 Constraints\n- MUST log\n#### refund\nbody\n";
        let out = project_interface("pay.isl.md", source);
        assert!(!out.contains("charge"));
        assert!(!out.contains("MUST log"));
        assert!(out.contains("#### pay\n#### refund\nbody"));
    }

    #[test]
    fn implementation_path_leads_and_stays() {
        let out = project_interface("cart.isl.md", CART);
        assert!(out.starts_with(
            "<!-- INTERFACE (REF) FOR: cart.isl.md -->\n<!-- IMPLEMENTATION PATH: src/cart.js -->\n# Project: Cart"
        ));
        assert!(out.contains("**Implementation**: src/cart.js"));
    }

    #[test]
    fn document_without_flow_is_unchanged() {
        let out = project_interface("a.isl.md", "# A\n\nbody\n");
        assert_eq!(out, "<!-- INTERFACE (REF) FOR: a.isl.md -->\n# A\n\nbody");
    }

    #[test]
    fn build_context_inlines_dependencies_before_source() {
        let source = "# UI\n**Implementation**: `src/ui.jsx`\n> **Reference**: [d](domain.isl.md)\n> **Reference**: [x](missing.isl.md)\n";
        let context = compose_build_context("ui.isl.md", source, |target| {
            return (target == "domain.isl.md").then(|| DependencyInterface {
                name: "domain.ref.md".to_string(),
                text: "DOMAIN INTERFACE".to_string(),
            });
        });

        assert_eq!(context.implementation_path.as_deref(), Some("src/ui.jsx"));
        let text = &context.text;
        assert!(text.starts_with("<!-- BUILD CONTEXT FOR: ui.isl.md -->\n<!-- TARGET IMPLEMENTATION PATH: src/ui.jsx -->"));
        let dep = text.find("DOMAIN INTERFACE").unwrap();
        let src = text.find("<!-- SOURCE FILE TO IMPLEMENT -->").unwrap();
        assert!(dep < src);
        assert!(text.contains("<!-- START DEPENDENCY INTERFACE: domain.ref.md -->\nDOMAIN INTERFACE\n<!-- END DEPENDENCY INTERFACE -->"));
        assert!(text.trim_end().ends_with(source.trim_end()));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn missing_implementation_path_is_none() {
        let context = compose_build_context("a.isl.md", "# A", |_| return None);
        assert_eq!(context.implementation_path, None);
        assert!(!context.text.contains("TARGET IMPLEMENTATION PATH"));
    }
}
