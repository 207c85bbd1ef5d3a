//! Semantic validation of a parsed ISL document.
//!
//! Every rule runs on every pass; none short-circuits another. Rules append to
//! explicit accumulators and the result is an immutable [`ValidationReport`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::{Diagnostic, Emoji, Section, SectionKind, Severity};

/// Marker that opens a constraint field inside a capability.
const CONSTRAINT_FIELD: &str = "🚨 Constraint";

/// Minimum length, in characters, of the project description.
const MIN_PROJECT_DESCRIPTION: usize = 20;

/// Type names that never need a Domain Concepts entry.
const PRIMITIVE_TYPES: [&str; 6] = ["String", "Number", "Boolean", "Array", "Object", "Date"];

/// Normative keywords a constraint must use.
pub const RFC_2119_KEYWORDS: [&str; 10] = [
    "MUST",
    "MUST NOT",
    "REQUIRED",
    "SHALL",
    "SHALL NOT",
    "SHOULD",
    "SHOULD NOT",
    "RECOMMENDED",
    "MAY",
    "OPTIONAL",
];

/// Marker that opens a test-scenario field inside a capability.
const TEST_SCENARIOS_FIELD: &str = "🧪 Test Scenarios";

/// A bolded field header such as `**Contract**:` or `**Signature:**`.
#[allow(clippy::expect_used, reason = "hardcoded pattern")]
static FIELD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\*\*[^*\n]+?(?:\*\*:|:\*\*)").expect("valid regex"));

/// A capitalized identifier introduced by `{` or `,`, optionally suffixed `[]`.
#[allow(clippy::expect_used, reason = "hardcoded pattern")]
static TYPE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"[{,]\s*([A-Z][A-Za-z]+)(?:\[\])?").expect("valid regex"));

/// Set of entity names declared under Domain Concepts, in declaration order.
#[derive(Debug, Default)]
pub struct DomainRegistry {
    /// Declared entity names.
    names: Vec<String>,
}

impl DomainRegistry {
    /// Whether an entity with this name was declared.
    pub fn contains(&self, name: &str) -> bool {
        return self.names.iter().any(|n| return n == name);
    }

    /// Record an entity name; duplicates are ignored.
    fn insert(&mut self, name: &str) {
        if !self.contains(name) {
            self.names.push(name.to_string());
        }
    }

    /// Number of distinct entities.
    pub fn len(&self) -> usize {
        return self.names.len();
    }

    /// Entity names in declaration order.
    pub fn names(&self) -> &[String] {
        return &self.names;
    }
}

/// Per-severity accumulators threaded through the rule functions.
#[derive(Debug, Default)]
struct Findings {
    /// Error-severity diagnostics.
    errors: Vec<Diagnostic>,
    /// Info-severity diagnostics.
    info: Vec<Diagnostic>,
    /// Warning-severity diagnostics.
    warnings: Vec<Diagnostic>,
}

impl Findings {
    /// Record a diagnostic in the bucket for its severity.
    fn push(&mut self, severity: Severity, rule: &'static str, section: String, message: String, line: Option<usize>) {
        let diagnostic = Diagnostic { line, message, rule, section, severity };
        match severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Info => self.info.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }
}

/// Count-based summary of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Level-4 capability sections.
    pub capabilities: usize,
    /// Component sections.
    pub components: usize,
    /// Sections whose content carries a constraint field.
    pub constraints: usize,
    /// Size of the domain concept registry.
    pub domain_concepts: usize,
    /// Sections whose content carries a test-scenario field.
    pub test_scenarios: usize,
}

/// Full outcome of one validation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Error-severity diagnostics.
    pub errors: Vec<Diagnostic>,
    /// Info-severity diagnostics.
    pub info: Vec<Diagnostic>,
    /// Document statistics.
    pub stats: Stats,
    /// True iff `errors` is empty.
    pub valid: bool,
    /// Warning-severity diagnostics.
    pub warnings: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Promote every warning to an error and recompute validity.
    #[must_use]
    pub fn into_strict(mut self) -> Self {
        for mut warning in self.warnings.drain(..) {
            warning.severity = Severity::Error;
            self.errors.push(warning);
        }
        self.valid = self.errors.is_empty();
        return self;
    }
}

/// Validate a parsed document.
pub fn validate(sections: &[Section]) -> ValidationReport {
    let mut findings = Findings::default();

    check_project_header(sections, &mut findings);
    let registry = collect_domain_registry(sections, &mut findings);
    check_components(sections, &mut findings);
    for capability in sections.iter().filter(|s| return s.kind == SectionKind::Capability) {
        check_capability(capability, &registry, &mut findings);
    }
    check_orphaned_sections(sections, &mut findings);

    let stats = gather_stats(sections, &registry);
    return ValidationReport {
        valid: findings.errors.is_empty(),
        errors: findings.errors,
        info: findings.info,
        stats,
        warnings: findings.warnings,
    };
}

/// Rules ISL-030 through ISL-034 for one capability.
fn check_capability(capability: &Section, registry: &DomainRegistry, findings: &mut Findings) {
    let path = format!("Capability: {}", capability.title);
    let line = Some(capability.line);
    let content = capability.content.as_str();

    if !content.contains("**Contract**:") {
        findings.push(
            Severity::Error,
            "ISL-030",
            path.clone(),
            "Missing required field: **Contract**".to_string(),
            line,
        );
    }

    if !content.contains("**Signature:**") {
        findings.push(
            Severity::Info,
            "ISL-031",
            path.clone(),
            "Missing recommended field: **Signature** (input/output types)".to_string(),
            line,
        );
    }

    if let Some(constraint) = field_text(content, CONSTRAINT_FIELD)
        && !contains_rfc2119_keyword(constraint)
    {
        findings.push(
            Severity::Warning,
            "ISL-033",
            path.clone(),
            format!(
                "Constraints should use RFC 2119 keywords ({}, ...)",
                RFC_2119_KEYWORDS.get(..5).unwrap_or_default().join(", ")
            ),
            line,
        );
    }

    if has_field(content, "Flow") && !has_field(content, TEST_SCENARIOS_FIELD) {
        findings.push(
            Severity::Warning,
            "ISL-032",
            path.clone(),
            "Complex capability with Flow should have Test Scenarios".to_string(),
            line,
        );
    }

    for name in undefined_type_references(content, registry) {
        findings.push(
            Severity::Warning,
            "ISL-034",
            path.clone(),
            format!("Reference to undefined domain entity: \"{name}\". Define it in Domain Concepts."),
            line,
        );
    }
}

/// Rules ISL-021 through ISL-024 for one component.
fn check_component(sections: &[Section], index: usize, findings: &mut Findings) {
    let Some(component) = sections.get(index) else {
        return;
    };
    let name = component.title.replace("Component:", "").trim().to_string();
    let path = format!("Component: {name}");
    let scope = component_scope(sections, index);

    match scope.iter().find(|s| return s.kind == SectionKind::Role) {
        None => findings.push(
            Severity::Error,
            "ISL-021",
            path.clone(),
            "Missing required section: \"### Role: Presentation / Backend\"".to_string(),
            Some(component.line),
        ),
        Some(role) => {
            let role_text = format!("{} {}", role.title, role.content);
            if !contains_word(&role_text, "Presentation") && !contains_word(&role_text, "Backend") {
                findings.push(
                    Severity::Error,
                    "ISL-022",
                    format!("{path} > Role"),
                    "Role must be either \"Presentation\" or \"Backend\"".to_string(),
                    Some(role.line),
                );
            }
        },
    }

    if !scope.iter().any(|s| return s.kind == SectionKind::Capabilities) {
        findings.push(
            Severity::Warning,
            "ISL-023",
            path.clone(),
            "No \"### ⚡ Capabilities / Methods\" section found. Components should define behaviors.".to_string(),
            Some(component.line),
        );
    }

    for sub in scope.iter().filter(|s| return s.level == 3) {
        if let Some(Emoji::Other(glyph)) = &sub.emoji {
            let valid = crate::types::Marker::ALL.map(|m| return m.glyph()).join(" ");
            findings.push(
                Severity::Warning,
                "ISL-024",
                path.clone(),
                format!("Invalid emoji \"{glyph}\". Valid emojis: {valid}"),
                Some(sub.line),
            );
        }
    }
}

/// Rule ISL-020, then per-component rules.
fn check_components(sections: &[Section], findings: &mut Findings) {
    let indices: Vec<usize> = sections
        .iter()
        .enumerate()
        .filter(|(_, s)| return s.kind == SectionKind::Component)
        .map(|(idx, _)| return idx)
        .collect();

    if indices.is_empty() {
        findings.push(
            Severity::Error,
            "ISL-020",
            "Components".to_string(),
            "No components found. At least one \"## Component: Name\" is required.".to_string(),
            None,
        );
        return;
    }

    for index in indices {
        check_component(sections, index, findings);
    }
}

/// Rule ISL-040: marker sections need an enclosing component.
fn check_orphaned_sections(sections: &[Section], findings: &mut Findings) {
    let mut inside_component = false;
    for section in sections {
        if section.kind == SectionKind::Component {
            inside_component = true;
        }
        if let Some(emoji @ Emoji::Marker(_)) = &section.emoji
            && section.level == 3
            && !inside_component
        {
            findings.push(
                Severity::Warning,
                "ISL-040",
                section.title.clone(),
                format!("Section with semantic emoji {} outside of a Component context", emoji.glyph()),
                Some(section.line),
            );
        }
    }
}

/// Rules ISL-001 through ISL-003.
fn check_project_header(sections: &[Section], findings: &mut Findings) {
    let Some(project) = sections.iter().find(|s| return s.kind == SectionKind::Project) else {
        findings.push(
            Severity::Error,
            "ISL-001",
            "Project".to_string(),
            "Missing project header (# Project: Name)".to_string(),
            None,
        );
        return;
    };

    if !project.title.contains("Project:") {
        findings.push(
            Severity::Warning,
            "ISL-002",
            "Project".to_string(),
            "Project header should follow format: \"# Project: YourProjectName\"".to_string(),
            Some(project.line),
        );
    }

    if project.content.chars().count() < MIN_PROJECT_DESCRIPTION {
        findings.push(
            Severity::Warning,
            "ISL-003",
            "Project".to_string(),
            "Project description is too short (should be at least 1-3 sentences)".to_string(),
            Some(project.line),
        );
    }
}

/// Rules ISL-010 through ISL-012 and the registry summary.
/// Entities are the level-3 sections directly after Domain Concepts,
/// up to the next section of level 2 or shallower.
fn collect_domain_registry(sections: &[Section], findings: &mut Findings) -> DomainRegistry {
    let mut registry = DomainRegistry::default();
    let Some(domain_index) = sections.iter().position(|s| return s.kind == SectionKind::Domain) else {
        findings.push(
            Severity::Warning,
            "ISL-010",
            "Domain Concepts".to_string(),
            "Missing \"## Domain Concepts\" section. Domain entities should be defined.".to_string(),
            None,
        );
        return registry;
    };

    let following = sections.get(domain_index.saturating_add(1)..).unwrap_or_default();
    for entity in following.iter().take_while(|s| return s.level > 2).filter(|s| return s.level == 3) {
        let path = format!("Domain Concepts > {}", entity.title);
        registry.insert(&entity.title);

        if !entity.content.contains("**Identity**:") {
            findings.push(
                Severity::Warning,
                "ISL-011",
                path.clone(),
                format!("Entity \"{}\" missing **Identity** field", entity.title),
                Some(entity.line),
            );
        }
        if !entity.content.contains("**Properties**:") {
            findings.push(
                Severity::Warning,
                "ISL-012",
                path,
                format!("Entity \"{}\" missing **Properties** field", entity.title),
                Some(entity.line),
            );
        }
    }

    findings.push(
        Severity::Info,
        "ISL-INFO",
        "Domain Concepts".to_string(),
        format!("Found {} domain entities: {}", registry.len(), registry.names().join(", ")),
        None,
    );
    return registry;
}

/// Sections after the component at `index`, up to the next component.
fn component_scope(sections: &[Section], index: usize) -> &[Section] {
    let rest = sections.get(index.saturating_add(1)..).unwrap_or_default();
    let end = rest
        .iter()
        .position(|s| return s.kind == SectionKind::Component)
        .unwrap_or(rest.len());
    return rest.get(..end).unwrap_or_default();
}

/// Whether the text uses any RFC 2119 keyword as an upper-case word.
pub fn contains_rfc2119_keyword(text: &str) -> bool {
    return RFC_2119_KEYWORDS.iter().any(|kw| return contains_word(text, kw));
}

/// Whether `word` occurs in `text` with no identifier character on either side.
fn contains_word(text: &str, word: &str) -> bool {
    let is_ident = |c: char| return c.is_alphanumeric() || c == '_';
    return text.match_indices(word).any(|(idx, _)| {
        let before = text.get(..idx).and_then(|s| return s.chars().next_back());
        let after = text.get(idx.saturating_add(word.len())..).and_then(|s| return s.chars().next());
        return !before.is_some_and(is_ident) && !after.is_some_and(is_ident);
    });
}

/// Text of a bolded field, from its marker to the next field header or end of content.
fn field_text<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    let start = [format!("**{name}**:"), format!("**{name}:**")]
        .iter()
        .filter_map(|marker| return content.find(marker.as_str()).map(|idx| return idx.saturating_add(marker.len())))
        .min()?;
    let after = content.get(start..)?;
    let end = FIELD_HEADER.find(after).map_or(after.len(), |m| return m.start());
    return after.get(..end);
}

/// Count sections matching a predicate.
fn count_where(sections: &[Section], pred: impl Fn(&Section) -> bool) -> usize {
    return sections.iter().filter(|&s| return pred(s)).count();
}

/// Count sections by kind and field markers.
fn gather_stats(sections: &[Section], registry: &DomainRegistry) -> Stats {
    return Stats {
        capabilities: count_where(sections, |s| return s.kind == SectionKind::Capability),
        components: count_where(sections, |s| return s.kind == SectionKind::Component),
        constraints: count_where(sections, |s| return has_field(&s.content, CONSTRAINT_FIELD)),
        domain_concepts: registry.len(),
        test_scenarios: count_where(sections, |s| return has_field(&s.content, TEST_SCENARIOS_FIELD)),
    };
}

/// Whether a bolded field header is present, as `**Name**:` or `**Name:**`.
fn has_field(content: &str, name: &str) -> bool {
    return content.contains(&format!("**{name}**:")) || content.contains(&format!("**{name}:**"));
}

/// Capitalized type references that are neither primitives nor registered
/// domain entities, one per occurrence, in document order.
fn undefined_type_references<'a>(content: &'a str, registry: &DomainRegistry) -> Vec<&'a str> {
    return TYPE_REFERENCE
        .captures_iter(content)
        .filter_map(|cap| {
            let (whole, name) = (cap.get(0)?, cap.get(1)?);
            let delimited = content
                .get(whole.end()..)
                .and_then(|rest| return rest.chars().next())
                .is_some_and(|c| return matches!(c, '}' | ':' | ',') || c.is_whitespace());
            let name = name.as_str();
            if !delimited || PRIMITIVE_TYPES.contains(&name) || registry.contains(name) {
                return None;
            }
            return Some(name);
        })
        .collect();
}
