/// Core domain types for ISL sections, diagnostics, and content hashes.
use serde::{Deserialize, Serialize};

/// SHA-256 content hash as 64 lowercase hex chars.
/// Newtype prevents mixing with arbitrary strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(
    /// The hex-encoded SHA-256 digest string.
    pub String,
);

/// One finding produced by a validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// One-based line of the section heading the finding is attached to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Human-readable description of the violation.
    pub message: String,
    /// Stable rule code such as `ISL-021`.
    pub rule: &'static str,
    /// Section path such as `Component: Cart > Role`.
    pub section: String,
    /// Severity the rule assigns to this finding.
    pub severity: Severity,
}

/// Glyph that prefixes a level-3 heading title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Emoji {
    /// One of the seven semantic markers.
    Marker(Marker),
    /// A symbol glyph that is not part of the marker set.
    Other(String),
}

impl Emoji {
    /// The glyph as it appears in the source.
    pub fn glyph(&self) -> String {
        return match self {
            Emoji::Marker(marker) => marker.glyph().to_string(),
            Emoji::Other(glyph) => glyph.clone(),
        };
    }
}

/// The closed set of semantic subsection markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    /// ✅ Acceptance criteria.
    Acceptance,
    /// 🔍 Appearance.
    Appearance,
    /// ⚡ Capabilities / methods.
    Capabilities,
    /// 🚨 Constraints.
    Constraints,
    /// 📦 Content.
    Content,
    /// 💡 Implementation hints.
    Hints,
    /// 🧪 Test scenarios.
    Tests,
}

impl Marker {
    /// Every marker, in the order they are conventionally listed.
    pub const ALL: [Marker; 7] = [
        Marker::Appearance,
        Marker::Content,
        Marker::Capabilities,
        Marker::Hints,
        Marker::Constraints,
        Marker::Acceptance,
        Marker::Tests,
    ];

    /// Map a glyph to its marker. A trailing variation selector is ignored.
    pub fn from_glyph(glyph: &str) -> Option<Self> {
        return match glyph.trim_end_matches('\u{FE0F}') {
            "\u{1F50D}" => Some(Marker::Appearance),
            "\u{1F4E6}" => Some(Marker::Content),
            "\u{26A1}" => Some(Marker::Capabilities),
            "\u{1F4A1}" => Some(Marker::Hints),
            "\u{1F6A8}" => Some(Marker::Constraints),
            "\u{2705}" => Some(Marker::Acceptance),
            "\u{1F9EA}" => Some(Marker::Tests),
            _ => None,
        };
    }

    /// The canonical glyph for this marker.
    pub const fn glyph(self) -> &'static str {
        return match self {
            Marker::Acceptance => "\u{2705}",
            Marker::Appearance => "\u{1F50D}",
            Marker::Capabilities => "\u{26A1}",
            Marker::Constraints => "\u{1F6A8}",
            Marker::Content => "\u{1F4E6}",
            Marker::Hints => "\u{1F4A1}",
            Marker::Tests => "\u{1F9EA}",
        };
    }

    /// The section kind a level-3 heading with this marker classifies as.
    pub const fn section_kind(self) -> SectionKind {
        return match self {
            Marker::Acceptance => SectionKind::Acceptance,
            Marker::Appearance => SectionKind::Appearance,
            Marker::Capabilities => SectionKind::Capabilities,
            Marker::Constraints => SectionKind::Constraints,
            Marker::Content => SectionKind::Content,
            Marker::Hints => SectionKind::Hints,
            Marker::Tests => SectionKind::Tests,
        };
    }
}

/// One heading-delimited block of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Raw text between this heading and the next one, trimmed.
    pub content: String,
    /// Glyph split off a level-3 title, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Emoji>,
    /// Derived semantic classification.
    pub kind: SectionKind,
    /// Heading depth, 1 through 4.
    pub level: u8,
    /// One-based source line of the heading.
    pub line: usize,
    /// Heading text with any leading glyph removed.
    pub title: String,
}

/// Semantic classification of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Level 3, ✅.
    Acceptance,
    /// Level 3, 🔍.
    Appearance,
    /// Level 4.
    Capability,
    /// Level 3, ⚡.
    Capabilities,
    /// Level 2 with `Component:` in the title.
    Component,
    /// Level 3, 🚨.
    Constraints,
    /// Level 3, 📦.
    Content,
    /// Level 2 with `Domain Concepts` in the title.
    Domain,
    /// Level 3, 💡.
    Hints,
    /// Level 1.
    Project,
    /// Level 3 with `Role` in the title.
    Role,
    /// Any other level 2.
    Section,
    /// Any other level 3.
    Subsection,
    /// Level 3, 🧪.
    Tests,
    /// Outside the four meaningful levels.
    Unknown,
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Makes the document invalid.
    Error,
    /// Informational only.
    Info,
    /// Advisory; promoted to an error in strict mode.
    Warning,
}
