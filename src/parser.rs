//! Structural parser: raw ISL text into an ordered sequence of typed sections.
//!
//! Parsing is total. Malformed structure is reported later by the validator.

use crate::types::{Emoji, Marker, Section, SectionKind};

/// Deepest heading level that opens a section.
const MAX_HEADING_LEVEL: usize = 4;

/// Byte-order mark some editors prepend to UTF-8 files.
const BOM: char = '\u{FEFF}';

/// Classify a heading by level, title keywords, and optional glyph.
pub fn classify(level: u8, title: &str, emoji: Option<&Emoji>) -> SectionKind {
    return match level {
        1 => SectionKind::Project,
        2 if title.contains("Domain Concepts") => SectionKind::Domain,
        2 if title.contains("Component:") => SectionKind::Component,
        2 => SectionKind::Section,
        3 => match emoji {
            Some(Emoji::Marker(marker)) => marker.section_kind(),
            Some(Emoji::Other(_)) => SectionKind::Subsection,
            None if title.contains("Role") => SectionKind::Role,
            None => SectionKind::Subsection,
        },
        4 => SectionKind::Capability,
        _ => SectionKind::Unknown,
    };
}

/// Recognize a heading line: 1–4 `#`, whitespace, then a non-empty title.
/// Returns the level and the trimmed raw title.
pub fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|c| return *c == '#').count();
    if hashes == 0 || hashes > MAX_HEADING_LEVEL {
        return None;
    }

    let rest = line.get(hashes..)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let title = rest.trim();
    if title.is_empty() {
        return None;
    }

    let level = u8::try_from(hashes).ok()?;
    return Some((level, title));
}

/// Parse a document into sections in source order.
pub fn parse(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = strip_bom(text).lines().collect();
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| return heading(line).is_some())
        .map(|(idx, _)| return idx)
        .collect();

    let mut sections = Vec::with_capacity(starts.len());
    for (pos, &start) in starts.iter().enumerate() {
        let end = starts.get(pos.saturating_add(1)).copied().unwrap_or(lines.len());
        let Some((level, raw_title)) = lines.get(start).and_then(|line| return heading(line)) else {
            continue;
        };
        let body = lines.get(start.saturating_add(1)..end).unwrap_or_default();
        sections.push(build_section(level, raw_title, body, start.saturating_add(1)));
    }

    return sections;
}

/// Assemble one section from its heading parts and body lines.
fn build_section(level: u8, raw_title: &str, body: &[&str], line: usize) -> Section {
    let (emoji, title) = if level == 3 {
        split_leading_glyph(raw_title)
    } else {
        (None, raw_title.to_string())
    };

    return Section {
        content: body.join("\n").trim().to_string(),
        kind: classify(level, &title, emoji.as_ref()),
        emoji,
        level,
        line,
        title,
    };
}

/// Whether a character is a pictographic symbol rather than text.
fn is_symbol_glyph(c: char) -> bool {
    return !c.is_ascii() && !c.is_alphanumeric() && !c.is_whitespace();
}

/// Split a leading glyph (plus optional variation selector) off a title.
/// The glyph must be followed by whitespace and a non-empty remainder.
fn split_leading_glyph(title: &str) -> (Option<Emoji>, String) {
    let mut chars = title.char_indices();
    let Some((_, first)) = chars.next() else {
        return (None, title.to_string());
    };
    if !is_symbol_glyph(first) {
        return (None, title.to_string());
    }

    let mut glyph_end = first.len_utf8();
    if title.get(glyph_end..).is_some_and(|rest| return rest.starts_with('\u{FE0F}')) {
        glyph_end = glyph_end.saturating_add('\u{FE0F}'.len_utf8());
    }

    let (Some(glyph), Some(rest)) = (title.get(..glyph_end), title.get(glyph_end..)) else {
        return (None, title.to_string());
    };
    let remainder = rest.trim_start();
    if !rest.starts_with(char::is_whitespace) || remainder.is_empty() {
        return (None, title.to_string());
    }

    let emoji = match Marker::from_glyph(glyph) {
        Some(marker) => Emoji::Marker(marker),
        None => Emoji::Other(glyph.to_string()),
    };
    return (Some(emoji), remainder.to_string());
}

/// Drop a leading byte-order mark, if any.
pub fn strip_bom(text: &str) -> &str {
    return text.strip_prefix(BOM).unwrap_or(text);
}
