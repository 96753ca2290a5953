//! Heading-delimited section segmentation.
//!
//! The narrative is scanned against an ordered table of [`SectionRule`]s.
//! For each rule the block after the heading's first occurrence runs up to the
//! rule's boundary; every non-empty, bullet-stripped line in the block becomes
//! one fact. Adding a heading is a table edit.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{ExtractedFacts, FactCategory};

/// A line holding nothing but spaces or tabs counts as blank.
static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

/// Where a section block ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionBoundary {
    /// First blank line after the heading, or end of text. A line of only
    /// spaces or tabs is blank too.
    BlankLine,
}

/// Extra per-section line rule applied after bullet stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFilter {
    /// Drop lines whose first token is a calendar month name.
    ///
    /// Dated entries ("March 1: admitted") in the events section are excluded.
    /// This also drops any line that happens to open with "may".
    DropMonthLed,
}

impl LineFilter {
    fn keeps(&self, line: &str) -> bool {
        match self {
            Self::DropMonthLed => !starts_with_month(line),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SectionRule {
    pub category: FactCategory,
    /// Heading label, lowercase. Matched case-insensitively.
    pub heading: &'static str,
    pub boundary: SectionBoundary,
    pub filter: Option<LineFilter>,
}

pub const SECTION_RULES: &[SectionRule] = &[
    SectionRule {
        category: FactCategory::Symptoms,
        heading: "symptoms",
        boundary: SectionBoundary::BlankLine,
        filter: None,
    },
    SectionRule {
        category: FactCategory::Conditions,
        heading: "medical history",
        boundary: SectionBoundary::BlankLine,
        filter: None,
    },
    SectionRule {
        category: FactCategory::Events,
        heading: "course of events",
        boundary: SectionBoundary::BlankLine,
        filter: Some(LineFilter::DropMonthLed),
    },
];

const BULLET_MARKERS: &[char] = &['-', '*', '•', '+'];

const MONTHS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Extract symptoms, history and events from a narrative.
///
/// Facts come back lowercased, in order of appearance.
pub fn extract(text: &str) -> ExtractedFacts {
    extract_with_rules(text, SECTION_RULES)
}

/// Extract using a caller-supplied rule table.
pub fn extract_with_rules(text: &str, rules: &[SectionRule]) -> ExtractedFacts {
    let normalized = text.replace("\r\n", "\n").to_lowercase();
    let mut facts = ExtractedFacts::default();

    for rule in rules {
        let Some(block) = locate_block(&normalized, rule) else {
            tracing::debug!(
                section = %rule.category,
                heading = rule.heading,
                "Section heading not found, list left empty"
            );
            continue;
        };

        let lines = block
            .lines()
            .filter_map(clean_line)
            .filter(|line| rule.filter.map_or(true, |f| f.keeps(line)))
            .map(str::to_string);
        facts.get_mut(rule.category).extend(lines);
    }

    tracing::debug!(
        symptoms = facts.symptoms.len(),
        conditions = facts.conditions.len(),
        events = facts.events.len(),
        "Section extraction complete"
    );

    facts
}

/// Text between the heading's first occurrence and the rule's boundary.
fn locate_block<'a>(text: &'a str, rule: &SectionRule) -> Option<&'a str> {
    let start = text.find(rule.heading)? + rule.heading.len();
    let rest = &text[start..];
    // "Symptoms: fever": the colon belongs to the heading.
    let rest = rest.strip_prefix(':').unwrap_or(rest);

    let end = match rule.boundary {
        SectionBoundary::BlankLine => BLANK_LINE.find(rest).map_or(rest.len(), |m| m.start()),
    };
    Some(&rest[..end])
}

fn clean_line(line: &str) -> Option<&str> {
    let stripped = line.trim().trim_start_matches(BULLET_MARKERS).trim();
    (!stripped.is_empty()).then_some(stripped)
}

fn starts_with_month(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .map(|token| token.trim_end_matches(|c: char| c.is_ascii_punctuation()))
        .is_some_and(|token| MONTHS.contains(&token))
}
