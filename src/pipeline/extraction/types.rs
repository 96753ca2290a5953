use std::fmt;

use serde::{Deserialize, Serialize};

/// The three fact lists a narrative is segmented into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
    Symptoms,
    Conditions,
    Events,
}

impl FactCategory {
    pub fn all() -> &'static [FactCategory] {
        &[Self::Symptoms, Self::Conditions, Self::Events]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symptoms => "symptoms",
            Self::Conditions => "conditions",
            Self::Events => "events",
        }
    }

    /// Human-facing label, also used when facts are rendered into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Symptoms => "Symptoms",
            Self::Conditions => "Medical History",
            Self::Events => "Course of Events",
        }
    }
}

impl fmt::Display for FactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clinical facts pulled out of a narrative, in order of appearance.
///
/// Entries are not deduplicated. The reviewer edits a clone of the
/// extractor's output; edits never flow back into the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFacts {
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

impl ExtractedFacts {
    pub fn get(&self, category: FactCategory) -> &[String] {
        match category {
            FactCategory::Symptoms => &self.symptoms,
            FactCategory::Conditions => &self.conditions,
            FactCategory::Events => &self.events,
        }
    }

    pub fn get_mut(&mut self, category: FactCategory) -> &mut Vec<String> {
        match category {
            FactCategory::Symptoms => &mut self.symptoms,
            FactCategory::Conditions => &mut self.conditions,
            FactCategory::Events => &mut self.events,
        }
    }

    /// True when all three lists are empty.
    pub fn is_empty(&self) -> bool {
        FactCategory::all().iter().all(|c| self.get(*c).is_empty())
    }

    pub fn total(&self) -> usize {
        FactCategory::all().iter().map(|c| self.get(*c).len()).sum()
    }

    /// Append a reviewer-supplied entry. Blank entries are ignored.
    ///
    /// Returns whether the entry was added.
    pub fn push(&mut self, category: FactCategory, entry: impl Into<String>) -> bool {
        let entry = entry.into();
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.get_mut(category).push(trimmed.to_string());
        true
    }

    /// Remove the entry at `index`, returning it if it existed.
    pub fn remove(&mut self, category: FactCategory, index: usize) -> Option<String> {
        let list = self.get_mut(category);
        (index < list.len()).then(|| list.remove(index))
    }

    /// Replace the entry at `index`, returning the previous value.
    ///
    /// A blank replacement removes the entry instead.
    pub fn replace(
        &mut self,
        category: FactCategory,
        index: usize,
        entry: impl Into<String>,
    ) -> Option<String> {
        let entry = entry.into();
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return self.remove(category, index);
        }
        let slot = self.get_mut(category).get_mut(index)?;
        Some(std::mem::replace(slot, trimmed.to_string()))
    }

    /// Keep only the entries of `category` matching `keep`. Returns how many were dropped.
    pub fn retain(&mut self, category: FactCategory, mut keep: impl FnMut(&str) -> bool) -> usize {
        let list = self.get_mut(category);
        let before = list.len();
        list.retain(|entry| keep(entry));
        before - list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractedFacts {
        ExtractedFacts {
            symptoms: vec!["fever".into(), "cough".into()],
            conditions: vec!["hypertension".into()],
            events: vec![],
        }
    }

    #[test]
    fn category_labels() {
        assert_eq!(FactCategory::Conditions.label(), "Medical History");
        assert_eq!(FactCategory::Events.label(), "Course of Events");
        assert_eq!(FactCategory::Symptoms.to_string(), "symptoms");
        assert_eq!(FactCategory::all().len(), 3);
    }

    #[test]
    fn empty_and_total() {
        assert!(ExtractedFacts::default().is_empty());
        let facts = sample();
        assert!(!facts.is_empty());
        assert_eq!(facts.total(), 3);
    }

    #[test]
    fn push_trims_and_ignores_blank() {
        let mut facts = sample();
        assert!(facts.push(FactCategory::Events, "  cardiac arrest "));
        assert!(!facts.push(FactCategory::Events, "   "));
        assert_eq!(facts.events, vec!["cardiac arrest"]);
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut facts = sample();
        assert_eq!(facts.remove(FactCategory::Symptoms, 0), Some("fever".into()));
        assert_eq!(facts.remove(FactCategory::Symptoms, 5), None);
        assert_eq!(facts.symptoms, vec!["cough"]);
    }

    #[test]
    fn replace_swaps_entry() {
        let mut facts = sample();
        let old = facts.replace(FactCategory::Conditions, 0, "chronic hypertension");
        assert_eq!(old, Some("hypertension".into()));
        assert_eq!(facts.conditions, vec!["chronic hypertension"]);
    }

    #[test]
    fn replace_with_blank_removes() {
        let mut facts = sample();
        let old = facts.replace(FactCategory::Symptoms, 1, " ");
        assert_eq!(old, Some("cough".into()));
        assert_eq!(facts.symptoms, vec!["fever"]);
    }

    #[test]
    fn retain_drops_non_matching_entries() {
        let mut facts = sample();
        let dropped = facts.retain(FactCategory::Symptoms, |s| s != "cough");
        assert_eq!(dropped, 1);
        assert_eq!(facts.symptoms, vec!["fever"]);
        assert_eq!(facts.conditions, vec!["hypertension"]);
    }

    #[test]
    fn edits_on_clone_leave_original_untouched() {
        let extracted = sample();
        let mut reviewed = extracted.clone();
        reviewed.push(FactCategory::Events, "respiratory failure");
        reviewed.remove(FactCategory::Symptoms, 0);

        assert_eq!(extracted, sample());
        assert_ne!(extracted, reviewed);
    }

    #[test]
    fn deserializes_with_missing_lists() {
        let facts: ExtractedFacts = serde_json::from_str(r#"{"symptoms": ["fever"]}"#).unwrap();
        assert_eq!(facts.symptoms, vec!["fever"]);
        assert!(facts.conditions.is_empty());
        assert!(facts.events.is_empty());
    }
}
