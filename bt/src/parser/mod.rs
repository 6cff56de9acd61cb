//! Section parser: turns a loosely formatted LLM reply into titled task sections
//!
//! The reply is normalized (carriage returns removed, outer whitespace trimmed)
//! and then handed to an ordered chain of strategies. The first strategy that
//! recognizes the text wins:
//!
//! 1. [`RomanNumerals`] - `I. ... II. ... III. ...` blocks
//! 2. [`HeaderKeywords`] - the three Vietnamese section headers in any order
//! 3. [`BulletBuckets`] - all bullets, split evenly across the three sections
//! 4. [`EmptySkeleton`] - three titled sections without tasks
//!
//! Empty input yields no sections at all; anything else yields exactly three,
//! so callers can always index positions 0, 1 and 2.
//!
//! The parser holds no mutable state. One instance can be shared freely
//! across request handlers.

mod strategies;
mod tasks;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use strategies::{BulletBuckets, EmptySkeleton, HeaderKeywords, ParseStrategy, RomanNumerals, bucket_size};
pub use tasks::{bullet_task, extract_tasks};

/// The three fixed sections of a BA to-do list, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    RequirementAnalysis,
    AcceptanceCriteria,
    BaTasks,
}

impl SectionKind {
    /// All kinds in canonical order
    pub const ALL: [SectionKind; 3] = [Self::RequirementAnalysis, Self::AcceptanceCriteria, Self::BaTasks];

    /// Canonical section title
    pub fn title(&self) -> &'static str {
        match self {
            Self::RequirementAnalysis => "PHÂN TÍCH YÊU CẦU",
            Self::AcceptanceCriteria => "TIÊU CHÍ CHẤP NHẬN",
            Self::BaTasks => "CÔNG VIỆC CỤ THỂ CHO BA",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A titled list of tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub tasks: Vec<String>,
}

impl Section {
    /// Create a section with the canonical title of `kind`
    pub fn new(kind: SectionKind, tasks: Vec<String>) -> Self {
        Self {
            title: kind.title().to_string(),
            tasks,
        }
    }
}

/// Which strategy produced a parse result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    RomanNumerals,
    HeaderKeywords,
    BulletBuckets,
    EmptySkeleton,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RomanNumerals => write!(f, "roman-numerals"),
            Self::HeaderKeywords => write!(f, "header-keywords"),
            Self::BulletBuckets => write!(f, "bullet-buckets"),
            Self::EmptySkeleton => write!(f, "empty-skeleton"),
        }
    }
}

/// Sections plus the tier that produced them (`None` for empty input)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseOutcome {
    pub tier: Option<Tier>,
    pub sections: Vec<Section>,
}

/// Ordered chain of parse strategies
pub struct SectionParser {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionParser {
    /// Build the standard four-tier chain
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(RomanNumerals),
                Box::new(HeaderKeywords),
                Box::new(BulletBuckets),
                Box::new(EmptySkeleton),
            ],
        }
    }

    /// Parse a reply, reporting which tier matched
    pub fn parse_outcome(&self, raw: Option<&str>) -> ParseOutcome {
        let text = normalize(raw.unwrap_or_default());
        debug!(text_len = text.len(), "parse_outcome: called");

        if text.is_empty() {
            return ParseOutcome {
                tier: None,
                sections: Vec::new(),
            };
        }

        for strategy in &self.strategies {
            if let Some(sections) = strategy.apply(&text) {
                debug!(tier = %strategy.tier(), "parse_outcome: strategy matched");
                return ParseOutcome {
                    tier: Some(strategy.tier()),
                    sections,
                };
            }
        }

        // The chain always ends with EmptySkeleton; kept total for custom chains
        ParseOutcome {
            tier: Some(Tier::EmptySkeleton),
            sections: EmptySkeleton.apply(&text).unwrap_or_default(),
        }
    }

    /// Parse a reply into sections
    pub fn parse(&self, raw: Option<&str>) -> Vec<Section> {
        self.parse_outcome(raw).sections
    }
}

/// Parse a reply with the standard chain
pub fn parse_sections(raw: &str) -> Vec<Section> {
    SectionParser::new().parse(Some(raw))
}

fn normalize(raw: &str) -> String {
    raw.replace('\r', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn titles(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.title.as_str()).collect()
    }

    fn canonical_titles() -> Vec<&'static str> {
        SectionKind::ALL.iter().map(|k| k.title()).collect()
    }

    #[test]
    fn test_empty_inputs_yield_no_sections() {
        let parser = SectionParser::new();
        assert!(parser.parse(None).is_empty());
        assert!(parser.parse(Some("")).is_empty());
        assert!(parser.parse(Some("   \n\t \r\n ")).is_empty());
        assert_eq!(parser.parse_outcome(Some("\r\r")).tier, None);
    }

    #[test]
    fn test_roman_numeral_reply() {
        let reply = "I. PHÂN TÍCH YÊU CẦU\n- [ ] A\n\nII. TIÊU CHÍ CHẤP NHẬN\n- [ ] B\n\nIII. CÔNG VIỆC CỤ THỂ CHO BA\n- [ ] C";
        let outcome = SectionParser::new().parse_outcome(Some(reply));

        assert_eq!(outcome.tier, Some(Tier::RomanNumerals));
        assert_eq!(titles(&outcome.sections), canonical_titles());
        assert_eq!(outcome.sections[0].tasks, vec!["A"]);
        assert_eq!(outcome.sections[1].tasks, vec!["B"]);
        assert_eq!(outcome.sections[2].tasks, vec!["C"]);
    }

    #[test]
    fn test_roman_numeral_reply_with_crlf_and_preamble() {
        let reply = "\r\n  Đây là danh sách:\r\nI. PHÂN TÍCH YÊU CẦU\r\n- [ ] A1\r\n- [x] A2\r\nII. TIÊU CHÍ CHẤP NHẬN\r\n* B\r\nIII. CÔNG VIỆC\r\n- C  \r\n";
        let sections = parse_sections(reply);
        assert_eq!(sections[0].tasks, vec!["A1", "A2"]);
        assert_eq!(sections[1].tasks, vec!["B"]);
        assert_eq!(sections[2].tasks, vec!["C"]);
    }

    #[test]
    fn test_header_keyword_reply() {
        let reply = "PHÂN TÍCH YÊU CẦU\n- [ ] A\n\nTIÊU CHÍ CHẤP NHẬN\n- [ ] B\n\nCÔNG VIỆC CỤ THỂ\n- [ ] C";
        let outcome = SectionParser::new().parse_outcome(Some(reply));

        assert_eq!(outcome.tier, Some(Tier::HeaderKeywords));
        assert_eq!(titles(&outcome.sections), canonical_titles());
        assert_eq!(outcome.sections[0].tasks, vec!["A"]);
        assert_eq!(outcome.sections[1].tasks, vec!["B"]);
        assert_eq!(outcome.sections[2].tasks, vec!["C"]);
    }

    #[test]
    fn test_markdown_headers_fall_to_keywords() {
        let reply = "## 1. Phân tích yêu cầu\n- a1\n- a2\n## 2. Tiêu chí chấp nhận\n- b1\n## 3. Công việc cụ thể cho BA\n- c1\n- c2\n- c3";
        let outcome = SectionParser::new().parse_outcome(Some(reply));

        assert_eq!(outcome.tier, Some(Tier::HeaderKeywords));
        let counts: Vec<usize> = outcome.sections.iter().map(|s| s.tasks.len()).collect();
        assert_eq!(counts, vec![2, 1, 3]);
    }

    #[test]
    fn test_plain_bullets_are_bucketed() {
        let reply = "- one\n- two\n- three\n- four\n- five\n- six";
        let outcome = SectionParser::new().parse_outcome(Some(reply));

        assert_eq!(outcome.tier, Some(Tier::BulletBuckets));
        assert_eq!(titles(&outcome.sections), canonical_titles());
        assert_eq!(outcome.sections[0].tasks, vec!["one", "two"]);
        assert_eq!(outcome.sections[1].tasks, vec!["three", "four"]);
        assert_eq!(outcome.sections[2].tasks, vec!["five", "six"]);
    }

    #[test]
    fn test_prose_yields_empty_skeleton() {
        let outcome = SectionParser::new().parse_outcome(Some("just prose, no bullets, no headers"));

        assert_eq!(outcome.tier, Some(Tier::EmptySkeleton));
        assert_eq!(titles(&outcome.sections), canonical_titles());
        assert!(outcome.sections.iter().all(|s| s.tasks.is_empty()));
    }

    #[test]
    fn test_partial_headers_fall_through_to_buckets() {
        // Two of three headers: Tier 2 declines, the bullets are bucketed instead
        let reply = "PHÂN TÍCH YÊU CẦU\n- a\nTIÊU CHÍ CHẤP NHẬN\n- b\n- c";
        let outcome = SectionParser::new().parse_outcome(Some(reply));
        assert_eq!(outcome.tier, Some(Tier::BulletBuckets));
        assert_eq!(outcome.sections[0].tasks, vec!["a"]);
        assert_eq!(outcome.sections[1].tasks, vec!["b"]);
        assert_eq!(outcome.sections[2].tasks, vec!["c"]);
    }

    #[test]
    fn test_section_serializes_as_title_and_tasks() {
        let section = Section::new(SectionKind::AcceptanceCriteria, vec!["x".to_string()]);
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "TIÊU CHÍ CHẤP NHẬN", "tasks": ["x"] }));
    }

    proptest! {
        #[test]
        fn prop_result_is_empty_or_three(text in "\\PC{0,400}") {
            let sections = SectionParser::new().parse(Some(&text));
            prop_assert!(sections.is_empty() || sections.len() == 3);
            prop_assert_eq!(sections.is_empty(), text.replace('\r', "").trim().is_empty());
        }

        #[test]
        fn prop_parse_is_idempotent(text in "(\\PC|\n){0,400}") {
            let parser = SectionParser::new();
            prop_assert_eq!(parser.parse_outcome(Some(&text)), parser.parse_outcome(Some(&text)));
        }

        #[test]
        fn prop_bucket_sizes(n in 1usize..60) {
            let reply: String = (0..n).map(|i| format!("- task {}\n", i)).collect();
            let outcome = SectionParser::new().parse_outcome(Some(&reply));
            prop_assert_eq!(outcome.tier, Some(Tier::BulletBuckets));

            let per = n.div_ceil(3);
            let expected = vec![per.min(n), per.min(n.saturating_sub(per)), n.saturating_sub(2 * per)];
            let counts: Vec<usize> = outcome.sections.iter().map(|s| s.tasks.len()).collect();
            prop_assert_eq!(counts, expected);
        }

        #[test]
        fn prop_strict_structure_keeps_canonical_order(
            a in "[a-z ]{1,20}",
            b in "[a-z ]{1,20}",
            c in "[a-z ]{1,20}",
        ) {
            let reply = format!("I. x\n- {a}\nII. y\n- {b}\nIII. z\n- {c}");
            let outcome = SectionParser::new().parse_outcome(Some(&reply));
            prop_assert_eq!(outcome.tier, Some(Tier::RomanNumerals));
            prop_assert_eq!(titles(&outcome.sections), canonical_titles());
        }
    }
}
