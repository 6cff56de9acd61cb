//! The ordered fallback strategies of the section parser
//!
//! Each strategy either recognizes the reply's shape and returns all sections,
//! or returns `None` so the next, less specific strategy can try.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::tasks::extract_tasks;
use super::{Section, SectionKind, Tier};

/// A single tier of the fallback cascade
pub trait ParseStrategy: Send + Sync {
    /// Which tier this strategy implements
    fn tier(&self) -> Tier;

    /// Try to split normalized, non-empty text into sections
    fn apply(&self, text: &str) -> Option<Vec<Section>>;
}

static ROMAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)I\.\s*(.*?)\n\s*II\.\s*(.*?)\n\s*III\.\s*(.*)").expect("roman numeral regex is valid")
});

static HEADER_RES: LazyLock<[(SectionKind, Regex); 3]> = LazyLock::new(|| {
    [
        (SectionKind::RequirementAnalysis, r"(?i)PHÂN\s*TÍCH\s*YÊU\s*CẦU"),
        (SectionKind::AcceptanceCriteria, r"(?i)TIÊU\s*CHÍ\s*CHẤP\s*NHẬN"),
        // Prefix only, so headers without the trailing "CHO BA" still match
        (SectionKind::BaTasks, r"(?i)CÔNG\s*VIỆC\s*CỤ\s*THỂ"),
    ]
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("header regex is valid")))
});

/// Tier 1: `I. ... II. ... III. ...` blocks, in that order
pub struct RomanNumerals;

impl ParseStrategy for RomanNumerals {
    fn tier(&self) -> Tier {
        Tier::RomanNumerals
    }

    fn apply(&self, text: &str) -> Option<Vec<Section>> {
        let caps = ROMAN_RE.captures(text)?;
        debug!("RomanNumerals::apply: matched I./II./III. structure");

        let sections = SectionKind::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let block = caps.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
                Section::new(*kind, extract_tasks(block))
            })
            .collect();
        Some(sections)
    }
}

/// Tier 2: the three Vietnamese header keywords, wherever they appear
pub struct HeaderKeywords;

impl ParseStrategy for HeaderKeywords {
    fn tier(&self) -> Tier {
        Tier::HeaderKeywords
    }

    fn apply(&self, text: &str) -> Option<Vec<Section>> {
        let mut found: Vec<(usize, SectionKind)> = HEADER_RES
            .iter()
            .filter_map(|(kind, re)| re.find(text).map(|m| (m.start(), *kind)))
            .collect();

        if found.len() < SectionKind::ALL.len() {
            debug!(found = found.len(), "HeaderKeywords::apply: not all headers present");
            return None;
        }

        found.sort_by_key(|(start, _)| *start);
        debug!(?found, "HeaderKeywords::apply: headers located");

        let sections = found
            .iter()
            .enumerate()
            .map(|(i, (start, kind))| {
                let end = found.get(i + 1).map(|(next, _)| *next).unwrap_or(text.len());
                let block = &text[*start..end];
                // Drop the header line itself
                let body = block.split_once('\n').map(|(_, rest)| rest).unwrap_or_default();
                Section::new(*kind, extract_tasks(body))
            })
            .collect();
        Some(sections)
    }
}

/// Tier 3: every bullet in the text, split into three contiguous buckets
pub struct BulletBuckets;

impl ParseStrategy for BulletBuckets {
    fn tier(&self) -> Tier {
        Tier::BulletBuckets
    }

    fn apply(&self, text: &str) -> Option<Vec<Section>> {
        let bullets = extract_tasks(text);
        if bullets.is_empty() {
            return None;
        }

        let per = bucket_size(bullets.len());
        debug!(total = bullets.len(), per, "BulletBuckets::apply: bucketing bullets");

        let mut chunks = bullets.chunks(per);
        let sections = SectionKind::ALL
            .iter()
            .map(|kind| Section::new(*kind, chunks.next().map(<[String]>::to_vec).unwrap_or_default()))
            .collect();
        Some(sections)
    }
}

/// Size of the first two buckets for `total` bullets: `ceil(total / 3)`
pub fn bucket_size(total: usize) -> usize {
    total.div_ceil(SectionKind::ALL.len()).max(1)
}

/// Tier 4: the three canonical sections with no tasks
pub struct EmptySkeleton;

impl ParseStrategy for EmptySkeleton {
    fn tier(&self) -> Tier {
        Tier::EmptySkeleton
    }

    fn apply(&self, _text: &str) -> Option<Vec<Section>> {
        Some(SectionKind::ALL.iter().map(|kind| Section::new(*kind, Vec::new())).collect())
    }
}
