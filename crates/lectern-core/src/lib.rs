use std::fmt;

use serde::Serialize;

pub mod config_file;
pub mod corpus;
pub mod engine;
pub mod extractor;
pub mod matching;
pub mod parser;
pub mod provider;
pub mod ranking;
pub mod registry;
pub mod resolver;
pub mod roman;
pub mod scoring;

// Re-export for convenience
pub use config_file::{ConfigError, ConfigFile};
pub use corpus::pipeline::{PrepareSummary, ValidationReport};
pub use corpus::search::{GutenbergCatalog, GutenbergCatalogError};
pub use corpus::{CorpusError, CorpusIndex, Work};
pub use engine::{CitationEngine, EngineInfo, WorkSummary};
pub use extractor::{ExtractionError, PassageExtractor};
pub use parser::{CitationParser, GrammarRule, ParseError, ParsedCitation, SegmentError};
pub use provider::{
    BibleProvider, ProviderError, ProviderKind, ProviderSettings, VerseRequest, build_bible_provider,
};
pub use registry::BookRegistry;
pub use resolver::SourceResolver;
pub use scoring::{ConfidenceBand, ConfidenceScorer, ScoreBreakdown, ScoringWeights};

/// What kind of text a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Bible,
    Literary,
    Drama,
    /// Only describes a whole citation whose references differ in type.
    Mixed,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceType::Bible => "bible",
            SourceType::Literary => "literary",
            SourceType::Drama => "drama",
            SourceType::Mixed => "mixed",
        })
    }
}

/// One parsed citation clause.
///
/// Bible references keep the chapter in `chapter_or_act` and the verses in
/// `line_or_verse_*`. Drama references keep the act in `chapter_or_act` and
/// the scene in `scene_or_verse_*`. Ranges are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub source_type: SourceType,
    /// Canonical book or work name when the registry knows it, otherwise the
    /// normalized text from the citation.
    pub work_or_book: String,
    /// Book of a multi-book epic (`IX` in `Paradise Lost IX.1033`).
    pub book_number: Option<u32>,
    pub chapter_or_act: Option<u32>,
    pub scene_or_verse_start: Option<u32>,
    pub scene_or_verse_end: Option<u32>,
    pub line_or_verse_start: u32,
    pub line_or_verse_end: u32,
    /// Grammar rule that produced this reference.
    pub rule: GrammarRule,
}

impl Reference {
    /// `"1033-1045"`, or `"7"` for a single line.
    pub fn range_label(&self) -> String {
        if self.line_or_verse_start == self.line_or_verse_end {
            self.line_or_verse_start.to_string()
        } else {
            format!("{}-{}", self.line_or_verse_start, self.line_or_verse_end)
        }
    }

    /// Lines or verses covered by the range; 0 for an inverted range.
    pub fn line_count(&self) -> u32 {
        if self.line_or_verse_end < self.line_or_verse_start {
            return 0;
        }
        self.line_or_verse_end - self.line_or_verse_start + 1
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = self.range_label();
        match (self.source_type, self.chapter_or_act, self.book_number) {
            (SourceType::Bible, Some(chapter), _) => {
                write!(f, "{} {}:{}", self.work_or_book, chapter, range)
            }
            (SourceType::Drama, Some(act), _) => {
                write!(f, "{} Act {}", self.work_or_book, act)?;
                if let Some(scene) = self.scene_or_verse_start {
                    write!(f, " Scene {scene}")?;
                }
                write!(f, ", {range}")
            }
            (_, _, Some(book)) => match roman::to_roman(book) {
                Some(numeral) => write!(f, "{} {}.{}", self.work_or_book, numeral, range),
                None => write!(f, "{} Book {}, {}", self.work_or_book, book, range),
            },
            _ => write!(f, "{} {}", self.work_or_book, range),
        }
    }
}

/// Where a candidate's text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A biblical translation served by a [`BibleProvider`].
    Bible,
    /// A work in the local corpus.
    Corpus,
    /// Degraded placeholder when the source could not be reached.
    Unresolved,
}

impl SourceKind {
    /// Fixed reliability weight used by scoring and ranking.
    pub fn reliability(self) -> f64 {
        match self {
            SourceKind::Bible => 0.95,
            SourceKind::Corpus => 0.85,
            SourceKind::Unresolved => 0.5,
        }
    }
}

/// A resolved pointer to retrievable text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLocation {
    pub kind: SourceKind,
    /// Corpus work id, or the translation code for biblical sources.
    pub key: String,
    pub title: String,
    pub author: Option<String>,
    pub translation: Option<String>,
    /// Similarity between the cited name and `title` (1.0 for an exact alias).
    pub match_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateMetadata {
    pub title: String,
    pub author: Option<String>,
    pub translation: Option<String>,
    /// Human-readable location, e.g. `"Genesis 1:1-3"`.
    pub range: String,
    /// Section the lines were counted in (`"Book IX"`, `"Act 3, Scene 1"`).
    pub section: Option<String>,
    /// Number of addressable lines in the source (or section).
    pub total_lines: Option<usize>,
}

/// A scored passage for one reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub source: SourceLocation,
    pub text: String,
    pub confidence: f64,
    pub metadata: CandidateMetadata,
    pub source_type: SourceType,
    /// Index of the reference (in parse order) this candidate answers.
    pub reference_index: usize,
    pub score: ScoreBreakdown,
}

impl Candidate {
    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::from_score(self.confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStage {
    Parse,
    Resolve,
    Extract,
    Provider,
}

/// A failure that was recovered from during a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: DiagnosticStage,
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: DiagnosticStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// The outcome of one `resolve_citation` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub original_citation: String,
    pub candidates: Vec<Candidate>,
    pub best_match: Option<Candidate>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LookupResult {
    pub fn empty(original_citation: &str, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            original_citation: original_citation.to_string(),
            candidates: Vec::new(),
            best_match: None,
            diagnostics,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Translation codes consulted for biblical references, in order.
    pub translations: Vec<String>,
    pub provider_timeout_secs: u64,
    /// Minimum title similarity for a fuzzy work match.
    pub fuzzy_floor: f64,
    /// Maximum number of candidates returned per lookup. `None` keeps all.
    pub max_candidates: Option<usize>,
    /// Emit a low-confidence placeholder when a provider fails.
    pub emit_unresolved: bool,
    /// Passage length (in characters) at which the length indicator saturates.
    pub min_text_length: usize,
    pub scoring_weights: ScoringWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translations: vec!["KJV".to_string()],
            provider_timeout_secs: 10,
            fuzzy_floor: 0.6,
            max_candidates: Some(5),
            emit_unresolved: false,
            min_text_length: 200,
            scoring_weights: ScoringWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(source_type: SourceType, work: &str) -> Reference {
        Reference {
            source_type,
            work_or_book: work.to_string(),
            book_number: None,
            chapter_or_act: None,
            scene_or_verse_start: None,
            scene_or_verse_end: None,
            line_or_verse_start: 7,
            line_or_verse_end: 8,
            rule: GrammarRule::BareRange,
        }
    }

    #[test]
    fn display_literary() {
        let r = reference(SourceType::Literary, "Absalom and Achitophel");
        assert_eq!(r.to_string(), "Absalom and Achitophel 7-8");
        assert_eq!(r.line_count(), 2);
    }

    #[test]
    fn line_count_of_inverted_range_is_zero() {
        let mut r = reference(SourceType::Literary, "Absalom and Achitophel");
        r.line_or_verse_start = 8;
        r.line_or_verse_end = 7;
        assert_eq!(r.line_count(), 0);
        r.line_or_verse_end = 8;
        assert_eq!(r.line_count(), 1);
    }

    #[test]
    fn display_epic_uses_roman_book() {
        let mut r = reference(SourceType::Literary, "Paradise Lost");
        r.book_number = Some(9);
        r.line_or_verse_start = 1033;
        r.line_or_verse_end = 1045;
        assert_eq!(r.to_string(), "Paradise Lost IX.1033-1045");
    }

    #[test]
    fn display_bible_single_verse() {
        let mut r = reference(SourceType::Bible, "Genesis");
        r.chapter_or_act = Some(3);
        r.line_or_verse_start = 15;
        r.line_or_verse_end = 15;
        assert_eq!(r.to_string(), "Genesis 3:15");
        assert_eq!(r.range_label(), "15");
    }

    #[test]
    fn display_drama() {
        let mut r = reference(SourceType::Drama, "Hamlet");
        r.chapter_or_act = Some(3);
        r.scene_or_verse_start = Some(1);
        r.scene_or_verse_end = Some(1);
        r.line_or_verse_start = 56;
        r.line_or_verse_end = 88;
        assert_eq!(r.to_string(), "Hamlet Act 3 Scene 1, 56-88");
    }

    #[test]
    fn reliability_order() {
        assert!(SourceKind::Bible.reliability() > SourceKind::Corpus.reliability());
        assert!(SourceKind::Corpus.reliability() > SourceKind::Unresolved.reliability());
        assert_eq!(SourceKind::Unresolved.reliability(), 0.5);
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.translations, vec!["KJV"]);
        assert_eq!(config.fuzzy_floor, 0.6);
        assert_eq!(config.max_candidates, Some(5));
        assert!(!config.emit_unresolved);
    }
}
