//! Confidence scoring for candidate passages.
//!
//! The confidence of a candidate is a weighted sum of four sub-scores, each in
//! `[0, 1]`:
//! - `text_quality`: length and cleanliness of the extracted text
//! - `source_reliability`: fixed per source kind
//! - `metadata_completeness`: fraction of author, title and range present
//! - `citation_match`: similarity of the cited name and the resolved title

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::matching::title_similarity;
use crate::{Candidate, CandidateMetadata, Reference, SourceKind, SourceLocation};

/// Weights for the confidence function. They should sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringWeights {
    pub text_quality: f64,
    pub source_reliability: f64,
    pub metadata_completeness: f64,
    pub citation_match: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            text_quality: 0.30,
            source_reliability: 0.20,
            metadata_completeness: 0.20,
            citation_match: 0.30,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.text_quality + self.source_reliability + self.metadata_completeness + self.citation_match
    }
}

/// The sub-scores behind a confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub text_quality: f64,
    pub source_reliability: f64,
    pub metadata_completeness: f64,
    pub citation_match: f64,
    /// Weighted sum, clamped to `[0, 1]`.
    pub total: f64,
}

/// Display band of a confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceBand::High
        } else if score >= 0.5 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
        })
    }
}

static EDITORIAL_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    weights: ScoringWeights,
    min_text_length: usize,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), 200)
    }
}

impl ConfidenceScorer {
    pub fn new(weights: ScoringWeights, min_text_length: usize) -> Self {
        if (weights.sum() - 1.0).abs() > 1e-6 {
            tracing::warn!(sum = weights.sum(), "scoring weights do not sum to 1");
        }
        Self {
            weights,
            min_text_length: min_text_length.max(1),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Mean of four indicators: length (saturating at `min_text_length`
    /// characters), completeness (elided text ending in `...`), readability
    /// (sentence punctuation present) and cleanliness (no `[...]` editorial
    /// markers). Empty text scores 0.
    pub fn text_quality(&self, text: &str) -> f64 {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return 0.0;
        }

        let length = (trimmed.chars().count() as f64 / self.min_text_length as f64).min(1.0);
        let completeness = if trimmed.ends_with("...") || trimmed.ends_with('\u{2026}') {
            0.8
        } else {
            1.0
        };
        let readability = if trimmed.contains(['.', '!', '?']) {
            1.0
        } else {
            0.6
        };
        let cleanliness = if EDITORIAL_MARKER.is_match(trimmed) {
            0.7
        } else {
            1.0
        };

        (length + completeness + readability + cleanliness) / 4.0
    }

    /// Fraction of author (the translation for biblical text), title and
    /// range that are present.
    pub fn metadata_completeness(&self, metadata: &CandidateMetadata, kind: SourceKind) -> f64 {
        let author = match kind {
            SourceKind::Bible => metadata.translation.as_deref(),
            SourceKind::Corpus | SourceKind::Unresolved => metadata.author.as_deref(),
        };
        let present = [author, Some(metadata.title.as_str()), Some(metadata.range.as_str())]
            .into_iter()
            .flatten()
            .filter(|v| !v.trim().is_empty())
            .count();
        present as f64 / 3.0
    }

    /// Similarity between the cited work or book and the resolved title.
    pub fn citation_match(&self, original: &Reference, source: &SourceLocation) -> f64 {
        title_similarity(&original.work_or_book, &source.title)
    }

    /// Score a passage before it is wrapped in a [`Candidate`].
    pub fn score(
        &self,
        text: &str,
        source: &SourceLocation,
        metadata: &CandidateMetadata,
        original: &Reference,
    ) -> ScoreBreakdown {
        let text_quality = self.text_quality(text);
        let source_reliability = source.kind.reliability();
        let metadata_completeness = self.metadata_completeness(metadata, source.kind);
        let citation_match = self.citation_match(original, source);

        let w = &self.weights;
        let total = (w.text_quality * text_quality
            + w.source_reliability * source_reliability
            + w.metadata_completeness * metadata_completeness
            + w.citation_match * citation_match)
            .clamp(0.0, 1.0);

        ScoreBreakdown {
            text_quality,
            source_reliability,
            metadata_completeness,
            citation_match,
            total,
        }
    }

    /// Re-score an existing candidate against a reference.
    pub fn score_candidate(&self, candidate: &Candidate, original: &Reference) -> ScoreBreakdown {
        self.score(
            &candidate.text,
            &candidate.source,
            &candidate.metadata,
            original,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CitationParser;

    fn metadata(author: Option<&str>, translation: Option<&str>) -> CandidateMetadata {
        CandidateMetadata {
            title: "Absalom and Achitophel".to_string(),
            author: author.map(str::to_string),
            translation: translation.map(str::to_string),
            range: "7-8".to_string(),
            section: None,
            total_lines: Some(1031),
        }
    }

    fn corpus_source(title: &str) -> SourceLocation {
        SourceLocation {
            kind: SourceKind::Corpus,
            key: "absalom".to_string(),
            title: title.to_string(),
            author: Some("John Dryden".to_string()),
            translation: None,
            match_score: 1.0,
        }
    }

    #[test]
    fn default_weights_sum_to_one() {
        let w = ScoringWeights::default();
        assert!((w.sum() - 1.0).abs() < 1e-12);
        assert_eq!(w.text_quality, 0.30);
        assert_eq!(w.source_reliability, 0.20);
        assert_eq!(w.metadata_completeness, 0.20);
        assert_eq!(w.citation_match, 0.30);
    }

    #[test]
    fn text_quality_indicators() {
        let scorer = ConfidenceScorer::default();
        assert_eq!(scorer.text_quality(""), 0.0);
        assert_eq!(scorer.text_quality("   "), 0.0);

        let long = "a".repeat(200) + ".";
        assert_eq!(scorer.text_quality(&long), 1.0);

        // 100 chars with no sentence punctuation: (0.5 + 1 + 0.6 + 1) / 4
        let half = "a".repeat(100);
        assert!((scorer.text_quality(&half) - 0.775).abs() < 1e-9);

        let elided = "a".repeat(197) + "...";
        assert!((scorer.text_quality(&elided) - 0.95).abs() < 1e-9);

        let marked = "a".repeat(195) + " [sic] b.";
        assert!((scorer.text_quality(&marked) - 0.925).abs() < 1e-9);
    }

    #[test]
    fn metadata_completeness_uses_translation_for_bible() {
        let scorer = ConfidenceScorer::default();
        assert_eq!(
            scorer.metadata_completeness(&metadata(Some("John Dryden"), None), SourceKind::Corpus),
            1.0
        );
        assert!(
            (scorer.metadata_completeness(&metadata(None, None), SourceKind::Corpus) - 2.0 / 3.0)
                .abs()
                < 1e-9
        );
        assert_eq!(
            scorer.metadata_completeness(&metadata(None, Some("KJV")), SourceKind::Bible),
            1.0
        );
        assert!(
            scorer.metadata_completeness(&metadata(Some(""), None), SourceKind::Corpus) < 1.0
        );
    }

    #[test]
    fn exact_literary_match_scores_high() {
        let scorer = ConfidenceScorer::default();
        let original = CitationParser::default()
            .parse_segment("Absalom and Achitophel 7-8")
            .unwrap();
        let text = "Sagacious, bold, and turbulent of wit,\nRestless, unfixed in principles and place,";
        let source = corpus_source("Absalom and Achitophel");
        let score = scorer.score(text, &source, &metadata(Some("John Dryden"), None), &original);

        assert_eq!(score.source_reliability, 0.85);
        assert_eq!(score.metadata_completeness, 1.0);
        assert_eq!(score.citation_match, 1.0);
        assert!(score.total >= 0.7, "{score:?}");
        let expected = 0.3 * score.text_quality + 0.2 * 0.85 + 0.2 + 0.3;
        assert!((score.total - expected).abs() < 1e-9);
    }

    #[test]
    fn poor_title_match_lowers_confidence() {
        let scorer = ConfidenceScorer::default();
        let original = CitationParser::default()
            .parse_segment("Absalom 7-8")
            .unwrap();
        let exact = scorer.score("x.", &corpus_source("Absalom"), &metadata(None, None), &original);
        let fuzzy = scorer.score(
            "x.",
            &corpus_source("Absalom and Achitophel"),
            &metadata(None, None),
            &original,
        );
        assert!(fuzzy.citation_match < exact.citation_match);
        assert!(fuzzy.total < exact.total);
    }

    #[test]
    fn total_is_clamped() {
        let heavy = ScoringWeights {
            text_quality: 1.0,
            source_reliability: 1.0,
            metadata_completeness: 1.0,
            citation_match: 1.0,
        };
        let scorer = ConfidenceScorer::new(heavy, 10);
        let original = CitationParser::default()
            .parse_segment("Absalom and Achitophel 7-8")
            .unwrap();
        let score = scorer.score(
            "A complete sentence.",
            &corpus_source("Absalom and Achitophel"),
            &metadata(Some("John Dryden"), None),
            &original,
        );
        assert_eq!(score.total, 1.0);
    }

    #[test]
    fn bands() {
        assert_eq!(ConfidenceBand::from_score(0.95), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(0.8), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(0.79), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(0.5), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(0.49), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::High.to_string(), "high");
    }
}
