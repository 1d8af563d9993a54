//! Exact line-range extraction from corpus works.

use std::sync::Arc;

use thiserror::Error;

use crate::corpus::CorpusIndex;
use crate::corpus::sections::{SectionKey, SectionLookup, find_section};
use crate::{Reference, SourceLocation, SourceType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("invalid range {start}-{end}")]
    InvalidRange { start: u32, end: u32 },
    #[error("line {end} is past the end of the source ({line_count} lines)")]
    RangeOutOfBounds { end: u32, line_count: usize },
    #[error("{section} not found in {work}")]
    SectionNotFound { work: String, section: String },
    #[error("no corpus work with id \"{0}\"")]
    UnknownWork(String),
}

/// Return lines `start..=end` (1-based) joined by `\n`.
///
/// `lines` must already be free of blank lines.
pub fn extract_lines(lines: &[String], start: u32, end: u32) -> Result<String, ExtractionError> {
    if start == 0 || end < start {
        return Err(ExtractionError::InvalidRange { start, end });
    }
    let line_count = lines.len();
    if end as usize > line_count {
        return Err(ExtractionError::RangeOutOfBounds { end, line_count });
    }
    Ok(lines[start as usize - 1..end as usize].join("\n"))
}

/// Split `text` into non-blank lines and extract `start..=end`.
pub fn extract_from_text(text: &str, start: u32, end: u32) -> Result<String, ExtractionError> {
    extract_lines(&crate::corpus::split_lines(text), start, end)
}

/// The section (if any) a reference counts its lines in.
pub fn section_key(reference: &Reference) -> Option<SectionKey> {
    match reference.source_type {
        SourceType::Drama => Some(SectionKey::Scene {
            act: reference.chapter_or_act?,
            scene: reference.scene_or_verse_start?,
        }),
        SourceType::Literary => reference.book_number.map(SectionKey::Book),
        SourceType::Bible | SourceType::Mixed => None,
    }
}

/// Extracted text plus where it was counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub text: String,
    /// Label of the section the lines were counted in.
    pub section: Option<String>,
    /// Lines available in that section (or the whole work).
    pub total_lines: usize,
}

/// Slices passages out of the shared corpus.
#[derive(Debug, Clone)]
pub struct PassageExtractor {
    corpus: Arc<CorpusIndex>,
}

impl PassageExtractor {
    pub fn new(corpus: Arc<CorpusIndex>) -> Self {
        Self { corpus }
    }

    /// Extract `start..=end` from the whole text of the work at `location`.
    pub fn extract(
        &self,
        location: &SourceLocation,
        start: u32,
        end: u32,
    ) -> Result<String, ExtractionError> {
        let work = self
            .corpus
            .get(&location.key)
            .ok_or_else(|| ExtractionError::UnknownWork(location.key.clone()))?;
        extract_lines(work.lines(), start, end)
    }

    /// Extract the lines a reference names, narrowing to its book or scene
    /// first when the work is divided into them.
    pub fn extract_reference(
        &self,
        location: &SourceLocation,
        reference: &Reference,
    ) -> Result<Passage, ExtractionError> {
        let work = self
            .corpus
            .get(&location.key)
            .ok_or_else(|| ExtractionError::UnknownWork(location.key.clone()))?;

        let (lines, section) = match section_key(reference) {
            None => (work.lines(), None),
            Some(key) => match find_section(work.lines(), key) {
                SectionLookup::Found(lines) => (lines, Some(key.to_string())),
                SectionLookup::Unsectioned => (work.lines(), None),
                SectionLookup::Missing => {
                    return Err(ExtractionError::SectionNotFound {
                        work: work.title.clone(),
                        section: key.to_string(),
                    });
                }
            },
        };

        let text = extract_lines(
            lines,
            reference.line_or_verse_start,
            reference.line_or_verse_end,
        )?;
        Ok(Passage {
            text,
            section,
            total_lines: lines.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Work;
    use crate::parser::CitationParser;
    use crate::{SourceKind, SourceLocation};

    fn numbered(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn test_single_line() {
        let lines = numbered(10);
        for n in 1..=10 {
            assert_eq!(extract_lines(&lines, n, n).unwrap(), format!("line {n}"));
        }
    }

    #[test]
    fn test_range_is_inclusive() {
        let lines = numbered(10);
        for start in 1..=10u32 {
            for end in start..=10u32 {
                let text = extract_lines(&lines, start, end).unwrap();
                let got: Vec<&str> = text.split('\n').collect();
                assert_eq!(got.len() as u32, end - start + 1);
                assert_eq!(got[0], format!("line {start}"));
                assert_eq!(got[got.len() - 1], format!("line {end}"));
            }
        }
    }

    #[test]
    fn test_invalid_ranges() {
        let lines = numbered(5);
        assert_eq!(
            extract_lines(&lines, 0, 2),
            Err(ExtractionError::InvalidRange { start: 0, end: 2 })
        );
        assert_eq!(
            extract_lines(&lines, 3, 2),
            Err(ExtractionError::InvalidRange { start: 3, end: 2 })
        );
        assert_eq!(
            extract_lines(&lines, 4, 6),
            Err(ExtractionError::RangeOutOfBounds {
                end: 6,
                line_count: 5
            })
        );
        assert!(extract_lines(&lines, 5, 5).is_ok());
    }

    #[test]
    fn test_blank_lines_are_not_counted() {
        let text = "one\n\ntwo\n   \nthree\n\n\nfour";
        assert_eq!(extract_from_text(text, 3, 4).unwrap(), "three\nfour");
    }

    #[test]
    fn test_content_is_verbatim() {
        let text = "  indented,  with  spaces  \n\tTabbed line.";
        assert_eq!(
            extract_from_text(text, 1, 2).unwrap(),
            "  indented,  with  spaces  \n\tTabbed line."
        );
    }

    fn location(key: &str) -> SourceLocation {
        SourceLocation {
            kind: SourceKind::Corpus,
            key: key.to_string(),
            title: key.to_string(),
            author: None,
            translation: None,
            match_score: 1.0,
        }
    }

    fn extractor() -> PassageExtractor {
        let epic = "BOOK I\nfirst one\nfirst two\nBOOK II\nsecond one\nsecond two\nsecond three";
        let play = "ACT I\nSCENE I.\nopening\nSCENE II.\nlater\nlater still";
        PassageExtractor::new(Arc::new(CorpusIndex::from_works(vec![
            Work::from_text("epic", "Epic", epic),
            Work::from_text("play", "Play", play),
            Work::from_text("plain", "Plain", "a\nb\nc"),
        ])))
    }

    #[test]
    fn test_extract_whole_work() {
        let ex = extractor();
        assert_eq!(ex.extract(&location("plain"), 2, 3).unwrap(), "b\nc");
        assert_eq!(
            ex.extract(&location("nope"), 1, 1),
            Err(ExtractionError::UnknownWork("nope".to_string()))
        );
    }

    #[test]
    fn test_extract_reference_in_book() {
        let ex = extractor();
        let r = CitationParser::default().parse_segment("Epic II.2-3").unwrap();
        let passage = ex.extract_reference(&location("epic"), &r).unwrap();
        assert_eq!(passage.text, "second two\nsecond three");
        assert_eq!(passage.section.as_deref(), Some("Book II"));
        assert_eq!(passage.total_lines, 3);

        let r = CitationParser::default().parse_segment("Epic IX.1").unwrap();
        assert!(matches!(
            ex.extract_reference(&location("epic"), &r),
            Err(ExtractionError::SectionNotFound { .. })
        ));
    }

    #[test]
    fn test_extract_reference_in_scene() {
        let ex = extractor();
        let r = CitationParser::default()
            .parse_segment("Play Act 1 Scene 2, 1-2")
            .unwrap();
        let passage = ex.extract_reference(&location("play"), &r).unwrap();
        assert_eq!(passage.text, "later\nlater still");
        assert_eq!(passage.section.as_deref(), Some("Act 1, Scene 2"));
    }

    #[test]
    fn test_book_in_unsectioned_work_uses_whole_text() {
        let ex = extractor();
        let r = CitationParser::default().parse_segment("Plain I.2").unwrap();
        let passage = ex.extract_reference(&location("plain"), &r).unwrap();
        assert_eq!(passage.text, "b");
        assert_eq!(passage.section, None);
    }
}
