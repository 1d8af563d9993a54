//! Citation grammar: turns free-form citation text into [`Reference`] values.
//!
//! A citation is split on `;` and every segment is parsed on its own. A
//! segment is first classified (bible, drama, literary) and then matched
//! against the rules in [`GrammarRule::ORDER`] that apply to its class. The
//! first rule that produces a reference wins.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use thiserror::Error;

use crate::registry::BookRegistry;
use crate::roman::parse_section_number;
use crate::{Reference, SourceType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("citation is empty")]
    EmptyInput,
    #[error("no citation pattern matched \"{segment}\"")]
    NoPatternMatched { segment: String },
    #[error("invalid range {start}-{end} in \"{segment}\"")]
    InvalidRange {
        segment: String,
        start: u32,
        end: u32,
    },
}

/// One structural pattern of the citation grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarRule {
    /// `<book> <chapter>:<start>-<end>`
    BibleRange,
    /// `<book> <chapter>:<verse>`
    BibleVerse,
    /// `<work> Book <roman-or-int>, <start>-<end>`
    EpicBook,
    /// `<work> <roman>.<start>-<end>`
    EpicDotted,
    /// `<work> Act <n> Scene <n>, <start>-<end>`
    Drama,
    /// `<work> line(s) <start>(-<end>)?`
    ExplicitLines,
    /// `<work> <start>-<end>`
    BareRange,
    /// `<work> <start>`
    BareLine,
}

impl GrammarRule {
    /// Rules in the order they are tried. More specific rules come first.
    pub const ORDER: [GrammarRule; 8] = [
        GrammarRule::BibleRange,
        GrammarRule::BibleVerse,
        GrammarRule::EpicBook,
        GrammarRule::EpicDotted,
        GrammarRule::Drama,
        GrammarRule::ExplicitLines,
        GrammarRule::BareRange,
        GrammarRule::BareLine,
    ];

    /// 1-based position in [`GrammarRule::ORDER`].
    pub fn priority(self) -> usize {
        Self::ORDER
            .iter()
            .position(|&r| r == self)
            .map_or(usize::MAX, |p| p + 1)
    }

    /// Whether this rule is tried for a segment of the given class.
    pub fn applies_to(self, class: SourceType) -> bool {
        match self {
            GrammarRule::BibleRange | GrammarRule::BibleVerse => class == SourceType::Bible,
            GrammarRule::Drama => class == SourceType::Drama,
            GrammarRule::EpicBook
            | GrammarRule::EpicDotted
            | GrammarRule::ExplicitLines
            | GrammarRule::BareRange
            | GrammarRule::BareLine => class == SourceType::Literary,
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            GrammarRule::BibleRange => &BIBLE_RANGE,
            GrammarRule::BibleVerse => &BIBLE_VERSE,
            GrammarRule::EpicBook => &EPIC_BOOK,
            GrammarRule::EpicDotted => &EPIC_DOTTED,
            GrammarRule::Drama => &DRAMA,
            GrammarRule::ExplicitLines => &EXPLICIT_LINES,
            GrammarRule::BareRange => &BARE_RANGE,
            GrammarRule::BareLine => &BARE_LINE,
        }
    }
}

impl fmt::Display for GrammarRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GrammarRule::BibleRange => "bible range",
            GrammarRule::BibleVerse => "bible verse",
            GrammarRule::EpicBook => "epic book",
            GrammarRule::EpicDotted => "epic dotted",
            GrammarRule::Drama => "drama",
            GrammarRule::ExplicitLines => "explicit lines",
            GrammarRule::BareRange => "bare range",
            GrammarRule::BareLine => "bare line",
        };
        f.write_str(name)
    }
}

// Patterns run on normalized segments: lower case, single spaces, ASCII dashes.

static BIBLE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<book>(?:[1-3]\s*)?[a-z]+(?:\s+[a-z]+)*)\.?\s+(?P<chapter>\d+)\s*:\s*(?P<start>\d+)\s*-\s*(?P<end>\d+)$",
    )
    .unwrap()
});

static BIBLE_VERSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<book>(?:[1-3]\s*)?[a-z]+(?:\s+[a-z]+)*)\.?\s+(?P<chapter>\d+)\s*:\s*(?P<start>\d+)$")
        .unwrap()
});

static EPIC_BOOK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<work>.+?),?\s+book\s+(?P<book>[ivxlcdm]+|\d+)\.?(?:,\s*|\s+)(?:(?:lines?|ll?\.)\s*)?(?P<start>\d+)(?:\s*-\s*(?P<end>\d+))?$",
    )
    .unwrap()
});

static EPIC_DOTTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<work>.+?),?\s+(?P<book>[ivxlcdm]+|\d+)\.(?P<start>\d+)(?:\s*-\s*(?P<end>\d+))?$",
    )
    .unwrap()
});

static DRAMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<work>.+?),?\s+act\s+(?P<act>[ivxlcdm]+|\d+)\.?,?\s+scene\s+(?P<scene>[ivxlcdm]+|\d+)\.?(?:,\s*|\s+)(?:(?:lines?|ll?\.)\s*)?(?P<start>\d+)(?:\s*-\s*(?P<end>\d+))?$",
    )
    .unwrap()
});

static EXPLICIT_LINES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<work>.+?)[.,]?\s+(?:lines?|ll?\.)\s*(?P<start>\d+)(?:\s*-\s*(?P<end>\d+))?$",
    )
    .unwrap()
});

static BARE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<work>.+?)[.,]?\s+(?P<start>\d+)\s*-\s*(?P<end>\d+)$").unwrap()
});

static BARE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<work>.+?)[.,]?\s+(?P<start>\d+)$").unwrap());

static DRAMA_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:act|scene)\s+(?:[ivxlcdm]+|\d+)\b").unwrap());

static CITATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:cf\b\.?|see\s+also\b|see\b|compare\b)\s*").unwrap());

static BARE_SEE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^see\s").unwrap());

/// A segment that failed to parse, kept alongside the successful references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentError {
    /// Position of the segment in the `;`-separated input.
    pub index: usize,
    pub segment: String,
    pub error: ParseError,
}

/// Outcome of parsing one citation: every reference that could be extracted
/// plus the segments that could not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCitation {
    pub references: Vec<Reference>,
    pub errors: Vec<SegmentError>,
}

impl ParsedCitation {
    /// The shared source type of all references, or `Mixed` when they differ.
    pub fn source_type(&self) -> Option<SourceType> {
        let first = self.references.first()?.source_type;
        if self.references.iter().all(|r| r.source_type == first) {
            Some(first)
        } else {
            Some(SourceType::Mixed)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Lower-case, straighten dashes, collapse whitespace, and strip surrounding
/// quotes, brackets, trailing punctuation and a leading citation marker.
pub fn normalize_segment(segment: &str) -> String {
    strip_marker(&clean_segment(segment))
}

/// Everything [`normalize_segment`] does except removing the citation marker.
fn clean_segment(segment: &str) -> String {
    let dashed: String = segment
        .chars()
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            _ => c,
        })
        .collect();
    let lower = dashed.to_lowercase();
    let collapsed = lower.split_whitespace().collect::<Vec<_>>().join(" ");

    strip_surrounding(&collapsed).to_string()
}

fn strip_marker(cleaned: &str) -> String {
    let unmarked = CITATION_MARKER.replace(cleaned, "");
    strip_surrounding(&unmarked).to_string()
}

fn strip_surrounding(s: &str) -> &str {
    const QUOTES: &[char] = &[
        '"', '\'', '(', ')', '[', ']', '{', '}', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}',
    ];
    let mut current = s;
    loop {
        let next = current
            .trim()
            .trim_matches(QUOTES)
            .trim_end_matches(['.', ',', ';', ':'])
            .trim();
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}

/// Parser over a shared [`BookRegistry`].
#[derive(Debug, Clone)]
pub struct CitationParser {
    registry: Arc<BookRegistry>,
}

impl Default for CitationParser {
    fn default() -> Self {
        Self::new(Arc::new(BookRegistry::standard()))
    }
}

impl CitationParser {
    pub fn new(registry: Arc<BookRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BookRegistry {
        &self.registry
    }

    /// Parse a full citation.
    ///
    /// Only a blank citation is an error. Segments that fail are reported in
    /// [`ParsedCitation::errors`] and do not affect the others.
    pub fn parse(&self, raw: &str) -> Result<ParsedCitation, ParseError> {
        let mut parsed = ParsedCitation::default();
        let mut seen_segment = false;

        for (index, piece) in raw.split(';').enumerate() {
            let Some((segment, result)) = self.parse_piece(piece) else {
                continue;
            };
            seen_segment = true;
            match result {
                Ok(reference) => parsed.references.push(reference),
                Err(error) => {
                    tracing::debug!(index, segment = %segment, error = %error, "segment did not parse");
                    parsed.errors.push(SegmentError {
                        index,
                        segment,
                        error,
                    });
                }
            }
        }

        if !seen_segment {
            return Err(ParseError::EmptyInput);
        }
        Ok(parsed)
    }

    /// Parse a single clause (no `;` splitting).
    pub fn parse_segment(&self, segment: &str) -> Result<Reference, ParseError> {
        match self.parse_piece(segment) {
            Some((_, result)) => result,
            None => Err(ParseError::EmptyInput),
        }
    }

    /// Normalize and parse one clause. `None` for a clause that is blank once
    /// cleaned.
    ///
    /// A leading bare `see` is kept when the clause then names a registered
    /// work (`See Saw 3`), and read as a citation marker otherwise.
    fn parse_piece(&self, piece: &str) -> Option<(String, Result<Reference, ParseError>)> {
        let cleaned = clean_segment(piece);
        if BARE_SEE.is_match(&cleaned)
            && !cleaned.starts_with("see also ")
            && let Ok(reference) = self.parse_normalized(&cleaned)
            && reference.source_type != SourceType::Bible
            && self.registry.canonical_work(&reference.work_or_book).is_some()
        {
            return Some((cleaned, Ok(reference)));
        }

        let segment = strip_marker(&cleaned);
        if segment.is_empty() {
            return None;
        }
        let result = self.parse_normalized(&segment);
        Some((segment, result))
    }

    /// Classify a normalized segment before structural parsing.
    pub fn classify(&self, segment: &str) -> SourceType {
        let bible_book = BIBLE_RANGE
            .captures(segment)
            .or_else(|| BIBLE_VERSE.captures(segment))
            .and_then(|caps| self.registry.canonical_book(&caps["book"]));
        if bible_book.is_some() {
            SourceType::Bible
        } else if DRAMA_MARKER.is_match(segment) {
            SourceType::Drama
        } else {
            SourceType::Literary
        }
    }

    fn parse_normalized(&self, segment: &str) -> Result<Reference, ParseError> {
        let class = self.classify(segment);
        for rule in GrammarRule::ORDER {
            if !rule.applies_to(class) {
                continue;
            }
            if let Some(reference) = self.try_rule(rule, segment)? {
                tracing::debug!(rule = %rule, segment, "grammar rule matched");
                return Ok(reference);
            }
        }
        Err(ParseError::NoPatternMatched {
            segment: segment.to_string(),
        })
    }

    /// `Ok(None)` means the rule does not apply and the next one should be
    /// tried. An error means the rule matched but the numbers are unusable.
    fn try_rule(&self, rule: GrammarRule, segment: &str) -> Result<Option<Reference>, ParseError> {
        let Some(caps) = rule.pattern().captures(segment) else {
            return Ok(None);
        };

        let (start, end) = match line_range(&caps) {
            Some(range) => range,
            None => return Ok(None),
        };

        let reference = match rule {
            GrammarRule::BibleRange | GrammarRule::BibleVerse => {
                let Some(book) = self.registry.canonical_book(&caps["book"]) else {
                    return Ok(None);
                };
                let Some(chapter) = number(&caps, "chapter") else {
                    return Ok(None);
                };
                Reference {
                    source_type: SourceType::Bible,
                    work_or_book: book.to_string(),
                    book_number: None,
                    chapter_or_act: Some(chapter),
                    scene_or_verse_start: None,
                    scene_or_verse_end: None,
                    line_or_verse_start: start,
                    line_or_verse_end: end,
                    rule,
                }
            }
            GrammarRule::EpicBook | GrammarRule::EpicDotted => {
                // `l.7` and `ll.7-9` are line markers, not book fifty.
                if rule == GrammarRule::EpicDotted && matches!(&caps["book"], "l" | "ll") {
                    return Ok(None);
                }
                let Some(book_number) = parse_section_number(&caps["book"]) else {
                    return Ok(None);
                };
                let Some(work) = self.work_name(&caps["work"]) else {
                    return Ok(None);
                };
                Reference {
                    source_type: SourceType::Literary,
                    work_or_book: work,
                    book_number: Some(book_number),
                    chapter_or_act: None,
                    scene_or_verse_start: None,
                    scene_or_verse_end: None,
                    line_or_verse_start: start,
                    line_or_verse_end: end,
                    rule,
                }
            }
            GrammarRule::Drama => {
                let (Some(act), Some(scene)) = (
                    parse_section_number(&caps["act"]),
                    parse_section_number(&caps["scene"]),
                ) else {
                    return Ok(None);
                };
                let Some(work) = self.work_name(&caps["work"]) else {
                    return Ok(None);
                };
                Reference {
                    source_type: SourceType::Drama,
                    work_or_book: work,
                    book_number: None,
                    chapter_or_act: Some(act),
                    scene_or_verse_start: Some(scene),
                    scene_or_verse_end: Some(scene),
                    line_or_verse_start: start,
                    line_or_verse_end: end,
                    rule,
                }
            }
            GrammarRule::ExplicitLines | GrammarRule::BareRange | GrammarRule::BareLine => {
                let Some(work) = self.work_name(&caps["work"]) else {
                    return Ok(None);
                };
                Reference {
                    source_type: SourceType::Literary,
                    work_or_book: work,
                    book_number: None,
                    chapter_or_act: None,
                    scene_or_verse_start: None,
                    scene_or_verse_end: None,
                    line_or_verse_start: start,
                    line_or_verse_end: end,
                    rule,
                }
            }
        };

        if start == 0 || end < start {
            return Err(ParseError::InvalidRange {
                segment: segment.to_string(),
                start,
                end,
            });
        }
        Ok(Some(reference))
    }

    /// Clean a captured work name and map it through the registry's aliases.
    fn work_name(&self, raw: &str) -> Option<String> {
        let work = raw.trim().trim_end_matches(['.', ',', ':']).trim();
        if work.is_empty() {
            return None;
        }
        Some(
            self.registry
                .canonical_work(work)
                .map(str::to_string)
                .unwrap_or_else(|| work.to_string()),
        )
    }
}

fn number(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

/// Start and end of the captured range; a single line is its own end.
/// `None` when a number overflows `u32`.
fn line_range(caps: &Captures<'_>) -> Option<(u32, u32)> {
    let start = number(caps, "start")?;
    let end = match caps.name("end") {
        Some(m) => m.as_str().parse().ok()?,
        None => start,
    };
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CitationParser {
        let registry = BookRegistry::standard().with_works(vec![
            ("Paradise Lost".to_string(), vec!["PL".to_string()]),
            ("Absalom and Achitophel".to_string(), vec![]),
            ("Hamlet".to_string(), vec![]),
        ]);
        CitationParser::new(Arc::new(registry))
    }

    fn single(raw: &str) -> Reference {
        let parsed = parser().parse(raw).unwrap();
        assert!(parsed.errors.is_empty(), "{raw}: {:?}", parsed.errors);
        assert_eq!(parsed.references.len(), 1, "{raw}");
        parsed.references.into_iter().next().unwrap()
    }

    #[test]
    fn test_normalize_segment() {
        assert_eq!(normalize_segment("  Genesis   1:1\u{2013}3. "), "genesis 1:1-3");
        assert_eq!(normalize_segment("cf. Genesis 3:15"), "genesis 3:15");
        assert_eq!(normalize_segment("See also Hamlet 3"), "hamlet 3");
        assert_eq!(normalize_segment("\u{201c}Absalom 7-8.\u{201d}"), "absalom 7-8");
        assert_eq!(normalize_segment("(Paradise Lost IX.1033-1045)"), "paradise lost ix.1033-1045");
        assert_eq!(normalize_segment("cf."), "");
    }

    #[test]
    fn test_bible_range() {
        let r = single("Genesis 1:1-3");
        assert_eq!(r.source_type, SourceType::Bible);
        assert_eq!(r.work_or_book, "Genesis");
        assert_eq!(r.chapter_or_act, Some(1));
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (1, 3));
        assert_eq!(r.rule, GrammarRule::BibleRange);
    }

    #[test]
    fn test_bible_single_verse_and_alias() {
        let r = single("Matt. 5:3");
        assert_eq!(r.work_or_book, "Matthew");
        assert_eq!(r.chapter_or_act, Some(5));
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (3, 3));
        assert_eq!(r.rule, GrammarRule::BibleVerse);

        let r = single("1 Cor 13:4-7");
        assert_eq!(r.work_or_book, "1 Corinthians");
        let r = single("1cor 13:4\u{2014}7");
        assert_eq!(r.work_or_book, "1 Corinthians");
        assert_eq!(r.line_or_verse_end, 7);
    }

    #[test]
    fn test_unknown_bible_book_is_not_bible() {
        let p = parser();
        assert_eq!(p.classify("hezekiah 3:4"), SourceType::Literary);
        let parsed = p.parse("Hezekiah 3:4").unwrap();
        assert!(parsed.references.is_empty());
        assert!(matches!(
            parsed.errors[0].error,
            ParseError::NoPatternMatched { .. }
        ));
    }

    #[test]
    fn test_epic_book_marker() {
        let r = single("Paradise Lost Book I, 1-26");
        assert_eq!(r.source_type, SourceType::Literary);
        assert_eq!(r.work_or_book, "Paradise Lost");
        assert_eq!(r.book_number, Some(1));
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (1, 26));
        assert_eq!(r.rule, GrammarRule::EpicBook);

        let r = single("Paradise Lost, Book 9, lines 1033-1045");
        assert_eq!(r.book_number, Some(9));
        assert_eq!(r.line_or_verse_start, 1033);
    }

    #[test]
    fn test_epic_dotted() {
        let r = single("Paradise Lost IX.1033-1045");
        assert_eq!(r.work_or_book, "Paradise Lost");
        assert_eq!(r.book_number, Some(9));
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (1033, 1045));
        assert_eq!(r.rule, GrammarRule::EpicDotted);

        let r = single("PL ix.1033");
        assert_eq!(r.work_or_book, "Paradise Lost");
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (1033, 1033));
    }

    #[test]
    fn test_drama_takes_priority_over_bare_range() {
        let r = single("Hamlet Act 3 Scene 1, 56-88");
        assert_eq!(r.source_type, SourceType::Drama);
        assert_eq!(r.work_or_book, "Hamlet");
        assert_eq!(r.chapter_or_act, Some(3));
        assert_eq!(r.scene_or_verse_start, Some(1));
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (56, 88));
        assert_eq!(r.rule, GrammarRule::Drama);

        let r = single("Hamlet, Act III, Scene i, lines 56-88");
        assert_eq!(r.chapter_or_act, Some(3));
        assert_eq!(r.scene_or_verse_start, Some(1));
    }

    #[test]
    fn test_drama_without_lines_does_not_fall_back() {
        let parsed = parser().parse("Hamlet Act 3 Scene 1").unwrap();
        assert!(parsed.references.is_empty());
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn test_explicit_lines() {
        let r = single("Absalom and Achitophel, lines 7-8");
        assert_eq!(r.work_or_book, "Absalom and Achitophel");
        assert_eq!(r.rule, GrammarRule::ExplicitLines);
        let r = single("Absalom and Achitophel ll. 7-8");
        assert_eq!(r.rule, GrammarRule::ExplicitLines);
        let r = single("Absalom and Achitophel line 9");
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (9, 9));
    }

    #[test]
    fn test_bare_range_and_line() {
        let r = single("Absalom and Achitophel 7-8");
        assert_eq!(r.source_type, SourceType::Literary);
        assert_eq!(r.work_or_book, "Absalom and Achitophel");
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (7, 8));
        assert_eq!(r.rule, GrammarRule::BareRange);

        let r = single("Absalom and Achitophel 9");
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (9, 9));
        assert_eq!(r.rule, GrammarRule::BareLine);
    }

    #[test]
    fn test_unknown_work_keeps_normalized_name() {
        let r = single("Unknown Work 999-1000");
        assert_eq!(r.work_or_book, "unknown work");
    }

    #[test]
    fn test_trailing_periods_are_ignored() {
        let p = parser();
        assert_eq!(
            p.parse("absalom and achitophel 7-8").unwrap(),
            p.parse("absalom and achitophel. 7-8.").unwrap()
        );
        assert_eq!(p.parse("work 7-8").unwrap(), p.parse("work. 7-8.").unwrap());
    }

    #[test]
    fn test_invalid_roman_falls_through() {
        // "ic" is not a canonical numeral: the epic rules step aside and no
        // later rule accepts the dotted form.
        let parsed = parser().parse("Paradise Lost ic.12").unwrap();
        assert!(parsed.references.is_empty());
        assert!(matches!(
            parsed.errors[0].error,
            ParseError::NoPatternMatched { .. }
        ));

        // "l." reads as a line marker, not as book fifty.
        let r = single("Absalom and Achitophel l. 7");
        assert_eq!(r.rule, GrammarRule::ExplicitLines);
        assert_eq!(r.book_number, None);
    }

    #[test]
    fn test_line_marker_without_space() {
        let r = single("Absalom and Achitophel l.7");
        assert_eq!(r.rule, GrammarRule::ExplicitLines);
        assert_eq!(r.book_number, None);
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (7, 7));

        let r = single("PL l.7-9");
        assert_eq!(r.work_or_book, "Paradise Lost");
        assert_eq!(r.book_number, None);
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (7, 9));

        let r = single("Absalom and Achitophel ll.7-8");
        assert_eq!(r.rule, GrammarRule::ExplicitLines);
        assert_eq!((r.line_or_verse_start, r.line_or_verse_end), (7, 8));

        // Other dotted numerals are still books.
        assert_eq!(single("PL ix.7").book_number, Some(9));
    }

    #[test]
    fn test_see_is_kept_in_registered_titles() {
        let registry = BookRegistry::standard().with_works(vec![
            ("See Saw".to_string(), Vec::<String>::new()),
            ("Hamlet".to_string(), vec![]),
        ]);
        let p = CitationParser::new(Arc::new(registry));

        let r = p.parse_segment("See Saw 3").unwrap();
        assert_eq!(r.work_or_book, "See Saw");

        // Unregistered remainders still drop the marker.
        let r = p.parse_segment("see Hamlet 3").unwrap();
        assert_eq!(r.work_or_book, "Hamlet");
        let r = p.parse_segment("See Genesis 1:1").unwrap();
        assert_eq!(r.work_or_book, "Genesis");
        let r = p.parse_segment("see also Hamlet 4").unwrap();
        assert_eq!(r.work_or_book, "Hamlet");
        assert_eq!(p.parse_segment("see"), Err(ParseError::EmptyInput));
    }

    #[test]
    fn test_invalid_range() {
        let parsed = parser().parse("Absalom 8-7").unwrap();
        assert_eq!(
            parsed.errors[0].error,
            ParseError::InvalidRange {
                segment: "absalom 8-7".to_string(),
                start: 8,
                end: 7,
            }
        );
        let parsed = parser().parse("Genesis 1:0").unwrap();
        assert!(matches!(parsed.errors[0].error, ParseError::InvalidRange { .. }));
    }

    #[test]
    fn test_empty_input() {
        let p = parser();
        assert_eq!(p.parse(""), Err(ParseError::EmptyInput));
        assert_eq!(p.parse("   "), Err(ParseError::EmptyInput));
        assert_eq!(p.parse(" ; ;"), Err(ParseError::EmptyInput));
        assert_eq!(p.parse("cf."), Err(ParseError::EmptyInput));
    }

    #[test]
    fn test_no_pattern_matched() {
        let parsed = parser().parse("just some words").unwrap();
        assert!(parsed.references.is_empty());
        assert_eq!(
            parsed.errors,
            vec![SegmentError {
                index: 0,
                segment: "just some words".to_string(),
                error: ParseError::NoPatternMatched {
                    segment: "just some words".to_string()
                },
            }]
        );
    }

    #[test]
    fn test_mixed_citation() {
        let parsed = parser()
            .parse("cf. Genesis 3:15; Paradise Lost IX.1033-1045")
            .unwrap();
        assert_eq!(parsed.references.len(), 2);
        assert_eq!(parsed.references[0].source_type, SourceType::Bible);
        assert_eq!(parsed.references[0].work_or_book, "Genesis");
        assert_eq!(parsed.references[1].source_type, SourceType::Literary);
        assert_eq!(parsed.references[1].book_number, Some(9));
        assert_eq!(parsed.source_type(), Some(SourceType::Mixed));
    }

    #[test]
    fn test_partial_success() {
        let parsed = parser()
            .parse("Genesis 1:1; gibberish; Absalom and Achitophel 7-8")
            .unwrap();
        assert_eq!(parsed.references.len(), 2);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].index, 1);
        assert_eq!(parsed.errors[0].segment, "gibberish");
    }

    #[test]
    fn test_rule_order_is_stable() {
        let priorities: Vec<usize> = GrammarRule::ORDER.iter().map(|r| r.priority()).collect();
        assert_eq!(priorities, (1..=8).collect::<Vec<_>>());
        assert!(GrammarRule::EpicBook.priority() < GrammarRule::Drama.priority());
        assert!(GrammarRule::Drama.priority() < GrammarRule::BareRange.priority());
        assert!(GrammarRule::BareRange.priority() < GrammarRule::BareLine.priority());
    }

    #[test]
    fn test_display_round_trips() {
        let p = parser();
        for raw in [
            "Genesis 1:1-3",
            "Genesis 3:15",
            "Paradise Lost IX.1033-1045",
            "Hamlet Act 3 Scene 1, 56-88",
            "Absalom and Achitophel 7-8",
        ] {
            let r = single(raw);
            let reparsed = p.parse_segment(&r.to_string()).unwrap();
            assert_eq!(reparsed.work_or_book, r.work_or_book, "{raw}");
            assert_eq!(reparsed.line_or_verse_start, r.line_or_verse_start, "{raw}");
            assert_eq!(reparsed.line_or_verse_end, r.line_or_verse_end, "{raw}");
        }
    }
}
