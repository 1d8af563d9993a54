//! Project Gutenberg boilerplate removal and header sniffing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::title_case;

const START_MARKERS: &[&str] = &[
    "*** start of this project gutenberg ebook",
    "*** start of the project gutenberg ebook",
    "*end*the small print",
    "start of this project gutenberg",
];

const END_MARKERS: &[&str] = &[
    "*** end of this project gutenberg ebook",
    "*** end of the project gutenberg ebook",
    "end of this project gutenberg",
    "end of the project gutenberg ebook",
    "end of project gutenberg",
];

/// Lines inside the body that are still distribution notes, not text.
const NOTE_PREFIXES: &[&str] = &[
    "produced by",
    "this ebook is for the use of anyone",
    "updated editions will replace",
    "creating the works from",
];

const HEADER_SKIP: &[&str] = &["project gutenberg", "ebook", "produced by"];

/// How many leading lines are examined for a title and author.
const SNIFF_LINES: usize = 10;

/// Whether the text carries Gutenberg start or end markers.
pub fn has_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    START_MARKERS
        .iter()
        .chain(END_MARKERS)
        .any(|m| lower.contains(m))
}

/// Cut the text down to the body between the Gutenberg start and end markers.
///
/// Text without markers is returned unchanged. When the markers are present
/// but out of order the original text is kept.
pub fn strip_boilerplate(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();

    let start = START_MARKERS
        .iter()
        .find_map(|marker| {
            let pos = lower.find(marker)?;
            lower[pos..].find('\n').map(|nl| pos + nl + 1)
        })
        .unwrap_or(0);
    let end = END_MARKERS
        .iter()
        .find_map(|marker| lower.find(marker))
        .unwrap_or(text.len());

    if start >= end {
        tracing::warn!("gutenberg markers out of order, keeping full text");
        return text.to_string();
    }

    text[start..end]
        .lines()
        .filter(|line| {
            let lower = line.trim().to_ascii_lowercase();
            !NOTE_PREFIXES.iter().any(|p| lower.starts_with(p))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Title and author guessed from the first lines of a text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffedHeader {
    pub title: String,
    pub author: Option<String>,
}

/// Guess title and author from the header of `text`.
///
/// `Title:`/`Author:` fields win. Otherwise the first line that is not
/// Gutenberg boilerplate is the title and a `by <Name>` line is the author.
/// Without a usable line the title-cased `fallback_stem` is used.
pub fn sniff_header(text: &str, fallback_stem: &str) -> SniffedHeader {
    static BY_AUTHOR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bby\s+([A-Za-z][A-Za-z\s.]*)").unwrap());
    static FIELD: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^(title|author)\s*:\s*(.+)$").unwrap());

    let mut title: Option<String> = None;
    let mut author: Option<String> = None;

    for line in text.lines().take(SNIFF_LINES) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = FIELD.captures(line) {
            let value = caps[2].trim().to_string();
            if caps[1].eq_ignore_ascii_case("title") {
                title = Some(value);
            } else {
                author = Some(value);
            }
            continue;
        }

        let lower = line.to_lowercase();
        if HEADER_SKIP.iter().any(|s| lower.contains(s)) {
            continue;
        }
        if title.is_none() {
            title = Some(line.to_string());
            continue;
        }

        if author.is_none()
            && let Some(caps) = BY_AUTHOR.captures(line)
        {
            let name = caps[1].trim().trim_end_matches('.').trim();
            if !name.is_empty() {
                author = Some(name.to_string());
            }
        }
    }

    SniffedHeader {
        title: title.unwrap_or_else(|| title_case(fallback_stem)),
        author,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
The Project Gutenberg EBook of Paradise Lost, by John Milton

Title: Paradise Lost
Author: John Milton

*** START OF THIS PROJECT GUTENBERG EBOOK PARADISE LOST ***
Produced by Judith Boss

BOOK I
Of Man's first disobedience, and the fruit
Of that forbidden tree whose mortal taste

*** END OF THIS PROJECT GUTENBERG EBOOK PARADISE LOST ***
Licence text follows.
";

    #[test]
    fn test_detects_boilerplate() {
        assert!(has_boilerplate(SAMPLE));
        assert!(!has_boilerplate("Of Man's first disobedience"));
    }

    #[test]
    fn test_strip_keeps_only_body() {
        let body = strip_boilerplate(SAMPLE);
        assert!(body.starts_with("\nBOOK I") || body.starts_with("BOOK I"), "{body:?}");
        assert!(body.contains("Of Man's first disobedience, and the fruit"));
        assert!(!body.contains("Produced by"));
        assert!(!body.contains("END OF THIS"));
        assert!(!body.contains("Licence"));
    }

    #[test]
    fn test_strip_without_markers_is_identity() {
        let text = "line one\nline two";
        assert_eq!(strip_boilerplate(text), text);
    }

    #[test]
    fn test_strip_out_of_order_markers_keeps_text() {
        let text = "*** END OF THE PROJECT GUTENBERG EBOOK\nbody\n*** START OF THE PROJECT GUTENBERG EBOOK X\n";
        assert_eq!(strip_boilerplate(text), text);
    }

    #[test]
    fn test_sniff_fields() {
        let header = sniff_header(SAMPLE, "paradise_lost");
        assert_eq!(header.title, "Paradise Lost");
        assert_eq!(header.author.as_deref(), Some("John Milton"));
    }

    #[test]
    fn test_sniff_plain_title_and_by_line() {
        let text = "\nAbsalom and Achitophel\nby John Dryden.\n\nIn pious times, ere priestcraft did begin,";
        let header = sniff_header(text, "absalom");
        assert_eq!(header.title, "Absalom and Achitophel");
        assert_eq!(header.author.as_deref(), Some("John Dryden"));
    }

    #[test]
    fn test_sniff_falls_back_to_stem() {
        let text = "The Project Gutenberg eBook\nProduced by volunteers\n";
        let header = sniff_header(text, "the_rape_of_the_lock");
        assert_eq!(header.title, "The Rape Of The Lock");
        assert_eq!(header.author, None);
    }
}
