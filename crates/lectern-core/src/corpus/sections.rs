//! Book, canto, act and scene headings inside a work.
//!
//! Line numbers inside a section count the non-blank lines after its heading.
//! The heading line itself is not counted.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::roman::{parse_section_number, to_roman};

static BOOK_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:book|canto)\s+(?P<n>[ivxlcdm]+|\d+)(?:[.:]|\s*$)").unwrap()
});

static ACT_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^act\s+(?P<n>[ivxlcdm]+|\d+)(?:[.:,]|\s|$)").unwrap());

static SCENE_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:act\s+(?:[ivxlcdm]+|\d+)[.:,]?\s+)?scene\s+(?P<n>[ivxlcdm]+|\d+)(?:[.:,]|\s|$)")
        .unwrap()
});

/// Which part of a sectioned work a reference counts lines in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKey {
    Book(u32),
    Scene { act: u32, scene: u32 },
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKey::Book(n) => match to_roman(*n) {
                Some(numeral) => write!(f, "Book {numeral}"),
                None => write!(f, "Book {n}"),
            },
            SectionKey::Scene { act, scene } => write!(f, "Act {act}, Scene {scene}"),
        }
    }
}

/// Result of looking for a section.
#[derive(Debug, PartialEq, Eq)]
pub enum SectionLookup<'a> {
    /// The section's lines, heading excluded.
    Found(&'a [String]),
    /// The work has no headings of this kind; it is one section.
    Unsectioned,
    /// Headings exist but not the requested one.
    Missing,
}

fn heading_number(re: &Regex, line: &str) -> Option<u32> {
    let caps = re.captures(line.trim())?;
    parse_section_number(caps.name("n")?.as_str())
}

pub fn book_heading(line: &str) -> Option<u32> {
    heading_number(&BOOK_HEADING, line)
}

pub fn act_heading(line: &str) -> Option<u32> {
    heading_number(&ACT_HEADING, line)
}

pub fn scene_heading(line: &str) -> Option<u32> {
    heading_number(&SCENE_HEADING, line)
}

/// Find the lines of `key` inside `lines`.
pub fn find_section(lines: &[String], key: SectionKey) -> SectionLookup<'_> {
    match key {
        SectionKey::Book(n) => find_book(lines, n),
        SectionKey::Scene { act, scene } => find_scene(lines, act, scene),
    }
}

fn find_book(lines: &[String], wanted: u32) -> SectionLookup<'_> {
    let headings: Vec<(usize, u32)> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| book_heading(line).map(|n| (i, n)))
        .collect();
    if headings.is_empty() {
        return SectionLookup::Unsectioned;
    }

    let Some(pos) = headings.iter().position(|&(_, n)| n == wanted) else {
        return SectionLookup::Missing;
    };
    let start = headings[pos].0 + 1;
    let end = headings.get(pos + 1).map_or(lines.len(), |&(i, _)| i);
    SectionLookup::Found(&lines[start..end])
}

fn find_scene(lines: &[String], wanted_act: u32, wanted_scene: u32) -> SectionLookup<'_> {
    let mut current_act: Option<u32> = None;
    let mut any_heading = false;
    let mut start: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        let act = act_heading(line);
        let scene = scene_heading(line);
        if act.is_none() && scene.is_none() {
            continue;
        }
        any_heading = true;

        if let Some(begin) = start {
            return SectionLookup::Found(&lines[begin..i]);
        }

        if act.is_some() {
            current_act = act;
        }
        // Plays without act headings number their scenes in one sequence.
        let in_act = current_act.is_none_or(|a| a == wanted_act);
        if in_act && scene == Some(wanted_scene) {
            start = Some(i + 1);
        }
    }

    match (start, any_heading) {
        (Some(begin), _) => SectionLookup::Found(&lines[begin..]),
        (None, false) => SectionLookup::Unsectioned,
        (None, true) => SectionLookup::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn recognizes_headings() {
        assert_eq!(book_heading("BOOK IX"), Some(9));
        assert_eq!(book_heading("Book 2."), Some(2));
        assert_eq!(book_heading("CANTO III: The Battle"), Some(3));
        assert_eq!(book_heading("Book I sing of arms"), None);
        assert_eq!(act_heading("ACT III. SCENE I. A room in the castle."), Some(3));
        assert_eq!(scene_heading("ACT III. SCENE I. A room in the castle."), Some(1));
        assert_eq!(scene_heading("SCENE II. Elsinore."), Some(2));
        assert_eq!(act_heading("Actions speak"), None);
        assert_eq!(scene_heading("Scenery"), None);
    }

    #[test]
    fn finds_book_between_headings() {
        let text = lines("BOOK I\na1\na2\n\nBOOK II\nb1\nb2\nb3\nBOOK III\nc1");
        assert_eq!(
            find_section(&text, SectionKey::Book(2)),
            SectionLookup::Found(&text[4..7])
        );
        assert_eq!(
            find_section(&text, SectionKey::Book(3)),
            SectionLookup::Found(&text[8..])
        );
        assert_eq!(find_section(&text, SectionKey::Book(4)), SectionLookup::Missing);
    }

    #[test]
    fn unsectioned_work_is_whole_text() {
        let text = lines("line one\nline two");
        assert_eq!(
            find_section(&text, SectionKey::Book(1)),
            SectionLookup::Unsectioned
        );
        assert_eq!(
            find_section(&text, SectionKey::Scene { act: 1, scene: 1 }),
            SectionLookup::Unsectioned
        );
    }

    #[test]
    fn finds_scene_within_act() {
        let text = lines(
            "ACT I\nSCENE I.\nfirst\nSCENE II.\nsecond\nACT II.\nSCENE I.\nthird\nfourth\nSCENE II.\nfifth",
        );
        match find_section(&text, SectionKey::Scene { act: 2, scene: 1 }) {
            SectionLookup::Found(section) => assert_eq!(section, ["third", "fourth"]),
            other => panic!("{other:?}"),
        }
        match find_section(&text, SectionKey::Scene { act: 1, scene: 2 }) {
            SectionLookup::Found(section) => assert_eq!(section, ["second"]),
            other => panic!("{other:?}"),
        }
        assert_eq!(
            find_section(&text, SectionKey::Scene { act: 3, scene: 1 }),
            SectionLookup::Missing
        );
    }

    #[test]
    fn act_and_scene_on_one_line() {
        let text = lines("ACT III. SCENE I. A room.\nTo be, or not to be\nACT III. SCENE II. A hall.\nSpeak the speech");
        match find_section(&text, SectionKey::Scene { act: 3, scene: 1 }) {
            SectionLookup::Found(section) => assert_eq!(section, ["To be, or not to be"]),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn labels() {
        assert_eq!(SectionKey::Book(9).to_string(), "Book IX");
        assert_eq!(
            SectionKey::Scene { act: 3, scene: 1 }.to_string(),
            "Act 3, Scene 1"
        );
    }
}
