//! Canonical book and work names with their abbreviations.
//!
//! The biblical table is static. Literary works are merged in at engine
//! initialization from the corpus catalog so that catalog aliases are honored
//! by the parser.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::normalize_title;

/// One biblical book: canonical name, chapter count, and accepted abbreviations.
#[derive(Debug, Clone, Copy)]
pub struct BibleBook {
    pub name: &'static str,
    pub chapters: u32,
    pub aliases: &'static [&'static str],
}

/// The 66 books of the Protestant canon in canonical order.
pub static BIBLE_BOOKS: &[BibleBook] = &[
    // Old Testament
    BibleBook { name: "Genesis", chapters: 50, aliases: &["gen", "ge", "gn"] },
    BibleBook { name: "Exodus", chapters: 40, aliases: &["exod", "ex", "exo"] },
    BibleBook { name: "Leviticus", chapters: 27, aliases: &["lev", "le", "lv"] },
    BibleBook { name: "Numbers", chapters: 36, aliases: &["num", "nu", "nm"] },
    BibleBook { name: "Deuteronomy", chapters: 34, aliases: &["deut", "dt", "deu"] },
    BibleBook { name: "Joshua", chapters: 24, aliases: &["josh", "jos"] },
    BibleBook { name: "Judges", chapters: 21, aliases: &["judg", "jdg"] },
    BibleBook { name: "Ruth", chapters: 4, aliases: &["ru", "rth"] },
    BibleBook { name: "1 Samuel", chapters: 31, aliases: &["1sam", "1sa", "1 sam"] },
    BibleBook { name: "2 Samuel", chapters: 24, aliases: &["2sam", "2sa", "2 sam"] },
    BibleBook { name: "1 Kings", chapters: 22, aliases: &["1kgs", "1ki", "1 kgs"] },
    BibleBook { name: "2 Kings", chapters: 25, aliases: &["2kgs", "2ki", "2 kgs"] },
    BibleBook { name: "1 Chronicles", chapters: 29, aliases: &["1chr", "1ch", "1 chron"] },
    BibleBook { name: "2 Chronicles", chapters: 36, aliases: &["2chr", "2ch", "2 chron"] },
    BibleBook { name: "Ezra", chapters: 10, aliases: &["ezr"] },
    BibleBook { name: "Nehemiah", chapters: 13, aliases: &["neh", "ne"] },
    BibleBook { name: "Esther", chapters: 10, aliases: &["est", "es", "esth"] },
    BibleBook { name: "Job", chapters: 42, aliases: &["jb"] },
    BibleBook { name: "Psalms", chapters: 150, aliases: &["psalm", "ps", "psa", "pss"] },
    BibleBook { name: "Proverbs", chapters: 31, aliases: &["prov", "pr", "prv"] },
    BibleBook { name: "Ecclesiastes", chapters: 12, aliases: &["eccl", "ec", "eccles", "qoh"] },
    BibleBook {
        name: "Song of Solomon",
        chapters: 8,
        aliases: &["song of songs", "song", "so", "sos", "canticles"],
    },
    BibleBook { name: "Isaiah", chapters: 66, aliases: &["isa", "is"] },
    BibleBook { name: "Jeremiah", chapters: 52, aliases: &["jer", "je"] },
    BibleBook { name: "Lamentations", chapters: 5, aliases: &["lam", "la"] },
    BibleBook { name: "Ezekiel", chapters: 48, aliases: &["ezek", "eze", "ezk"] },
    BibleBook { name: "Daniel", chapters: 12, aliases: &["dan", "da", "dn"] },
    BibleBook { name: "Hosea", chapters: 14, aliases: &["hos", "ho"] },
    BibleBook { name: "Joel", chapters: 3, aliases: &["joe", "jl"] },
    BibleBook { name: "Amos", chapters: 9, aliases: &["am"] },
    BibleBook { name: "Obadiah", chapters: 1, aliases: &["obad", "ob"] },
    BibleBook { name: "Jonah", chapters: 4, aliases: &["jon", "jnh"] },
    BibleBook { name: "Micah", chapters: 7, aliases: &["mic", "mi"] },
    BibleBook { name: "Nahum", chapters: 3, aliases: &["nah", "na"] },
    BibleBook { name: "Habakkuk", chapters: 3, aliases: &["hab", "hb"] },
    BibleBook { name: "Zephaniah", chapters: 3, aliases: &["zeph", "zep"] },
    BibleBook { name: "Haggai", chapters: 2, aliases: &["hag", "hg"] },
    BibleBook { name: "Zechariah", chapters: 14, aliases: &["zech", "zec"] },
    BibleBook { name: "Malachi", chapters: 4, aliases: &["mal"] },
    // New Testament
    BibleBook { name: "Matthew", chapters: 28, aliases: &["matt", "mt", "mat"] },
    BibleBook { name: "Mark", chapters: 16, aliases: &["mk", "mrk"] },
    BibleBook { name: "Luke", chapters: 24, aliases: &["lk", "luk"] },
    BibleBook { name: "John", chapters: 21, aliases: &["jn", "jhn"] },
    BibleBook { name: "Acts", chapters: 28, aliases: &["ac", "act"] },
    BibleBook { name: "Romans", chapters: 16, aliases: &["rom", "ro", "rm"] },
    BibleBook { name: "1 Corinthians", chapters: 16, aliases: &["1cor", "1co", "1 cor"] },
    BibleBook { name: "2 Corinthians", chapters: 13, aliases: &["2cor", "2co", "2 cor"] },
    BibleBook { name: "Galatians", chapters: 6, aliases: &["gal", "ga"] },
    BibleBook { name: "Ephesians", chapters: 6, aliases: &["eph", "ep"] },
    BibleBook { name: "Philippians", chapters: 4, aliases: &["phil", "php"] },
    BibleBook { name: "Colossians", chapters: 4, aliases: &["col"] },
    BibleBook { name: "1 Thessalonians", chapters: 5, aliases: &["1thess", "1th", "1 thess"] },
    BibleBook { name: "2 Thessalonians", chapters: 3, aliases: &["2thess", "2th", "2 thess"] },
    BibleBook { name: "1 Timothy", chapters: 6, aliases: &["1tim", "1ti", "1 tim"] },
    BibleBook { name: "2 Timothy", chapters: 4, aliases: &["2tim", "2ti", "2 tim"] },
    BibleBook { name: "Titus", chapters: 3, aliases: &["tit", "ti"] },
    BibleBook { name: "Philemon", chapters: 1, aliases: &["phlm", "phm"] },
    BibleBook { name: "Hebrews", chapters: 13, aliases: &["heb"] },
    BibleBook { name: "James", chapters: 5, aliases: &["jas", "ja"] },
    BibleBook { name: "1 Peter", chapters: 5, aliases: &["1pet", "1pe", "1 pet"] },
    BibleBook { name: "2 Peter", chapters: 3, aliases: &["2pet", "2pe", "2 pet"] },
    BibleBook { name: "1 John", chapters: 5, aliases: &["1jn", "1 jn"] },
    BibleBook { name: "2 John", chapters: 1, aliases: &["2jn", "2 jn"] },
    BibleBook { name: "3 John", chapters: 1, aliases: &["3jn", "3 jn"] },
    BibleBook { name: "Jude", chapters: 1, aliases: &["jd", "jud"] },
    BibleBook { name: "Revelation", chapters: 22, aliases: &["rev", "re", "apocalypse"] },
];

/// Lookup table keyed by lower-case name or abbreviation.
static BIBLE_INDEX: Lazy<HashMap<String, &'static BibleBook>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for book in BIBLE_BOOKS {
        m.insert(book.name.to_lowercase(), book);
        for alias in book.aliases {
            m.insert((*alias).to_string(), book);
        }
    }
    m
});

/// Normalize a book key: lower case, single spaces, no trailing period,
/// and a single space after a leading book number ("1cor" -> "1 cor").
fn book_key(name: &str) -> String {
    static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([1-3])\s*([a-z])").unwrap());

    let lower = name.trim().trim_end_matches('.').to_lowercase();
    let collapsed = lower.split_whitespace().collect::<Vec<_>>().join(" ");
    NUMBERED.replace(&collapsed, "$1 $2").into_owned()
}

/// Registry of canonical book/work identifiers.
///
/// Cheap to clone: the biblical table is shared static data; only literary
/// work aliases are owned.
#[derive(Debug, Clone, Default)]
pub struct BookRegistry {
    /// Normalized alias -> canonical work title.
    work_aliases: HashMap<String, String>,
}

impl BookRegistry {
    /// A registry that knows the biblical canon and no literary works.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Add literary works as `(canonical title, aliases)` pairs.
    ///
    /// The canonical title is itself registered as an alias. The first work to
    /// claim an alias keeps it.
    pub fn with_works<I, A>(mut self, works: I) -> Self
    where
        I: IntoIterator<Item = (String, A)>,
        A: IntoIterator<Item = String>,
    {
        for (title, aliases) in works {
            let keys = std::iter::once(title.clone()).chain(aliases);
            for alias in keys {
                let key = normalize_title(&alias);
                if key.is_empty() {
                    continue;
                }
                self.work_aliases.entry(key).or_insert_with(|| title.clone());
            }
        }
        self
    }

    /// Look up a biblical book by name or abbreviation.
    pub fn bible_book(&self, name: &str) -> Option<&'static BibleBook> {
        let key = book_key(name);
        if let Some(book) = BIBLE_INDEX.get(&key) {
            return Some(book);
        }
        // Abbreviations are stored without the space after the number
        // ("1cor"), full names with it ("1 corinthians").
        BIBLE_INDEX.get(&key.replace(' ', "")).copied()
    }

    /// Canonical biblical book name for `name`, e.g. "Matt" -> "Matthew".
    pub fn canonical_book(&self, name: &str) -> Option<&'static str> {
        self.bible_book(name).map(|b| b.name)
    }

    /// Number of chapters in a biblical book, if the book is known.
    pub fn chapter_count(&self, name: &str) -> Option<u32> {
        self.bible_book(name).map(|b| b.chapters)
    }

    /// Canonical title of a literary work registered under `name`.
    pub fn canonical_work(&self, name: &str) -> Option<&str> {
        self.work_aliases
            .get(&normalize_title(name))
            .map(String::as_str)
    }

    /// Number of registered literary-work aliases.
    pub fn work_alias_count(&self) -> usize {
        self.work_aliases.len()
    }
}
