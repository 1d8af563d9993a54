//! Title search over the Project Gutenberg CSV catalog (`pg_catalog.csv`).
//!
//! Used to find the ebook number of a work before downloading its text for
//! the corpus.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fuzzy title matches must score above this.
pub const FUZZY_THRESHOLD: f64 = 0.6;

/// Score given to entries that only share a title word with the query.
const WORD_MATCH_SCORE: f64 = 0.5;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]+").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TITLE_NOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:\([^)]*project gutenberg[^)]*\)|\[[^\]]*project gutenberg[^\]]*\]|\x{2014}.*project gutenberg.*)")
        .unwrap()
});
static AUTHOR_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:\([^)]*\)|\[[^\]]*\])").unwrap());
static AUTHOR_DATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",\s*(?:active\s+)?[\d?]+(?:\s*BCE?)?\s*-\s*(?:[\d?]+(?:\s*BCE?)?)?$").unwrap()
});

#[derive(Error, Debug)]
pub enum GutenbergCatalogError {
    #[error("cannot read Gutenberg catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed Gutenberg catalog: {0}")]
    Csv(#[from] csv::Error),
    #[error("Gutenberg catalog has no \"{0}\" column")]
    MissingColumn(&'static str),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Text#")]
    text_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Language", default)]
    language: String,
    #[serde(rename = "Authors", default)]
    authors: String,
    #[serde(rename = "Subjects", default)]
    subjects: String,
    #[serde(rename = "Bookshelves", default)]
    bookshelves: String,
    #[serde(rename = "Issued", default)]
    issued: String,
}

/// One English text from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GutenbergEntry {
    pub text_id: u32,
    pub title: String,
    pub authors: Vec<String>,
    pub subjects: String,
    pub bookshelves: String,
    pub issued: String,
}

impl GutenbergEntry {
    pub fn primary_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    /// Plain-text UTF-8 download of this ebook.
    pub fn text_url(&self) -> String {
        format!("https://www.gutenberg.org/ebooks/{}.txt.utf-8", self.text_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactTitle,
    FuzzyTitle,
    Word,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    pub entry: &'a GutenbergEntry,
    pub score: f64,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_texts: usize,
    pub distinct_authors: usize,
    /// Most prolific authors, most texts first.
    pub top_authors: Vec<(String, usize)>,
}

/// The English part of the Gutenberg catalog with its title indexes.
#[derive(Debug, Default)]
pub struct GutenbergCatalog {
    entries: Vec<GutenbergEntry>,
    by_title: HashMap<String, Vec<usize>>,
    by_word: HashMap<String, Vec<usize>>,
    normalized_titles: Vec<String>,
}

impl GutenbergCatalog {
    pub fn load(path: &Path) -> Result<Self, GutenbergCatalogError> {
        let file = std::fs::File::open(path).map_err(|source| GutenbergCatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_reader(file)?;
        tracing::info!(path = %path.display(), texts = catalog.len(), "loaded Gutenberg catalog");
        Ok(catalog)
    }

    /// Parse CSV with a `Text#` column. Rows that are not English, lack a
    /// numeric id, or do not parse are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GutenbergCatalogError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        if !rdr.headers()?.iter().any(|h| h == "Text#") {
            return Err(GutenbergCatalogError::MissingColumn("Text#"));
        }

        let mut entries = Vec::new();
        for (row, record) in rdr.deserialize::<CsvRow>().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(row = row + 1, error = %e, "skipping Gutenberg catalog row");
                    continue;
                }
            };
            let Ok(text_id) = record.text_id.trim().parse::<u32>() else {
                continue;
            };
            if record.language.trim() != "en" {
                continue;
            }
            entries.push(GutenbergEntry {
                text_id,
                title: clean_title(&record.title),
                authors: parse_authors(&record.authors),
                subjects: record.subjects.trim().to_string(),
                bookshelves: record.bookshelves.trim().to_string(),
                issued: record.issued.trim().to_string(),
            });
        }
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<GutenbergEntry>) -> Self {
        let mut by_title: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_word: HashMap<String, Vec<usize>> = HashMap::new();
        let mut normalized_titles = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            normalized_titles.push(normalize_for_search(&entry.title));
            if entry.title.is_empty() {
                continue;
            }
            let lower = entry.title.to_lowercase();
            for word in WORD.find_iter(&lower).map(|m| m.as_str()) {
                if word.chars().count() > 2 {
                    let ids = by_word.entry(word.to_string()).or_default();
                    if ids.last() != Some(&i) {
                        ids.push(i);
                    }
                }
            }
            by_title.entry(lower).or_default().push(i);
        }

        Self {
            entries,
            by_title,
            by_word,
            normalized_titles,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GutenbergEntry] {
        &self.entries
    }

    pub fn get(&self, text_id: u32) -> Option<&GutenbergEntry> {
        self.entries.iter().find(|e| e.text_id == text_id)
    }

    /// Search titles: exact matches score 1.0, then fuzzy matches above
    /// [`FUZZY_THRESHOLD`], then entries sharing a title word at 0.5.
    /// Best first, at most `limit` hits.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit<'_>> {
        let query = query.trim();
        let mut seen: HashSet<usize> = HashSet::new();
        let mut hits = Vec::new();

        for &i in self.by_title.get(&query.to_lowercase()).into_iter().flatten() {
            if seen.insert(i) {
                hits.push(self.hit(i, 1.0, MatchKind::ExactTitle));
            }
        }

        let normalized_query = normalize_for_search(query);
        if !normalized_query.is_empty() {
            for (i, title) in self.normalized_titles.iter().enumerate() {
                if seen.contains(&i) || title.is_empty() {
                    continue;
                }
                let score = rapidfuzz::fuzz::ratio(normalized_query.chars(), title.chars());
                if score > FUZZY_THRESHOLD {
                    seen.insert(i);
                    hits.push(self.hit(i, score, MatchKind::FuzzyTitle));
                }
            }
        }

        let lower = query.to_lowercase();
        for word in WORD.find_iter(&lower).map(|m| m.as_str()) {
            for &i in self.by_word.get(word).into_iter().flatten() {
                if seen.insert(i) {
                    hits.push(self.hit(i, WORD_MATCH_SCORE, MatchKind::Word));
                }
            }
        }

        // Stable: equal scores keep catalog order within each match kind.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    fn hit(&self, i: usize, score: f64, kind: MatchKind) -> SearchHit<'_> {
        SearchHit {
            entry: &self.entries[i],
            score,
            kind,
        }
    }

    /// Text counts overall and per primary author.
    pub fn stats(&self, top: usize) -> CatalogStats {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for author in self.entries.iter().filter_map(GutenbergEntry::primary_author) {
            *counts.entry(author).or_default() += 1;
        }
        let distinct_authors = counts.len();

        let mut top_authors: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(author, n)| (author.to_string(), n))
            .collect();
        top_authors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_authors.truncate(top);

        CatalogStats {
            total_texts: self.entries.len(),
            distinct_authors,
            top_authors,
        }
    }
}

/// Collapse whitespace and drop Project Gutenberg notes from a title.
pub fn clean_title(title: &str) -> String {
    let collapsed = WHITESPACE.replace_all(title.trim(), " ");
    TITLE_NOTE.replace_all(&collapsed, "").trim().to_string()
}

/// Split a `;`-separated author field, dropping life dates and roles.
pub fn parse_authors(authors: &str) -> Vec<String> {
    authors
        .split(';')
        .map(|author| {
            let author = AUTHOR_NOTE.replace_all(author.trim(), "");
            AUTHOR_DATES.replace(author.trim(), "").trim().to_string()
        })
        .filter(|author| !author.is_empty())
        .collect()
}

/// Lowercase, replace punctuation with spaces, collapse whitespace.
pub fn normalize_for_search(text: &str) -> String {
    let lower = text.to_lowercase();
    let spaced = NON_WORD.replace_all(&lower, " ");
    WHITESPACE.replace_all(spaced.trim(), " ").into_owned()
}
