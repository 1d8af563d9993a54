//! Corpus preparation: turn raw Gutenberg downloads into line-addressable
//! text, check the result, and describe the directory in a `catalog.toml`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::catalog::{CATALOG_FILE, Catalog, CatalogEntry};
use super::{CorpusError, gutenberg, read_text, split_lines, text_files};

/// Texts shorter than this lose points in [`validate_cleaned_text`].
pub const MIN_WORDS: usize = 1000;

const LEFTOVER_MARKERS: &[&str] = &["project gutenberg", "gutenberg.org", "ebook", "this etext"];

static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s*$").unwrap());
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s+").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<kind>CHAPTER|BOOK|CANTO)\s+(?P<n>[IVXLC]+|\d+)\.?\s*$").unwrap()
});
static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+(?P<p>[.!?;:,])").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n\s*\n").unwrap());

/// Normalize the line layout of a cleaned text.
///
/// Page numbers and leading line numbers are removed, `BOOK`/`CANTO`/`CHAPTER`
/// headings lose trailing dots, curly quotes are straightened and runs of
/// blank lines shrink to one. Line order never changes.
pub fn normalize_line_format(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if PAGE_NUMBER.is_match(line) {
            push_blank(&mut out);
            continue;
        }

        let line = LEADING_NUMBER.replace(line, "");
        let line = line.trim_end();
        let line = HEADING.replace(line, "$kind $n");
        let line = SPACE_BEFORE_PUNCT.replace_all(&line, "$p");
        let line = straighten_quotes(&line);

        if line.is_empty() {
            push_blank(&mut out);
        } else {
            out.push(line);
        }
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

fn push_blank(out: &mut Vec<String>) {
    if out.last().is_some_and(|l| !l.is_empty()) {
        out.push(String::new());
    }
}

fn straighten_quotes(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '\u{201c}' | '\u{201d}' | '\u{201e}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            _ => c,
        })
        .collect()
}

/// Strip Gutenberg boilerplate when present, then normalize the layout.
pub fn clean_text(raw: &str) -> String {
    let body = if gutenberg::has_boilerplate(raw) {
        gutenberg::strip_boilerplate(raw)
    } else {
        raw.to_string()
    };
    normalize_line_format(&body)
}

/// Quality check of one text file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub title: String,
    pub char_count: usize,
    pub word_count: usize,
    /// Addressable (non-blank) lines.
    pub line_count: usize,
    pub paragraph_count: usize,
    pub has_gutenberg_markers: bool,
    pub has_line_numbers: bool,
    pub excessive_whitespace: bool,
    /// Out of 100.
    pub quality_score: f64,
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check that cleaning left a usable text behind.
///
/// Leftover Gutenberg markers cost 30 points, leading line numbers 20,
/// three or more consecutive blank lines 10, and fewer than [`MIN_WORDS`]
/// words 20.
pub fn validate_cleaned_text(text: &str, title: &str) -> ValidationReport {
    let lower = text.to_lowercase();
    let word_count = text.split_whitespace().count();

    let has_gutenberg_markers = LEFTOVER_MARKERS.iter().any(|m| lower.contains(m));
    let has_line_numbers = text.lines().any(|l| LEADING_NUMBER.is_match(l));
    let excessive_whitespace = BLANK_RUN.is_match(&text.replace('\r', ""));

    let mut issues = Vec::new();
    let mut score = 100.0_f64;
    if has_gutenberg_markers {
        issues.push("contains Project Gutenberg markers".to_string());
        score -= 30.0;
    }
    if has_line_numbers {
        issues.push("contains line numbers".to_string());
        score -= 20.0;
    }
    if excessive_whitespace {
        issues.push("excessive blank lines".to_string());
        score -= 10.0;
    }
    if word_count < MIN_WORDS {
        issues.push(format!("only {word_count} words"));
        score -= 20.0;
    }

    ValidationReport {
        title: title.to_string(),
        char_count: text.chars().count(),
        word_count,
        line_count: split_lines(text).len(),
        paragraph_count: text
            .replace('\r', "")
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count(),
        has_gutenberg_markers,
        has_line_numbers,
        excessive_whitespace,
        quality_score: score.max(0.0),
        issues,
    }
}

/// One work written by [`prepare_dir`].
#[derive(Debug, Clone, Serialize)]
pub struct PreparedWork {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub source: PathBuf,
    /// Cleaned file, relative to the destination directory.
    pub file: PathBuf,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepareSummary {
    pub catalog: PathBuf,
    pub works: Vec<PreparedWork>,
    pub avg_quality_score: f64,
}

/// Clean every `*.txt` in `source` into `dest` and write `dest/catalog.toml`.
///
/// Titles and authors are sniffed from the raw headers. When `dest` already
/// has a catalog, the aliases of works with the same id are carried over.
pub fn prepare_dir(source: &Path, dest: &Path) -> Result<PrepareSummary, CorpusError> {
    if same_dir(source, dest) {
        return Err(CorpusError::SameDirectory(dest.to_path_buf()));
    }
    let paths = text_files(source)?;
    std::fs::create_dir_all(dest).map_err(|source| CorpusError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut previous: HashMap<String, Vec<String>> = match Catalog::load(dest) {
        Ok(catalog) => catalog
            .works
            .into_iter()
            .map(|entry| (entry.id, entry.aliases))
            .collect(),
        Err(CorpusError::CatalogMissing(_)) => HashMap::new(),
        Err(e) => return Err(e),
    };

    let mut catalog = Catalog::default();
    let mut works = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = read_text(&path)?;
        let id = file_stem(&path);
        let header = gutenberg::sniff_header(&raw, &id);
        let cleaned = clean_text(&raw);

        let file = PathBuf::from(format!("{id}.txt"));
        let target = dest.join(&file);
        std::fs::write(&target, &cleaned).map_err(|source| CorpusError::Io {
            path: target.clone(),
            source,
        })?;

        let validation = validate_cleaned_text(&cleaned, &header.title);
        tracing::info!(
            work = %id,
            words = validation.word_count,
            quality = validation.quality_score,
            "prepared corpus text"
        );

        catalog.works.push(CatalogEntry {
            id: id.clone(),
            title: header.title.clone(),
            author: header.author.clone(),
            file: file.clone(),
            aliases: previous.remove(&id).unwrap_or_default(),
            strip_boilerplate: Some(false),
        });
        works.push(PreparedWork {
            id,
            title: header.title,
            author: header.author,
            source: path,
            file,
            validation,
        });
    }

    let catalog_path = dest.join(CATALOG_FILE);
    let content = toml::to_string_pretty(&catalog).map_err(|source| CorpusError::CatalogWrite {
        path: catalog_path.clone(),
        source,
    })?;
    std::fs::write(&catalog_path, content).map_err(|source| CorpusError::Io {
        path: catalog_path.clone(),
        source,
    })?;

    let avg_quality_score = if works.is_empty() {
        0.0
    } else {
        works.iter().map(|w| w.validation.quality_score).sum::<f64>() / works.len() as f64
    };
    Ok(PrepareSummary {
        catalog: catalog_path,
        works,
        avg_quality_score,
    })
}

/// Validate the text files of a corpus directory as they are on disk.
///
/// Works listed in `catalog.toml` are checked under their catalog titles.
/// Without a catalog every `*.txt` is checked under its sniffed title.
pub fn validate_dir(dir: &Path) -> Result<Vec<ValidationReport>, CorpusError> {
    match Catalog::load(dir) {
        Ok(catalog) => catalog
            .works
            .iter()
            .map(|entry| {
                let text = read_text(&dir.join(&entry.file))?;
                Ok(validate_cleaned_text(&text, &entry.title))
            })
            .collect(),
        Err(CorpusError::CatalogMissing(_)) => text_files(dir)?
            .iter()
            .map(|path| {
                let text = read_text(path)?;
                let header = gutenberg::sniff_header(&text, &file_stem(path));
                Ok(validate_cleaned_text(&text, &header.title))
            })
            .collect(),
        Err(e) => Err(e),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .chunks(10)
            .map(|c| c.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_normalize_removes_numbers_and_blank_runs() {
        let raw = "BOOK I.\n\n\n\n12\n1 Of Man's first disobedience , and the fruit   \n  Of that forbidden tree\n\n\n";
        assert_eq!(
            normalize_line_format(raw),
            "BOOK I\n\nOf Man's first disobedience, and the fruit\n  Of that forbidden tree"
        );
    }

    #[test]
    fn test_normalize_straightens_quotes() {
        assert_eq!(
            normalize_line_format("\u{201c}Hail,\u{201d} she said, \u{2018}hail\u{2019}"),
            "\"Hail,\" she said, 'hail'"
        );
    }

    #[test]
    fn test_normalize_keeps_line_order() {
        let raw = "CANTO II\nfirst\n\nsecond\nthird";
        let lines = split_lines(&normalize_line_format(raw));
        assert_eq!(lines, ["CANTO II", "first", "second", "third"]);
    }

    #[test]
    fn test_clean_text_strips_boilerplate() {
        let raw = "The Project Gutenberg eBook of Ode\n*** START OF THE PROJECT GUTENBERG EBOOK ODE ***\n\n3 One line\n\n\n\nTwo line\n*** END OF THE PROJECT GUTENBERG EBOOK ODE ***\nLicence\n";
        assert_eq!(clean_text(raw), "One line\n\nTwo line");
    }

    #[test]
    fn test_validate_clean_text_scores_full_marks() {
        let report = validate_cleaned_text(&long_text(1200), "Long");
        assert_eq!(report.word_count, 1200);
        assert_eq!(report.line_count, 120);
        assert_eq!(report.quality_score, 100.0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_validate_penalties() {
        let text = "The Project Gutenberg eBook\n12 numbered line\n\n\n\nshort";
        let report = validate_cleaned_text(text, "Messy");
        assert!(report.has_gutenberg_markers);
        assert!(report.has_line_numbers);
        assert!(report.excessive_whitespace);
        assert_eq!(report.quality_score, 20.0);
        assert_eq!(report.issues.len(), 4);
        assert_eq!(report.paragraph_count, 2);
    }

    #[test]
    fn test_validate_cleaned_output_has_no_issues_but_length() {
        let raw = "*** START OF THE PROJECT GUTENBERG EBOOK X ***\n1 A line\n\n\n\n2 Another\n*** END OF THE PROJECT GUTENBERG EBOOK X ***\n";
        let report = validate_cleaned_text(&clean_text(raw), "X");
        assert!(!report.has_gutenberg_markers);
        assert!(!report.has_line_numbers);
        assert!(!report.excessive_whitespace);
        assert_eq!(report.quality_score, 80.0);
    }

    #[test]
    fn test_prepare_dir_writes_catalog() {
        let source = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(
            source.path().join("ode.txt"),
            "Title: Ode\nAuthor: Anon\n*** START OF THE PROJECT GUTENBERG EBOOK ODE ***\n1 First line.\n\n\n\n2 Second line.\n*** END OF THE PROJECT GUTENBERG EBOOK ODE ***\n",
        )
        .unwrap();
        std::fs::write(source.path().join("notes.md"), "skipped").unwrap();
        std::fs::write(
            dest.path().join(CATALOG_FILE),
            "[[works]]\nid = \"ode\"\ntitle = \"Old\"\nfile = \"ode.txt\"\naliases = [\"The Ode\"]\n",
        )
        .unwrap();

        let summary = prepare_dir(source.path(), dest.path()).unwrap();
        assert_eq!(summary.works.len(), 1);
        assert_eq!(summary.works[0].title, "Ode");
        assert_eq!(summary.works[0].author.as_deref(), Some("Anon"));
        assert_eq!(summary.avg_quality_score, 80.0);

        let cleaned = std::fs::read_to_string(dest.path().join("ode.txt")).unwrap();
        assert_eq!(cleaned, "First line.\n\nSecond line.");

        let catalog = Catalog::load(dest.path()).unwrap();
        assert_eq!(catalog.works.len(), 1);
        assert_eq!(catalog.works[0].title, "Ode");
        assert_eq!(catalog.works[0].aliases, vec!["The Ode"]);
        assert_eq!(catalog.works[0].strip_boilerplate, Some(false));

        // The prepared directory loads as a corpus.
        let index = crate::corpus::CorpusIndex::load(dest.path()).unwrap();
        let work = index.lookup("the ode").unwrap();
        assert_eq!(work.lines(), ["First line.", "Second line."]);
    }

    #[test]
    fn test_prepare_dir_refuses_to_overwrite_sources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ode.txt"), "text").unwrap();
        assert!(matches!(
            prepare_dir(dir.path(), dir.path()),
            Err(CorpusError::SameDirectory(_))
        ));
    }

    #[test]
    fn test_validate_dir_with_and_without_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Alpha\nby Someone\n\n12 numbered").unwrap();
        let reports = validate_dir(dir.path()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].title, "Alpha");
        assert!(reports[0].has_line_numbers);

        std::fs::write(
            dir.path().join(CATALOG_FILE),
            "[[works]]\nid = \"a\"\ntitle = \"Catalogued Alpha\"\nfile = \"a.txt\"\n",
        )
        .unwrap();
        let reports = validate_dir(dir.path()).unwrap();
        assert_eq!(reports[0].title, "Catalogued Alpha");
    }
}
