//! The corpus index: literary works, their aliases and their line-split text.
//!
//! Built once at startup and shared read-only (behind an `Arc`) by every
//! lookup.

pub mod catalog;
pub mod gutenberg;
pub mod pipeline;
pub mod search;
pub mod sections;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::matching::normalize_title;
use crate::registry::BookRegistry;

pub use catalog::{CATALOG_FILE, Catalog, CatalogEntry};

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("corpus catalog not found at {}", .0.display())]
    CatalogMissing(PathBuf),
    #[error("invalid corpus catalog {}: {source}", .path.display())]
    Catalog {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corpus directory {} is empty", .0.display())]
    Empty(PathBuf),
    #[error("cannot write corpus catalog {}: {source}", .path.display())]
    CatalogWrite {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
    #[error("refusing to prepare {} into itself", .0.display())]
    SameDirectory(PathBuf),
}

/// Split text into addressable lines: blank lines are dropped, the rest are
/// kept verbatim apart from a trailing `\r`.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// One literary work in the corpus.
#[derive(Debug, Clone)]
pub struct Work {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub aliases: Vec<String>,
    pub path: Option<PathBuf>,
    lines: Vec<String>,
}

impl Work {
    /// Build a work from in-memory text. Blank lines are dropped.
    pub fn from_text(id: impl Into<String>, title: impl Into<String>, text: &str) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: None,
            aliases: Vec::new(),
            path: None,
            lines: split_lines(text),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Non-blank lines of the work, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Read-only index of the literary corpus.
#[derive(Debug, Default)]
pub struct CorpusIndex {
    root: Option<PathBuf>,
    works: Vec<Work>,
    /// Normalized title or alias -> index into `works`.
    aliases: HashMap<String, usize>,
}

impl CorpusIndex {
    /// Load a corpus directory described by its `catalog.toml`.
    ///
    /// Every listed file must be readable.
    pub fn load(dir: &Path) -> Result<Self, CorpusError> {
        let catalog = Catalog::load(dir)?;
        let mut works = Vec::with_capacity(catalog.works.len());

        for entry in catalog.works {
            let path = dir.join(&entry.file);
            let raw = read_text(&path)?;
            let text = match entry.strip_boilerplate {
                Some(false) => raw,
                Some(true) => gutenberg::strip_boilerplate(&raw),
                None if gutenberg::has_boilerplate(&raw) => gutenberg::strip_boilerplate(&raw),
                None => raw,
            };

            let mut work = Work::from_text(entry.id, entry.title, &text).with_aliases(entry.aliases);
            work.author = entry.author;
            work.path = Some(path);
            works.push(work);
        }

        let mut index = Self::from_works(works);
        index.root = Some(dir.to_path_buf());
        tracing::info!(
            path = %dir.display(),
            works = index.len(),
            "loaded corpus catalog"
        );
        Ok(index)
    }

    /// Index every `*.txt` file in `dir` without a catalog.
    ///
    /// Titles and authors are sniffed from each file's header. Files are
    /// visited in name order so that alias conflicts resolve the same way on
    /// every run.
    pub fn scan_dir(dir: &Path) -> Result<Self, CorpusError> {
        let paths = text_files(dir)?;
        let mut works = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = read_text(&path)?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let header = gutenberg::sniff_header(&raw, &stem);
            let text = gutenberg::strip_boilerplate(&raw);

            let mut work = Work::from_text(stem, header.title, &text);
            work.author = header.author;
            work.path = Some(path);
            works.push(work);
        }

        let mut index = Self::from_works(works);
        index.root = Some(dir.to_path_buf());
        tracing::info!(path = %dir.display(), works = index.len(), "scanned corpus directory");
        Ok(index)
    }

    /// Build an index from works already in memory.
    pub fn from_works(works: Vec<Work>) -> Self {
        let mut aliases: HashMap<String, usize> = HashMap::new();
        for (i, work) in works.iter().enumerate() {
            let names = std::iter::once(&work.title)
                .chain(work.aliases.iter())
                .chain(std::iter::once(&work.id));
            for name in names {
                let key = normalize_title(name);
                if key.is_empty() {
                    continue;
                }
                match aliases.get(&key) {
                    Some(&owner) if owner != i => {
                        tracing::warn!(
                            alias = %name,
                            kept = %works[owner].id,
                            ignored = %work.id,
                            "duplicate corpus alias"
                        );
                    }
                    Some(_) => {}
                    None => {
                        aliases.insert(key, i);
                    }
                }
            }
        }
        Self {
            root: None,
            works,
            aliases,
        }
    }

    /// Directory the corpus was loaded from, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn works(&self) -> &[Work] {
        &self.works
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Work> {
        self.works.iter().find(|w| w.id == id)
    }

    /// Exact lookup by title, alias or id (after normalization).
    pub fn lookup(&self, name: &str) -> Option<&Work> {
        self.aliases
            .get(&normalize_title(name))
            .map(|&i| &self.works[i])
    }

    /// A registry that knows the biblical canon plus every work in the corpus.
    pub fn registry(&self) -> BookRegistry {
        BookRegistry::standard().with_works(
            self.works
                .iter()
                .map(|w| (w.title.clone(), w.aliases.clone())),
        )
    }
}

/// The `*.txt` files directly inside `dir`, in name order.
fn text_files(dir: &Path) -> Result<Vec<PathBuf>, CorpusError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CorpusError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(CorpusError::Empty(dir.to_path_buf()));
    }
    Ok(paths)
}

fn read_text(path: &Path) -> Result<String, CorpusError> {
    let bytes = std::fs::read(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
