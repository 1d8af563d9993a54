//! Biblical text providers.
//!
//! The engine never talks to a translation source directly. It holds an
//! optional `Arc<dyn BibleProvider>` and bounds every call with a timeout.

pub mod bible_api;
pub mod mock;
pub mod offline;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::{Reference, SourceType};

pub use bible_api::BibleApi;
pub use mock::MockBible;
pub use offline::OfflineBible;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("bible provider unavailable: {0}")]
    Unavailable(String),
    #[error("bible provider timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0} not found")]
    VerseNotFound(String),
    #[error("translation {0} is not supported")]
    UnsupportedTranslation(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("malformed provider data: {0}")]
    Malformed(String),
}

/// A request for an inclusive verse range in one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRequest {
    /// Canonical book name ("1 Corinthians").
    pub book: String,
    pub chapter: u32,
    pub verse_start: u32,
    pub verse_end: u32,
    /// Translation code ("KJV").
    pub translation: String,
}

impl VerseRequest {
    /// Build a request from a bible reference. `None` for other source types.
    pub fn from_reference(reference: &Reference, translation: &str) -> Option<Self> {
        if reference.source_type != SourceType::Bible {
            return None;
        }
        Some(Self {
            book: reference.work_or_book.clone(),
            chapter: reference.chapter_or_act?,
            verse_start: reference.line_or_verse_start,
            verse_end: reference.line_or_verse_end,
            translation: translation.to_string(),
        })
    }

    /// `"Genesis 1:1-3"`.
    pub fn label(&self) -> String {
        if self.verse_start == self.verse_end {
            format!("{} {}:{}", self.book, self.chapter, self.verse_start)
        } else {
            format!(
                "{} {}:{}-{}",
                self.book, self.chapter, self.verse_start, self.verse_end
            )
        }
    }
}

impl fmt::Display for VerseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.translation)
    }
}

/// A source of biblical verse text.
pub trait BibleProvider: Send + Sync {
    /// Short provider name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Whether this provider can serve `translation`.
    fn supports(&self, translation: &str) -> bool;

    /// Fetch the verses of `request`, one `"<n> <text>"` line per verse.
    fn fetch_verses<'a>(
        &'a self,
        request: &'a VerseRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>>;
}

/// Render verses as `"<n> <text>"` lines.
pub fn format_verses<'a, I>(verses: I) -> String
where
    I: IntoIterator<Item = (u32, &'a str)>,
{
    verses
        .into_iter()
        .map(|(n, text)| format!("{n} {}", text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// In-memory verse storage keyed by (book, chapter, verse).
#[derive(Debug, Clone, Default)]
pub struct VerseTable {
    verses: HashMap<(String, u32, u32), String>,
}

impl VerseTable {
    fn key(book: &str, chapter: u32, verse: u32) -> (String, u32, u32) {
        (book.to_lowercase(), chapter, verse)
    }

    pub fn insert(&mut self, book: &str, chapter: u32, verse: u32, text: impl Into<String>) {
        self.verses
            .insert(Self::key(book, chapter, verse), text.into());
    }

    pub fn get(&self, book: &str, chapter: u32, verse: u32) -> Option<&str> {
        self.verses
            .get(&Self::key(book, chapter, verse))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// All verses of `request`. A single missing verse fails the request.
    pub fn passage(&self, request: &VerseRequest) -> Result<String, ProviderError> {
        let mut verses = Vec::new();
        for n in request.verse_start..=request.verse_end {
            let text = self
                .get(&request.book, request.chapter, n)
                .ok_or_else(|| ProviderError::VerseNotFound(request.label()))?;
            verses.push((n, text));
        }
        Ok(format_verses(verses))
    }
}

/// Which provider implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// Built-in sample passages.
    Mock,
    /// bible-api.com compatible HTTP endpoint.
    #[default]
    Http,
    /// Tab-separated verse file.
    Offline,
    /// No provider: biblical references resolve to nothing.
    None,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "http" | "api" => Ok(ProviderKind::Http),
            "offline" | "file" => Ok(ProviderKind::Offline),
            "none" | "off" => Ok(ProviderKind::None),
            other => Err(format!(
                "unknown bible provider \"{other}\" (expected mock, http, offline or none)"
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Mock => "mock",
            ProviderKind::Http => "http",
            ProviderKind::Offline => "offline",
            ProviderKind::None => "none",
        })
    }
}

/// Everything needed to construct a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Base URL for [`ProviderKind::Http`].
    pub base_url: Option<String>,
    /// Verse file for [`ProviderKind::Offline`].
    pub offline_path: Option<PathBuf>,
    /// Translation code the offline file holds.
    pub offline_translation: Option<String>,
    pub timeout: Option<Duration>,
}

/// Build the configured provider. `Ok(None)` when biblical lookups are off.
pub fn build_bible_provider(
    settings: &ProviderSettings,
) -> Result<Option<Arc<dyn BibleProvider>>, ProviderError> {
    let provider: Arc<dyn BibleProvider> = match settings.kind {
        ProviderKind::None => return Ok(None),
        ProviderKind::Mock => Arc::new(MockBible::with_samples()),
        ProviderKind::Http => {
            let base = settings
                .base_url
                .clone()
                .unwrap_or_else(|| bible_api::DEFAULT_BASE_URL.to_string());
            Arc::new(BibleApi::new(base, settings.timeout)?)
        }
        ProviderKind::Offline => {
            let path = settings.offline_path.as_ref().ok_or_else(|| {
                ProviderError::Unavailable("offline provider needs a verse file".to_string())
            })?;
            let translation = settings.offline_translation.as_deref().unwrap_or("KJV");
            Arc::new(OfflineBible::load(path, translation)?)
        }
    };
    tracing::debug!(provider = provider.name(), "bible provider ready");
    Ok(Some(provider))
}
