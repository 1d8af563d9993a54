//! In-memory Bible provider with canned passages.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{BibleProvider, ProviderError, VerseRequest, VerseTable};

/// Sample King James passages served by [`MockBible::with_samples`].
const KJV_SAMPLES: &[(&str, u32, u32, &str)] = &[
    ("Genesis", 1, 1, "In the beginning God created the heaven and the earth."),
    (
        "Genesis",
        1,
        2,
        "And the earth was without form, and void; and darkness was upon the face of the deep. And the Spirit of God moved upon the face of the waters.",
    ),
    ("Genesis", 1, 3, "And God said, Let there be light: and there was light."),
    (
        "Genesis",
        3,
        15,
        "And I will put enmity between thee and the woman, and between thy seed and her seed; it shall bruise thy head, and thou shalt bruise his heel.",
    ),
    ("Matthew", 5, 3, "Blessed are the poor in spirit: for theirs is the kingdom of heaven."),
    ("Matthew", 5, 4, "Blessed are they that mourn: for they shall be comforted."),
    ("Matthew", 5, 5, "Blessed are the meek: for they shall inherit the earth."),
    (
        "John",
        3,
        16,
        "For God so loved the world, that he gave his only begotten Son, that whosoever believeth in him should not perish, but have everlasting life.",
    ),
    (
        "Romans",
        8,
        28,
        "And we know that all things work together for good to them that love God, to them who are the called according to his purpose.",
    ),
    (
        "1 Corinthians",
        13,
        4,
        "Charity suffereth long, and is kind; charity envieth not; charity vaunteth not itself, is not puffed up,",
    ),
    (
        "1 Corinthians",
        13,
        5,
        "Doth not behave itself unseemly, seeketh not her own, is not easily provoked, thinketh no evil;",
    ),
    ("1 Corinthians", 13, 6, "Rejoiceth not in iniquity, but rejoiceth in the truth;"),
    (
        "1 Corinthians",
        13,
        7,
        "Beareth all things, believeth all things, hopeth all things, endureth all things.",
    ),
];

/// A hand-rolled [`BibleProvider`] for tests and offline demos.
///
/// Supports:
/// - Seeded verses (the KJV samples, or anything added with [`MockBible::with_verse`]).
/// - A fixed failure returned for every call.
/// - Optional per-call latency.
/// - Call counting via [`call_count()`](MockBible::call_count).
#[derive(Debug)]
pub struct MockBible {
    name: &'static str,
    /// Supported translation codes. Empty means every translation.
    translations: Vec<String>,
    verses: VerseTable,
    failure: Option<ProviderError>,
    delay: Option<Duration>,
    call_count: AtomicUsize,
}

impl Default for MockBible {
    fn default() -> Self {
        Self {
            name: "mock",
            translations: Vec::new(),
            verses: VerseTable::default(),
            failure: None,
            delay: None,
            call_count: AtomicUsize::new(0),
        }
    }
}

impl MockBible {
    /// A provider with no verses.
    pub fn new() -> Self {
        Self::default()
    }

    /// A KJV-only provider seeded with the sample passages.
    pub fn with_samples() -> Self {
        let mut mock = Self::new().with_translations(["KJV"]);
        for &(book, chapter, verse, text) in KJV_SAMPLES {
            mock.verses.insert(book, chapter, verse, text);
        }
        mock
    }

    /// A provider that fails every call with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_verse(mut self, book: &str, chapter: u32, verse: u32, text: &str) -> Self {
        self.verses.insert(book, chapter, verse, text);
        self
    }

    pub fn with_translations<I, S>(mut self, translations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translations = translations.into_iter().map(Into::into).collect();
        self
    }

    /// Set simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `fetch_verses()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl BibleProvider for MockBible {
    fn name(&self) -> &str {
        self.name
    }

    fn supports(&self, translation: &str) -> bool {
        self.translations.is_empty()
            || self
                .translations
                .iter()
                .any(|t| t.eq_ignore_ascii_case(translation))
    }

    fn fetch_verses<'a>(
        &'a self,
        request: &'a VerseRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            if let Some(error) = &self.failure {
                return Err(error.clone());
            }
            if !self.supports(&request.translation) {
                return Err(ProviderError::UnsupportedTranslation(
                    request.translation.clone(),
                ));
            }
            self.verses.passage(request)
        })
    }
}
