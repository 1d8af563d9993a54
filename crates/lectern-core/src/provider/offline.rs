//! Bible provider backed by a local tab-separated verse file.
//!
//! Format: one verse per line, `Book<TAB>Chapter<TAB>Verse<TAB>Text`. Blank
//! lines and lines starting with `#` are ignored. Book names may be any name or
//! abbreviation the registry knows.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use super::{BibleProvider, ProviderError, VerseRequest, VerseTable};
use crate::registry::BookRegistry;

/// One translation loaded from disk.
#[derive(Debug)]
pub struct OfflineBible {
    translation: String,
    verses: VerseTable,
}

impl OfflineBible {
    pub fn load(path: &Path, translation: &str) -> Result<Self, ProviderError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProviderError::Io(format!("{}: {e}", path.display())))?;
        let bible = Self::from_tsv(&content, translation)?;
        tracing::info!(
            path = %path.display(),
            translation,
            verses = bible.verses.len(),
            "loaded offline bible"
        );
        Ok(bible)
    }

    pub fn from_tsv(content: &str, translation: &str) -> Result<Self, ProviderError> {
        let registry = BookRegistry::standard();
        let mut verses = VerseTable::default();

        for (i, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = || ProviderError::Malformed(format!("line {}: {line:?}", i + 1));

            let mut fields = line.splitn(4, '\t');
            let (Some(book), Some(chapter), Some(verse), Some(text)) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed());
            };
            let chapter: u32 = chapter.trim().parse().map_err(|_| malformed())?;
            let verse: u32 = verse.trim().parse().map_err(|_| malformed())?;
            let book = registry.canonical_book(book).unwrap_or(book.trim());
            verses.insert(book, chapter, verse, text.trim());
        }

        Ok(Self {
            translation: translation.to_uppercase(),
            verses,
        })
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }
}

impl BibleProvider for OfflineBible {
    fn name(&self) -> &str {
        "offline"
    }

    fn supports(&self, translation: &str) -> bool {
        self.translation.eq_ignore_ascii_case(translation)
    }

    fn fetch_verses<'a>(
        &'a self,
        request: &'a VerseRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            if !self.supports(&request.translation) {
                return Err(ProviderError::UnsupportedTranslation(
                    request.translation.clone(),
                ));
            }
            self.verses.passage(request)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "# book\tchapter\tverse\ttext\n\
Gen\t1\t1\tIn the beginning God created the heaven and the earth.\n\
\n\
Genesis\t1\t2\tAnd the earth was without form, and void;\r\n\
Jn\t11\t35\tJesus wept.\n";

    fn request(book: &str, chapter: u32, start: u32, end: u32) -> VerseRequest {
        VerseRequest {
            book: book.to_string(),
            chapter,
            verse_start: start,
            verse_end: end,
            translation: "kjv".to_string(),
        }
    }

    #[tokio::test]
    async fn serves_verses_under_canonical_names() {
        let bible = OfflineBible::from_tsv(TSV, "kjv").unwrap();
        assert_eq!(bible.translation(), "KJV");
        assert_eq!(
            bible.fetch_verses(&request("Genesis", 1, 1, 2)).await.unwrap(),
            "1 In the beginning God created the heaven and the earth.\n2 And the earth was without form, and void;"
        );
        assert_eq!(
            bible.fetch_verses(&request("John", 11, 35, 35)).await.unwrap(),
            "35 Jesus wept."
        );
    }

    #[tokio::test]
    async fn other_translations_are_rejected() {
        let bible = OfflineBible::from_tsv(TSV, "KJV").unwrap();
        let mut req = request("John", 11, 35, 35);
        req.translation = "WEB".to_string();
        assert!(matches!(
            bible.fetch_verses(&req).await,
            Err(ProviderError::UnsupportedTranslation(_))
        ));
    }

    #[test]
    fn malformed_lines_are_reported() {
        let err = OfflineBible::from_tsv("Gen\tone\t1\tx\n", "KJV").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(ref m) if m.starts_with("line 1")));
        assert!(OfflineBible::from_tsv("Gen\t1\t1\n", "KJV").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kjv.tsv");
        std::fs::write(&path, TSV).unwrap();
        let bible = OfflineBible::load(&path, "KJV").unwrap();
        assert!(bible.supports("kjv"));
        assert!(matches!(
            OfflineBible::load(&dir.path().join("missing.tsv"), "KJV"),
            Err(ProviderError::Io(_))
        ));
    }
}
