//! Maps parsed references to concrete source locations.

use std::sync::Arc;

use crate::corpus::{CorpusIndex, Work};
use crate::matching::title_similarity;
use crate::registry::BookRegistry;
use crate::{Reference, SourceKind, SourceLocation, SourceType};

/// Full names of the translation codes the engine knows about.
pub fn translation_name(code: &str) -> Option<&'static str> {
    match code.to_uppercase().as_str() {
        "KJV" => Some("King James Version"),
        "ESV" => Some("English Standard Version"),
        "NIV" => Some("New International Version"),
        "NASB" => Some("New American Standard Bible"),
        "NRSV" => Some("New Revised Standard Version"),
        "WEB" => Some("World English Bible"),
        "ASV" => Some("American Standard Version"),
        "YLT" => Some("Young's Literal Translation"),
        _ => None,
    }
}

/// Resolves references against the corpus and the configured translations.
///
/// Resolution never fails: an empty list means nothing matched.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    corpus: Arc<CorpusIndex>,
    registry: Arc<BookRegistry>,
    translations: Vec<String>,
    fuzzy_floor: f64,
}

impl SourceResolver {
    pub fn new(
        corpus: Arc<CorpusIndex>,
        registry: Arc<BookRegistry>,
        translations: Vec<String>,
        fuzzy_floor: f64,
    ) -> Self {
        Self {
            corpus,
            registry,
            translations,
            fuzzy_floor,
        }
    }

    pub fn resolve(&self, reference: &Reference) -> Vec<SourceLocation> {
        match reference.source_type {
            SourceType::Bible => self.resolve_bible(reference),
            SourceType::Literary | SourceType::Drama => self.resolve_work(reference),
            SourceType::Mixed => Vec::new(),
        }
    }

    /// One location per configured translation, provided the book has the
    /// cited chapter.
    fn resolve_bible(&self, reference: &Reference) -> Vec<SourceLocation> {
        let Some(book) = self.registry.bible_book(&reference.work_or_book) else {
            return Vec::new();
        };
        let chapter = reference.chapter_or_act.unwrap_or(0);
        if chapter == 0 || chapter > book.chapters {
            tracing::debug!(book = book.name, chapter, "chapter out of range");
            return Vec::new();
        }

        self.translations
            .iter()
            .map(|code| SourceLocation {
                kind: SourceKind::Bible,
                key: code.to_uppercase(),
                title: book.name.to_string(),
                author: None,
                translation: Some(code.to_uppercase()),
                match_score: 1.0,
            })
            .collect()
    }

    /// Exact alias lookup, then every work whose title or alias is similar
    /// enough, best first.
    fn resolve_work(&self, reference: &Reference) -> Vec<SourceLocation> {
        let name = &reference.work_or_book;
        if let Some(work) = self.corpus.lookup(name) {
            return vec![location(work, 1.0)];
        }

        let mut matches: Vec<(f64, &Work)> = self
            .corpus
            .works()
            .iter()
            .filter_map(|work| {
                let best = std::iter::once(&work.title)
                    .chain(work.aliases.iter())
                    .map(|candidate| title_similarity(name, candidate))
                    .fold(0.0_f64, f64::max);
                tracing::debug!(work = %work.id, cited = %name, score = best, "fuzzy title score");
                (best >= self.fuzzy_floor).then_some((best, work))
            })
            .collect();
        // Stable: equal scores keep corpus order.
        matches.sort_by(|a, b| b.0.total_cmp(&a.0));

        matches
            .into_iter()
            .map(|(score, work)| location(work, score))
            .collect()
    }
}

fn location(work: &Work, match_score: f64) -> SourceLocation {
    SourceLocation {
        kind: SourceKind::Corpus,
        key: work.id.clone(),
        title: work.title.clone(),
        author: work.author.clone(),
        translation: None,
        match_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CitationParser;

    fn corpus() -> Arc<CorpusIndex> {
        Arc::new(CorpusIndex::from_works(vec![
            Work::from_text("pl", "Paradise Lost", "a").with_author("John Milton"),
            Work::from_text("pr", "Paradise Regained", "b").with_author("John Milton"),
            Work::from_text("absalom", "Absalom and Achitophel", "c").with_aliases(["Absalom"]),
        ]))
    }

    fn resolver(translations: &[&str]) -> SourceResolver {
        let corpus = corpus();
        let registry = Arc::new(corpus.registry());
        SourceResolver::new(
            corpus,
            registry,
            translations.iter().map(|t| t.to_string()).collect(),
            0.6,
        )
    }

    fn reference(raw: &str) -> Reference {
        CitationParser::default().parse_segment(raw).unwrap()
    }

    #[test]
    fn exact_alias_match() {
        let found = resolver(&["KJV"]).resolve(&reference("Absalom 7-8"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "absalom");
        assert_eq!(found[0].kind, SourceKind::Corpus);
        assert_eq!(found[0].match_score, 1.0);
    }

    #[test]
    fn fuzzy_match_returns_all_above_floor() {
        let found = resolver(&["KJV"]).resolve(&reference("Paradise Lst 1-2"));
        assert!(!found.is_empty());
        assert_eq!(found[0].key, "pl");
        assert!(found[0].match_score > 0.9);
        assert!(found.iter().all(|l| l.match_score >= 0.6));
        assert!(
            found
                .windows(2)
                .all(|w| w[0].match_score >= w[1].match_score)
        );
        assert!(found.iter().all(|l| l.key != "absalom"));
    }

    #[test]
    fn fuzzy_match_keeps_every_candidate_above_floor() {
        // "paradisereg" shares a long prefix with both Milton titles.
        let found = resolver(&["KJV"]).resolve(&reference("Paradise Reg 1"));
        let keys: Vec<&str> = found.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, ["pr", "pl"]);
    }

    #[test]
    fn unknown_work_resolves_to_nothing() {
        assert!(resolver(&["KJV"]).resolve(&reference("Unknown Work 999-1000")).is_empty());
    }

    #[test]
    fn bible_resolves_per_translation() {
        let found = resolver(&["KJV", "web"]).resolve(&reference("Genesis 1:1-3"));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, SourceKind::Bible);
        assert_eq!(found[0].title, "Genesis");
        assert_eq!(found[0].translation.as_deref(), Some("KJV"));
        assert_eq!(found[1].translation.as_deref(), Some("WEB"));
    }

    #[test]
    fn bible_chapter_past_end_resolves_to_nothing() {
        assert!(resolver(&["KJV"]).resolve(&reference("Genesis 51:1")).is_empty());
        assert_eq!(resolver(&["KJV"]).resolve(&reference("Genesis 50:1")).len(), 1);
    }

    #[test]
    fn translation_names() {
        assert_eq!(translation_name("kjv"), Some("King James Version"));
        assert_eq!(translation_name("XYZ"), None);
    }
}
