//! The citation lookup pipeline: parse, resolve, extract, score, rank.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;

use crate::corpus::CorpusIndex;
use crate::extractor::PassageExtractor;
use crate::parser::{CitationParser, ParseError, ParsedCitation};
use crate::provider::{BibleProvider, ProviderError, VerseRequest};
use crate::ranking;
use crate::registry::BookRegistry;
use crate::resolver::SourceResolver;
use crate::scoring::ConfidenceScorer;
use crate::{
    Candidate, CandidateMetadata, Config, Diagnostic, DiagnosticStage, LookupResult, Reference,
    SourceKind, SourceLocation, SourceType,
};

/// A work as listed by [`CitationEngine::info`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkSummary {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineInfo {
    pub literary_works: usize,
    pub biblical_translations: Vec<String>,
    /// Name of the configured bible provider, if any.
    pub bible_provider: Option<String>,
    pub available_works: Vec<WorkSummary>,
}

/// Candidates and recovered failures for one reference.
#[derive(Default)]
struct Outcome {
    candidates: Vec<Candidate>,
    diagnostics: Vec<Diagnostic>,
}

impl Outcome {
    fn diagnostic(&mut self, stage: DiagnosticStage, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(stage, message));
    }
}

/// Resolves citation strings to ranked candidate passages.
///
/// Cheap to share: wrap it in an `Arc` and call [`resolve_citation`] from as
/// many tasks as needed. The corpus is never mutated after construction.
///
/// [`resolve_citation`]: CitationEngine::resolve_citation
pub struct CitationEngine {
    corpus: Arc<CorpusIndex>,
    registry: Arc<BookRegistry>,
    config: Config,
    parser: CitationParser,
    resolver: SourceResolver,
    extractor: PassageExtractor,
    scorer: ConfidenceScorer,
    provider: Option<Arc<dyn BibleProvider>>,
}

impl CitationEngine {
    pub fn new(corpus: Arc<CorpusIndex>, config: Config) -> Self {
        let registry = Arc::new(corpus.registry());
        let translations = config
            .translations
            .iter()
            .map(|t| t.to_uppercase())
            .collect();
        Self {
            parser: CitationParser::new(registry.clone()),
            resolver: SourceResolver::new(
                corpus.clone(),
                registry.clone(),
                translations,
                config.fuzzy_floor,
            ),
            extractor: PassageExtractor::new(corpus.clone()),
            scorer: ConfidenceScorer::new(config.scoring_weights, config.min_text_length),
            corpus,
            registry,
            config,
            provider: None,
        }
    }

    /// Consult `provider` for biblical references.
    pub fn with_provider(mut self, provider: Arc<dyn BibleProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn corpus(&self) -> &CorpusIndex {
        &self.corpus
    }

    pub fn registry(&self) -> &BookRegistry {
        &self.registry
    }

    pub fn provider(&self) -> Option<&Arc<dyn BibleProvider>> {
        self.provider.as_ref()
    }

    /// Run only the parser.
    pub fn parse(&self, raw: &str) -> Result<ParsedCitation, ParseError> {
        self.parser.parse(raw)
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            literary_works: self.corpus.len(),
            biblical_translations: self
                .config
                .translations
                .iter()
                .map(|t| t.to_uppercase())
                .collect(),
            bible_provider: self.provider.as_ref().map(|p| p.name().to_string()),
            available_works: self
                .corpus
                .works()
                .iter()
                .map(|w| WorkSummary {
                    id: w.id.clone(),
                    title: w.title.clone(),
                    author: w.author.clone(),
                    lines: w.line_count(),
                })
                .collect(),
        }
    }

    /// Resolve a raw citation to ranked candidates.
    ///
    /// Never fails. Anything that went wrong along the way is reported in
    /// [`LookupResult::diagnostics`], and an empty candidate list is a normal
    /// outcome.
    pub async fn resolve_citation(&self, raw: &str) -> LookupResult {
        let parsed = match self.parser.parse(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(citation = raw, error = %e, "citation did not parse");
                return LookupResult::empty(
                    raw,
                    vec![Diagnostic::new(DiagnosticStage::Parse, e.to_string())],
                );
            }
        };

        let mut diagnostics: Vec<Diagnostic> = parsed
            .errors
            .iter()
            .map(|e| {
                Diagnostic::new(
                    DiagnosticStage::Parse,
                    format!("\"{}\": {}", e.segment, e.error),
                )
            })
            .collect();

        let outcomes = join_all(
            parsed
                .references
                .iter()
                .enumerate()
                .map(|(index, reference)| self.lookup_reference(index, reference)),
        )
        .await;

        let mut candidates = Vec::new();
        for outcome in outcomes {
            candidates.extend(outcome.candidates);
            diagnostics.extend(outcome.diagnostics);
        }

        let candidates = ranking::truncate(ranking::rank(candidates), self.config.max_candidates);
        tracing::debug!(
            citation = raw,
            references = parsed.references.len(),
            candidates = candidates.len(),
            "citation resolved"
        );

        LookupResult {
            original_citation: raw.to_string(),
            best_match: candidates.first().cloned(),
            candidates,
            diagnostics,
        }
    }

    async fn lookup_reference(&self, index: usize, reference: &Reference) -> Outcome {
        let locations = self.resolver.resolve(reference);
        if locations.is_empty() {
            let mut outcome = Outcome::default();
            outcome.diagnostic(
                DiagnosticStage::Resolve,
                format!("no source found for {reference}"),
            );
            return outcome;
        }

        match reference.source_type {
            SourceType::Bible => self.bible_candidates(index, reference, locations).await,
            _ => self.corpus_candidates(index, reference, locations),
        }
    }

    fn corpus_candidates(
        &self,
        index: usize,
        reference: &Reference,
        locations: Vec<SourceLocation>,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        for location in locations {
            match self.extractor.extract_reference(&location, reference) {
                Ok(passage) => outcome.candidates.push(self.candidate(
                    index,
                    reference,
                    location,
                    passage.text,
                    passage.section,
                    Some(passage.total_lines),
                )),
                Err(e) => {
                    tracing::warn!(work = %location.key, reference = %reference, error = %e, "skipping candidate");
                    outcome.diagnostic(
                        DiagnosticStage::Extract,
                        format!("{}: {e}", location.title),
                    );
                }
            }
        }
        outcome
    }

    async fn bible_candidates(
        &self,
        index: usize,
        reference: &Reference,
        locations: Vec<SourceLocation>,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        let Some(provider) = &self.provider else {
            outcome.diagnostic(
                DiagnosticStage::Provider,
                format!("no bible provider configured for {reference}"),
            );
            return outcome;
        };
        let timeout = Duration::from_secs(self.config.provider_timeout_secs);

        for location in locations {
            let translation = location.translation.as_deref().unwrap_or(&location.key);
            let Some(request) = VerseRequest::from_reference(reference, translation) else {
                continue;
            };

            let fetched = if provider.supports(translation) {
                tokio::time::timeout(timeout, provider.fetch_verses(&request))
                    .await
                    .unwrap_or(Err(ProviderError::Timeout(timeout)))
            } else {
                Err(ProviderError::UnsupportedTranslation(translation.to_string()))
            };

            match fetched {
                Ok(text) => {
                    outcome
                        .candidates
                        .push(self.candidate(index, reference, location, text, None, None));
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), request = %request, error = %e, "bible lookup failed");
                    outcome.diagnostic(DiagnosticStage::Provider, format!("{request}: {e}"));
                    if self.config.emit_unresolved {
                        let text = reference.to_string();
                        let source = SourceLocation {
                            kind: SourceKind::Unresolved,
                            ..location
                        };
                        outcome
                            .candidates
                            .push(self.candidate(index, reference, source, text, None, None));
                    }
                }
            }
        }
        outcome
    }

    fn candidate(
        &self,
        index: usize,
        reference: &Reference,
        source: SourceLocation,
        text: String,
        section: Option<String>,
        total_lines: Option<usize>,
    ) -> Candidate {
        let metadata = CandidateMetadata {
            title: source.title.clone(),
            author: source.author.clone(),
            translation: source.translation.clone(),
            range: reference.to_string(),
            section,
            total_lines,
        };
        let score = self.scorer.score(&text, &source, &metadata, reference);
        Candidate {
            source,
            text,
            confidence: score.total,
            metadata,
            source_type: reference.source_type,
            reference_index: index,
            score,
        }
    }
}
