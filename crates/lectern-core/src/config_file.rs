use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::{ProviderKind, ProviderSettings};
use crate::{Config, ScoringWeights};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub corpus: Option<CorpusSection>,
    pub bible: Option<BibleSection>,
    pub matching: Option<MatchingSection>,
    pub scoring: Option<ScoringSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusSection {
    pub path: Option<String>,
    /// Index every `*.txt` file instead of reading `catalog.toml`.
    pub scan: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BibleSection {
    /// `mock`, `http`, `offline` or `none`.
    pub provider: Option<String>,
    pub translations: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
    pub offline_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingSection {
    pub fuzzy_floor: Option<f64>,
    /// 0 keeps every candidate.
    pub max_candidates: Option<usize>,
    pub emit_unresolved: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringSection {
    pub text_quality: Option<f64>,
    pub source_reliability: Option<f64>,
    pub metadata_completeness: Option<f64>,
    pub citation_match: Option<f64>,
    pub min_text_length: Option<usize>,
}

/// Platform config directory path: `<config_dir>/lectern/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lectern").join("config.toml"))
}

/// Load config by cascading CWD `.lectern.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".lectern.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed; a parse failure is logged.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    match read_config(path) {
        Ok(config) => Some(config),
        Err(ConfigError::Io { .. }) => None,
        Err(e) => {
            tracing::warn!("ignoring config file: {e}");
            None
        }
    }
}

/// Read and parse one config file.
pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The overlay's value for a field if it has one, otherwise the base's.
fn pick<S, T>(overlay: &Option<S>, base: &Option<S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (b, o) = (&base, &overlay);
    ConfigFile {
        corpus: Some(CorpusSection {
            path: pick(&o.corpus, &b.corpus, |c| c.path.clone()),
            scan: pick(&o.corpus, &b.corpus, |c| c.scan),
        }),
        bible: Some(BibleSection {
            provider: pick(&o.bible, &b.bible, |s| s.provider.clone()),
            translations: pick(&o.bible, &b.bible, |s| s.translations.clone()),
            timeout_secs: pick(&o.bible, &b.bible, |s| s.timeout_secs),
            base_url: pick(&o.bible, &b.bible, |s| s.base_url.clone()),
            offline_path: pick(&o.bible, &b.bible, |s| s.offline_path.clone()),
        }),
        matching: Some(MatchingSection {
            fuzzy_floor: pick(&o.matching, &b.matching, |m| m.fuzzy_floor),
            max_candidates: pick(&o.matching, &b.matching, |m| m.max_candidates),
            emit_unresolved: pick(&o.matching, &b.matching, |m| m.emit_unresolved),
        }),
        scoring: Some(ScoringSection {
            text_quality: pick(&o.scoring, &b.scoring, |s| s.text_quality),
            source_reliability: pick(&o.scoring, &b.scoring, |s| s.source_reliability),
            metadata_completeness: pick(&o.scoring, &b.scoring, |s| s.metadata_completeness),
            citation_match: pick(&o.scoring, &b.scoring, |s| s.citation_match),
            min_text_length: pick(&o.scoring, &b.scoring, |s| s.min_text_length),
        }),
    }
}

impl ConfigFile {
    pub fn corpus_path(&self) -> Option<PathBuf> {
        self.corpus
            .as_ref()
            .and_then(|c| c.path.as_ref())
            .map(PathBuf::from)
    }

    pub fn scan(&self) -> bool {
        self.corpus.as_ref().and_then(|c| c.scan).unwrap_or(false)
    }

    /// Apply this file over [`Config::default`].
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Some(bible) = &self.bible {
            if let Some(translations) = &bible.translations {
                if translations.iter().all(|t| t.trim().is_empty()) {
                    return Err(ConfigError::Invalid {
                        key: "bible.translations",
                        message: "at least one translation code is required".to_string(),
                    });
                }
                config.translations = translations
                    .iter()
                    .map(|t| t.trim().to_uppercase())
                    .filter(|t| !t.is_empty())
                    .collect();
            }
            if let Some(secs) = bible.timeout_secs {
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: "bible.timeout_secs",
                        message: "timeout must be at least one second".to_string(),
                    });
                }
                config.provider_timeout_secs = secs;
            }
        }

        if let Some(matching) = &self.matching {
            if let Some(floor) = matching.fuzzy_floor {
                if !(0.0..=1.0).contains(&floor) {
                    return Err(ConfigError::Invalid {
                        key: "matching.fuzzy_floor",
                        message: format!("{floor} is outside 0..=1"),
                    });
                }
                config.fuzzy_floor = floor;
            }
            if let Some(max) = matching.max_candidates {
                config.max_candidates = (max > 0).then_some(max);
            }
            if let Some(emit) = matching.emit_unresolved {
                config.emit_unresolved = emit;
            }
        }

        if let Some(scoring) = &self.scoring {
            let defaults = ScoringWeights::default();
            let weights = ScoringWeights {
                text_quality: scoring.text_quality.unwrap_or(defaults.text_quality),
                source_reliability: scoring
                    .source_reliability
                    .unwrap_or(defaults.source_reliability),
                metadata_completeness: scoring
                    .metadata_completeness
                    .unwrap_or(defaults.metadata_completeness),
                citation_match: scoring.citation_match.unwrap_or(defaults.citation_match),
            };
            let all = [
                weights.text_quality,
                weights.source_reliability,
                weights.metadata_completeness,
                weights.citation_match,
            ];
            if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(ConfigError::Invalid {
                    key: "scoring",
                    message: "weights must be non-negative".to_string(),
                });
            }
            config.scoring_weights = weights;
            if let Some(len) = scoring.min_text_length {
                config.min_text_length = len;
            }
        }

        Ok(config)
    }

    /// Provider settings from the `[bible]` section.
    pub fn provider_settings(&self) -> Result<ProviderSettings, ConfigError> {
        let bible = self.bible.clone().unwrap_or_default();
        let kind = match &bible.provider {
            Some(name) => name
                .parse::<ProviderKind>()
                .map_err(|message| ConfigError::Invalid {
                    key: "bible.provider",
                    message,
                })?,
            None => ProviderKind::default(),
        };
        if bible.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "bible.timeout_secs",
                message: "timeout must be at least one second".to_string(),
            });
        }
        Ok(ProviderSettings {
            kind,
            base_url: bible.base_url,
            offline_path: bible.offline_path.map(PathBuf::from),
            offline_translation: bible
                .translations
                .and_then(|t| t.into_iter().next())
                .map(|t| t.to_uppercase()),
            timeout: bible.timeout_secs.map(Duration::from_secs),
        })
    }
}
