use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lectern_core::config_file::{self, ConfigFile};
use lectern_core::corpus::pipeline;
use lectern_core::provider::{ProviderKind, build_bible_provider};
use lectern_core::{CitationEngine, Config, CorpusIndex, GutenbergCatalog};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod output;

use output::ColorMode;

/// Lectern - resolve literary and biblical citations to exact passages
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CorpusArgs {
    /// Corpus directory (with catalog.toml unless --scan is given)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Index every .txt file in the corpus directory instead of reading catalog.toml
    #[arg(long)]
    scan: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a citation and print ranked candidate passages
    Lookup {
        /// Citation text, e.g. "cf. Genesis 3:15; Paradise Lost IX.1033-1045"
        citation: String,

        #[command(flatten)]
        corpus: CorpusArgs,

        /// Bible provider: mock, http, offline or none
        #[arg(long)]
        provider: Option<String>,

        /// Translation code to consult (repeatable)
        #[arg(long = "translation")]
        translations: Vec<String>,

        /// Base URL of a bible-api.com compatible endpoint
        #[arg(long)]
        bible_url: Option<String>,

        /// Tab-separated verse file for the offline provider
        #[arg(long)]
        offline_bible: Option<PathBuf>,

        /// Maximum number of candidates (0 for all)
        #[arg(long)]
        max: Option<usize>,

        /// Print the lookup result as JSON
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Parse a citation without resolving it
    Parse {
        citation: String,

        /// Print the parsed references as JSON
        #[arg(long)]
        json: bool,
    },

    /// List indexed works and configured translations
    Info {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[arg(long)]
        json: bool,
    },

    /// Prepare and check corpus texts, or search the Gutenberg catalog
    Corpus {
        #[command(subcommand)]
        action: CorpusCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CorpusCommand {
    /// Clean downloaded texts into a corpus directory and write its catalog.toml
    Prepare {
        /// Directory of raw .txt files
        source: PathBuf,

        /// Corpus directory to write
        dest: PathBuf,

        #[arg(long)]
        json: bool,

        #[arg(long)]
        no_color: bool,
    },

    /// Report the cleaning quality of every text in a corpus
    Validate {
        /// Corpus directory (defaults to the configured corpus)
        #[arg(long)]
        corpus: Option<PathBuf>,

        #[arg(long)]
        json: bool,

        #[arg(long)]
        no_color: bool,
    },

    /// Search the Project Gutenberg CSV catalog by title
    Search {
        query: String,

        /// Path to pg_catalog.csv
        #[arg(long)]
        catalog: PathBuf,

        /// Maximum number of hits
        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Summarize the Project Gutenberg CSV catalog
    Stats {
        /// Path to pg_catalog.csv
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let file = config_file::load_config();

    match cli.command {
        Command::Lookup {
            citation,
            corpus,
            provider,
            translations,
            bible_url,
            offline_bible,
            max,
            json,
            no_color,
        } => {
            let options = LookupOptions {
                provider,
                translations,
                bible_url,
                offline_bible,
                max,
            };
            lookup(&citation, &corpus, options, &file, json, no_color).await
        }
        Command::Parse { citation, json } => parse(&citation, &file, json),
        Command::Info { corpus, json } => info(&corpus, &file, json),
        Command::Corpus { action } => corpus_command(action, &file),
    }
}

struct LookupOptions {
    provider: Option<String>,
    translations: Vec<String>,
    bible_url: Option<String>,
    offline_bible: Option<PathBuf>,
    max: Option<usize>,
}

async fn lookup(
    citation: &str,
    corpus_args: &CorpusArgs,
    options: LookupOptions,
    file: &ConfigFile,
    json: bool,
    no_color: bool,
) -> anyhow::Result<()> {
    // Resolve configuration: CLI flags > env vars > config file > defaults
    let mut config = file.to_config().context("invalid configuration file")?;
    if !options.translations.is_empty() {
        config.translations = options
            .translations
            .iter()
            .map(|t| t.to_uppercase())
            .collect();
    }
    if let Some(secs) = std::env::var("LECTERN_TIMEOUT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
    {
        config.provider_timeout_secs = secs;
    }
    if let Some(max) = options.max {
        config.max_candidates = (max > 0).then_some(max);
    }

    let mut settings = file
        .provider_settings()
        .context("invalid [bible] configuration")?;
    let provider_name = options
        .provider
        .or_else(|| std::env::var("LECTERN_PROVIDER").ok());
    if let Some(name) = provider_name {
        settings.kind = name.parse::<ProviderKind>().map_err(anyhow::Error::msg)?;
    } else if options.offline_bible.is_some() {
        settings.kind = ProviderKind::Offline;
    }
    if let Some(url) = options
        .bible_url
        .or_else(|| std::env::var("LECTERN_BIBLE_URL").ok())
    {
        settings.base_url = Some(url);
    }
    if let Some(path) = options.offline_bible {
        settings.offline_path = Some(path);
    }
    if let Some(first) = config.translations.first() {
        settings.offline_translation = Some(first.clone());
    }
    settings.timeout = Some(Duration::from_secs(config.provider_timeout_secs));

    let corpus = load_corpus(corpus_args, file)?;
    let mut engine = CitationEngine::new(corpus, config);
    if let Some(provider) = build_bible_provider(&settings)
        .with_context(|| format!("failed to start the {} bible provider", settings.kind))?
    {
        engine = engine.with_provider(provider);
    }

    let result = engine.resolve_citation(citation).await;

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &result)?;
        writeln!(stdout)?;
    } else {
        let color = ColorMode(!no_color && std::io::stdout().is_terminal());
        output::print_lookup(&mut stdout, &result, color)?;
    }
    Ok(())
}

fn parse(citation: &str, file: &ConfigFile, json: bool) -> anyhow::Result<()> {
    // Catalog aliases only; a missing corpus still parses.
    let corpus = match corpus_path(&CorpusArgs { corpus: None, scan: false }, file) {
        Some(path) => open_corpus(&path, file.scan()).unwrap_or_else(|e| {
            tracing::warn!("{e:#}");
            CorpusIndex::from_works(Vec::new())
        }),
        None => CorpusIndex::from_works(Vec::new()),
    };
    let engine = CitationEngine::new(Arc::new(corpus), Config::default());

    let mut stdout = std::io::stdout().lock();
    match engine.parse(citation) {
        Ok(parsed) => {
            if json {
                let errors: Vec<_> = parsed
                    .errors
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "index": e.index,
                            "segment": e.segment,
                            "error": e.error.to_string(),
                        })
                    })
                    .collect();
                let body = serde_json::json!({
                    "source_type": parsed.source_type(),
                    "references": parsed.references,
                    "errors": errors,
                });
                serde_json::to_writer_pretty(&mut stdout, &body)?;
                writeln!(stdout)?;
            } else {
                output::print_parsed(&mut stdout, &parsed)?;
            }
            Ok(())
        }
        Err(e) => anyhow::bail!("could not parse \"{citation}\": {e}"),
    }
}

fn info(corpus_args: &CorpusArgs, file: &ConfigFile, json: bool) -> anyhow::Result<()> {
    let config = file.to_config().context("invalid configuration file")?;
    let corpus = load_corpus(corpus_args, file)?;
    let engine = CitationEngine::new(corpus, config);
    let info = engine.info();

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &info)?;
        writeln!(stdout)?;
    } else {
        output::print_info(&mut stdout, &info, engine.corpus().root())?;
    }
    Ok(())
}

fn corpus_command(action: CorpusCommand, file: &ConfigFile) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    let color = |no_color: bool| ColorMode(!no_color && std::io::stdout().is_terminal());
    match action {
        CorpusCommand::Prepare {
            source,
            dest,
            json,
            no_color,
        } => {
            let summary = pipeline::prepare_dir(&source, &dest).with_context(|| {
                format!("failed to prepare {} into {}", source.display(), dest.display())
            })?;
            if json {
                serde_json::to_writer_pretty(&mut stdout, &summary)?;
                writeln!(stdout)?;
            } else {
                output::print_prepare(&mut stdout, &summary, color(no_color))?;
            }
        }
        CorpusCommand::Validate {
            corpus,
            json,
            no_color,
        } => {
            let args = CorpusArgs {
                corpus,
                scan: false,
            };
            let Some(dir) = corpus_path(&args, file) else {
                anyhow::bail!(
                    "No corpus directory given. Pass --corpus, set LECTERN_CORPUS, or add [corpus] path to .lectern.toml"
                );
            };
            let reports = pipeline::validate_dir(&dir)
                .with_context(|| format!("failed to validate corpus at {}", dir.display()))?;
            if json {
                serde_json::to_writer_pretty(&mut stdout, &reports)?;
                writeln!(stdout)?;
            } else {
                output::print_validation(&mut stdout, &reports, color(no_color))?;
            }
        }
        CorpusCommand::Search {
            query,
            catalog,
            limit,
            json,
        } => {
            let catalog = GutenbergCatalog::load(&catalog)?;
            let hits = catalog.search(&query, limit);
            if json {
                serde_json::to_writer_pretty(&mut stdout, &hits)?;
                writeln!(stdout)?;
            } else {
                output::print_search(&mut stdout, &query, &hits)?;
            }
        }
        CorpusCommand::Stats { catalog, json } => {
            let stats = GutenbergCatalog::load(&catalog)?.stats(10);
            if json {
                serde_json::to_writer_pretty(&mut stdout, &stats)?;
                writeln!(stdout)?;
            } else {
                output::print_stats(&mut stdout, &stats)?;
            }
        }
    }
    Ok(())
}

fn corpus_path(args: &CorpusArgs, file: &ConfigFile) -> Option<PathBuf> {
    args.corpus
        .clone()
        .or_else(|| std::env::var("LECTERN_CORPUS").ok().map(PathBuf::from))
        .or_else(|| file.corpus_path())
}

fn open_corpus(path: &std::path::Path, scan: bool) -> anyhow::Result<CorpusIndex> {
    if !path.is_dir() {
        anyhow::bail!("Corpus directory not found: {}", path.display());
    }
    let index = if scan {
        CorpusIndex::scan_dir(path)
    } else {
        CorpusIndex::load(path)
    };
    index.with_context(|| format!("failed to load corpus at {}", path.display()))
}

fn load_corpus(args: &CorpusArgs, file: &ConfigFile) -> anyhow::Result<Arc<CorpusIndex>> {
    let Some(path) = corpus_path(args, file) else {
        anyhow::bail!(
            "No corpus directory given. Pass --corpus, set LECTERN_CORPUS, or add [corpus] path to .lectern.toml"
        );
    };
    let index = open_corpus(&path, args.scan || file.scan())?;
    Ok(Arc::new(index))
}
