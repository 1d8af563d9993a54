use std::path::PathBuf;

use lectern_core::CitationEngine;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub engine: CitationEngine,
    pub corpus_path: Option<PathBuf>,
}
