use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::CorpusError;

/// File name of the catalog inside a corpus directory.
pub const CATALOG_FILE: &str = "catalog.toml";

/// On-disk corpus catalog (`catalog.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub works: Vec<CatalogEntry>,
}

/// One `[[works]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Text file, relative to the corpus directory.
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Force Gutenberg boilerplate stripping on or off. When unset the markers
    /// are detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_boilerplate: Option<bool>,
}

impl Catalog {
    /// Read `<dir>/catalog.toml`.
    pub fn load(dir: &Path) -> Result<Self, CorpusError> {
        let path = dir.join(CATALOG_FILE);
        if !path.is_file() {
            return Err(CorpusError::CatalogMissing(path));
        }
        let content = std::fs::read_to_string(&path).map_err(|source| CorpusError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| CorpusError::Catalog { path, source })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
