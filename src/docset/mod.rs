//! Docset bundles: validation, metadata, and schema detection.

pub mod discover;
pub mod store;

use crate::error::{Error, Result};
use serde::Deserialize;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use store::SymbolStore;
use tracing::debug;

/// Relative location of the index database inside a bundle.
const INDEX_DB: &str = "Contents/Resources/docSet.dsidx";

/// Known docset index schemas. Adding support for a new schema means adding a
/// variant here and its query construction in [`store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocsetKind {
    /// Flat `searchIndex` symbol table.
    Dash,
    /// Normalized token/metadata/filepath/tokentype join.
    ZDash,
}

impl fmt::Display for DocsetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dash => write!(f, "dash"),
            Self::ZDash => write!(f, "zdash"),
        }
    }
}

/// Optional `meta.json` at the bundle root.
#[derive(Debug, Default, Deserialize)]
struct DocsetMeta {
    name: Option<String>,
    title: Option<String>,
}

impl DocsetMeta {
    fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(meta) => meta,
            Err(e) => {
                debug!("ignoring malformed meta.json at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// One loaded docset: identity plus an exclusively owned store handle.
///
/// The registry keys docsets by [`name`](Self::name) and matches query
/// filters against [`prefix`](Self::prefix). Dropping a `Docset` without
/// calling [`close`](Self::close) leaks nothing, but removal paths close
/// explicitly so store errors get logged.
#[derive(Debug)]
pub struct Docset {
    name: String,
    prefix: String,
    store: SymbolStore,
}

impl Docset {
    /// Open and validate the bundle at `path`.
    ///
    /// The bundle must be a directory holding an index database at
    /// `Contents/Resources/docSet.dsidx` in one of the known schemas. Name
    /// and prefix come from `meta.json` when present, falling back to the
    /// directory stem.
    pub fn open(path: &Path) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidDocset {
            path: path.to_path_buf(),
            reason: reason.to_owned(),
        };

        if !path.is_dir() {
            return Err(invalid("not a directory"));
        }

        let index_db = path.join(INDEX_DB);
        if !index_db.is_file() {
            return Err(invalid("no docSet.dsidx index database"));
        }

        let meta = DocsetMeta::load(&path.join("meta.json"));
        let name = meta
            .name
            .filter(|name| !name.is_empty())
            .or_else(|| {
                path.file_stem()
                    .and_then(OsStr::to_str)
                    .map(str::to_owned)
            })
            .ok_or_else(|| invalid("cannot determine docset name"))?;
        let prefix = meta
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| name.clone())
            .to_lowercase();

        let store = SymbolStore::open(&index_db)?;
        debug!(name = %name, kind = %store.kind(), "opened docset");

        Ok(Self {
            name,
            prefix,
            store,
        })
    }

    /// Unique registry key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short lowercase identifier matched against query filters.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn kind(&self) -> DocsetKind {
        self.store.kind()
    }

    /// The store adapter for this docset's schema.
    pub fn store(&self) -> &SymbolStore {
        &self.store
    }

    /// Release the backing store explicitly.
    pub fn close(self) {
        self.store.close();
    }
}
