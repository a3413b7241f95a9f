//! Shared test fixtures: temporary shelves of fixture docsets.
//!
//! Each builder writes a complete `.docset` bundle (directory layout,
//! optional `meta.json`, and a real SQLite index database) in one of the two
//! supported schemas, so tests exercise the exact query paths production
//! uses.

use docshelf::registry::{DocsetRegistry, SearchSnapshot};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding fixture docset bundles.
///
/// Dropping the shelf removes everything; keep it alive for the duration of
/// the test.
pub struct TempShelf {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Helpers used across different integration test crates
impl TempShelf {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a flat-schema bundle at the shelf root.
    /// `symbols` are `(name, type, path)` rows.
    pub fn dash_docset(
        &self,
        dir_name: &str,
        title: Option<&str>,
        symbols: &[(&str, &str, &str)],
    ) -> PathBuf {
        build_dash_docset(&self.root, dir_name, title, symbols)
    }

    /// Build a ZDash-schema bundle at the shelf root.
    /// `symbols` are `(name, type, path, anchor)` rows; an empty anchor is
    /// stored as NULL.
    pub fn zdash_docset(
        &self,
        dir_name: &str,
        title: Option<&str>,
        symbols: &[(&str, &str, &str, &str)],
    ) -> PathBuf {
        build_zdash_docset(&self.root, dir_name, title, symbols)
    }
}

impl Default for TempShelf {
    fn default() -> Self {
        Self::new()
    }
}

fn bundle_skeleton(parent: &Path, dir_name: &str, title: Option<&str>) -> (PathBuf, PathBuf) {
    let bundle = parent.join(format!("{dir_name}.docset"));
    let resources = bundle.join("Contents/Resources");
    std::fs::create_dir_all(&resources).expect("failed to create bundle layout");

    if let Some(title) = title {
        let meta = serde_json::json!({ "name": dir_name, "title": title });
        std::fs::write(bundle.join("meta.json"), meta.to_string())
            .expect("failed to write meta.json");
    }

    let index_db = resources.join("docSet.dsidx");
    (bundle, index_db)
}

#[allow(dead_code)]
pub fn build_dash_docset(
    parent: &Path,
    dir_name: &str,
    title: Option<&str>,
    symbols: &[(&str, &str, &str)],
) -> PathBuf {
    let (bundle, index_db) = bundle_skeleton(parent, dir_name, title);

    let conn = Connection::open(&index_db).expect("failed to create index database");
    conn.execute_batch(
        "CREATE TABLE searchIndex (id INTEGER PRIMARY KEY, name TEXT, type TEXT, path TEXT);",
    )
    .expect("failed to create searchIndex");
    for (name, token_type, path) in symbols {
        conn.execute(
            "INSERT INTO searchIndex (name, type, path) VALUES (?1, ?2, ?3)",
            (name, token_type, path),
        )
        .expect("failed to insert symbol");
    }
    conn.close().expect("failed to close fixture database");

    bundle
}

#[allow(dead_code)]
pub fn build_zdash_docset(
    parent: &Path,
    dir_name: &str,
    title: Option<&str>,
    symbols: &[(&str, &str, &str, &str)],
) -> PathBuf {
    let (bundle, index_db) = bundle_skeleton(parent, dir_name, title);

    let conn = Connection::open(&index_db).expect("failed to create index database");
    conn.execute_batch(
        "CREATE TABLE ztoken (z_pk INTEGER PRIMARY KEY, ztokenname TEXT, \
         ztokentype INTEGER, zmetainformation INTEGER);\n\
         CREATE TABLE ztokenmetainformation (z_pk INTEGER PRIMARY KEY, \
         zfile INTEGER, zanchor TEXT);\n\
         CREATE TABLE zfilepath (z_pk INTEGER PRIMARY KEY, zpath TEXT);\n\
         CREATE TABLE ztokentype (z_pk INTEGER PRIMARY KEY, ztypename TEXT);",
    )
    .expect("failed to create ZDash schema");

    let mut file_ids: HashMap<String, i64> = HashMap::new();
    let mut type_ids: HashMap<String, i64> = HashMap::new();

    for (name, token_type, path, anchor) in symbols {
        let file_id = *file_ids.entry((*path).to_owned()).or_insert_with(|| {
            conn.execute("INSERT INTO zfilepath (zpath) VALUES (?1)", [path])
                .expect("failed to insert file path");
            conn.last_insert_rowid()
        });
        let type_id = *type_ids.entry((*token_type).to_owned()).or_insert_with(|| {
            conn.execute("INSERT INTO ztokentype (ztypename) VALUES (?1)", [token_type])
                .expect("failed to insert token type");
            conn.last_insert_rowid()
        });

        let anchor = if anchor.is_empty() { None } else { Some(*anchor) };
        conn.execute(
            "INSERT INTO ztokenmetainformation (zfile, zanchor) VALUES (?1, ?2)",
            (file_id, anchor),
        )
        .expect("failed to insert token metadata");
        let meta_id = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO ztoken (ztokenname, ztokentype, zmetainformation) VALUES (?1, ?2, ?3)",
            (name, type_id, meta_id),
        )
        .expect("failed to insert token");
    }
    conn.close().expect("failed to close fixture database");

    bundle
}

/// Submit a query and wait until a snapshot for it (or a newer generation)
/// is published.
#[allow(dead_code)]
pub async fn search_and_wait(registry: &DocsetRegistry, query: &str) -> SearchSnapshot {
    let mut events = registry.subscribe();
    let generation = registry.search(query);
    loop {
        {
            let snapshot = events.borrow_and_update();
            if snapshot.generation >= generation {
                return snapshot.clone();
            }
        }
        events
            .changed()
            .await
            .expect("registry worker exited while waiting for results");
    }
}
