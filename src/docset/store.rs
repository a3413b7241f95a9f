//! Symbol store adapter: uniform queries over the two known docset index
//! schemas.
//!
//! A `Dash`-style index is a flat `searchIndex(name, type, path)` table. A
//! `ZDash`-style index spreads symbols over a token/metadata/filepath join and
//! keeps the in-page anchor in its own column. Both are exposed through one
//! row shape so the engine never branches on schema.

use super::DocsetKind;
use crate::error::{Error, Result};
use crate::search::query::escape_like;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::warn;

/// Hard ceiling on rows collected per store per phase.
pub const RESULT_CAP: usize = 100;

/// One symbol row in adapter shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRow {
    pub name: String,
    /// Explicit parent, when the schema records one. Neither known schema
    /// does today; separator decomposition fills the gap downstream.
    pub parent: Option<String>,
    pub path: String,
    /// In-page anchor, kept separate by the `ZDash` schema.
    pub anchor: Option<String>,
}

/// An open, read-only handle to one docset's index database.
#[derive(Debug)]
pub struct SymbolStore {
    conn: Connection,
    kind: DocsetKind,
}

impl SymbolStore {
    /// Open the index database and detect which schema it carries.
    pub fn open(index_db: &Path) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidDocset {
            path: index_db.to_path_buf(),
            reason,
        };

        let conn = Connection::open_with_flags(
            index_db,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| invalid(format!("cannot open index database: {e}")))?;

        let kind = detect_kind(&conn)
            .map_err(|e| invalid(format!("cannot inspect index schema: {e}")))?
            .ok_or_else(|| invalid("unrecognized symbol table schema".to_owned()))?;

        Ok(Self { conn, kind })
    }

    /// The schema variant this store dispatches on.
    pub fn kind(&self) -> DocsetKind {
        self.kind
    }

    /// Match symbols by name.
    ///
    /// In prefix mode the term matches names it starts, plus qualified names
    /// where it starts a segment (`%.term%`, `%::term%`, `%/term%`, catching
    /// `django.utils.http` or `archive/tar` style symbols). In substring mode
    /// the term matches anywhere. `not_term` excludes everything the prefix
    /// clause for that term would match, so a substring pass never repeats
    /// the prefix pass. At most [`RESULT_CAP`] rows, ordered by name length,
    /// then case-insensitive name, then path.
    pub fn search(
        &self,
        term: &str,
        not_term: Option<&str>,
        substring: bool,
    ) -> rusqlite::Result<Vec<SymbolRow>> {
        let mut params = like_patterns(term, !substring).to_vec();

        let name_column = match self.kind {
            DocsetKind::Dash => "t.name",
            DocsetKind::ZDash => "ztokenname",
        };

        let exclusion = match not_term {
            Some(not_term) => {
                params.extend(like_patterns(not_term, true));
                format!(" AND NOT {}", match_clause(name_column, 5))
            }
            None => String::new(),
        };

        let sql = match self.kind {
            DocsetKind::Dash => format!(
                "SELECT t.name, NULL, t.path, NULL FROM searchIndex t \
                 WHERE {}{} \
                 ORDER BY length(t.name), lower(t.name) ASC, t.path ASC LIMIT {RESULT_CAP}",
                match_clause(name_column, 1),
                exclusion,
            ),
            DocsetKind::ZDash => format!(
                "SELECT ztoken.ztokenname, NULL, zfilepath.zpath, ztokenmetainformation.zanchor \
                 FROM ztoken \
                 JOIN ztokenmetainformation ON ztoken.zmetainformation = ztokenmetainformation.z_pk \
                 JOIN zfilepath ON ztokenmetainformation.zfile = zfilepath.z_pk \
                 WHERE {}{} \
                 ORDER BY length(ztokenname), lower(ztokenname) ASC, zfilepath.zpath ASC, \
                 ztokenmetainformation.zanchor ASC LIMIT {RESULT_CAP}",
                match_clause(name_column, 1),
                exclusion,
            ),
        };

        self.collect_rows(&sql, &params)
    }

    /// Every symbol whose page matches `page` (an anchor-free path).
    ///
    /// Dash indexes keep anchors inline in the path column, so the page is
    /// matched as a prefix; ZDash paths are anchor-free and match exactly.
    /// No cap, no phases.
    pub fn symbols_on_page(&self, page: &str) -> rusqlite::Result<Vec<SymbolRow>> {
        match self.kind {
            DocsetKind::Dash => self.collect_rows(
                "SELECT t.name, NULL, t.path, NULL FROM searchIndex t \
                 WHERE t.path LIKE ?1 ESCAPE '\\' \
                 ORDER BY length(t.name), lower(t.name) ASC, t.path ASC",
                &[format!("{}%", escape_like(page))],
            ),
            DocsetKind::ZDash => self.collect_rows(
                "SELECT ztoken.ztokenname, NULL, zfilepath.zpath, ztokenmetainformation.zanchor \
                 FROM ztoken \
                 JOIN ztokenmetainformation ON ztoken.zmetainformation = ztokenmetainformation.z_pk \
                 JOIN zfilepath ON ztokenmetainformation.zfile = zfilepath.z_pk \
                 WHERE zfilepath.zpath = ?1 \
                 ORDER BY length(ztokenname), lower(ztokenname) ASC, \
                 ztokenmetainformation.zanchor ASC",
                &[page.to_owned()],
            ),
        }
    }

    /// Release the underlying connection.
    pub(crate) fn close(self) {
        if let Err((_conn, e)) = self.conn.close() {
            warn!("failed to close docset database: {e}");
        }
    }

    fn collect_rows(&self, sql: &str, params: &[String]) -> rusqlite::Result<Vec<SymbolRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(SymbolRow {
                name: row.get(0)?,
                parent: row.get(1)?,
                path: row.get(2)?,
                anchor: row.get(3)?,
            })
        })?;
        rows.collect()
    }
}

/// `(col LIKE ?n ESCAPE '\' OR ... )` over four consecutive placeholders,
/// pairing with the patterns from [`like_patterns`].
fn match_clause(column: &str, first_placeholder: usize) -> String {
    let likes: Vec<String> = (first_placeholder..first_placeholder + 4)
        .map(|n| format!("{column} LIKE ?{n} ESCAPE '\\'"))
        .collect();
    format!("({})", likes.join(" OR "))
}

/// The bare pattern plus the three qualified-name patterns for a sanitized
/// term.
fn like_patterns(term: &str, prefix_mode: bool) -> [String; 4] {
    let bare = if prefix_mode {
        format!("{term}%")
    } else {
        format!("%{term}%")
    };
    [
        bare,
        format!("%.{term}%"),
        format!("%::{term}%"),
        format!("%/{term}%"),
    ]
}

fn detect_kind(conn: &Connection) -> rusqlite::Result<Option<DocsetKind>> {
    let has_table = |name: &str| -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND lower(name) = lower(?1)",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count > 0)
    };

    if has_table("searchIndex")? {
        Ok(Some(DocsetKind::Dash))
    } else if has_table("ZTOKEN")? {
        Ok(Some(DocsetKind::ZDash))
    } else {
        Ok(None)
    }
}
