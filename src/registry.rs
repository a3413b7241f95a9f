//! The docset registry and search engine.
//!
//! A dedicated worker thread exclusively owns every open docset store; the
//! cloneable [`DocsetRegistry`] handle talks to it over a command channel.
//! Query submission is fire-and-forget: each submission bumps a shared
//! generation counter, and a search that observes a newer generation (at
//! start or right before publishing) discards itself silently. Completed
//! snapshots are published over a watch channel the UI subscribes to.

use crate::docset::store::{RESULT_CAP, SymbolRow};
use crate::docset::{Docset, DocsetKind, discover};
use crate::error::{Error, Result};
use crate::search::{SearchQuery, normalize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// One ranked search hit. Plain value type, copied freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Display symbol name, normalized.
    pub name: String,
    /// Containing symbol, when one was recorded or decomposed.
    pub parent_name: Option<String>,
    /// Page path relative to the docset, with `#anchor` when known.
    pub path: String,
    /// Name of the docset this hit came from.
    pub docset: String,
    /// The term that produced this hit, kept for UI highlighting.
    pub query: String,
}

/// The published outcome of one query generation.
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    /// Generation that produced these results; 0 until the first search.
    pub generation: u64,
    /// The term that was searched.
    pub term: String,
    pub results: Vec<SearchResult>,
}

/// Listing entry for a loaded docset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsetInfo {
    pub name: String,
    pub prefix: String,
    pub kind: DocsetKind,
}

enum Command {
    Add {
        path: PathBuf,
        reply: oneshot::Sender<Result<String>>,
    },
    Remove {
        name: String,
    },
    Clear,
    Search {
        raw: String,
        generation: u64,
    },
    Related {
        docset: String,
        path: String,
        reply: oneshot::Sender<Result<Vec<SearchResult>>>,
    },
    Scan {
        root: PathBuf,
        reply: oneshot::Sender<usize>,
    },
    Initialize {
        roots: Vec<PathBuf>,
        reply: oneshot::Sender<usize>,
    },
}

/// Handle to the registry worker. Cheap to clone; the worker exits and closes
/// every store once the last handle is dropped.
#[derive(Debug, Clone)]
pub struct DocsetRegistry {
    commands: mpsc::UnboundedSender<Command>,
    generation: Arc<AtomicU64>,
    shelf: Arc<RwLock<Vec<DocsetInfo>>>,
    snapshot: watch::Receiver<SearchSnapshot>,
}

impl DocsetRegistry {
    /// Spawn the worker thread and return a handle to it.
    pub fn new() -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));
        let shelf = Arc::new(RwLock::new(Vec::new()));
        let (snapshot_tx, snapshot) = watch::channel(SearchSnapshot::default());

        let worker = Worker {
            docsets: HashMap::new(),
            generation: Arc::clone(&generation),
            shelf: Arc::clone(&shelf),
            snapshots: snapshot_tx,
        };
        thread::Builder::new()
            .name("docshelf-registry".to_owned())
            .spawn(move || worker.run(command_rx))
            .expect("failed to spawn registry worker thread");

        Self {
            commands,
            generation,
            shelf,
            snapshot,
        }
    }

    /// Submit a query. Returns the generation assigned to it immediately;
    /// results arrive through [`subscribe`](Self::subscribe). Submitting
    /// implicitly cancels any query still in flight.
    pub fn search(&self, raw: &str) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(Command::Search {
            raw: raw.to_owned(),
            generation,
        });
        generation
    }

    /// Invalidate any in-flight query without submitting a new one.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Load and validate the docset bundle at `path`, replacing (and closing)
    /// any loaded docset with the same name. Returns the docset name.
    ///
    /// This is the one deliberately synchronous hand-off into the worker:
    /// callers usually need the docset loaded before their next step.
    pub async fn add_docset(&self, path: impl Into<PathBuf>) -> Result<String> {
        let path = path.into();
        self.request(|reply| Command::Add { path, reply }).await?
    }

    /// Unload the named docset, closing its store. No-op when not loaded.
    pub fn remove(&self, name: &str) {
        self.send(Command::Remove {
            name: name.to_owned(),
        });
    }

    /// Unload every docset.
    pub fn clear(&self) {
        self.send(Command::Clear);
    }

    /// Discover bundles under `root` and add each; returns how many loaded.
    /// Bundles that fail validation are logged and skipped.
    pub async fn scan_directory(&self, root: impl Into<PathBuf>) -> Result<usize> {
        let root = root.into();
        self.request(|reply| Command::Scan { root, reply }).await
    }

    /// Reset to exactly the docsets found under `roots` plus the bundled
    /// docsets directory next to the executable. Returns how many loaded.
    pub async fn initialize(&self, roots: Vec<PathBuf>) -> Result<usize> {
        self.request(|reply| Command::Initialize { roots, reply })
            .await
    }

    /// Every symbol on the same page as `path` (any `#anchor` is ignored)
    /// in the named docset.
    pub async fn related_symbols(&self, docset: &str, path: &str) -> Result<Vec<SearchResult>> {
        let docset = docset.to_owned();
        let path = path.to_owned();
        self.request(|reply| Command::Related {
            docset,
            path,
            reply,
        })
        .await?
    }

    /// Subscribe to published search snapshots.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.snapshot.clone()
    }

    /// The most recently published result set.
    pub fn last_results(&self) -> Vec<SearchResult> {
        self.snapshot.borrow().results.clone()
    }

    /// Loaded docsets, sorted by name.
    pub fn list(&self) -> Vec<DocsetInfo> {
        self.shelf.read().expect("registry mirror poisoned").clone()
    }

    /// Names of the loaded docsets, sorted.
    pub fn names(&self) -> Vec<String> {
        self.list().into_iter().map(|info| info.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shelf
            .read()
            .expect("registry mirror poisoned")
            .iter()
            .any(|info| info.name == name)
    }

    pub fn count(&self) -> usize {
        self.shelf.read().expect("registry mirror poisoned").len()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("registry worker is gone; command dropped");
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .map_err(|_| Error::WorkerGone)?;
        reply_rx.await.map_err(|_| Error::WorkerGone)
    }
}

impl Default for DocsetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker-side state: the only place docset stores are ever touched.
struct Worker {
    docsets: HashMap<String, Docset>,
    generation: Arc<AtomicU64>,
    shelf: Arc<RwLock<Vec<DocsetInfo>>>,
    snapshots: watch::Sender<SearchSnapshot>,
}

impl Worker {
    fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!("registry worker started");
        while let Some(command) = commands.blocking_recv() {
            match command {
                Command::Add { path, reply } => {
                    let _ = reply.send(self.add_docset(&path));
                }
                Command::Remove { name } => self.remove(&name),
                Command::Clear => self.clear(),
                Command::Search { raw, generation } => self.execute_search(&raw, generation),
                Command::Related {
                    docset,
                    path,
                    reply,
                } => {
                    let _ = reply.send(self.related_symbols(&docset, &path));
                }
                Command::Scan { root, reply } => {
                    let _ = reply.send(self.scan_directory(&root));
                }
                Command::Initialize { roots, reply } => {
                    let _ = reply.send(self.initialize(&roots));
                }
            }
        }
        self.clear();
        debug!("registry worker exited");
    }

    fn add_docset(&mut self, path: &Path) -> Result<String> {
        let docset = Docset::open(path)?;
        let name = docset.name().to_owned();
        if let Some(previous) = self.docsets.remove(&name) {
            debug!(name = %name, "replacing already-loaded docset");
            previous.close();
        }
        self.docsets.insert(name.clone(), docset);
        self.sync_shelf();
        Ok(name)
    }

    fn remove(&mut self, name: &str) {
        if let Some(docset) = self.docsets.remove(name) {
            docset.close();
            self.sync_shelf();
        }
    }

    fn clear(&mut self) {
        for (_, docset) in self.docsets.drain() {
            docset.close();
        }
        self.sync_shelf();
    }

    fn scan_directory(&mut self, root: &Path) -> usize {
        let mut added = 0;
        for bundle in discover::find_bundles(root) {
            match self.add_docset(&bundle) {
                Ok(name) => {
                    debug!(name = %name, "loaded docset from {}", bundle.display());
                    added += 1;
                }
                Err(e) => warn!("skipping bundle {}: {}", bundle.display(), e),
            }
        }
        added
    }

    fn initialize(&mut self, roots: &[PathBuf]) -> usize {
        self.clear();
        let mut added = 0;
        for root in roots {
            added += self.scan_directory(root);
        }
        if let Some(bundled) = discover::bundled_docsets_dir() {
            added += self.scan_directory(&bundled);
        }
        info!("initialized registry with {} docsets", added);
        added
    }

    fn execute_search(&self, raw: &str, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "query superseded before start; skipping");
            return;
        }

        let query = SearchQuery::parse(raw);
        let mut results = Vec::new();
        for docset in self.docsets.values() {
            if !query.matches_docset(docset.prefix()) {
                continue;
            }
            match search_docset(docset, &query) {
                Ok(mut hits) => results.append(&mut hits),
                Err(e) => warn!(
                    docset = docset.name(),
                    "docset search failed, contributing nothing: {}", e
                ),
            }
        }
        results.sort_by_cached_key(ranking_key);

        // A long-running search may have been superseded while it ran; never
        // let it overwrite a newer generation's results.
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(
                generation,
                "query superseded; discarding {} results",
                results.len()
            );
            return;
        }

        let _ = self.snapshots.send(SearchSnapshot {
            generation,
            term: query.term().to_owned(),
            results,
        });
    }

    fn related_symbols(&self, name: &str, path: &str) -> Result<Vec<SearchResult>> {
        let docset = self
            .docsets
            .get(name)
            .ok_or_else(|| Error::DocsetNotFound(name.to_owned()))?;

        let page = path.split('#').next().unwrap_or(path);
        let rows = docset.store().symbols_on_page(page)?;
        Ok(rows
            .into_iter()
            .map(|row| to_result(docset.name(), "", row))
            .collect())
    }

    fn sync_shelf(&self) {
        let mut infos: Vec<DocsetInfo> = self
            .docsets
            .values()
            .map(|docset| DocsetInfo {
                name: docset.name().to_owned(),
                prefix: docset.prefix().to_owned(),
                kind: docset.kind(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        *self.shelf.write().expect("registry mirror poisoned") = infos;
    }
}

/// Two-phase search of one docset: a prefix pass, then, only when the prefix
/// pass left the cap unfilled, a substring pass that excludes everything the
/// prefix pass already matched.
fn search_docset(docset: &Docset, query: &SearchQuery) -> Result<Vec<SearchResult>> {
    let store = docset.store();
    let term = query.sanitized_term();

    let mut rows = store.search(term, None, false)?;
    if rows.len() < RESULT_CAP {
        rows.extend(store.search(term, Some(term), true)?);
    }

    Ok(rows
        .into_iter()
        .map(|row| to_result(docset.name(), query.term(), row))
        .collect())
}

fn to_result(docset: &str, term: &str, row: SymbolRow) -> SearchResult {
    let (name, parent_name) = normalize(&row.name, row.parent.as_deref());
    let path = match row.anchor {
        Some(anchor) if !anchor.is_empty() => format!("{}#{}", row.path, anchor),
        _ => row.path,
    };
    SearchResult {
        name,
        parent_name,
        path,
        docset: docset.to_owned(),
        query: term.to_owned(),
    }
}

/// Global ranking: shortest name first, then case-insensitive name, then
/// docset name, then path. Interleaves hits from all docsets fairly; the
/// stable sort keeps insertion order for full ties.
fn ranking_key(result: &SearchResult) -> (usize, String, String, String) {
    (
        result.name.chars().count(),
        result.name.to_lowercase(),
        result.docset.clone(),
        result.path.clone(),
    )
}
