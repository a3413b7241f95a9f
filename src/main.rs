use anyhow::Context;
use clap::Parser;
use docshelf::cli::{Cli, Commands};
use docshelf::config::Config;
use docshelf::registry::{DocsetRegistry, SearchResult};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docshelf::tracing::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            docsets,
            limit,
        } => {
            let registry = build_registry(docsets).await?;
            let mut events = registry.subscribe();
            let generation = registry.search(&query);

            // Wait for our generation (or a newer one) to publish.
            let snapshot = loop {
                {
                    let snapshot = events.borrow_and_update();
                    if snapshot.generation >= generation {
                        break snapshot.clone();
                    }
                }
                events
                    .changed()
                    .await
                    .context("registry worker exited before publishing results")?;
            };

            if snapshot.results.is_empty() {
                println!("No results for '{}'", snapshot.term);
                return Ok(());
            }
            for result in snapshot.results.iter().take(limit) {
                println!("{}", format_result(result));
            }
            let shown = snapshot.results.len().min(limit);
            if shown < snapshot.results.len() {
                println!("... and {} more", snapshot.results.len() - shown);
            }
        }
        Commands::List { docsets } => {
            let registry = build_registry(docsets).await?;
            for info in registry.list() {
                println!("{}  (prefix: {}, schema: {})", info.name, info.prefix, info.kind);
            }
        }
        Commands::Related {
            docset,
            path,
            docsets,
        } => {
            let registry = build_registry(docsets).await?;
            let related = registry
                .related_symbols(&docset, &path)
                .await
                .with_context(|| format!("related symbols lookup in '{}'", docset))?;
            for result in &related {
                println!("{}", format_result(result));
            }
        }
    }

    Ok(())
}

/// Build a registry loaded from either the given directory or the configured
/// search roots (plus the bundled docsets next to the executable).
async fn build_registry(override_dir: Option<PathBuf>) -> anyhow::Result<DocsetRegistry> {
    let roots = match override_dir {
        Some(dir) => vec![dir],
        None => Config::load().search_roots(),
    };

    let registry = DocsetRegistry::new();
    let loaded = registry
        .initialize(roots)
        .await
        .context("failed to initialize docset registry")?;
    if loaded == 0 {
        tracing::warn!("no docsets loaded; searches will return nothing");
    }
    Ok(registry)
}

fn format_result(result: &SearchResult) -> String {
    let display = match &result.parent_name {
        Some(parent) => format!("{}.{}", parent, result.name),
        None => result.name.clone(),
    };
    format!("{:<12} {:<40} {}", result.docset, display, result.path)
}
