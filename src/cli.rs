use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docshelf")]
#[command(about = "Search offline documentation docsets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search every loaded docset; prefix the query with `<docset>:` to
    /// filter (e.g. `go:fprintf`)
    Search {
        query: String,
        /// Directory to scan for docsets instead of the configured ones
        #[arg(short, long)]
        docsets: Option<PathBuf>,
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// List the loaded docsets
    List {
        #[arg(short, long)]
        docsets: Option<PathBuf>,
    },
    /// Show every symbol on the same page as a search result
    Related {
        /// Docset name the result came from
        docset: String,
        /// Page path of the result (an `#anchor` suffix is ignored)
        path: String,
        #[arg(short, long)]
        docsets: Option<PathBuf>,
    },
}
