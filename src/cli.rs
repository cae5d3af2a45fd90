//! Command-line arguments.

use bookshelf_config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Catalog the ebooks under a directory tree.
///
/// Scans ROOT for FictionBook files, including those inside zip archives, and
/// stores their metadata (books, authors, genres and keywords) in a SQLite
/// database. Arguments override the configuration file and environment.
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about)]
pub struct Args {
    /// Directory to scan [default: .]
    pub root: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "BOOKSHELF_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database to write to; created if missing
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Number of parse workers [default: 16]
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Capacity of the queue of unparsed documents [default: 50]
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub queue_capacity: Option<u16>,

    /// Capacity of the queue of parsed books [default: 50]
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub book_queue_capacity: Option<u16>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// The log filter to use when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Override configured values with the ones given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.ingest.root = root.clone();
        }
        if let Some(database) = &self.database {
            config.database.path = database.clone();
        }
        if let Some(workers) = self.workers {
            config.ingest.workers = usize::from(workers);
        }
        if let Some(capacity) = self.queue_capacity {
            config.ingest.queue_capacity = usize::from(capacity);
        }
        if let Some(capacity) = self.book_queue_capacity {
            config.ingest.book_queue_capacity = usize::from(capacity);
        }
    }
}
