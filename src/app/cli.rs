use crate::app::models::SortBy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "List directory contents, with brace and glob expansion of arguments"
)]
pub struct Cli {
    /// Files, directories or patterns to list (e.g., 'src/*.rs' 'log{1..3}.txt')
    pub patterns: Vec<String>,

    /// Long format: mode, size, modification time and name
    #[arg(short = 'l', long = "long")]
    pub long: bool,

    /// Include entries whose name starts with '.'
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Scale sizes to K, M, G, ... in long format
    #[arg(short = 'H', long)]
    pub human_readable: bool,

    /// Descend into subdirectories
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Reverse the sort order
    #[arg(short = 'r', long)]
    pub reverse: bool,

    /// Sort key
    #[arg(short = 's', long = "sort", value_enum, value_name = "KEY")]
    pub sort: Option<SortBy>,

    /// Sort by modification time, newest first
    #[arg(short = 't', conflicts_with_all = ["sort", "by_size"])]
    pub by_time: bool,

    /// Sort by size, largest first
    #[arg(short = 'S', conflicts_with = "sort")]
    pub by_size: bool,

    /// With -R, print the whole subtree as one list without per-directory headers
    #[arg(long)]
    pub flat: bool,

    /// Give up after this many milliseconds, keeping what was already printed
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Read defaults from this file instead of ~/.config/lister/config.toml
    #[arg(long, value_name = "PATH", conflicts_with = "no_config")]
    pub config: Option<PathBuf>,

    /// Ignore the defaults file
    #[arg(long)]
    pub no_config: bool,
}

impl Cli {
    /// The sort key chosen on the command line, if any.
    pub fn sort_key(&self) -> Option<SortBy> {
        if self.by_time {
            Some(SortBy::Time)
        } else if self.by_size {
            Some(SortBy::Size)
        } else {
            self.sort
        }
    }
}
