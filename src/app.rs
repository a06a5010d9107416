// Declare modules
pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod formatter;
pub mod fs;
pub mod lister;
pub mod models;
pub mod patterns;
pub mod sorter;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::time::Duration;

pub use self::cancel::CancelToken;
pub use self::error::ListError;
pub use self::fs::{FileSystem, LocalFs};
pub use self::lister::{Lister, Summary};
pub use self::models::{Entry, ListOptions, SortBy};

use self::cli::Cli;
use self::config::resolve_config;

/// Exit status when some path or entry could not be listed.
const EXIT_PARTIAL: u8 = 1;
/// Exit status when the run was cancelled by its timeout.
const EXIT_CANCELLED: u8 = 130;

/// Parses the command line, lists what it names and maps the outcome to an exit status.
pub fn run() -> Result<ExitCode> {
    // 1. Parse Args
    let args = Cli::parse();

    // 2. Resolve Configuration
    let options = resolve_config(&args)?;

    // 3. Cancellation
    let cancel = match args.timeout_ms {
        Some(ms) => CancelToken::with_timeout(Duration::from_millis(ms)),
        None => CancelToken::new(),
    };

    // 4. List
    let lister = Lister::new(options);
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = BufWriter::new(stdout.lock());
    let mut err = stderr.lock();

    let outcome = lister.run(&args.patterns, &mut out, &mut err, &cancel);
    out.flush().context("Failed to flush output")?;

    match outcome {
        Ok(summary) if summary.is_clean() => Ok(ExitCode::SUCCESS),
        Ok(summary) => {
            log::info!("{} path(s) could not be listed", summary.errors);
            Ok(ExitCode::from(EXIT_PARTIAL))
        }
        Err(e) if e.is_cancelled() => {
            log::warn!("listing cancelled after {:?}", args.timeout_ms.map(Duration::from_millis));
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(e) => Err(e.into()),
    }
}
