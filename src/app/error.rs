use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("invalid pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to write output")]
    Output(#[from] std::io::Error),
}

impl ListError {
    /// Cancellation is an aborted run, not a failed one.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A failure met while walking a subtree, tagged with the path it concerns.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct WalkError {
    pub path: PathBuf,
    pub message: String,
}
