use crate::app::error::WalkError;
use crate::app::models::Entry;
use ignore::WalkBuilder;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The filesystem operations the lister consumes.
///
/// Errors are surfaced as-is; the lister decides how far each one reaches.
pub trait FileSystem {
    /// Metadata for `path`, following symlinks.
    fn stat(&self, path: &Path) -> io::Result<Entry>;

    /// Metadata for a directory child, without following a final symlink.
    fn entry_info(&self, path: &Path) -> io::Result<Entry>;

    /// Names of the immediate children of `path`, in no particular order.
    /// An `Err` item is a child that could not be read; siblings are unaffected.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<OsString>>>;

    /// The root and every descendant in lexicographic depth-first order.
    /// Hidden descendants are pruned unless `all_files` is set.
    fn walk(&self, root: &Path, all_files: bool) -> Box<dyn Iterator<Item = Result<Entry, WalkError>>>;
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn stat(&self, path: &Path) -> io::Result<Entry> {
        let meta = fs::metadata(path)?;
        Ok(Entry::from_metadata(path.to_path_buf(), &meta))
    }

    fn entry_info(&self, path: &Path) -> io::Result<Entry> {
        let meta = fs::symlink_metadata(path)?;
        Ok(Entry::from_metadata(path.to_path_buf(), &meta))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<OsString>>> {
        let names = fs::read_dir(path)?
            .map(|item| item.map(|e| e.file_name()))
            .collect();
        Ok(names)
    }

    fn walk(&self, root: &Path, all_files: bool) -> Box<dyn Iterator<Item = Result<Entry, WalkError>>> {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(!all_files)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let root = root.to_path_buf();
        Box::new(walker.map(move |result| {
            let entry = result.map_err(|e| walk_error(e, &root))?;
            let meta = entry.metadata().map_err(|e| walk_error(e, entry.path()))?;
            Ok(Entry::from_metadata(entry.path().to_path_buf(), &meta))
        }))
    }
}

/// Pull the offending path out of an `ignore` error so it can be reported as `ls: <path>: ...`.
fn walk_error(err: ignore::Error, fallback: &Path) -> WalkError {
    match err {
        ignore::Error::WithPath { path, err } => WalkError {
            path,
            message: err.to_string(),
        },
        ignore::Error::WithDepth { err, .. } => walk_error(*err, fallback),
        ignore::Error::Loop { child, .. } => WalkError {
            path: child,
            message: "filesystem loop detected".to_string(),
        },
        other => WalkError {
            path: PathBuf::from(fallback),
            message: other.to_string(),
        },
    }
}
