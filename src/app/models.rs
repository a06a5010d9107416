use serde::Deserialize;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

/// Key used to order the children of one directory.
///
/// `Time` and `Size` put the most recent / largest entry first, the way
/// `ls -t` and `ls -S` do. `reverse` flips whichever order is chosen.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Time,
    Size,
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortBy::Name => "name",
            SortBy::Time => "time",
            SortBy::Size => "size",
        };
        f.write_str(s)
    }
}

/// Represents the final configuration after merging the defaults file and CLI args.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub long_format: bool,
    pub all_files: bool,
    pub human_readable: bool,
    pub recursive: bool,
    pub reverse: bool,
    pub sort_by: SortBy,
    /// With `recursive`, walk the subtree as one flat list instead of per-directory blocks.
    pub flat: bool,
}

/// A single filesystem item, alive only while its line is produced.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub mod_time: SystemTime,
    /// Raw `st_mode` bits (type and permissions).
    pub mode: u32,
}

impl Entry {
    pub fn from_metadata(path: PathBuf, meta: &std::fs::Metadata) -> Self {
        let name = base_name(&path);
        Self {
            name,
            is_dir: meta.is_dir(),
            size: meta.len(),
            mod_time: meta.modified().unwrap_or_else(|e| {
                log::debug!("no modification time for {}: {}", path.display(), e);
                SystemTime::UNIX_EPOCH
            }),
            mode: raw_mode(meta),
            path,
        }
    }
}

/// One child of a directory being listed, with its metadata if it could be read.
#[derive(Debug)]
pub struct DirChild {
    /// Raw name as read from the directory; only display converts it.
    pub name: OsString,
    pub path: PathBuf,
    pub info: std::io::Result<Entry>,
}

/// Last path component, or the whole path when there is none (`/`, `..`).
pub fn base_name(path: &std::path::Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    }
}

#[cfg(unix)]
fn raw_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.mode()
}

#[cfg(not(unix))]
fn raw_mode(meta: &std::fs::Metadata) -> u32 {
    let kind = if meta.is_dir() { 0o040000 } else { 0o100000 };
    let perms = if meta.permissions().readonly() { 0o444 } else { 0o644 };
    kind | perms
}
