use crate::app::cancel::CancelToken;
use crate::app::error::ListError;
use crate::app::formatter::EntryFormatter;
use crate::app::fs::{FileSystem, LocalFs};
use crate::app::models::{DirChild, ListOptions};
use crate::app::patterns::expand_patterns;
use crate::app::sorter::sort_children;
use std::ffi::OsStr;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Cancellation is polled every this many children while filtering.
const FILTER_CHECK_INTERVAL: usize = 1000;
/// ...and every this many lines while emitting.
const EMIT_CHECK_INTERVAL: usize = 100;

/// Outcome of a run that was not aborted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Lines written for entries (headers and separators not counted).
    pub entries: usize,
    /// Diagnostics written for paths or entries that could not be listed.
    pub errors: usize,
}

impl Summary {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// The two destination streams plus the running tally.
struct Sink<'a> {
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
    summary: Summary,
}

impl Sink<'_> {
    fn entry(&mut self, line: &str) -> io::Result<()> {
        self.summary.entries += 1;
        writeln!(self.out, "{}", line)
    }

    fn header(&mut self, path: impl Display, separate: bool) -> io::Result<()> {
        if separate {
            writeln!(self.out)?;
        }
        writeln!(self.out, "{}:", path)
    }

    fn report(&mut self, path: &Path, message: impl Display) -> io::Result<()> {
        self.summary.errors += 1;
        log::debug!("reported error for {}", path.display());
        writeln!(self.err, "ls: {}: {}", path.display(), message)
    }
}

pub struct Lister<F: FileSystem = LocalFs> {
    opts: ListOptions,
    fs: F,
    formatter: EntryFormatter,
}

impl Lister<LocalFs> {
    pub fn new(opts: ListOptions) -> Self {
        Self::with_fs(opts, LocalFs)
    }
}

impl<F: FileSystem> Lister<F> {
    pub fn with_fs(opts: ListOptions, fs: F) -> Self {
        Self {
            formatter: EntryFormatter::new(&opts),
            opts,
            fs,
        }
    }

    /// Expands `patterns` and lists every resulting path.
    ///
    /// Per-path and per-entry failures go to `err` and are counted in the
    /// returned [`Summary`]. Only a bad pattern, a failing output stream or
    /// cancellation end the run early; lines already written stay written.
    pub fn run(
        &self,
        patterns: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<Summary, ListError> {
        cancel.check()?;

        let patterns = if patterns.is_empty() {
            vec![".".to_string()]
        } else {
            patterns.to_vec()
        };
        let paths = expand_patterns(&patterns)?;

        let mut sink = Sink {
            out,
            err,
            summary: Summary::default(),
        };
        // Headers follow the arguments given, not what a glob grew them into.
        let multiple = patterns.len() > 1;
        for (i, path) in paths.iter().enumerate() {
            cancel.check()?;
            if multiple {
                sink.header(path, i > 0)?;
            }
            self.list_path(Path::new(path), &mut sink, cancel)?;
        }

        log::debug!(
            "listed {} entries from {} path(s), {} error(s)",
            sink.summary.entries,
            paths.len(),
            sink.summary.errors
        );
        Ok(sink.summary)
    }

    fn list_path(&self, path: &Path, sink: &mut Sink<'_>, cancel: &CancelToken) -> Result<(), ListError> {
        cancel.check()?;

        let entry = match self.fs.stat(path) {
            Ok(entry) => entry,
            Err(e) => {
                sink.report(path, e)?;
                return Ok(());
            }
        };

        if !entry.is_dir {
            sink.entry(&self.formatter.format(&entry))?;
            return Ok(());
        }

        if self.opts.recursive && self.opts.flat {
            self.walk_flat(path, sink, cancel)
        } else {
            self.list_directory(path, sink, cancel)
        }
    }

    fn list_directory(&self, dir: &Path, sink: &mut Sink<'_>, cancel: &CancelToken) -> Result<(), ListError> {
        cancel.check()?;
        let names = match self.fs.read_dir(dir) {
            Ok(names) => names,
            Err(e) => {
                sink.report(dir, e)?;
                return Ok(());
            }
        };
        cancel.check()?;

        let mut children = Vec::with_capacity(names.len());
        for (i, name) in names.into_iter().enumerate() {
            if i % FILTER_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }
            let name = match name {
                Ok(name) => name,
                Err(e) => {
                    sink.report(dir, e)?;
                    continue;
                }
            };
            if !self.opts.all_files && is_hidden(&name) {
                continue;
            }
            let path = join_child(dir, &name);
            let info = self.fs.entry_info(&path);
            children.push(DirChild { name, path, info });
        }

        cancel.check()?;
        sort_children(&mut children, self.opts.sort_by, self.opts.reverse);
        cancel.check()?;
        log::trace!("{}: {} visible entries", dir.display(), children.len());

        for (i, child) in children.into_iter().enumerate() {
            if i % EMIT_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }
            let entry = match child.info {
                Ok(entry) => entry,
                Err(e) => {
                    sink.report(&child.path, e)?;
                    continue;
                }
            };
            sink.entry(&self.formatter.format(&entry))?;

            if self.opts.recursive && entry.is_dir {
                sink.header(child.path.display(), true)?;
                self.list_directory(&child.path, sink, cancel)?;
            }
        }

        Ok(())
    }

    /// Recursive listing as one flat walk: the root, then every descendant.
    fn walk_flat(&self, root: &Path, sink: &mut Sink<'_>, cancel: &CancelToken) -> Result<(), ListError> {
        for (i, item) in self.fs.walk(root, self.opts.all_files).enumerate() {
            if i % EMIT_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }
            match item {
                Ok(entry) => sink.entry(&self.formatter.format(&entry))?,
                Err(e) => sink.report(&e.path, &e.message)?,
            }
        }
        Ok(())
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// `dir/name`, except that children of `.` stay bare.
fn join_child(dir: &Path, name: &OsStr) -> PathBuf {
    if dir == Path::new(".") {
        PathBuf::from(name)
    } else {
        dir.join(name)
    }
}
