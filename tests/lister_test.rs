use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use lister::app::error::WalkError;
use lister::app::{CancelToken, Entry, FileSystem, ListError, ListOptions, Lister, SortBy, Summary};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Write `names` as small files into `root`, creating parent directories.
fn touch(root: &Path, names: &[&str]) {
    for name in names {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, name.as_bytes()).unwrap();
    }
}

fn list<F: FileSystem>(lister: &Lister<F>, patterns: &[String]) -> (String, String, Summary) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let summary = lister
        .run(patterns, &mut out, &mut err, &CancelToken::new())
        .unwrap();
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
        summary,
    )
}

fn list_local(opts: ListOptions, patterns: &[String]) -> (String, String, Summary) {
    list(&Lister::new(opts), patterns)
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

/// In-memory filesystem; `broken` entries fail their metadata lookup.
#[derive(Default)]
struct MemFs {
    nodes: BTreeMap<PathBuf, MemNode>,
}

struct MemNode {
    dir: bool,
    size: u64,
    broken: bool,
    unreadable: bool,
}

impl MemFs {
    fn dir(mut self, path: &str) -> Self {
        self.nodes.insert(
            path.into(),
            MemNode { dir: true, size: 0, broken: false, unreadable: false },
        );
        self
    }

    fn locked_dir(mut self, path: &str) -> Self {
        self.nodes.insert(
            path.into(),
            MemNode { dir: true, size: 0, broken: false, unreadable: true },
        );
        self
    }

    fn file(mut self, path: &str, size: u64) -> Self {
        self.nodes.insert(
            path.into(),
            MemNode { dir: false, size, broken: false, unreadable: false },
        );
        self
    }

    fn broken(mut self, path: &str) -> Self {
        self.nodes.insert(
            path.into(),
            MemNode { dir: false, size: 0, broken: true, unreadable: false },
        );
        self
    }

    fn entry(&self, path: &Path) -> io::Result<Entry> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
        if node.broken {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        Ok(Entry {
            path: path.to_path_buf(),
            name: path.file_name().unwrap().to_string_lossy().into_owned(),
            is_dir: node.dir,
            size: node.size,
            mod_time: SystemTime::UNIX_EPOCH,
            mode: if node.dir { 0o040755 } else { 0o100644 },
        })
    }
}

impl FileSystem for MemFs {
    fn stat(&self, path: &Path) -> io::Result<Entry> {
        self.entry(path)
    }

    fn entry_info(&self, path: &Path) -> io::Result<Entry> {
        self.entry(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<OsString>>> {
        if self.nodes.get(path).map_or(false, |n| n.unreadable) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        // Reverse order so sorting is actually exercised.
        Ok(self
            .nodes
            .keys()
            .rev()
            .filter(|p| p.parent() == Some(path))
            .map(|p| Ok(p.file_name().unwrap().to_os_string()))
            .collect())
    }

    fn walk(&self, root: &Path, _all_files: bool) -> Box<dyn Iterator<Item = Result<Entry, WalkError>>> {
        let items: Vec<_> = self
            .nodes
            .keys()
            .filter(|p| p.starts_with(root))
            .map(|p| {
                self.entry(p).map_err(|e| WalkError {
                    path: p.clone(),
                    message: e.to_string(),
                })
            })
            .collect();
        Box::new(items.into_iter())
    }
}

/// Collects output and trips the token on the first write.
struct CancelOnWrite {
    buf: Vec<u8>,
    token: CancelToken,
}

impl Write for CancelOnWrite {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.token.cancel();
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Local filesystem
// ---------------------------------------------------------------------------

#[test]
fn single_file_is_one_line_whatever_the_flags() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["only.txt"]);
    let target = vec![arg(&dir.path().join("only.txt"))];

    for (recursive, all_files) in [(false, false), (true, false), (false, true), (true, true)] {
        let opts = ListOptions { recursive, all_files, ..ListOptions::default() };
        let (out, err, summary) = list_local(opts, &target);
        assert_eq!(out, "only.txt\n");
        assert!(err.is_empty());
        assert_eq!(summary, Summary { entries: 1, errors: 0 });
    }
}

#[test]
fn hidden_entries_are_skipped_by_default() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &[".hidden", "b.txt", "a.txt"]);

    let (out, _, _) = list_local(ListOptions::default(), &[arg(dir.path())]);
    assert_eq!(out, "a.txt\nb.txt\n");
}

#[test]
fn all_files_with_reverse_inverts_full_order() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &[".hidden", "b.txt", "a.txt"]);

    let opts = ListOptions { all_files: true, reverse: true, ..ListOptions::default() };
    let (out, _, _) = list_local(opts, &[arg(dir.path())]);
    assert_eq!(out, "b.txt\na.txt\n.hidden\n");
}

#[test]
fn recursive_listing_nests_under_headers() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.txt", "sub/inner.txt", ".secret/skipped.txt"]);

    let opts = ListOptions { recursive: true, ..ListOptions::default() };
    let (out, err, summary) = list_local(opts, &[arg(dir.path())]);

    let expected = format!("a.txt\nsub\n\n{}:\ninner.txt\n", dir.path().join("sub").display());
    assert_eq!(out, expected);
    assert!(err.is_empty());
    assert_eq!(summary.entries, 3);
}

#[test]
fn multiple_paths_get_headers_and_separators() {
    let one = tempfile::tempdir().unwrap();
    let two = tempfile::tempdir().unwrap();
    touch(one.path(), &["x"]);
    touch(two.path(), &["y"]);

    let (out, _, _) = list_local(ListOptions::default(), &[arg(one.path()), arg(two.path())]);
    let expected = format!("{}:\nx\n\n{}:\ny\n", one.path().display(), two.path().display());
    assert_eq!(out, expected);
}

#[test]
fn missing_path_is_reported_and_the_rest_continues() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["here.txt"]);
    let missing = arg(&dir.path().join("gone.txt"));
    let present = arg(&dir.path().join("here.txt"));

    let (out, err, summary) = list_local(ListOptions::default(), &[missing.clone(), present]);

    assert!(out.ends_with("here.txt\n"));
    assert!(err.starts_with(&format!("ls: {}: ", missing)), "{}", err);
    assert_eq!(err.lines().count(), 1);
    assert_eq!(summary.errors, 1);
    assert!(!summary.is_clean());
}

#[test]
fn long_format_with_human_sizes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("blob"), vec![0u8; 1536]).unwrap();

    let opts = ListOptions { long_format: true, human_readable: true, ..ListOptions::default() };
    let (out, _, _) = list_local(opts, &[arg(dir.path())]);

    let line = out.lines().next().unwrap();
    let fields: Vec<&str> = line.split_whitespace().collect();
    assert!(fields[0].starts_with('-'), "{}", line);
    assert_eq!(fields[1], "1.5K");
    assert_eq!(fields.last(), Some(&"blob"));
}

#[test]
fn size_sort_puts_largest_first() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("small"), vec![0u8; 1]).unwrap();
    fs::write(dir.path().join("large"), vec![0u8; 100]).unwrap();
    fs::write(dir.path().join("medium"), vec![0u8; 10]).unwrap();

    let opts = ListOptions { sort_by: SortBy::Size, ..ListOptions::default() };
    let (out, _, _) = list_local(opts, &[arg(dir.path())]);
    assert_eq!(out, "large\nmedium\nsmall\n");

    let opts = ListOptions { sort_by: SortBy::Size, reverse: true, ..ListOptions::default() };
    let (out, _, _) = list_local(opts, &[arg(dir.path())]);
    assert_eq!(out, "small\nmedium\nlarge\n");
}

#[test]
fn one_glob_argument_lists_matches_without_headers() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.txt", "b.txt", "c.md"]);
    let root = dir.path().display();

    let (out, err, summary) = list_local(ListOptions::default(), &[format!("{}/*.txt", root)]);
    assert_eq!(out, "a.txt\nb.txt\n");
    assert!(err.is_empty());
    assert_eq!(summary.entries, 2);
}

#[test]
fn each_argument_gets_a_header_when_there_are_several() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.txt", "b.txt", "c.md"]);
    let root = dir.path().display();

    let patterns = vec![format!("{}/*.txt", root), format!("{}/c.md", root)];
    let (out, _, _) = list_local(ListOptions::default(), &patterns);
    let expected = format!(
        "{root}/a.txt:\na.txt\n\n{root}/b.txt:\nb.txt\n\n{root}/c.md:\nc.md\n",
        root = root
    );
    assert_eq!(out, expected);
}

#[cfg(unix)]
#[test]
fn names_that_are_not_utf8_are_still_listed() {
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let odd = std::ffi::OsStr::from_bytes(b"bad\xffname");
    if fs::write(dir.path().join(odd), "x").is_err() {
        // Some filesystems refuse non-UTF-8 names outright.
        return;
    }
    touch(dir.path(), &["ok.txt"]);

    let (out, err, summary) = list_local(ListOptions::default(), &[arg(dir.path())]);
    assert_eq!(out, "bad\u{FFFD}name\nok.txt\n");
    assert!(err.is_empty(), "{}", err);
    assert_eq!(summary, Summary { entries: 2, errors: 0 });
}

#[test]
fn brace_literals_that_do_not_exist_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["log1.txt"]);
    let root = dir.path().display();

    let (out, err, summary) = list_local(ListOptions::default(), &[format!("{}/log{{1..2}}.txt", root)]);
    assert_eq!(out, "log1.txt\n");
    assert!(err.starts_with(&format!("ls: {}/log2.txt: ", root)), "{}", err);
    assert_eq!(summary.errors, 1);
}

#[test]
fn bad_glob_aborts_before_output() {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = Lister::new(ListOptions::default()).run(
        &["[oops".to_string()],
        &mut out,
        &mut err,
        &CancelToken::new(),
    );
    assert!(matches!(result, Err(ListError::Pattern { .. })));
    assert!(out.is_empty() && err.is_empty());
}

#[test]
fn flat_walk_lists_subtree_without_headers() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["tree/a.txt", "tree/sub/b.txt", "tree/.hid/x"]);

    let opts = ListOptions { recursive: true, flat: true, ..ListOptions::default() };
    let (out, err, _) = list_local(opts, &[arg(&dir.path().join("tree"))]);
    assert_eq!(out, "tree\na.txt\nsub\nb.txt\n");
    assert!(err.is_empty());

    let opts = ListOptions { recursive: true, flat: true, all_files: true, ..ListOptions::default() };
    let (out, _, _) = list_local(opts, &[arg(&dir.path().join("tree"))]);
    assert_eq!(out, "tree\n.hid\nx\na.txt\nsub\nb.txt\n");
}

// ---------------------------------------------------------------------------
// Injected failures
// ---------------------------------------------------------------------------

#[test]
fn unreadable_entry_is_reported_and_siblings_listed() {
    let mem = MemFs::default()
        .dir("/d")
        .file("/d/a", 1)
        .broken("/d/b")
        .file("/d/c", 1);
    let lister = Lister::with_fs(ListOptions::default(), mem);

    let (out, err, summary) = list(&lister, &["/d".to_string()]);
    assert_eq!(out, "a\nc\n");
    assert_eq!(err, "ls: /d/b: permission denied\n");
    assert_eq!(summary, Summary { entries: 2, errors: 1 });
}

#[test]
fn unreadable_subdirectory_does_not_stop_the_parent() {
    let mem = MemFs::default()
        .dir("/d")
        .locked_dir("/d/locked")
        .file("/d/z", 1);
    let opts = ListOptions { recursive: true, ..ListOptions::default() };
    let lister = Lister::with_fs(opts, mem);

    let (out, err, summary) = list(&lister, &["/d".to_string()]);
    assert_eq!(out, "locked\n\n/d/locked:\nz\n");
    assert_eq!(err, "ls: /d/locked: permission denied\n");
    assert_eq!(summary.errors, 1);
}

#[test]
fn time_sort_with_broken_metadata_still_lists_the_rest() {
    let mem = MemFs::default()
        .dir("/d")
        .file("/d/b", 1)
        .broken("/d/a")
        .file("/d/c", 1);
    let opts = ListOptions { sort_by: SortBy::Time, ..ListOptions::default() };
    let lister = Lister::with_fs(opts, mem);

    let (out, err, _) = list(&lister, &["/d".to_string()]);
    // equal timestamps fall back to name order
    assert_eq!(out, "b\nc\n");
    assert_eq!(err, "ls: /d/a: permission denied\n");
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn cancellation_stops_at_the_next_checkpoint() {
    let mut mem = MemFs::default().dir("/big");
    for i in 0..250 {
        mem = mem.file(&format!("/big/f{:03}", i), 1);
    }
    let lister = Lister::with_fs(ListOptions::default(), mem);

    let token = CancelToken::new();
    let mut out = CancelOnWrite { buf: Vec::new(), token: token.clone() };
    let mut err = Vec::new();
    let result = lister.run(&["/big".to_string()], &mut out, &mut err, &token);

    assert!(matches!(result, Err(ListError::Cancelled)));
    let text = String::from_utf8(out.buf).unwrap();
    assert_eq!(text.lines().count(), 100);
    assert!(text.starts_with("f000\n"));
    assert!(err.is_empty(), "cancellation is not a diagnostic");
}

#[test]
fn cancelled_token_writes_nothing() {
    let mem = MemFs::default().dir("/d").file("/d/a", 1);
    let lister = Lister::with_fs(ListOptions::default(), mem);

    let token = CancelToken::new();
    token.cancel();
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = lister.run(&["/d".to_string()], &mut out, &mut err, &token);

    assert!(result.unwrap_err().is_cancelled());
    assert!(out.is_empty() && err.is_empty());
}
