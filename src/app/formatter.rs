use crate::app::models::{Entry, ListOptions};
use chrono::{DateTime, Local};

const SIZE_WIDTH: usize = 10;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const UNITS: [&str; 6] = ["K", "M", "G", "T", "P", "E"];

/// Renders entries as output lines.
pub struct EntryFormatter {
    long_format: bool,
    human_readable: bool,
}

impl EntryFormatter {
    pub fn new(opts: &ListOptions) -> Self {
        Self {
            long_format: opts.long_format,
            human_readable: opts.human_readable,
        }
    }

    pub fn format(&self, entry: &Entry) -> String {
        if self.long_format {
            self.format_long(entry)
        } else {
            entry.name.clone()
        }
    }

    /// `<mode> <size> <mtime> <name>`, size right-aligned.
    pub fn format_long(&self, entry: &Entry) -> String {
        let size = if self.human_readable {
            human_size(entry.size)
        } else {
            entry.size.to_string()
        };
        let modified: DateTime<Local> = entry.mod_time.into();

        format!(
            "{} {:>width$} {} {}",
            mode_string(entry.mode),
            size,
            modified.format(TIME_FORMAT),
            entry.name,
            width = SIZE_WIDTH
        )
    }
}

/// Base-1024 size with one decimal, e.g. `1.5K`; below 1024 it is `<n>B`.
pub fn human_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    if size < UNIT {
        return format!("{}B", size);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1}{}", size as f64 / div as f64, UNITS[exp])
}

/// Format mode bits as a POSIX-style string (e.g., "drwxr-xr-x").
pub fn mode_string(mode: u32) -> String {
    let kind = match mode & 0o170000 {
        0o040000 => 'd',
        0o120000 => 'l',
        0o010000 => 'p',
        0o140000 => 's',
        0o060000 => 'b',
        0o020000 => 'c',
        _ => '-',
    };

    let mut s = String::with_capacity(10);
    s.push(kind);
    // (shift, special bit, exec char when special is set with/without x)
    for (shift, special, set, unset) in [
        (6, 0o4000, 's', 'S'),
        (3, 0o2000, 's', 'S'),
        (0, 0o1000, 't', 'T'),
    ] {
        let bits = (mode >> shift) & 7;
        s.push(if bits & 4 != 0 { 'r' } else { '-' });
        s.push(if bits & 2 != 0 { 'w' } else { '-' });
        let exec = bits & 1 != 0;
        s.push(match (mode & special != 0, exec) {
            (true, true) => set,
            (true, false) => unset,
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    s
}
