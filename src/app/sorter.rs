use crate::app::models::{DirChild, Entry, SortBy};
use std::cmp::Ordering;

/// Orders one directory's children in place. `reverse` flips the whole comparison.
pub fn sort_children(children: &mut [DirChild], sort_by: SortBy, reverse: bool) {
    children.sort_by(|a, b| {
        let ord = compare(a, b, sort_by);
        if reverse {
            ord.reverse()
        } else {
            ord
        }
    });
}

pub fn compare(a: &DirChild, b: &DirChild, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Name => a.name.cmp(&b.name),
        SortBy::Time => by_key(a, b, |e| e.mod_time),
        SortBy::Size => by_key(a, b, |e| e.size),
    }
}

/// Larger key first, ties broken by name.
///
/// Children without metadata only compare by name, grouped after the rest so
/// the order stays total.
fn by_key<K: Ord>(a: &DirChild, b: &DirChild, key: impl Fn(&Entry) -> K) -> Ordering {
    match (a.info.as_ref().ok(), b.info.as_ref().ok()) {
        (Some(x), Some(y)) => key(y).cmp(&key(x)).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}
