use crate::app::error::ListError;
use globset::GlobBuilder;
use ignore::WalkBuilder;
use pathdiff::diff_paths;
use std::collections::HashSet;
use std::path::PathBuf;

/// Expands every argument into concrete paths: braces first, then globs.
///
/// A glob without matches keeps its literal text so the stat step can report it.
/// Duplicates are dropped, first occurrence wins.
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<String>, ListError> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        for expanded in expand_braces(pattern) {
            let matches = expand_glob(&expanded)?;
            if matches.is_empty() {
                if seen.insert(expanded.clone()) {
                    result.push(expanded);
                }
                continue;
            }
            for found in matches {
                if seen.insert(found.clone()) {
                    result.push(found);
                }
            }
        }
    }

    if result.is_empty() {
        return Ok(patterns.to_vec());
    }

    log::debug!("expanded {} pattern(s) into {} path(s)", patterns.len(), result.len());
    Ok(result)
}

/// Expands the first balanced `{...}` group, then recurses on what it produced.
///
/// `{a,b}` is a list, `{1..3}` / `{c..a}` are ranges. Unbalanced braces are left alone.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(start) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0usize;
    let mut end = None;
    for (i, c) in pattern[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(end) = end else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..start];
    let body = &pattern[start + 1..end];
    let suffix = &pattern[end + 1..];

    let mut items = Vec::new();
    if body.contains("..") {
        let bounds: Vec<&str> = body.split("..").collect();
        if let [from, to] = bounds.as_slice() {
            items = expand_range(from.trim(), to.trim());
        }
    }
    if items.is_empty() {
        items = split_top_level(body)
            .into_iter()
            .map(|item| item.trim().to_string())
            .collect();
    }

    items
        .iter()
        .flat_map(|item| expand_braces(&format!("{}{}{}", prefix, item, suffix)))
        .collect()
}

fn expand_range(from: &str, to: &str) -> Vec<String> {
    if let (Ok(a), Ok(b)) = (from.parse::<i64>(), to.parse::<i64>()) {
        return if a <= b {
            (a..=b).map(|n| n.to_string()).collect()
        } else {
            (b..=a).rev().map(|n| n.to_string()).collect()
        };
    }

    let mut from_chars = from.chars();
    let mut to_chars = to.chars();
    if let (Some(a), None, Some(b), None) = (
        from_chars.next(),
        from_chars.next(),
        to_chars.next(),
        to_chars.next(),
    ) {
        return if a <= b {
            (a..=b).map(String::from).collect()
        } else {
            (b..=a).rev().map(String::from).collect()
        };
    }

    // Neither numbers nor single characters: keep both ends as literals.
    vec![from.to_string(), to.to_string()]
}

/// Splits on commas that are not nested inside another brace group.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut last = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&body[last..i]);
                last = i + 1;
            }
            _ => {}
        }
    }
    items.push(&body[last..]);
    items
}

/// Braces left after brace expansion are plain characters, not globset alternation.
fn literal_braces(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut escaped = false;
    let mut in_class = false;
    for c in pattern.chars() {
        match c {
            '{' | '}' if !escaped && !in_class => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            '[' if !escaped && !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            _ => out.push(c),
        }
        escaped = c == '\\' && !escaped;
    }
    out
}

fn has_glob_meta(s: &str) -> bool {
    s.chars().any(|c| matches!(c, '*' | '?' | '['))
}

/// Matches a shell-style glob against the filesystem, in lexicographic order.
///
/// Strings without glob metacharacters come back unchanged without any I/O.
/// Unreadable directories are skipped silently, like a shell would.
pub fn expand_glob(pattern: &str) -> Result<Vec<String>, ListError> {
    if !has_glob_meta(pattern) {
        return Ok(vec![pattern.to_string()]);
    }

    let matcher = GlobBuilder::new(&literal_braces(pattern))
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map_err(|source| ListError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    // Walk from the longest literal directory prefix, only as deep as the pattern reaches.
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components.iter().take_while(|c| !has_glob_meta(c)).count();
    let depth = components.len() - literal;
    let joined = components[..literal].join("/");
    let (base, relative) = if literal == 0 {
        (PathBuf::from("."), true)
    } else if joined.is_empty() {
        (PathBuf::from("/"), false)
    } else {
        (PathBuf::from(joined), false)
    };

    let walker = WalkBuilder::new(&base)
        .standard_filters(false)
        .hidden(false)
        .follow_links(true)
        .max_depth(Some(depth))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut matches = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("glob {}: skipping {}", pattern, err);
                continue;
            }
        };
        if entry.depth() != depth {
            continue;
        }

        let candidate = if relative {
            match diff_paths(entry.path(), &base) {
                Some(path) => path,
                None => continue,
            }
        } else {
            entry.path().to_path_buf()
        };
        let candidate = candidate.to_string_lossy().into_owned();
        if matcher.is_match(&candidate) {
            matches.push(candidate);
        }
    }

    log::trace!("glob {} matched {} path(s)", pattern, matches.len());
    Ok(matches)
}
