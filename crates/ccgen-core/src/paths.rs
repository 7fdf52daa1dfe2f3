//! Slash-separated path helpers.
//!
//! Bazel packages, labels and `#include` spellings are always `/`-separated
//! regardless of the host platform, so these helpers work on `&str` instead
//! of `std::path`. An empty string denotes the repository root.

/// Lexically normalize a path: collapse repeated separators, drop `.`
/// segments and resolve `..` against preceding segments.
///
/// Returns `"."` for an empty relative result, matching POSIX conventions.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join path elements, ignoring empty ones, and clean the result.
///
/// Joining only empty elements (or the root marker `.`) yields `""`.
pub fn join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let joined = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        return String::new();
    }
    let cleaned = clean(&joined);
    if cleaned == "." { String::new() } else { cleaned }
}

/// Parent directory of a path, `""` for top-level entries.
pub fn dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last path segment.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Path of `target` relative to `base`, if `target` lies strictly beneath it.
///
/// Both arguments are cleaned first. An empty `base` (or `.`) is the
/// repository root, under which every relative path lies.
pub fn rel(base: &str, target: &str) -> Option<String> {
    let base = clean(base);
    let target = clean(target);
    if target == "." || target.starts_with("../") || target == ".." {
        return None;
    }
    if base == "." {
        return Some(target);
    }
    target
        .strip_prefix(base.as_str())
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean(""), ".");
        assert_eq!(clean("a//b/./c/"), "a/b/c");
        assert_eq!(clean("a/../../b"), "../b");
        assert_eq!(clean("/a/../.."), "/");
        assert_eq!(clean("./x.h"), "x.h");
    }

    #[test]
    fn test_join() {
        assert_eq!(join(["", "a.h"]), "a.h");
        assert_eq!(join(["pkg", "."]), "pkg");
        assert_eq!(join(["", ""]), "");
        assert_eq!(join(["lib", "../inc/x.h"]), "inc/x.h");
    }

    #[test]
    fn test_rel() {
        assert_eq!(rel("", "a/b.h").as_deref(), Some("a/b.h"));
        assert_eq!(rel("pkg/include", "pkg/include/a/b.h").as_deref(), Some("a/b.h"));
        assert_eq!(rel("pkg/inc", "pkg/include/b.h"), None);
        assert_eq!(rel("pkg", "pkg"), None);
        assert_eq!(rel("pkg", "other/b.h"), None);
    }

    #[test]
    fn test_dir_and_file_name() {
        assert_eq!(dir("a/b/c.h"), "a/b");
        assert_eq!(dir("c.h"), "");
        assert_eq!(file_name("a/b/c.h"), "c.h");
    }
}
