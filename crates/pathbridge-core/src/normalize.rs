//! Path canonicalization shared by the translator, the matcher and the
//! resolution pipeline.
//!
//! A normalized path uses `/` separators only, has runs of separators
//! collapsed (a leading `//` network-share marker survives), and always ends
//! with exactly one trailing `/`. Local paths additionally get their drive
//! letter uppercased so `c:\src` and `C:/src` compare equal.

use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Uppercase drive letter when the path starts with `X:/`.
    pub fn drive_letter(&self) -> Option<char> {
        drive_letter(&self.0).map(|c| c.to_ascii_uppercase())
    }

    /// Prefix test on whole segments. An empty prefix never matches.
    pub fn starts_with(&self, prefix: &NormalizedPath) -> bool {
        !prefix.is_empty() && self.0.starts_with(prefix.as_str())
    }

    /// The path without its trailing separator, suitable for filesystem
    /// calls. Roots (`/`, `//`, `C:/`) are returned unchanged.
    pub fn fs_path(&self) -> &str {
        fs_path(&self.0)
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a local-side path, folding the drive letter.
pub fn normalize(path: &str) -> NormalizedPath {
    normalize_with(path, true)
}

/// Normalize a remote-side path. The remote side is never case-folded.
pub fn normalize_remote(path: &str) -> NormalizedPath {
    normalize_with(path, false)
}

fn normalize_with(path: &str, fold_drive: bool) -> NormalizedPath {
    if path.is_empty() {
        return NormalizedPath::default();
    }

    let mut owned = path.to_string();
    if fold_drive && has_drive_prefix(&owned) {
        owned[..1].make_ascii_uppercase();
    }

    let mut out = collapse_separators(&owned.replace('\\', "/"));
    if !out.ends_with('/') {
        out.push('/');
    }
    NormalizedPath(out)
}

/// Collapse runs of `/` to one, keeping a leading `//` as exactly two.
pub(crate) fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    if path.starts_with("//") {
        out.push('/');
    }
    let mut prev_sep = false;
    for ch in path.chars() {
        if ch == '/' {
            if !prev_sep {
                out.push('/');
            }
            prev_sep = true;
        } else {
            out.push(ch);
            prev_sep = false;
        }
    }
    out
}

/// `X:` alone or followed by a separator. A bare `X:` normalizes to `X:/`,
/// so it must fold the same way for normalization to stay idempotent.
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Drive letter of `X:/` or `X:\` paths, as written.
pub(crate) fn drive_letter(path: &str) -> Option<char> {
    let bytes = path.as_bytes();
    if bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
    {
        Some(bytes[0] as char)
    } else {
        None
    }
}

pub(crate) fn fs_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.starts_with("//") { "//" } else { &path[..path.len().min(1)] };
    }
    if trimmed.len() == 2 && trimmed.ends_with(':') {
        return &path[..3];
    }
    trimmed
}

fn split_root(path: &str) -> (&str, &str) {
    if path.starts_with("//") {
        path.split_at(2)
    } else if path.starts_with('/') {
        path.split_at(1)
    } else if drive_letter(path).is_some() {
        path.split_at(3)
    } else {
        ("", path)
    }
}

/// Join `relative` onto `base` and collapse `.` and `..` segments of both
/// without touching the filesystem. `..` never climbs above a root; for a rootless
/// base a leading `..` is preserved.
pub fn join_lexically(base: &str, relative: &str) -> String {
    let base = collapse_separators(&base.replace('\\', "/"));
    let (root, rest) = split_root(&base);
    let mut segments: Vec<&str> = Vec::new();

    let relative = relative.split(|c: char| c == '/' || c == '\\');
    for segment in rest.split('/').chain(relative) {
        match segment {
            "" | "." => {}
            ".." => {
                let can_pop = matches!(segments.last(), Some(s) if *s != "..");
                if can_pop {
                    segments.pop();
                } else if root.is_empty() {
                    segments.push(segment);
                }
            }
            other => segments.push(other),
        }
    }

    format!("{root}{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "",
            "/",
            "c:\\Projects\\App",
            "C:/Projects//app///src",
            "\\\\server\\share\\dir",
            "////server/share",
            "/home/u/",
            "relative\\dir",
            "d:",
        ];
        for sample in samples {
            let once = normalize(sample);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {sample:?}");
            let once = normalize_remote(sample);
            assert_eq!(once, normalize_remote(once.as_str()));
        }
    }

    #[test]
    fn folds_only_the_local_drive_letter() {
        assert_eq!(normalize("c:\\Projects\\App").as_str(), "C:/Projects/App/");
        assert_eq!(normalize_remote("c:/Projects").as_str(), "c:/Projects/");
        assert_eq!(normalize("/Home/User").as_str(), "/Home/User/");
        assert_eq!(normalize("c:").as_str(), "C:/");
        assert_eq!(normalize("c:file").as_str(), "c:file/");
    }

    #[test]
    fn keeps_network_share_prefix() {
        assert_eq!(normalize("\\\\server\\share").as_str(), "//server/share/");
        assert_eq!(normalize("////server//share").as_str(), "//server/share/");
        assert_eq!(normalize("/a//b").as_str(), "/a/b/");
    }

    #[test]
    fn empty_stays_empty() {
        assert!(normalize("").is_empty());
        assert_eq!(normalize("/").as_str(), "/");
    }

    #[test]
    fn drive_letter_and_prefix_checks() {
        let path = normalize("c:/work/app/main.c");
        assert_eq!(path.drive_letter(), Some('C'));
        assert!(path.starts_with(&normalize("C:\\work")));
        assert!(!path.starts_with(&normalize("C:/wo")));
        assert!(!path.starts_with(&NormalizedPath::default()));
    }

    #[test]
    fn fs_path_drops_trailing_separator() {
        assert_eq!(normalize("C:/Projects/app.js").fs_path(), "C:/Projects/app.js");
        assert_eq!(normalize("/").fs_path(), "/");
        assert_eq!(normalize("C:\\").fs_path(), "C:/");
        assert_eq!(normalize("//").fs_path(), "//");
    }

    #[test]
    fn joins_and_resolves_dot_segments() {
        assert_eq!(join_lexically("/home/u/app", "./src/main.c"), "/home/u/app/src/main.c");
        assert_eq!(join_lexically("/home/u/app/", "../lib/x.h"), "/home/u/lib/x.h");
        assert_eq!(join_lexically("/", "../../etc"), "/etc");
        assert_eq!(join_lexically("C:\\work", "..\\x"), "C:/x");
        assert_eq!(join_lexically("build", "../../x"), "../x");
        assert_eq!(join_lexically("/home/u/app/build/..", "./src"), "/home/u/app/src");
    }
}
