//! Detection of file references in free-form terminal output.
//!
//! Four grammars are recognized:
//!
//! - `unix`: `/abs/path` or `~/path`, optionally `:line[:column]`
//! - `relative`: `./path` or `../path`, optionally `:line[:column]`
//! - `cmake`: `file.ext(line[,column]):`, the MSVC and CMake style
//! - `make`: `file:line[:column]:` followed by whitespace, end of text or
//!   `error`/`warning`/`note`, the GCC and Clang style
//!
//! URLs are located first and any candidate overlapping one is dropped, so
//! `https://host/a/b.js` never yields a filesystem reference.

use crate::error::CoreError;
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::LazyLock;

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b[A-Za-z][A-Za-z0-9+.\-]*://[^\s"'<>`]+|\bwww\.[^\s"'<>`]+"#).expect("valid regex")
});

static UNIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\s'"`(\[{<=,;|])((?:~/|/)[^\s:()"'`]+)(?::(\d+))?(?::(\d+))?"#)
        .expect("valid regex")
});

static RELATIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\s'"`(\[{<=,;|])(\.{1,2}/[^\s:()"'`]+)(?::(\d+))?(?::(\d+))?"#)
        .expect("valid regex")
});

static CMAKE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[\s'"`\[{<=,;|])((?:[A-Za-z]:)?[\w.~/\\+\-]*\.[\w+\-]+)\((\d+)(?:,\s*(\d+))?\):"#,
    )
    .expect("valid regex")
});

static MAKE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[\s'"`\[{<=,;|])((?:\.{1,2}/|[A-Za-z]:)?[\w.~/\\+\-]+):(\d+)(?::(\d+))?:"#,
    )
    .expect("valid regex")
});

const MAKE_SEVERITIES: [&str; 3] = ["error", "warning", "note"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    Unix,
    Relative,
    Cmake,
    Make,
}

impl Grammar {
    pub const ALL: [Grammar; 4] = [Grammar::Unix, Grammar::Relative, Grammar::Cmake, Grammar::Make];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grammar::Unix => "unix",
            Grammar::Relative => "relative",
            Grammar::Cmake => "cmake",
            Grammar::Make => "make",
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            Grammar::Unix => &UNIX_REGEX,
            Grammar::Relative => &RELATIVE_REGEX,
            Grammar::Cmake => &CMAKE_REGEX,
            Grammar::Make => &MAKE_REGEX,
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grammar {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unix" => Ok(Grammar::Unix),
            "relative" => Ok(Grammar::Relative),
            "cmake" => Ok(Grammar::Cmake),
            "make" => Ok(Grammar::Make),
            other => Err(CoreError::Invalid(format!("unknown reference grammar: {other}"))),
        }
    }
}

/// A path-like substring found in scanned text. `start` and `length` are
/// byte offsets covering the whole link text, `:line:col` suffix included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathReference {
    pub raw_path: String,
    pub start: usize,
    pub length: usize,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub grammar: Grammar,
    pub is_absolute_style: bool,
    pub is_relative_style: bool,
}

impl PathReference {
    pub fn span(&self) -> Range<usize> {
        self.start..self.start + self.length
    }

    /// Last path component, split on either separator.
    pub fn file_name(&self) -> &str {
        self.raw_path
            .trim_end_matches(&['/', '\\'][..])
            .rsplit(&['/', '\\'][..])
            .next()
            .unwrap_or("")
    }
}

#[derive(Clone, Debug)]
pub struct Scanner {
    grammars: Vec<Grammar>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            grammars: Grammar::ALL.to_vec(),
        }
    }
}

impl Scanner {
    pub fn new(grammars: Vec<Grammar>) -> Self {
        Self { grammars }
    }

    /// Build from configured grammar names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, CoreError> {
        let grammars = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<Grammar>, CoreError>>()?;
        Ok(Self::new(grammars))
    }

    pub fn grammars(&self) -> &[Grammar] {
        &self.grammars
    }

    /// All references in `text`, ordered by start offset. A substring hit
    /// by several grammars is reported once per grammar.
    pub fn scan(&self, text: &str) -> Vec<PathReference> {
        let urls: Vec<Range<usize>> = URL_REGEX.find_iter(text).map(|m| m.range()).collect();

        let mut out = Vec::new();
        for grammar in &self.grammars {
            for caps in grammar.regex().captures_iter(text) {
                let Some(reference) = reference_from_captures(*grammar, &caps, text) else {
                    continue;
                };
                let span = reference.span();
                if urls.iter().any(|url| overlaps(url, &span)) {
                    continue;
                }
                out.push(reference);
            }
        }

        // Stable: equal offsets keep grammar order.
        out.sort_by_key(|r| r.start);
        out
    }
}

/// Scan with every grammar enabled.
pub fn scan(text: &str) -> Vec<PathReference> {
    Scanner::default().scan(text)
}

/// Keep the first reference of every group of overlapping spans.
pub fn dedup_overlapping(references: Vec<PathReference>) -> Vec<PathReference> {
    let mut kept: Vec<PathReference> = Vec::with_capacity(references.len());
    for reference in references {
        let span = reference.span();
        if kept.iter().any(|k| overlaps(&k.span(), &span)) {
            continue;
        }
        kept.push(reference);
    }
    kept
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn reference_from_captures(grammar: Grammar, caps: &Captures<'_>, text: &str) -> Option<PathReference> {
    let path = caps.get(1)?;
    let line = caps.get(2);
    let column = caps.get(3);

    if grammar == Grammar::Make {
        // `10:30:45: error` is a clock, not a file.
        if path.as_str().bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !make_tail_ok(&text[caps.get(0)?.end()..]) {
            return None;
        }
    }

    let mut raw_path = path.as_str();
    if line.is_none() {
        raw_path = trim_sentence_punctuation(raw_path);
    }
    if raw_path.is_empty() {
        return None;
    }

    let end = match grammar {
        // Through the closing parenthesis, without the trailing `:`.
        Grammar::Cmake => caps.get(0)?.end() - 1,
        _ => column
            .or(line)
            .map(|m| m.end())
            .unwrap_or(path.start() + raw_path.len()),
    };
    let (is_absolute_style, is_relative_style) = match grammar {
        Grammar::Unix => (true, false),
        Grammar::Relative => (false, true),
        Grammar::Cmake | Grammar::Make => {
            let absolute = looks_absolute(raw_path);
            (absolute, !absolute)
        }
    };

    Some(PathReference {
        raw_path: raw_path.to_string(),
        start: path.start(),
        length: end - path.start(),
        line: line.and_then(|m| parse_position(m.as_str())),
        column: column.and_then(|m| parse_position(m.as_str())),
        grammar,
        is_absolute_style,
        is_relative_style,
    })
}

/// What follows `file:line[:col]:` in compiler output.
fn make_tail_ok(rest: &str) -> bool {
    rest.is_empty()
        || rest.starts_with(char::is_whitespace)
        || MAKE_SEVERITIES.iter().any(|s| rest.starts_with(s))
}

/// `/usr/lib/x.so.` at the end of a sentence refers to `/usr/lib/x.so`.
fn trim_sentence_punctuation(path: &str) -> &str {
    let mut out = path.trim_end_matches(&[',', ';'][..]);
    if let Some(stripped) = out.strip_suffix('.') {
        if stripped.ends_with(|c: char| c.is_alphanumeric()) {
            out = stripped;
        }
    }
    out
}

fn looks_absolute(path: &str) -> bool {
    path.starts_with('/')
        || path.starts_with('\\')
        || path.starts_with("~/")
        || crate::normalize::drive_letter(path).is_some()
}

/// Digits only, and must fit; anything else leaves the position unset.
fn parse_position(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
