//! Comment-directive suppression.
//!
//! A `//ctxprop:ignore` comment suppresses findings on its own line and on
//! the line below it. Directives that never suppress anything are reported
//! back so stale ones can be cleaned up.

use std::collections::BTreeMap;

use ctxprop_core::node::Position;

/// Directive text recognized by default.
pub const DEFAULT_DIRECTIVE: &str = "ctxprop:ignore";

/// Decides whether a finding at a position is suppressed.
pub trait Suppress {
    /// `true` if a finding at `pos` should be dropped. Implementations may
    /// record that the suppression was used.
    fn should_suppress(&mut self, pos: &Position) -> bool;

    /// Positions of directives that never suppressed anything.
    fn unused(&self) -> Vec<Position> {
        Vec::new()
    }
}

/// Never suppresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuppression;

impl Suppress for NoSuppression {
    fn should_suppress(&mut self, _pos: &Position) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Directive {
    column: u32,
    used: bool,
}

/// Directive lines of a single file.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMap {
    lines: BTreeMap<u32, Directive>,
}

impl IgnoreMap {
    /// Scans `source` for `//` comments starting with `directive`. String,
    /// rune and block-comment text is not searched.
    pub fn parse(source: &str, directive: &str) -> Self {
        let mut lines = BTreeMap::new();
        let mut open = Open::Code;
        for (idx, line) in source.lines().enumerate() {
            let Some(start) = line_comment_start(line, &mut open) else {
                continue;
            };
            if line[start + 2..].trim_start().starts_with(directive) {
                lines.insert(
                    idx as u32 + 1,
                    Directive {
                        column: start as u32 + 1,
                        used: false,
                    },
                );
            }
        }
        IgnoreMap { lines }
    }

    /// `true` if a directive covers `line`; marks it used.
    pub fn should_ignore(&mut self, line: u32) -> bool {
        let candidates = [Some(line), line.checked_sub(1)];
        for candidate in candidates.into_iter().flatten() {
            if let Some(directive) = self.lines.get_mut(&candidate) {
                directive.used = true;
                return true;
            }
        }
        false
    }

    /// `(line, column)` of every directive not yet used.
    pub fn unused(&self) -> Vec<(u32, u32)> {
        self.lines
            .iter()
            .filter(|(_, d)| !d.used)
            .map(|(line, d)| (*line, d.column))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Lexical state carried from one line into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Code,
    RawString,
    BlockComment,
}

/// Byte offset of the `//` comment on `line`, if any.
fn line_comment_start(line: &str, open: &mut Open) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match *open {
            Open::RawString => {
                if bytes[i] == b'`' {
                    *open = Open::Code;
                }
                i += 1;
            }
            Open::BlockComment => {
                if bytes[i..].starts_with(b"*/") {
                    *open = Open::Code;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            Open::Code => match bytes[i] {
                b'/' if bytes.get(i + 1) == Some(&b'/') => return Some(i),
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    *open = Open::BlockComment;
                    i += 2;
                }
                b'`' => {
                    *open = Open::RawString;
                    i += 1;
                }
                quote @ (b'"' | b'\'') => i = skip_quoted(bytes, i + 1, quote),
                _ => i += 1,
            },
        }
    }
    None
}

/// Index just past the closing `quote`; interpreted literals end with the line.
fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    i
}

/// Ignore maps for every file findings can land in.
#[derive(Debug, Clone, Default)]
pub struct DirectiveIndex {
    files: BTreeMap<String, IgnoreMap>,
}

impl DirectiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and registers `source` under `file`.
    pub fn add_source(&mut self, file: &str, source: &str, directive: &str) {
        self.files.insert(file.to_string(), IgnoreMap::parse(source, directive));
    }

    pub fn insert(&mut self, file: &str, map: IgnoreMap) {
        self.files.insert(file.to_string(), map);
    }

    /// Number of directives across all files.
    pub fn directive_count(&self) -> usize {
        self.files.values().map(IgnoreMap::len).sum()
    }
}

impl Suppress for DirectiveIndex {
    fn should_suppress(&mut self, pos: &Position) -> bool {
        self.files
            .get_mut(&pos.file)
            .is_some_and(|map| map.should_ignore(pos.line))
    }

    fn unused(&self) -> Vec<Position> {
        self.files
            .iter()
            .flat_map(|(file, map)| {
                map.unused()
                    .into_iter()
                    .map(move |(line, column)| Position::new(file.clone(), line, column))
            })
            .collect()
    }
}
