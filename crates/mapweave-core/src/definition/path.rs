//! Path grammar parser
//!
//! Turns a path string such as `>items[-1]` or `^.^.meta.tags[]` into the
//! primitive steps of a pipeline. The parser is total: malformed bracket
//! expressions are kept as literal key text rather than rejected.
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use crate::pipeline::{PathKind, PathStep};

/// Characters a backslash may escape
const ESCAPABLE: [char; 4] = ['$', '.', '[', '/'];

/// A character of a segment, remembering whether it was escaped
#[derive(Debug, Clone, Copy, PartialEq)]
struct Char {
    ch: char,
    escaped: bool,
}

impl Char {
    fn is(&self, ch: char) -> bool {
        !self.escaped && self.ch == ch
    }
}

/// Parse a path string into get-oriented steps
///
/// A leading `>` turns the path into a set path: the steps are reversed
/// and all carry set orientation.
pub fn parse(path: &str) -> Vec<PathStep> {
    let (set, rest) = split_set_prefix(path);
    let steps = split_segments(rest)
        .iter()
        .flat_map(|segment| parse_segment(segment))
        .collect();
    orient(steps, set)
}

/// Parse a path that has already been split into segments
pub fn parse_segments<S: AsRef<str>>(segments: &[S]) -> Vec<PathStep> {
    let mut set = false;
    let mut steps = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        let mut text = segment.as_ref();
        if i == 0 {
            let (is_set, rest) = split_set_prefix(text);
            set = is_set;
            text = rest;
        }
        steps.extend(parse_segment(&unescape(text)));
    }
    orient(steps, set)
}

/// Steps that write a value at `path`, outermost step last
pub fn parse_set(path: &str) -> Vec<PathStep> {
    orient(parse(path), true)
}

fn split_set_prefix(path: &str) -> (bool, &str) {
    match path.strip_prefix('>') {
        Some(rest) => (true, rest),
        None => (false, path),
    }
}

fn orient(steps: Vec<PathStep>, set: bool) -> Vec<PathStep> {
    if !set {
        return steps;
    }
    steps
        .into_iter()
        .rev()
        .map(|step| PathStep { set: true, ..step })
        .collect()
}

fn unescape(text: &str) -> Vec<Char> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if ESCAPABLE.contains(&next) {
                    chars.next();
                    out.push(Char { ch: next, escaped: true });
                    continue;
                }
            }
        }
        out.push(Char { ch, escaped: false });
    }
    out
}

fn split_segments(path: &str) -> Vec<Vec<Char>> {
    unescape(path)
        .split(|c| c.is('.'))
        .filter(|segment| !segment.is_empty())
        .map(<[Char]>::to_vec)
        .collect()
}

fn text(chars: &[Char]) -> String {
    chars.iter().map(|c| c.ch).collect()
}

fn parse_segment(segment: &[Char]) -> Vec<PathStep> {
    if segment.iter().all(|c| c.is('^')) {
        return match segment.len() {
            2 => vec![PathStep::get(PathKind::Root)],
            n => (0..n).map(|_| PathStep::get(PathKind::Parent)).collect(),
        };
    }
    if let [c] = segment {
        if c.is('|') {
            return vec![PathStep::get(PathKind::Plug)];
        }
    }
    if segment.first().is_some_and(|c| c.is('$')) && text(segment) == "$modify" {
        return vec![PathStep::get(PathKind::Modify)];
    }

    let key_end = segment
        .iter()
        .position(|c| c.is('['))
        .unwrap_or(segment.len());
    let (key, brackets) = segment.split_at(key_end);

    let Some(bracket_steps) = parse_brackets(brackets) else {
        return vec![PathStep::prop(text(segment))];
    };

    let mut steps = Vec::with_capacity(bracket_steps.len() + 1);
    if !key.is_empty() {
        let (key, slashed) = split_slash(key);
        steps.push(PathStep::get(PathKind::Prop {
            key: text(key),
            slashed,
        }));
    }
    steps.extend(bracket_steps);
    steps
}

/// Parse `[]`, `[n]` and `[-n]` groups; `None` when any group is malformed
fn parse_brackets(mut rest: &[Char]) -> Option<Vec<PathStep>> {
    let mut steps = Vec::new();
    while !rest.is_empty() {
        if !rest[0].is('[') {
            return None;
        }
        let close = rest.iter().position(|c| c.is(']'))?;
        let inner = text(&rest[1..close]);
        if inner.is_empty() {
            steps.push(PathStep::get(PathKind::Array));
        } else {
            let digits = inner.strip_prefix('-').unwrap_or(&inner);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            steps.push(PathStep::get(PathKind::Index(inner.parse().ok()?)));
        }
        rest = &rest[close + 1..];
    }
    Some(steps)
}

/// Strip a trailing `/N` from a key
fn split_slash(key: &[Char]) -> (&[Char], bool) {
    let Some(slash) = key.iter().rposition(|c| c.is('/')) else {
        return (key, false);
    };
    let suffix = &key[slash + 1..];
    if slash > 0 && !suffix.is_empty() && suffix.iter().all(|c| c.ch.is_ascii_digit()) {
        (&key[..slash], true)
    } else {
        (key, false)
    }
}
