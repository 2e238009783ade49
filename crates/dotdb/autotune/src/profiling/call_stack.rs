// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::backtrace::Backtrace;

use super::CallStackSource;
use crate::query::CallStack;

/// Frames belonging to the runtime rather than application code
const RUNTIME_PREFIXES: &[&str] = &["std::", "core::", "alloc::", "test::", "tokio::", "__rust", "rust_begin_unwind", "__libc", "_start", "fn("];

/// Symbol rendered for frames without debug symbols
const UNKNOWN_SYMBOL: &str = "<unknown>";

/// Frames belonging to the capture path itself
const CAPTURE_MARKERS: &[&str] = &["dotdb_autotune::profiling::call_stack::BacktraceCallStack", "dotdb_autotune::engine::QueryTuner"];

const DEFAULT_MAX_FRAMES: usize = 5;

/// Call stack source backed by `std::backtrace`
///
/// Keeps the innermost `max_frames` application frames. A frame is rendered
/// as `symbol@path:line` when the backtrace carries its source position, so
/// two queries issued from the same function get different keys. Frames
/// without symbols are skipped; a binary built without debug info yields an
/// empty stack, which the engine never tunes.
#[derive(Debug, Clone)]
pub struct BacktraceCallStack {
    max_frames: usize,
    ignored_prefixes: Vec<String>,
}

impl BacktraceCallStack {
    pub fn new(max_frames: usize) -> Self {
        Self {
            max_frames,
            ignored_prefixes: Vec::new(),
        }
    }

    /// Skips frames starting with `prefix`, e.g. the executor's own modules.
    pub fn ignore_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_prefixes.push(prefix.into());
        self
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    fn is_ignored(&self, symbol: &str) -> bool {
        if symbol == UNKNOWN_SYMBOL || CAPTURE_MARKERS.iter().any(|marker| symbol.contains(marker)) {
            return true;
        }

        let subject = self_type(symbol);
        RUNTIME_PREFIXES.iter().any(|prefix| subject.starts_with(prefix)) || self.ignored_prefixes.iter().any(|prefix| subject.starts_with(prefix.as_str()))
    }

    /// Extracts application frames from a rendered backtrace.
    pub fn parse_frames(&self, rendered: &str) -> Vec<String> {
        let mut frames: Vec<String> = Vec::new();
        // whether the last symbol line was kept, so its `at` line belongs to it
        let mut kept = false;
        let mut numbered = false;

        for line in rendered.lines() {
            if let Some(position) = frame_position(line) {
                if let Some(frame) = frames.last_mut().filter(|_| kept) {
                    if !frame.contains('@') {
                        frame.push('@');
                        frame.push_str(position);
                    }
                }
                continue;
            }

            let symbol = match frame_symbol(line) {
                Some(symbol) => {
                    numbered = true;
                    symbol
                }
                // inlined callers are listed under the frame without an index
                None if numbered => match inlined_symbol(line) {
                    Some(symbol) => symbol,
                    None => continue,
                },
                None => continue,
            };

            if frames.len() == self.max_frames {
                break;
            }
            kept = !self.is_ignored(symbol);
            if kept {
                frames.push(symbol.to_string());
            }
        }

        frames
    }
}

impl Default for BacktraceCallStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAMES)
    }
}

impl CallStackSource for BacktraceCallStack {
    fn capture(&self) -> CallStack {
        let rendered = Backtrace::force_capture().to_string();
        CallStack::new(self.parse_frames(&rendered))
    }
}

/// Returns the symbol of a `  12: symbol` frame line.
fn frame_symbol(line: &str) -> Option<&str> {
    let (index, symbol) = line.trim_start().split_once(": ")?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(strip_hash(symbol.trim()))
}

/// Returns the symbol of an unnumbered, indented inlined frame line.
fn inlined_symbol(line: &str) -> Option<&str> {
    let symbol = line.trim();
    if symbol.is_empty() || !line.starts_with(char::is_whitespace) {
        return None;
    }
    Some(strip_hash(symbol))
}

/// Returns `path:line` of an `at path:line:column` position line.
fn frame_position(line: &str) -> Option<&str> {
    let position = line.trim_start().strip_prefix("at ")?.trim_end();
    match position.rsplit_once(':') {
        Some((path_line, column)) if !column.is_empty() && column.bytes().all(|b| b.is_ascii_digit()) => Some(path_line),
        _ => Some(position),
    }
}

/// Returns `A` for a `<A as B>::method` symbol and the symbol otherwise.
fn self_type(symbol: &str) -> &str {
    let Some(inner) = symbol.strip_prefix('<') else {
        return symbol;
    };

    let mut depth = 0usize;
    for (at, c) in inner.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            // `->` in a function pointer type is not a closing bracket
            '>' if inner[..at].ends_with('-') => {}
            '>' if depth == 0 => return &inner[..at],
            '>' => depth -= 1,
            ' ' if depth == 0 && inner[at..].starts_with(" as ") => return &inner[..at],
            _ => {}
        }
    }
    inner
}

/// Drops a trailing `::h0123456789abcdef` symbol hash.
fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::") {
        Some((path, hash)) if hash.len() == 17 && hash.starts_with('h') && hash[1..].bytes().all(|b| b.is_ascii_hexdigit()) => path,
        _ => symbol,
    }
}
