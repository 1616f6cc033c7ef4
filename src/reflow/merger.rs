/*!
 * Line merger.
 *
 * Extracted PDF text splits table rows and list items into many short lines.
 * Without layout geometry the merger falls back on a length/punctuation rule:
 * short lines that do not end a sentence are glued together with `" | "`,
 * long or terminated lines stand as paragraphs of their own.
 */

use log::trace;

use super::{char_len, Unit};
use crate::page_text::PAGE_SENTINEL;

/// Lines shorter than this (in characters) are candidates for merging
pub const DEFAULT_SHORT_LINE_THRESHOLD: usize = 100;

/// Separator placed between merged short lines
const CELL_SEPARATOR: &str = " | ";

/// Settings for the merge heuristic
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// Lines shorter than this without a trailing period are merged
    pub short_line_threshold: usize,

    /// Reserved line value marking the end of a page
    pub page_sentinel: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            short_line_threshold: DEFAULT_SHORT_LINE_THRESHOLD,
            page_sentinel: PAGE_SENTINEL.to_string(),
        }
    }
}

impl MergeConfig {
    /// Use a different short-line threshold
    pub fn with_short_line_threshold(mut self, threshold: usize) -> Self {
        self.short_line_threshold = threshold;
        self
    }
}

/// Strategy turning raw lines into units.
///
/// Anything able to group lines into paragraphs (for example from text
/// bounding boxes) can stand in for the heuristic as long as it keeps one
/// `PageBreak` per page sentinel, in order.
pub trait LineGrouping {
    /// Group the raw lines into units
    fn group(&self, lines: &[String]) -> Vec<Unit>;
}

/// The length/punctuation heuristic
#[derive(Debug, Clone, Default)]
pub struct HeuristicMerger {
    config: MergeConfig,
}

impl HeuristicMerger {
    /// Create a merger with the given settings
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }
}

impl LineGrouping for HeuristicMerger {
    fn group(&self, lines: &[String]) -> Vec<Unit> {
        merge(lines, &self.config)
    }
}

/// Merge raw lines into paragraph and marker units
pub fn merge<S: AsRef<str>>(lines: &[S], config: &MergeConfig) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut buffer = String::new();

    for line in lines {
        let line: &str = line.as_ref();

        if line == config.page_sentinel {
            flush(&mut buffer, &mut units);
            units.push(Unit::page_break());
            continue;
        }

        let stripped = line.trim();
        if stripped.is_empty() {
            flush(&mut buffer, &mut units);
            units.push(Unit::blank());
            continue;
        }

        if char_len(stripped) < config.short_line_threshold && !stripped.ends_with('.') {
            if !buffer.is_empty() {
                buffer.push_str(CELL_SEPARATOR);
            }
            buffer.push_str(stripped);
        } else {
            flush(&mut buffer, &mut units);
            units.push(Unit::text(normalize(stripped)));
        }
    }

    flush(&mut buffer, &mut units);

    trace!("Merged {} raw lines into {} units", lines.len(), units.len());
    units
}

fn flush(buffer: &mut String, units: &mut Vec<Unit>) {
    if buffer.is_empty() {
        return;
    }
    units.push(Unit::text(normalize(buffer)));
    buffer.clear();
}

/// Single pass replacing each pair of spaces by one, then trim
fn normalize(text: &str) -> String {
    text.replace("  ", " ").trim().to_string()
}
