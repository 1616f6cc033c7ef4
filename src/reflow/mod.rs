/*!
 * Document re-flow: turning raw extracted lines into translatable chunks and
 * back into a paginated document.
 *
 * - `merger`: raw lines to paragraph/marker units
 * - `packer`: units to size-bounded chunks
 * - `reconstructor`: (translated) chunks to document events
 *
 * Every stage is a pure, order-preserving transformation over one linear stream.
 */

use serde::{Deserialize, Serialize};

pub mod merger;
pub mod packer;
pub mod reconstructor;

pub use self::merger::{merge, HeuristicMerger, LineGrouping, MergeConfig, DEFAULT_SHORT_LINE_THRESHOLD};
pub use self::packer::{check_chunk_bounds, pack, Chunk, MarkerKind, DEFAULT_MAX_CHUNK_SIZE, PARAGRAPH_SEPARATOR};
pub use self::reconstructor::{reconstruct, render, BlankRendering, ReconstructionEvent};

/// Kind of a normalized stream element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// A logical paragraph
    Text,
    /// A blank source line
    Blank,
    /// A page boundary
    PageBreak,
}

/// One element of the merged stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// What the unit represents
    pub kind: UnitKind,

    /// Paragraph text; empty for markers
    pub content: String,
}

impl Unit {
    /// A paragraph unit
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: UnitKind::Text,
            content: content.into(),
        }
    }

    /// A blank-line marker
    pub fn blank() -> Self {
        Self {
            kind: UnitKind::Blank,
            content: String::new(),
        }
    }

    /// A page-boundary marker
    pub fn page_break() -> Self {
        Self {
            kind: UnitKind::PageBreak,
            content: String::new(),
        }
    }

    /// Whether this unit carries structure rather than text
    pub fn is_marker(&self) -> bool {
        self.kind != UnitKind::Text
    }
}

/// Number of characters in a string, as the pipeline measures sizes
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncate a string to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
