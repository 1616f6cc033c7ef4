/*!
 * Chunk packer.
 *
 * Groups consecutive paragraphs into translation units bounded by a character
 * budget. A paragraph is never split: one that is larger than the budget on its
 * own travels as a single oversized chunk. Blank and page-break markers pass
 * through as marker chunks at their original positions.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use super::{char_len, Unit, UnitKind};
use crate::errors::PipelineError;

/// Default character budget per translation call
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4500;

/// Separator between paragraphs inside one chunk
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

const SEPARATOR_LEN: usize = 2;

/// Structural marker carried through translation untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Blank line
    Blank,
    /// Page boundary
    PageBreak,
}

/// Unit of work for the translation adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chunk {
    /// Paragraphs joined with `PARAGRAPH_SEPARATOR`
    Translatable {
        /// Text sent to the translator
        payload: String,
        /// Number of source paragraphs packed into the payload
        paragraphs: usize,
    },
    /// A marker passed straight through
    Marker {
        /// Which marker this is
        marker: MarkerKind,
    },
}

impl Chunk {
    /// A single-paragraph translatable chunk
    pub fn translatable(payload: impl Into<String>) -> Self {
        Self::Translatable {
            payload: payload.into(),
            paragraphs: 1,
        }
    }

    /// A marker chunk
    pub fn marker(marker: MarkerKind) -> Self {
        Self::Marker { marker }
    }

    /// Text carried by the chunk; markers carry none
    pub fn payload(&self) -> &str {
        match self {
            Self::Translatable { payload, .. } => payload,
            Self::Marker { .. } => "",
        }
    }

    /// Whether the chunk goes to the translator
    pub fn is_translatable(&self) -> bool {
        matches!(self, Self::Translatable { .. })
    }

    /// Marker kind, if this is a marker chunk
    pub fn marker_kind(&self) -> Option<MarkerKind> {
        match self {
            Self::Marker { marker } => Some(*marker),
            Self::Translatable { .. } => None,
        }
    }
}

/// In-progress translatable chunk
#[derive(Default)]
struct ChunkBuffer {
    text: String,
    chars: usize,
    paragraphs: usize,
}

impl ChunkBuffer {
    fn is_empty(&self) -> bool {
        self.paragraphs == 0
    }

    fn start(&mut self, content: &str, content_chars: usize) {
        self.text.push_str(content);
        self.chars = content_chars;
        self.paragraphs = 1;
    }

    fn append(&mut self, content: &str, content_chars: usize) {
        if self.is_empty() {
            self.start(content, content_chars);
            return;
        }
        self.text.push_str(PARAGRAPH_SEPARATOR);
        self.text.push_str(content);
        self.chars += SEPARATOR_LEN + content_chars;
        self.paragraphs += 1;
    }

    fn flush_into(&mut self, chunks: &mut Vec<Chunk>) {
        if self.is_empty() {
            return;
        }
        let taken = std::mem::take(self);
        chunks.push(Chunk::Translatable {
            payload: taken.text,
            paragraphs: taken.paragraphs,
        });
    }
}

/// Pack units into chunks of at most `max_size` characters
pub fn pack(units: &[Unit], max_size: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = ChunkBuffer::default();

    for unit in units {
        match unit.kind {
            UnitKind::Blank => {
                buffer.flush_into(&mut chunks);
                chunks.push(Chunk::marker(MarkerKind::Blank));
            }
            UnitKind::PageBreak => {
                buffer.flush_into(&mut chunks);
                chunks.push(Chunk::marker(MarkerKind::PageBreak));
            }
            UnitKind::Text if unit.content.trim().is_empty() => {
                debug!("Dropping blank text unit");
            }
            UnitKind::Text => {
                let content_chars = char_len(&unit.content);
                if buffer.chars + SEPARATOR_LEN + content_chars > max_size {
                    buffer.flush_into(&mut chunks);
                    if content_chars > max_size {
                        debug!("Paragraph of {} chars exceeds the {} char budget, sending it alone",
                               content_chars, max_size);
                    }
                    buffer.start(&unit.content, content_chars);
                } else {
                    buffer.append(&unit.content, content_chars);
                }
            }
        }
    }

    buffer.flush_into(&mut chunks);
    chunks
}

/// Verify that only single-paragraph chunks exceed the budget
pub fn check_chunk_bounds(chunks: &[Chunk], max_size: usize) -> Result<(), PipelineError> {
    for (chunk_index, chunk) in chunks.iter().enumerate() {
        if let Chunk::Translatable { payload, paragraphs } = chunk {
            let length = char_len(payload);
            if length > max_size && *paragraphs != 1 {
                return Err(PipelineError::PackingInvariantViolation {
                    chunk_index,
                    length,
                    paragraphs: *paragraphs,
                    max_size,
                });
            }
        }
    }
    Ok(())
}
