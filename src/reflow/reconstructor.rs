/*!
 * Reconstructor: rebuilds paragraph and page-break events from the
 * (translated) chunk stream.
 */

use serde::{Deserialize, Serialize};

use super::packer::{Chunk, MarkerKind, PARAGRAPH_SEPARATOR};
use crate::document_sink::DocumentSink;

/// Instruction for a document sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReconstructionEvent {
    /// Append one paragraph of text
    AppendParagraph {
        /// Paragraph text
        text: String,
    },
    /// Start a new page
    InsertPageBreak,
}

impl ReconstructionEvent {
    /// Shorthand for an `AppendParagraph` event
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::AppendParagraph { text: text.into() }
    }
}

/// How blank-line markers are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankRendering {
    /// Emit nothing; separate paragraphs already imply the gap
    #[default]
    Skip,
    /// Emit an empty paragraph for each blank line
    EmptyParagraph,
}

/// Turn chunks into sink events
pub fn reconstruct(chunks: &[Chunk], blank_rendering: BlankRendering) -> Vec<ReconstructionEvent> {
    let mut events = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        match chunk {
            Chunk::Marker { marker: MarkerKind::PageBreak } => {
                events.push(ReconstructionEvent::InsertPageBreak);
            }
            Chunk::Marker { marker: MarkerKind::Blank } => {
                if blank_rendering == BlankRendering::EmptyParagraph {
                    events.push(ReconstructionEvent::paragraph(""));
                }
            }
            Chunk::Translatable { payload, .. } => {
                events.extend(
                    payload
                        .split(PARAGRAPH_SEPARATOR)
                        .map(str::trim)
                        .filter(|segment| !segment.is_empty())
                        .map(|segment| ReconstructionEvent::paragraph(segment)),
                );
            }
        }
    }

    events
}

/// Replay events into a document sink, in order
pub fn render<S: DocumentSink + ?Sized>(events: &[ReconstructionEvent], sink: &mut S) {
    for event in events {
        match event {
            ReconstructionEvent::AppendParagraph { text } => sink.append_paragraph(text),
            ReconstructionEvent::InsertPageBreak => sink.insert_page_break(),
        }
    }
}
