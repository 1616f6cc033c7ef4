/*!
 * Document sinks rendering reconstruction events.
 *
 * A sink only has to accept two operations, append a paragraph and insert a
 * page break, so the pipeline never depends on an output format.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::reflow::{render, ReconstructionEvent};

/// Receiver for reconstruction events
pub trait DocumentSink {
    /// Append one paragraph
    fn append_paragraph(&mut self, text: &str);

    /// Start a new page
    fn insert_page_break(&mut self);
}

/// Output formats the CLI can write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text, pages separated by form feeds
    #[default]
    Text,
    /// Markdown, pages separated by horizontal rules
    Markdown,
    /// The raw event list as JSON
    Json,
}

impl OutputFormat {
    /// File extension for the format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }

    /// Render events into a complete document string
    pub fn render_events(&self, events: &[ReconstructionEvent]) -> Result<String> {
        match self {
            Self::Text => {
                let mut document = PlainTextDocument::new();
                render(events, &mut document);
                Ok(document.finish())
            }
            Self::Markdown => {
                let mut document = MarkdownDocument::new();
                render(events, &mut document);
                Ok(document.finish())
            }
            Self::Json => {
                let mut recorder = EventRecorder::default();
                render(events, &mut recorder);
                serde_json::to_string_pretty(&recorder.events)
                    .context("Failed to serialize reconstruction events")
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Json => "json",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("Invalid output format: {}", s)),
        }
    }
}

/// Plain text: one blank line between paragraphs, a form feed per page break
#[derive(Debug)]
pub struct PlainTextDocument {
    content: String,
    at_page_start: bool,
}

impl PlainTextDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            content: String::new(),
            at_page_start: true,
        }
    }

    /// The rendered text
    pub fn finish(self) -> String {
        self.content
    }
}

impl Default for PlainTextDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSink for PlainTextDocument {
    fn append_paragraph(&mut self, text: &str) {
        if !self.at_page_start {
            self.content.push('\n');
        }
        self.content.push_str(text);
        self.content.push('\n');
        self.at_page_start = false;
    }

    fn insert_page_break(&mut self) {
        self.content.push(crate::page_text::FORM_FEED);
        self.at_page_start = true;
    }
}

/// Markdown: paragraphs separated by blank lines, `---` between pages
#[derive(Debug, Default)]
pub struct MarkdownDocument {
    blocks: Vec<String>,
}

impl MarkdownDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// The rendered markdown
    pub fn finish(self) -> String {
        if self.blocks.is_empty() {
            return String::new();
        }
        let mut content = self.blocks.join("\n\n");
        content.push('\n');
        content
    }
}

impl DocumentSink for MarkdownDocument {
    fn append_paragraph(&mut self, text: &str) {
        // An empty paragraph renders as a non-breaking space to keep the gap
        if text.is_empty() {
            self.blocks.push("&nbsp;".to_string());
        } else {
            self.blocks.push(text.to_string());
        }
    }

    fn insert_page_break(&mut self) {
        self.blocks.push("---".to_string());
    }
}

/// Sink that keeps the events it receives
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    /// Events in arrival order
    pub events: Vec<ReconstructionEvent>,
}

impl DocumentSink for EventRecorder {
    fn append_paragraph(&mut self, text: &str) {
        self.events.push(ReconstructionEvent::paragraph(text));
    }

    fn insert_page_break(&mut self) {
        self.events.push(ReconstructionEvent::InsertPageBreak);
    }
}
