/*!
 * Re-flow pipeline orchestrator.
 *
 * Runs one document through the whole chain:
 * 1. Merge raw lines into paragraphs and markers
 * 2. Pack paragraphs into size-bounded chunks
 * 3. Translate every text chunk, one call at a time
 * 4. Reconstruct paragraph and page-break events
 *
 * The run is all-or-nothing: the first failed chunk aborts it and nothing
 * produced so far is returned.
 */

use log::{debug, error, info};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::errors::{PipelineError, TranslationError};
use crate::reflow::{
    check_chunk_bounds, pack, reconstruct, truncate_chars, BlankRendering, Chunk, HeuristicMerger,
    LineGrouping, MarkerKind, MergeConfig, ReconstructionEvent, Unit, UnitKind,
    DEFAULT_MAX_CHUNK_SIZE, DEFAULT_SHORT_LINE_THRESHOLD, PARAGRAPH_SEPARATOR,
};
use super::ChunkTranslator;

/// Line standing for a page boundary in the previews
pub const PREVIEW_PAGE_MARKER: &str = "--- page break ---";

/// Invocation settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Source language code, or `auto`
    pub source_language: String,

    /// Target language code
    pub target_language: String,

    /// Character budget per translation call
    pub max_chunk_size: usize,

    /// Pause between consecutive translation calls
    pub inter_call_delay_ms: u64,

    /// Merge threshold for short lines
    pub short_line_threshold: usize,

    /// How blank lines come out of the reconstructor
    pub blank_rendering: BlankRendering,

    /// Characters kept in each preview
    pub preview_length: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            source_language: "auto".to_string(),
            target_language: "en".to_string(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            inter_call_delay_ms: 100,
            short_line_threshold: DEFAULT_SHORT_LINE_THRESHOLD,
            blank_rendering: BlankRendering::Skip,
            preview_length: 5000,
        }
    }
}

impl PipelineOptions {
    /// Default options for a language pair
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            ..Default::default()
        }
    }

    /// Set the chunk budget
    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// Set the pause between translation calls
    pub fn with_inter_call_delay_ms(mut self, delay_ms: u64) -> Self {
        self.inter_call_delay_ms = delay_ms;
        self
    }

    /// Set the blank-line rendering
    pub fn with_blank_rendering(mut self, blank_rendering: BlankRendering) -> Self {
        self.blank_rendering = blank_rendering;
        self
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_chunk_size == 0 {
            return Err(PipelineError::InvalidOptions("max_chunk_size must be greater than zero".to_string()));
        }
        if self.short_line_threshold == 0 {
            return Err(PipelineError::InvalidOptions("short_line_threshold must be greater than zero".to_string()));
        }
        if self.target_language.trim().is_empty() {
            return Err(PipelineError::InvalidOptions("target_language is empty".to_string()));
        }
        Ok(())
    }

    /// Merge settings matching these options
    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig::default().with_short_line_threshold(self.short_line_threshold)
    }
}

/// Progress of the translation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineProgress {
    /// Text chunks translated so far
    pub chunks_done: usize,

    /// Text chunks in the run
    pub total_chunks: usize,

    /// Characters of the chunk that just finished
    pub chunk_chars: usize,
}

impl PipelineProgress {
    /// Completion between 0.0 and 1.0
    pub fn fraction(&self) -> f32 {
        if self.total_chunks == 0 {
            1.0
        } else {
            self.chunks_done as f32 / self.total_chunks as f32
        }
    }
}

/// Callback receiving progress after every translated chunk
pub type ProgressCallback = Box<dyn Fn(PipelineProgress) + Send + Sync>;

/// Counters collected during a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// Page boundaries seen
    pub pages: usize,
    /// Paragraphs after merging
    pub paragraphs: usize,
    /// Blank-line markers
    pub blank_lines: usize,
    /// Chunks, markers included
    pub chunks: usize,
    /// Chunks sent to the translator
    pub translatable_chunks: usize,
    /// Single-paragraph chunks above the budget
    pub oversized_chunks: usize,
    /// Characters sent for translation
    pub source_chars: usize,
    /// Characters received back
    pub translated_chars: usize,
    /// Wall time of the run
    pub duration: Duration,
}

impl PipelineStats {
    /// One-line description for logs
    pub fn summary(&self) -> String {
        format!(
            "{} pages, {} paragraphs, {} chunks ({} translated, {} oversized), {} -> {} chars in {:.2}s",
            self.pages,
            self.paragraphs,
            self.chunks,
            self.translatable_chunks,
            self.oversized_chunks,
            self.source_chars,
            self.translated_chars,
            self.duration.as_secs_f32()
        )
    }
}

/// Truncated views of the merged original and the translation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelinePreview {
    /// Merged source text
    pub original: String,
    /// Translated text
    pub translated: String,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Identifier used in log lines of this run
    pub run_id: Uuid,
    /// Events for the document sink, in order
    pub events: Vec<ReconstructionEvent>,
    /// Text previews
    pub preview: PipelinePreview,
    /// Run counters
    pub stats: PipelineStats,
}

/// Orchestrates merge, pack, translate and reconstruct
pub struct ReflowPipeline {
    options: PipelineOptions,
    grouping: Box<dyn LineGrouping + Send + Sync>,
}

impl ReflowPipeline {
    /// Pipeline using the length/punctuation merge heuristic
    pub fn new(options: PipelineOptions) -> Self {
        let grouping = HeuristicMerger::new(options.merge_config());
        Self::with_grouping(options, Box::new(grouping))
    }

    /// Pipeline with a custom line grouping strategy
    pub fn with_grouping(options: PipelineOptions, grouping: Box<dyn LineGrouping + Send + Sync>) -> Self {
        Self { options, grouping }
    }

    /// Options of this pipeline
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Merge and pack without translating.
    ///
    /// Fails with `EmptyContent` when the lines hold no text at all.
    pub fn prepare(&self, lines: &[String]) -> Result<(Vec<Unit>, Vec<Chunk>), PipelineError> {
        self.options.validate()?;
        self.prepare_validated(lines)
    }

    fn prepare_validated(&self, lines: &[String]) -> Result<(Vec<Unit>, Vec<Chunk>), PipelineError> {
        let units = self.grouping.group(lines);
        let has_text = units
            .iter()
            .any(|unit| unit.kind == UnitKind::Text && !unit.content.trim().is_empty());
        if !has_text {
            return Err(PipelineError::EmptyContent);
        }

        let chunks = pack(&units, self.options.max_chunk_size);
        check_chunk_bounds(&chunks, self.options.max_chunk_size)?;

        Ok((units, chunks))
    }

    /// Run the whole pipeline against a translator
    pub async fn run(
        &self,
        lines: &[String],
        translator: &dyn ChunkTranslator,
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<PipelineOutput, PipelineError> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4();

        self.options.validate()?;
        translator.check_available().map_err(|e| match e {
            TranslationError::Unavailable(reason) => PipelineError::ServiceUnavailable(reason),
            other => PipelineError::ServiceUnavailable(other.to_string()),
        })?;

        let (units, chunks) = self.prepare_validated(lines)?;
        let total_chunks = chunks.iter().filter(|chunk| chunk.is_translatable()).count();

        info!("[{}] Translating {} chunks ({} -> {}) with {}",
              run_id, total_chunks, self.options.source_language,
              self.options.target_language, translator.name());

        let mut stats = collect_stats(&units, &chunks, self.options.max_chunk_size);
        let translated_chunks = self
            .translate_chunks(run_id, &chunks, translator, total_chunks, progress_callback, &mut stats)
            .await?;

        let events = reconstruct(&translated_chunks, self.options.blank_rendering);

        let preview = PipelinePreview {
            original: preview_text(units.iter().map(unit_preview_line), self.options.preview_length),
            translated: preview_text(translated_chunks.iter().map(chunk_preview_line), self.options.preview_length),
        };

        stats.duration = start_time.elapsed();
        info!("[{}] Done: {}", run_id, stats.summary());

        Ok(PipelineOutput { run_id, events, preview, stats })
    }

    async fn translate_chunks(
        &self,
        run_id: Uuid,
        chunks: &[Chunk],
        translator: &dyn ChunkTranslator,
        total_chunks: usize,
        progress_callback: Option<&ProgressCallback>,
        stats: &mut PipelineStats,
    ) -> Result<Vec<Chunk>, PipelineError> {
        let delay = Duration::from_millis(self.options.inter_call_delay_ms);
        let mut translated_chunks = Vec::with_capacity(chunks.len());
        let mut chunk_index = 0;

        for chunk in chunks {
            let Chunk::Translatable { payload, paragraphs } = chunk else {
                translated_chunks.push(chunk.clone());
                continue;
            };

            if chunk_index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            chunk_index += 1;

            let chunk_chars = payload.chars().count();
            debug!("[{}] Chunk {}/{}: {} chars, {} paragraphs",
                   run_id, chunk_index, total_chunks, chunk_chars, paragraphs);

            let translated = translator
                .translate(payload, &self.options.source_language, &self.options.target_language)
                .await
                .map_err(|source| {
                    error!("[{}] Chunk {}/{} failed: {}", run_id, chunk_index, total_chunks, source);
                    PipelineError::TranslationFailure { chunk_index, total_chunks, source }
                })?;

            let translated = translated.trim().to_string();
            stats.translated_chars += translated.chars().count();
            translated_chunks.push(Chunk::Translatable {
                payload: translated,
                paragraphs: *paragraphs,
            });

            if let Some(callback) = progress_callback {
                callback(PipelineProgress {
                    chunks_done: chunk_index,
                    total_chunks,
                    chunk_chars,
                });
            }
        }

        Ok(translated_chunks)
    }
}

fn collect_stats(units: &[Unit], chunks: &[Chunk], max_chunk_size: usize) -> PipelineStats {
    let mut stats = PipelineStats::default();

    for unit in units {
        match unit.kind {
            UnitKind::Text => stats.paragraphs += 1,
            UnitKind::Blank => stats.blank_lines += 1,
            UnitKind::PageBreak => stats.pages += 1,
        }
    }

    stats.chunks = chunks.len();
    for chunk in chunks.iter().filter(|chunk| chunk.is_translatable()) {
        let chars = chunk.payload().chars().count();
        stats.translatable_chunks += 1;
        stats.source_chars += chars;
        if chars > max_chunk_size {
            stats.oversized_chunks += 1;
        }
    }

    stats
}

fn unit_preview_line(unit: &Unit) -> &str {
    match unit.kind {
        UnitKind::Text => &unit.content,
        UnitKind::Blank => "",
        UnitKind::PageBreak => PREVIEW_PAGE_MARKER,
    }
}

fn chunk_preview_line(chunk: &Chunk) -> &str {
    match chunk.marker_kind() {
        Some(MarkerKind::PageBreak) => PREVIEW_PAGE_MARKER,
        Some(MarkerKind::Blank) => "",
        None => chunk.payload(),
    }
}

fn preview_text<'a>(parts: impl Iterator<Item = &'a str>, max_chars: usize) -> String {
    let joined = parts.collect::<Vec<_>>().join(PARAGRAPH_SEPARATOR);
    truncate_chars(&joined, max_chars).to_string()
}
