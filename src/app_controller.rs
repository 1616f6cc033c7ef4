use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::{FileManager, TEXT_DUMP_EXTENSION};
use crate::page_text;
use crate::providers::mock::MockTranslator;
use crate::translation::pipeline::ProgressCallback;
use crate::translation::{ChunkTranslator, PipelineOutput, ReflowPipeline, TranslationService};

// @module: Application controller for document translation

/// Issues log written next to the translated documents
pub const ISSUES_LOG_FILE: &str = "paratrans.issues.log";

/// A document that went through the pipeline and was written to disk
#[derive(Debug, Clone)]
pub struct DocumentReport {
    /// Where the translated document was written
    pub output_path: PathBuf,
    /// Pipeline result
    pub output: PipelineOutput,
}

/// Outcome of a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    /// Documents translated and written
    pub processed: usize,
    /// Documents with an existing translation
    pub skipped: usize,
    /// Documents that failed
    pub failed: usize,
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Translation capability used for every document
    translator: Arc<dyn ChunkTranslator>,

    // @field: Whether to draw progress bars
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller translating through the configured provider
    pub fn with_config(config: Config) -> Result<Self> {
        let service = TranslationService::new(config.translation.clone())
            .context("Failed to create translation service")?;
        Ok(Self::with_translator(config, Arc::new(service)))
    }

    /// Controller around an explicit translator
    pub fn with_translator(config: Config, translator: Arc<dyn ChunkTranslator>) -> Self {
        Self {
            config,
            translator,
            show_progress: true,
        }
    }

    /// Controller that runs the whole pipeline without calling any provider
    pub fn dry_run(config: Config) -> Self {
        Self::with_translator(config, Arc::new(MockTranslator::identity()))
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a form-feed separated text dump through the pipeline
    pub async fn translate_text(&self, text: &str, progress_bar: &ProgressBar) -> Result<PipelineOutput> {
        let lines = page_text::lines_from_dump(text);
        let pipeline = ReflowPipeline::new(self.config.pipeline_options());

        let bar = progress_bar.clone();
        let callback: ProgressCallback = Box::new(move |progress| {
            bar.set_length(progress.total_chunks as u64);
            bar.set_position(progress.chunks_done as u64);
        });

        let run = pipeline.run(&lines, self.translator.as_ref(), Some(&callback));

        let output = match self.config.reflow.overall_timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
                .await
                .map_err(|_| anyhow!("Translation did not finish within {}s", secs))??,
            None => run.await?,
        };

        Ok(output)
    }

    /// Translate one document and write the result to `output_dir`.
    ///
    /// Returns `None` when a translation already exists and `force_overwrite` is off.
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<Option<DocumentReport>> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite).await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<DocumentReport>> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = self.output_path_for(input_file, output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input_file);
            return Ok(None);
        }

        let text = FileManager::read_to_string(input_file)?;

        let progress_bar = self.new_progress_bar(multi_progress, "chunks");
        progress_bar.set_message(display_name(input_file));

        let output = match self.translate_text(&text, &progress_bar).await {
            Ok(output) => output,
            Err(e) => {
                progress_bar.abandon_with_message("failed");
                self.log_issue(output_dir, input_file, &format!("{:#}", e));
                return Err(e.context(format!("Failed to translate {:?}", input_file)));
            }
        };
        progress_bar.finish_and_clear();

        let rendered = self.config.output_format.render_events(&output.events)?;
        FileManager::write_to_file(&output_path, &rendered)?;

        info!("Translated {:?} -> {:?} in {}", input_file, output_path, format_duration(start_time.elapsed()));
        info!("{}", output.stats.summary());
        if let Some(summary) = self.translator.usage_summary() {
            info!("{}", summary);
        }

        Ok(Some(DocumentReport { output_path, output }))
    }

    /// Run the workflow in folder mode, processing every text dump in a directory tree.
    /// Files that already have a translation are skipped.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let target_language = &self.config.target_language;
        let documents: Vec<PathBuf> = FileManager::find_files(&input_dir, TEXT_DUMP_EXTENSION)?
            .into_iter()
            .filter(|path| !FileManager::is_translated_output(path, target_language))
            .collect();

        if documents.is_empty() {
            return Err(anyhow!("No .{} files found in directory: {:?}", TEXT_DUMP_EXTENSION, input_dir));
        }

        // One failed connection would otherwise fail every document
        self.test_connection().await?;

        let multi_progress = MultiProgress::new();
        let folder_pb = self.new_progress_bar(&multi_progress, "files");
        folder_pb.set_length(documents.len() as u64);

        let mut summary = FolderSummary::default();

        for document in &documents {
            folder_pb.set_message(format!("Processing: {}", display_name(document)));

            let output_dir = document.parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| input_dir.clone());

            match self.run_with_progress(document, &output_dir, &multi_progress, force_overwrite).await {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", display_name(document), e);
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let summary_message = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors - Duration: {}",
            summary.processed, summary.skipped, summary.failed, format_duration(start_time.elapsed())
        );
        info!("{}", summary_message);

        if let Err(e) = FileManager::append_to_log_file(input_dir.join(ISSUES_LOG_FILE), &summary_message) {
            warn!("Failed to write folder summary to log file: {}", e);
        }

        Ok(summary)
    }

    /// Check the translator can be used and reach its backing service
    pub async fn test_connection(&self) -> Result<()> {
        let name = self.translator.name();
        self.translator.check_available()
            .with_context(|| format!("{} is not usable", name))?;
        self.translator.test_connection().await
            .with_context(|| format!("Failed to connect to {}", name))?;

        info!("Connection to {} OK", name);
        Ok(())
    }

    /// Expected output path for an input document
    pub fn output_path_for(&self, input_file: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(
            input_file,
            output_dir,
            &self.config.target_language,
            self.config.output_format.extension(),
        )
    }

    fn new_progress_bar(&self, multi_progress: &MultiProgress, unit: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    fn log_issue(&self, output_dir: &Path, input_file: &Path, message: &str) {
        let entry = format!(
            "{} [{} -> {}, {}]: {}",
            input_file.display(),
            self.config.source_language,
            self.config.target_language,
            self.translator.name(),
            message
        );
        if let Err(e) = FileManager::append_to_log_file(output_dir.join(ISSUES_LOG_FILE), &entry) {
            warn!("Failed to write issues log: {}", e);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Human-friendly duration
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
