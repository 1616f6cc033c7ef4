/*!
 * Translation of packed chunks using AI providers.
 *
 * This module contains the functionality for sending chunk payloads to a
 * translation capability and re-flowing whole documents through it:
 *
 * - `core`: provider-backed translation service
 * - `cache`: caching of chunk translations
 * - `pipeline`: merge, pack, translate and reconstruct a document
 */

use async_trait::async_trait;

use crate::errors::TranslationError;

/// Capability that translates one chunk payload.
///
/// Implementations must return the payload translated as a whole, keeping
/// the blank-line separators between paragraphs.
#[async_trait]
pub trait ChunkTranslator: Send + Sync {
    /// Translate `payload` from `source_language` (possibly `auto`) to `target_language`
    async fn translate(
        &self,
        payload: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError>;

    /// Verify the capability can be used before any chunk is sent
    fn check_available(&self) -> Result<(), TranslationError> {
        Ok(())
    }

    /// Reach the backing service once without translating anything
    async fn test_connection(&self) -> Result<(), TranslationError> {
        Ok(())
    }

    /// Human-readable name for logs
    fn name(&self) -> String;

    /// Usage report after a run, if the implementation tracks one
    fn usage_summary(&self) -> Option<String> {
        None
    }
}

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::core::{TokenUsageStats, TranslationService};
pub use self::pipeline::{
    PipelineOptions, PipelineOutput, PipelinePreview, PipelineStats, ReflowPipeline,
};

// Submodules
pub mod cache;
pub mod core;
pub mod pipeline;
