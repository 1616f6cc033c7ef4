/*!
 * Translation caching functionality.
 *
 * Identical chunk payloads (repeated headers, footers, boilerplate pages) are
 * translated once per language pair. Keys hold a SHA-256 digest of the
 * payload instead of the payload itself.
 */

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use log::debug;
use sha2::{Digest, Sha256};

use crate::reflow::truncate_chars;

/// Cache key combining the payload digest with the language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// SHA-256 of the source text
    digest: [u8; 32],

    /// Source language code
    source_language: String,

    /// Target language code
    target_language: String,
}

impl CacheKey {
    /// Create a new cache key
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            digest: Sha256::digest(source_text.as_bytes()).into(),
            source_language: source_language.to_lowercase(),
            target_language: target_language.to_lowercase(),
        }
    }
}

/// Translation cache for storing and retrieving translations
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, String>>>,

    /// Hit and miss counters
    counters: Arc<RwLock<(usize, usize)>>,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            counters: Arc::new(RwLock::new((0, 0))),
            enabled,
        }
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let found = self.cache.read().get(&key).cloned();

        let mut counters = self.counters.write();
        match found {
            Some(translation) => {
                counters.0 += 1;
                debug!("Cache hit for '{}' ({} -> {})",
                       truncate_chars(source_text, 30), source_language, target_language);
                Some(translation)
            }
            None => {
                counters.1 += 1;
                None
            }
        }
    }

    /// Store a translation in the cache
    pub fn store(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        self.cache.write().insert(key, translation.to_string());
    }

    /// Get cache statistics: hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let (hits, misses) = *self.counters.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.counters.write() = (0, 0);
        debug!("Translation cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            counters: self.counters.clone(),
            enabled: self.enabled,
        }
    }
}
