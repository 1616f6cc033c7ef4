/*!
 * Mock translator implementations for testing and dry runs.
 *
 * This module provides a scripted `ChunkTranslator` that simulates different behaviors:
 * - `MockTranslator::identity()` - Returns every payload unchanged
 * - `MockTranslator::fail_on_call(n)` - Fails on the n-th call only
 * - `MockTranslator::unavailable()` - Fails the capability check
 *
 * Every payload it receives is recorded, together with the instant of the call.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::{ProviderError, TranslationError};
use crate::translation::ChunkTranslator;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Returns the payload unchanged
    Identity,
    /// Reverses the characters of every paragraph, keeping separators
    Reversal,
    /// Prefixes every paragraph with `[target]`
    Tagged,
    /// Succeeds, except on the given 1-based call
    FailOnCall { call: usize },
    /// Always fails with an error
    Failing,
    /// Fails the capability check
    Unavailable,
    /// Returns an empty response
    Empty,
    /// Identity, after sleeping for the given time
    Slow { delay_ms: u64 },
}

/// Scripted chunk translator
#[derive(Debug, Clone)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of translate calls received
    call_count: Arc<AtomicUsize>,
    /// Payloads in the order they were received
    payloads: Arc<Mutex<Vec<String>>>,
    /// Instant of every call
    call_times: Arc<Mutex<Vec<Instant>>>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
            payloads: Arc::new(Mutex::new(Vec::new())),
            call_times: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Translator returning payloads unchanged
    pub fn identity() -> Self {
        Self::new(MockBehavior::Identity)
    }

    /// Translator reversing every paragraph
    pub fn reversal() -> Self {
        Self::new(MockBehavior::Reversal)
    }

    /// Translator tagging every paragraph with the target language
    pub fn tagged() -> Self {
        Self::new(MockBehavior::Tagged)
    }

    /// Translator failing on the given 1-based call
    pub fn fail_on_call(call: usize) -> Self {
        Self::new(MockBehavior::FailOnCall { call })
    }

    /// Translator that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Translator whose capability check fails
    pub fn unavailable() -> Self {
        Self::new(MockBehavior::Unavailable)
    }

    /// Translator answering with nothing
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Identity translator with a fixed latency
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Number of translate calls received so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Payloads received so far, in order
    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().clone()
    }

    /// Time between consecutive calls
    pub fn call_gaps(&self) -> Vec<Duration> {
        let times = self.call_times.lock();
        times.windows(2).map(|pair| pair[1].duration_since(pair[0])).collect()
    }

    fn map_paragraphs(payload: &str, map: impl Fn(&str) -> String) -> String {
        payload
            .split(crate::reflow::PARAGRAPH_SEPARATOR)
            .map(map)
            .collect::<Vec<_>>()
            .join(crate::reflow::PARAGRAPH_SEPARATOR)
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::identity()
    }
}

#[async_trait]
impl ChunkTranslator for MockTranslator {
    async fn translate(
        &self,
        payload: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.call_times.lock().push(Instant::now());
        self.payloads.lock().push(payload.to_string());

        match self.behavior {
            MockBehavior::Identity => Ok(payload.to_string()),
            MockBehavior::Reversal => Ok(Self::map_paragraphs(payload, |p| p.chars().rev().collect())),
            MockBehavior::Tagged => Ok(Self::map_paragraphs(payload, |p| format!("[{}] {}", target_language, p))),
            MockBehavior::FailOnCall { call: failing_call } => {
                if call == failing_call {
                    Err(ProviderError::ApiError {
                        status_code: 500,
                        message: format!("Simulated failure on call {}", call),
                    }.into())
                } else {
                    Ok(payload.to_string())
                }
            }
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string()).into()),
            MockBehavior::Unavailable => Err(TranslationError::Unavailable("Mock translator is offline".to_string())),
            MockBehavior::Empty => Ok(String::new()),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(payload.to_string())
            }
        }
    }

    fn check_available(&self) -> Result<(), TranslationError> {
        match self.behavior {
            MockBehavior::Unavailable => Err(TranslationError::Unavailable("Mock translator is offline".to_string())),
            _ => Ok(()),
        }
    }

    async fn test_connection(&self) -> Result<(), TranslationError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string()).into()),
            _ => self.check_available(),
        }
    }

    fn name(&self) -> String {
        format!("mock ({:?})", self.behavior)
    }
}
