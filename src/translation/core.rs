/*!
 * Core translation service implementation.
 *
 * This module contains the main TranslationService struct, which translates
 * chunk payloads using the configured AI provider.
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::{Provider, RetryPolicy};
use super::cache::TranslationCache;
use super::ChunkTranslator;

/// Token usage statistics for tracking API consumption
#[derive(Clone, Debug)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Number of provider calls made
    pub requests: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl TokenUsageStats {
    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            requests: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Record one provider call
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>, duration: Duration) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }

        self.requests += 1;
        self.api_duration += duration;
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        // Use the API duration for rate calculation, with fallback to elapsed time
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "Token Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Requests: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.provider,
            self.model,
            self.requests,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.api_duration.as_secs_f64() / 60.0,
            self.tokens_per_minute()
        )
    }
}

/// Parse an endpoint string into a URL, defaulting the scheme to http
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    if endpoint.trim().is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }

    Ok(url)
}

/// Translation provider implementation variants
enum TranslationProviderImpl {
    /// Ollama LLM service
    Ollama {
        /// Client instance
        client: Ollama,
    },

    /// OpenAI API service
    OpenAI {
        /// Client instance
        client: OpenAI,
    },

    /// LM Studio local server (OpenAI-compatible)
    LMStudio {
        /// Client instance (OpenAI-compatible)
        client: OpenAI,
    },

    /// Anthropic API service
    Anthropic {
        /// Client instance
        client: Anthropic,
    },
}

/// Provider-backed chunk translator
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    /// Translation cache for storing and retrieving translations
    pub cache: TranslationCache,

    /// Accumulated token usage
    usage: Arc<Mutex<TokenUsageStats>>,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let retry = RetryPolicy {
            max_retries: config.common.retry_count,
            backoff_base_ms: config.common.retry_backoff_ms,
        };
        let timeout_secs = config.get_timeout_secs();

        let provider = match config.provider {
            ConfigTranslationProvider::Ollama => {
                let url = parse_endpoint(&config.get_endpoint())?;
                TranslationProviderImpl::Ollama {
                    client: Ollama::new_with_config(url.as_str(), timeout_secs, retry),
                }
            },
            ConfigTranslationProvider::OpenAI => {
                TranslationProviderImpl::OpenAI {
                    client: OpenAI::new_with_config(config.get_api_key(), config.get_endpoint(), timeout_secs, retry),
                }
            },
            ConfigTranslationProvider::LMStudio => {
                // LM Studio often doesn't require an API key; use a default if empty
                let api_key = {
                    let k = config.get_api_key();
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };

                TranslationProviderImpl::LMStudio {
                    client: OpenAI::new_with_config(api_key, config.get_endpoint(), timeout_secs, retry),
                }
            },
            ConfigTranslationProvider::Anthropic => {
                TranslationProviderImpl::Anthropic {
                    client: Anthropic::new_with_config(config.get_api_key(), config.get_endpoint(), timeout_secs, retry),
                }
            },
        };

        let usage = TokenUsageStats::with_provider_info(
            config.provider.display_name().to_string(),
            config.get_model(),
        );

        Ok(Self {
            provider,
            cache: TranslationCache::new(config.common.enable_cache),
            config,
            usage: Arc::new(Mutex::new(usage)),
        })
    }

    /// System prompt for a language pair, with placeholders filled in
    pub fn build_system_prompt(&self, source_language: &str, target_language: &str) -> String {
        self.config.common.system_prompt
            .replace("{source_language}", &language_utils::describe_language(source_language))
            .replace("{target_language}", &language_utils::describe_language(target_language))
    }

    /// Snapshot of the token usage so far
    pub fn token_usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }

    /// Send one payload to the provider, recording token usage
    async fn request_translation(&self, text: &str, system_prompt: &str) -> Result<String, ProviderError> {
        let start_time = Instant::now();
        let model = self.config.get_model();
        let temperature = self.config.common.temperature;

        let (translated, prompt_tokens, completion_tokens) = match &self.provider {
            TranslationProviderImpl::Ollama { client } => {
                let request = GenerationRequest::new(model, text)
                    .system(system_prompt)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                (Ollama::extract_text(&response), response.prompt_eval_count, response.eval_count)
            },
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                let request = OpenAIRequest::new(model.as_str())
                    .add_message("system", system_prompt)
                    .add_message("user", text)
                    .temperature(temperature)
                    .max_tokens(max_tokens_for_model(&model));
                let response = client.complete(request).await?;
                let usage = response.usage.as_ref()
                    .map(|u| (u.prompt_tokens as u64, u.completion_tokens as u64));
                (OpenAI::extract_text(&response), usage.map(|u| u.0), usage.map(|u| u.1))
            },
            TranslationProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(model.as_str(), max_tokens_for_model(&model))
                    .system(system_prompt)
                    .add_message("user", text)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                (
                    Anthropic::extract_text(&response),
                    Some(response.usage.input_tokens as u64),
                    Some(response.usage.output_tokens as u64),
                )
            }
        };

        let duration = start_time.elapsed();
        debug!("{} response received in {:?}", self.config.provider.display_name(), duration);
        self.usage.lock().add_token_usage(prompt_tokens, completion_tokens, duration);

        Ok(translated)
    }
}

#[async_trait]
impl ChunkTranslator for TranslationService {
    async fn translate(
        &self,
        payload: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        if let Some(cached_translation) = self.cache.get(payload, source_language, target_language) {
            return Ok(cached_translation);
        }

        let system_prompt = self.build_system_prompt(source_language, target_language);
        let translated = self.request_translation(payload, &system_prompt).await?;

        if translated.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }

        self.cache.store(payload, source_language, target_language, &translated);
        Ok(translated)
    }

    fn check_available(&self) -> Result<(), TranslationError> {
        let provider = &self.config.provider;

        if provider.requires_api_key() && self.config.get_api_key().trim().is_empty() {
            return Err(TranslationError::Unavailable(format!(
                "{} requires an API key", provider.display_name()
            )));
        }

        parse_endpoint(&self.config.get_endpoint())
            .map_err(|e| TranslationError::Unavailable(format!(
                "{} endpoint is not usable: {}", provider.display_name(), e
            )))?;

        if self.config.get_model().trim().is_empty() {
            return Err(TranslationError::Unavailable(format!(
                "No model configured for {}", provider.display_name()
            )));
        }

        Ok(())
    }

    async fn test_connection(&self) -> Result<(), TranslationError> {
        info!("Testing connection to {} with model {}",
              self.config.provider.display_name(), self.config.get_model());

        let result = match &self.provider {
            TranslationProviderImpl::Ollama { client } => client.test_connection().await,
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                client.test_connection().await
            },
            TranslationProviderImpl::Anthropic { .. } => {
                // Anthropic has no free probe: a tiny translation proves the key and model
                self.request_translation("Hello", "You are a translator. Translate to French.").await.map(|_| ())
            }
        };

        result.map_err(TranslationError::Provider)
    }

    fn name(&self) -> String {
        format!("{} ({})", self.config.provider.display_name(), self.config.get_model())
    }

    fn usage_summary(&self) -> Option<String> {
        let (hits, misses, _) = self.cache.stats();
        Some(format!("{}\nCache: {} hits, {} misses", self.token_usage().summary(), hits, misses))
    }
}

/// Get the maximum number of output tokens for a given model
fn max_tokens_for_model(model: &str) -> u32 {
    match model {
        // OpenAI models
        "gpt-4" | "gpt-4-0613" => 8192,
        "gpt-4-32k" | "gpt-4-32k-0613" => 32768,
        "gpt-4o" | "gpt-4o-mini" | "gpt-4-turbo" => 4096,
        "gpt-3.5-turbo-16k" => 16384,

        // Anthropic models
        "claude-3-opus-20240229" | "claude-3-sonnet-20240229" | "claude-3-haiku-20240307" => 4096,
        m if m.starts_with("claude-3-5") => 8192,

        // A full chunk (4500 chars) needs room for its translation
        _ => 4096,
    }
}
