/*!
 * Tests for the provider-backed translation service
 */

use paratrans::app_config::{TranslationConfig, TranslationProvider};
use paratrans::errors::{ProviderError, TranslationError};
use paratrans::translation::{ChunkTranslator, TranslationService};

use crate::common::{init_test_logging, ollama_response, StubServer};

fn ollama_config(endpoint: &str) -> TranslationConfig {
    init_test_logging();
    let mut config = TranslationConfig::default();
    config.provider = TranslationProvider::Ollama;
    config.active_provider_config_mut().endpoint = endpoint.to_string();
    config.active_provider_config_mut().model = "stub-model".to_string();
    config.active_provider_config_mut().timeout_secs = 5;
    config
}

#[tokio::test]
async fn test_translate_withOllamaStub_shouldReturnResponseAndCountTokens() {
    let server = StubServer::start(vec![(200, ollama_response("Bonjour\n\nMonde"))]).await.unwrap();
    let service = TranslationService::new(ollama_config(&server.base_url)).unwrap();

    let translated = service.translate("Hello\n\nWorld", "en", "fr").await.unwrap();

    assert_eq!(translated, "Bonjour\n\nMonde");
    let usage = service.token_usage();
    assert_eq!(usage.requests, 1);
    assert_eq!(usage.total_tokens, 19);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&requests[0]).unwrap();
    assert_eq!(body["model"], "stub-model");
    assert_eq!(body["prompt"], "Hello\n\nWorld");
    assert!(body["system"].as_str().unwrap().contains("French"));
}

#[tokio::test]
async fn test_translate_withRepeatedPayload_shouldHitCache() {
    let server = StubServer::start(vec![(200, ollama_response("Salut"))]).await.unwrap();
    let service = TranslationService::new(ollama_config(&server.base_url)).unwrap();

    service.translate("Hi", "en", "fr").await.unwrap();
    let second = service.translate("Hi", "en", "fr").await.unwrap();

    assert_eq!(second, "Salut");
    assert_eq!(server.requests().len(), 1);
    let (hits, misses, _) = service.cache.stats();
    assert_eq!((hits, misses), (1, 1));
}

#[tokio::test]
async fn test_translate_withCacheDisabled_shouldCallEveryTime() {
    let server = StubServer::start(vec![(200, ollama_response("Salut"))]).await.unwrap();
    let mut config = ollama_config(&server.base_url);
    config.common.enable_cache = false;
    let service = TranslationService::new(config).unwrap();

    service.translate("Hi", "en", "fr").await.unwrap();
    service.translate("Hi", "en", "fr").await.unwrap();

    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_translate_withBlankResponse_shouldFailWithEmptyResponse() {
    let server = StubServer::start(vec![(200, ollama_response("   "))]).await.unwrap();
    let service = TranslationService::new(ollama_config(&server.base_url)).unwrap();

    let result = service.translate("Hi", "en", "fr").await;

    assert!(matches!(result, Err(TranslationError::EmptyResponse)));
    assert!(service.cache.is_empty());
}

#[tokio::test]
async fn test_translate_withServerErrorAndNoRetries_shouldFailOnce() {
    let server = StubServer::start(vec![(500, r#"{"error":"boom"}"#.to_string())]).await.unwrap();
    let service = TranslationService::new(ollama_config(&server.base_url)).unwrap();

    let result = service.translate("Hi", "en", "fr").await;

    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::ApiError { status_code: 500, .. }))
    ));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_translate_withTransientErrorAndRetries_shouldRecover() {
    let server = StubServer::start(vec![
        (503, r#"{"error":"busy"}"#.to_string()),
        (200, ollama_response("Salut")),
    ]).await.unwrap();
    let mut config = ollama_config(&server.base_url);
    config.common.retry_count = 2;
    config.common.retry_backoff_ms = 1;
    let service = TranslationService::new(config).unwrap();

    let translated = service.translate("Hi", "en", "fr").await.unwrap();

    assert_eq!(translated, "Salut");
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_translate_withAuthError_shouldNotRetry() {
    let server = StubServer::start(vec![(401, r#"{"error":"denied"}"#.to_string())]).await.unwrap();
    let mut config = ollama_config(&server.base_url);
    config.common.retry_count = 3;
    config.common.retry_backoff_ms = 1;
    let service = TranslationService::new(config).unwrap();

    let result = service.translate("Hi", "en", "fr").await;

    assert!(matches!(result, Err(TranslationError::Provider(ProviderError::AuthenticationError(_)))));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn test_checkAvailable_withAnthropicKey_shouldPass() {
    let mut config = TranslationConfig::default();
    config.provider = TranslationProvider::Anthropic;
    config.active_provider_config_mut().api_key = "sk-ant-test".to_string();
    let service = TranslationService::new(config).unwrap();

    assert!(service.check_available().is_ok());
    assert!(service.name().starts_with("Anthropic"));
}

#[test]
fn test_usageSummary_shouldMentionCache() {
    let service = TranslationService::new(TranslationConfig::default()).unwrap();

    let summary = service.usage_summary().unwrap();

    assert!(summary.contains("Cache: 0 hits, 0 misses"));
}

#[tokio::test]
async fn test_testConnection_withOllamaStub_shouldQueryVersion() {
    let server = StubServer::start(vec![(200, r#"{"version":"0.5.7"}"#.to_string())]).await.unwrap();
    let service = TranslationService::new(ollama_config(&server.base_url)).unwrap();

    assert!(service.test_connection().await.is_ok());
    assert_eq!(server.requests().len(), 1);
    assert_eq!(service.token_usage().requests, 0);
}

#[tokio::test]
async fn test_testConnection_withRejectingServer_shouldReturnProviderError() {
    let server = StubServer::start(vec![(401, r#"{"error":"denied"}"#.to_string())]).await.unwrap();
    let service = TranslationService::new(ollama_config(&server.base_url)).unwrap();

    let result = service.test_connection().await;

    assert!(matches!(result, Err(TranslationError::Provider(ProviderError::AuthenticationError(_)))));
}
