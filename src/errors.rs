/*!
 * Error types for the paratrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map an HTTP status and body to the matching provider error
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Whether another attempt at the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) | Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur while translating a single chunk
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The translation capability cannot be used at all
    #[error("Translation service unavailable: {0}")]
    Unavailable(String),

    /// The provider answered, but with no text
    #[error("Provider returned an empty translation")]
    EmptyResponse,
}

/// Errors raised by the re-flow and translation pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The merged document holds no text to translate
    #[error("No translatable text found in the document")]
    EmptyContent,

    /// The translation adapter failed; the whole run is abandoned
    #[error("Translation failed on chunk {chunk_index} of {total_chunks}: {source}")]
    TranslationFailure {
        /// 1-based position among the translatable chunks
        chunk_index: usize,
        /// Number of translatable chunks in the run
        total_chunks: usize,
        /// Underlying adapter error
        #[source]
        source: TranslationError,
    },

    /// A packed chunk exceeds the size limit without being a single paragraph
    #[error("Chunk {chunk_index} holds {length} characters in {paragraphs} paragraphs, above the limit of {max_size}")]
    PackingInvariantViolation {
        /// 0-based position in the chunk stream
        chunk_index: usize,
        /// Payload length in characters
        length: usize,
        /// Number of paragraphs packed into the chunk
        paragraphs: usize,
        /// Configured limit
        max_size: usize,
    },

    /// The capability check run before translation failed
    #[error("Translation service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The options passed to the pipeline are unusable
    #[error("Invalid pipeline options: {0}")]
    InvalidOptions(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Process exit code for the error category
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unknown(_) => 1,
            Self::File(_) => 2,
            Self::Provider(_) | Self::Translation(_) => 3,
            Self::Pipeline(PipelineError::TranslationFailure { .. } | PipelineError::ServiceUnavailable(_)) => 3,
            Self::Pipeline(_) => 4,
        }
    }
}

// Recover the typed error behind an anyhow chain, context included
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        let message = format!("{:#}", error);
        let error = match error.downcast::<PipelineError>() {
            Ok(pipeline_error) => return Self::Pipeline(pipeline_error),
            Err(error) => error,
        };
        let error = match error.downcast::<TranslationError>() {
            Ok(translation_error) => return Self::Translation(translation_error),
            Err(error) => error,
        };
        match error.downcast::<std::io::Error>() {
            Ok(io_error) => Self::File(io_error.to_string()),
            Err(_) => Self::Unknown(message),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
