//! Pluggable model-backend abstraction
//!
//! The generative model is an opaque request/response collaborator: the
//! pipeline hands it a system instruction plus a user payload and gets
//! raw text back. Everything else (payload assembly, response parsing,
//! guardrails) stays deterministic and lives outside this module.
//!
//! # Architecture
//!
//! - `ModelBackend` trait: the single completion operation
//! - `ModelClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `MODEL_BACKEND`: Backend to use (openai, mock). Default: openai
//! - `OPENAI_API_KEY`: API key (required for the openai backend)
//! - `OPENAI_BASE_URL`: Server URL (default: https://api.openai.com)
//! - `OPENAI_MODEL`: Model name (default: gpt-4.1-mini)

mod mock;
mod openai_compatible;
pub mod parsing;

pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for model backends
///
/// Backends must be Send + Sync so reconciliation runs can execute
/// concurrently without coordination.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run a chat completion with a system instruction and user payload,
    /// returning the raw response text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for the run envelope)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete model client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
/// Constructed once at process start and passed into the pipeline as an
/// explicit dependency.
#[derive(Clone)]
pub enum ModelClient {
    /// Any server implementing the OpenAI chat completions API
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl ModelClient {
    /// Create a model client from environment variables.
    ///
    /// Returns `None` when no credentials are configured; the pipeline
    /// turns that into a model-unavailable outcome instead of an error.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("MODEL_BACKEND").unwrap_or_else(|_| "openai".to_string());

        match backend.to_lowercase().as_str() {
            "mock" => Some(ModelClient::Mock(MockBackend::new())),
            "openai" | "openai_compatible" => {
                OpenAICompatibleBackend::from_env().map(ModelClient::OpenAICompatible)
            }
            _ => {
                tracing::warn!(backend = %backend, "Unknown MODEL_BACKEND, falling back to openai");
                OpenAICompatibleBackend::from_env().map(ModelClient::OpenAICompatible)
            }
        }
    }

    /// Create an OpenAI-compatible backend directly
    pub fn openai(base_url: &str, model: &str, api_key: Option<&str>) -> Self {
        ModelClient::OpenAICompatible(OpenAICompatibleBackend::new(base_url, model, api_key))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ModelClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl ModelBackend for ModelClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        match self {
            ModelClient::OpenAICompatible(b) => b.complete(system, user).await,
            ModelClient::Mock(b) => b.complete(system, user).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ModelClient::OpenAICompatible(b) => b.health_check().await,
            ModelClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ModelClient::OpenAICompatible(b) => b.model(),
            ModelClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            ModelClient::OpenAICompatible(b) => b.host(),
            ModelClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_client_mock() {
        let client = ModelClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = ModelClient::mock();
        assert!(client.health_check().await);
    }
}
