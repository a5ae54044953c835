//! External AI capabilities: OCR/document understanding and structured
//! interpretation
//!
//! The engine never calls a model directly. It goes through two narrow
//! traits so every deterministic stage (rule compilation, distance checks,
//! scoring) runs against fixed-output stubs in tests:
//!
//! - [`DocumentCapability`]: `extract(doc) -> PageContent[]`, one call per document
//! - [`InterpretCapability`]: `interpret(pages, schema) -> JSON`, one call per guideline
//!
//! [`client::ChatCapability`] implements both against any OpenAI-compatible
//! (or Anthropic) chat endpoint, with keys discovered from the environment.

pub mod client;
pub mod prompts;

pub use client::{ApiKeyEntry, ChatCapability, ChatCapabilityConfig};

use crate::ingest::{Document, PageContent};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by an external capability
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited by {provider}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("capability unavailable: {0}")]
    Unavailable(String),

    /// The input itself is unusable (corrupt, unsupported)
    #[error("malformed input: {0}")]
    Malformed(String),

    /// The capability refused the request (auth, quota, bad request)
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("capability not configured: {0}")]
    NotConfigured(String),
}

impl CapabilityError {
    /// Transient failures are retried; everything else is final
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::RateLimited { .. } | Self::Unavailable(_)
        )
    }
}

/// Fixed output contract handed to the interpretation capability
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaContract {
    pub name: &'static str,
    /// JSON Schema the response must follow
    pub schema: serde_json::Value,
    /// Task instructions prepended to the document text
    pub instructions: String,
}

/// OCR / document-understanding capability
#[async_trait]
pub trait DocumentCapability: Send + Sync {
    /// Human-readable name for logs and error messages
    fn name(&self) -> &str;

    /// Extract every page of `document` in a single external call
    async fn extract(&self, document: &Document) -> Result<Vec<PageContent>, CapabilityError>;
}

/// Language-understanding capability constrained to a schema
#[async_trait]
pub trait InterpretCapability: Send + Sync {
    fn name(&self) -> &str;

    /// Interpret page content into a record shaped by `contract`. The
    /// returned JSON is untrusted: callers validate every field.
    async fn interpret(
        &self,
        pages: &[PageContent],
        contract: &SchemaContract,
    ) -> Result<serde_json::Value, CapabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CapabilityError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(CapabilityError::RateLimited {
            provider: "openai".into(),
            retry_after: None
        }
        .is_transient());
        assert!(CapabilityError::Unavailable("502".into()).is_transient());
        assert!(!CapabilityError::Malformed("bad pdf".into()).is_transient());
        assert!(!CapabilityError::Rejected("401".into()).is_transient());
        assert!(!CapabilityError::NotConfigured("no key".into()).is_transient());
    }
}
