//! Chat-backed capability client
//!
//! Implements both [`DocumentCapability`] and [`InterpretCapability`] on top
//! of any OpenAI-compatible chat-completions endpoint (or Anthropic's
//! messages API). Works with a rotating pool of API keys.
//!
//! ## Key Discovery
//!
//! Auto-discovers API keys from environment variables:
//! - `OPENAI_API_KEY` → OpenAI
//! - `ANTHROPIC_API_KEY` → Anthropic
//! - `GROQ_API_KEY` → Groq (text-only; interpretation)
//! - `OPENROUTER_API_KEY` → OpenRouter
//! - `BRANDGUARD_AI_KEY` + `BRANDGUARD_AI_ENDPOINT` (+ `BRANDGUARD_AI_MODEL`) → custom endpoint

use super::prompts;
use super::{CapabilityError, DocumentCapability, InterpretCapability, SchemaContract};
use crate::ingest::{Document, PageContent};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Configuration for the chat capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCapabilityConfig {
    /// API keys pool (rotated to spread rate limits)
    pub api_keys: Vec<ApiKeyEntry>,
    /// Maximum tokens per response
    pub max_tokens: usize,
    pub temperature: f64,
    /// Whether to auto-discover keys from environment variables
    pub auto_discover_keys: bool,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ChatCapabilityConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            max_tokens: 8192,
            temperature: 0.0,
            auto_discover_keys: true,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    pub provider: String,
    pub key: String,
    pub endpoint: String,
    pub model: String,
    /// Whether the model accepts document/image input
    pub vision: bool,
    pub active: bool,
}

/// Known providers: (env_var, provider_name, endpoint, default_model, vision)
const PROVIDER_MAP: &[(&str, &str, &str, &str, bool)] = &[
    ("OPENAI_API_KEY", "openai", "https://api.openai.com/v1/chat/completions", "gpt-4o", true),
    ("ANTHROPIC_API_KEY", "anthropic", "https://api.anthropic.com/v1/messages", "claude-sonnet-4-20250514", true),
    ("OPENROUTER_API_KEY", "openrouter", "https://openrouter.ai/api/v1/chat/completions", "openai/gpt-4o", true),
    ("GROQ_API_KEY", "groq", "https://api.groq.com/openai/v1/chat/completions", "llama-3.3-70b-versatile", false),
];

/// Response shape from OpenAI-compatible APIs
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
    // Anthropic uses a different shape
    content: Option<Vec<AnthropicContent>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedPages {
    pages: Vec<PageContent>,
}

/// Attachment sent alongside the prompt
struct Attachment<'a> {
    filename: &'a str,
    mime_type: &'static str,
    base64: String,
    is_pdf: bool,
}

/// Chat-backed extraction + interpretation capability
pub struct ChatCapability {
    config: ChatCapabilityConfig,
    keys: Vec<ApiKeyEntry>,
    key_index: Arc<RwLock<usize>>,
    client: reqwest::Client,
}

impl ChatCapability {
    pub fn new(config: ChatCapabilityConfig) -> Self {
        let mut keys = config.api_keys.clone();

        if config.auto_discover_keys {
            for dk in Self::discover_keys() {
                if !keys.iter().any(|k| k.provider == dk.provider) {
                    keys.push(dk);
                }
            }
        }

        if let (Ok(endpoint), Ok(key)) = (
            std::env::var("BRANDGUARD_AI_ENDPOINT"),
            std::env::var("BRANDGUARD_AI_KEY"),
        ) {
            let model = std::env::var("BRANDGUARD_AI_MODEL").unwrap_or_else(|_| "default".to_string());
            if !keys.iter().any(|k| k.provider == "custom") {
                keys.push(ApiKeyEntry {
                    provider: "custom".to_string(),
                    key,
                    endpoint,
                    model,
                    vision: true,
                    active: true,
                });
            }
        }

        let active: Vec<&str> = keys
            .iter()
            .filter(|k| k.active)
            .map(|k| k.provider.as_str())
            .collect();
        if active.is_empty() {
            tracing::info!(
                "Chat capability initialized without API keys; \
                 set OPENAI_API_KEY, ANTHROPIC_API_KEY or BRANDGUARD_AI_KEY"
            );
        } else {
            tracing::info!(
                "Chat capability initialized with {} key(s): {}",
                active.len(),
                active.join(", ")
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                // Attempts stay bounded by the retry policy's per-attempt timeout
                tracing::warn!(
                    "HTTP client with {}s timeout failed to build ({}); using default client",
                    config.timeout_seconds,
                    e
                );
                reqwest::Client::new()
            });

        Self {
            config,
            keys,
            key_index: Arc::new(RwLock::new(0)),
            client,
        }
    }

    /// Discover API keys from well-known environment variables
    fn discover_keys() -> Vec<ApiKeyEntry> {
        let mut keys = Vec::new();
        for &(env_var, provider, endpoint, model, vision) in PROVIDER_MAP {
            if let Ok(key) = std::env::var(env_var) {
                if !key.is_empty() {
                    tracing::debug!("Discovered {} API key from {}", provider, env_var);
                    keys.push(ApiKeyEntry {
                        provider: provider.to_string(),
                        key,
                        endpoint: endpoint.to_string(),
                        model: model.to_string(),
                        vision,
                        active: true,
                    });
                }
            }
        }
        keys
    }

    /// Whether at least one key is configured
    pub fn is_available(&self) -> bool {
        self.keys.iter().any(|k| k.active)
    }

    /// Next key (round-robin), optionally restricted to vision models
    async fn next_key(&self, needs_vision: bool) -> Result<ApiKeyEntry, CapabilityError> {
        let candidates: Vec<&ApiKeyEntry> = self
            .keys
            .iter()
            .filter(|k| k.active && (!needs_vision || k.vision))
            .collect();
        if candidates.is_empty() {
            return Err(CapabilityError::NotConfigured(if needs_vision {
                "no vision-capable API key configured".to_string()
            } else {
                "no API key configured".to_string()
            }));
        }
        let mut idx = self.key_index.write().await;
        let key = candidates[*idx % candidates.len()].clone();
        *idx += 1;
        Ok(key)
    }

    fn request_body(
        &self,
        key: &ApiKeyEntry,
        system: &str,
        prompt: &str,
        attachment: Option<&Attachment<'_>>,
    ) -> serde_json::Value {
        if key.provider == "anthropic" {
            let mut content = Vec::new();
            if let Some(att) = attachment {
                content.push(serde_json::json!({
                    "type": if att.is_pdf { "document" } else { "image" },
                    "source": {
                        "type": "base64",
                        "media_type": att.mime_type,
                        "data": att.base64,
                    }
                }));
            }
            content.push(serde_json::json!({ "type": "text", "text": prompt }));
            return serde_json::json!({
                "model": key.model,
                "max_tokens": self.config.max_tokens,
                "temperature": self.config.temperature,
                "system": system,
                "messages": [{ "role": "user", "content": content }]
            });
        }

        let user_content = match attachment {
            None => serde_json::json!(prompt),
            Some(att) => {
                let data_url = format!("data:{};base64,{}", att.mime_type, att.base64);
                let part = if att.is_pdf {
                    serde_json::json!({
                        "type": "file",
                        "file": { "filename": att.filename, "file_data": data_url }
                    })
                } else {
                    serde_json::json!({ "type": "image_url", "image_url": { "url": data_url } })
                };
                serde_json::json!([{ "type": "text", "text": prompt }, part])
            }
        };

        serde_json::json!({
            "model": key.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user_content }
            ]
        })
    }

    /// Call the endpoint and return the raw text of the first choice
    async fn call_api(&self, key: &ApiKeyEntry, body: &serde_json::Value) -> Result<String, CapabilityError> {
        let request = if key.provider == "anthropic" {
            self.client
                .post(&key.endpoint)
                .header("x-api-key", &key.key)
                .header("anthropic-version", "2023-06-01")
        } else {
            self.client
                .post(&key.endpoint)
                .header("Authorization", format!("Bearer {}", key.key))
        };

        let response = request
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(key, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            let error_body = response.text().await.unwrap_or_default();
            let snippet: String = error_body.chars().take(200).collect();
            return Err(classify_status(&key.provider, status.as_u16(), retry_after, &snippet));
        }

        let resp: ChatCompletionResponse = response.json().await.map_err(|e| {
            CapabilityError::Unavailable(format!("unparseable response from {}: {}", key.provider, e))
        })?;

        if let Some(text) = resp
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message.content)
        {
            return Ok(text);
        }
        if let Some(text) = resp
            .content
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.text)
        {
            return Ok(text);
        }
        Err(CapabilityError::Unavailable(format!("empty response from {}", key.provider)))
    }

    fn classify_transport_error(&self, key: &ApiKeyEntry, e: reqwest::Error) -> CapabilityError {
        if e.is_timeout() {
            CapabilityError::Timeout(Duration::from_secs(self.config.timeout_seconds))
        } else {
            CapabilityError::Unavailable(format!("request to {} failed: {}", key.provider, e))
        }
    }
}

/// Map an HTTP error status to a capability error
fn classify_status(provider: &str, status: u16, retry_after: Option<Duration>, body: &str) -> CapabilityError {
    match status {
        429 => CapabilityError::RateLimited {
            provider: provider.to_string(),
            retry_after,
        },
        408 | 500..=599 => CapabilityError::Unavailable(format!("{} returned {}: {}", provider, status, body)),
        413 | 415 | 422 => CapabilityError::Malformed(format!("{} returned {}: {}", provider, status, body)),
        _ => CapabilityError::Rejected(format!("{} returned {}: {}", provider, status, body)),
    }
}

/// Pull the JSON object out of a model response (tolerates code fences and
/// surrounding prose)
pub fn extract_json_object(raw: &str) -> Result<serde_json::Value, CapabilityError> {
    let json_str = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw,
    };
    serde_json::from_str(json_str).map_err(|e| {
        let snippet: String = raw.chars().take(120).collect();
        CapabilityError::Unavailable(format!("model did not return JSON ({}): {}", e, snippet))
    })
}

#[async_trait]
impl DocumentCapability for ChatCapability {
    fn name(&self) -> &str {
        "chat-vision"
    }

    async fn extract(&self, document: &Document) -> Result<Vec<PageContent>, CapabilityError> {
        let format = document.format();
        if !(format.is_image() || format == crate::ingest::DocumentFormat::Pdf) {
            return Err(CapabilityError::Malformed(format!(
                "unsupported document format: {}",
                format
            )));
        }

        let key = self.next_key(true).await?;
        let attachment = Attachment {
            filename: &document.name,
            mime_type: format.mime_type(),
            base64: base64::engine::general_purpose::STANDARD.encode(&document.bytes),
            is_pdf: !format.is_image(),
        };
        let body = self.request_body(
            &key,
            prompts::EXTRACTION_SYSTEM,
            &prompts::extraction_prompt(&document.name),
            Some(&attachment),
        );

        let text = self.call_api(&key, &body).await?;
        tracing::debug!(
            "Extraction response from {} ({}): {} chars",
            key.provider,
            key.model,
            text.len()
        );
        let value = extract_json_object(&text)?;
        let parsed: ExtractedPages = serde_json::from_value(value).map_err(|e| {
            CapabilityError::Unavailable(format!("extraction response did not match page layout: {}", e))
        })?;
        Ok(parsed.pages)
    }
}

#[async_trait]
impl InterpretCapability for ChatCapability {
    fn name(&self) -> &str {
        "chat-interpret"
    }

    async fn interpret(
        &self,
        pages: &[PageContent],
        contract: &SchemaContract,
    ) -> Result<serde_json::Value, CapabilityError> {
        let key = self.next_key(false).await?;
        let prompt = prompts::interpretation_prompt(&contract.instructions, &contract.schema, pages);
        let body = self.request_body(&key, prompts::INTERPRET_SYSTEM, &prompt, None);

        let text = self.call_api(&key, &body).await?;
        tracing::debug!(
            "Interpretation ({}) response from {} ({}): {} chars",
            contract.name,
            key.provider,
            key.model,
            text.len()
        );
        extract_json_object(&text)
    }
}

impl Default for ChatCapability {
    fn default() -> Self {
        Self::new(ChatCapabilityConfig::default())
    }
}
